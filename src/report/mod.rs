//! Reporting utilities: residuals, fitted grids, and formatted terminal output.

pub mod format;

pub use format::*;
