//! Double-exponential degradation model evaluation.

pub mod model;

pub use model::*;
