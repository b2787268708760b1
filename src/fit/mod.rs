//! Capacity-fade fitting.
//!
//! Responsibilities:
//!
//! - generate log-spaced decay-rate grids for the (k1, k2) search
//! - evaluate each candidate rate pair (parallel), solving the linear
//!   parameters by least squares
//! - absorb numerical failure into the linear fallback model

pub mod fitter;
pub mod rate_grid;

pub use fitter::*;
pub use rate_grid::*;
