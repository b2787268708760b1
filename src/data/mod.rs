//! Synthetic cycling-data generation.

pub mod sample;

pub use sample::*;
