//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - conditioned cycling data (`CyclePoint`, `CycleSeries`)
//! - fitted model parameters and outcomes (`DegradationParams`, `FitOutcome`)
//! - end-of-life predictions (`EolPrediction`)
//! - run configuration (`RunConfig`, `EngineConfig`, `ParamBounds`)

pub mod types;

pub use types::*;
