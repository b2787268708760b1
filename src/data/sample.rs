//! Deterministic synthetic degradation series.
//!
//! Useful for demos and tests when no measured cycling data is at hand:
//! samples a known double-exponential fade curve, adds seeded Gaussian
//! measurement noise, and (optionally) writes the result as a CSV the
//! conditioner can ingest.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{CyclePoint, CycleSeries, DegradationParams};
use crate::error::AppError;
use crate::models::predict;

/// Configuration for synthetic series generation.
#[derive(Debug, Clone, Copy)]
pub struct SampleConfig {
    /// True parameters of the generated fade curve.
    pub params: DegradationParams,
    /// Number of points to generate.
    pub count: usize,
    /// Cycle spacing between consecutive points.
    pub cycle_step: u32,
    /// Standard deviation of the additive Gaussian measurement noise.
    pub noise_sigma: f64,
    /// RNG seed (same seed, same series).
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            params: DegradationParams {
                a1: 0.2,
                k1: 0.01,
                a2: 0.05,
                k2: 0.001,
                baseline: 0.75,
            },
            count: 100,
            cycle_step: 10,
            noise_sigma: 0.002,
            seed: 42,
        }
    }
}

/// Generate a noisy synthetic series in increasing cycle order.
pub fn generate_series(config: &SampleConfig) -> Result<CycleSeries, AppError> {
    if config.count == 0 {
        return Err(AppError::contract("Sample count must be > 0."));
    }
    if config.cycle_step == 0 {
        return Err(AppError::contract("Sample cycle step must be > 0."));
    }
    if !(config.noise_sigma.is_finite() && config.noise_sigma >= 0.0) {
        return Err(AppError::contract("Sample noise sigma must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise_sigma.max(f64::MIN_POSITIVE))
        .map_err(|e| AppError::internal(format!("Noise distribution error: {e}")))?;

    let mut points = Vec::with_capacity(config.count);
    for i in 0..config.count {
        let cycle = (i as u32).saturating_mul(config.cycle_step);
        let noise = if config.noise_sigma > 0.0 {
            normal.sample(&mut rng)
        } else {
            0.0
        };
        // Keep capacities physical: the conditioner would drop `<= 0` rows.
        let capacity = (predict(&config.params, f64::from(cycle)) + noise).max(1e-6);
        points.push(CyclePoint { cycle, capacity });
    }

    Ok(CycleSeries::new(points))
}

/// Write a generated series as a two-column CSV.
pub fn write_sample_csv(path: &Path, series: &CycleSeries) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::contract(format!("Failed to create sample CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "cycle,capacity")
        .map_err(|e| AppError::contract(format!("Failed to write sample CSV header: {e}")))?;
    for p in &series.points {
        writeln!(file, "{},{:.6}", p.cycle, p.capacity)
            .map_err(|e| AppError::contract(format!("Failed to write sample CSV row: {e}")))?;
    }

    Ok(())
}
