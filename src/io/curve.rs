//! Read/write model JSON files.
//!
//! Model JSON is the "portable" representation of a fitted degradation model:
//! - the five fitted parameters
//! - fit quality and (when applicable) the fallback reason
//! - a precomputed fitted grid over the input cycle range for quick plotting
//!
//! The schema is defined by `domain::CurveFile`. `soh predict` reloads these
//! files to re-run the EOL search for new thresholds without refitting.

use std::fs::File;
use std::path::Path;

use crate::domain::{CurveFile, CurveGrid, FitOutcome};
use crate::error::AppError;
use crate::io::ingest::SeriesStats;
use crate::models::predict;

/// Number of grid samples written to the curve file.
const GRID_SAMPLES: usize = 101;

/// Write a model JSON file.
pub fn write_curve_json(path: &Path, outcome: &FitOutcome, stats: &SeriesStats) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::contract(format!("Failed to create model JSON '{}': {e}", path.display()))
    })?;

    let curve = CurveFile {
        tool: "soh".to_string(),
        model: *outcome.params(),
        fit_quality: *outcome.quality(),
        fallback_reason: outcome.fallback_reason(),
        grid: build_grid(outcome, stats.cycle_min, stats.cycle_max),
    };

    serde_json::to_writer_pretty(file, &curve)
        .map_err(|e| AppError::contract(format!("Failed to write model JSON: {e}")))?;

    Ok(())
}

/// Read a model JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::contract(format!("Failed to open model JSON '{}': {e}", path.display()))
    })?;
    let curve: CurveFile = serde_json::from_reader(file)
        .map_err(|e| AppError::contract(format!("Invalid model JSON: {e}")))?;
    Ok(curve)
}

fn build_grid(outcome: &FitOutcome, cycle_min: u32, cycle_max: u32) -> CurveGrid {
    let span = cycle_max.saturating_sub(cycle_min).max(1);
    let n = GRID_SAMPLES.min(span as usize + 1).max(2);

    let mut cycles = Vec::with_capacity(n);
    let mut capacity = Vec::with_capacity(n);
    for i in 0..n {
        let frac = i as f64 / (n as f64 - 1.0);
        let cycle = cycle_min + (frac * span as f64).round() as u32;
        cycles.push(cycle);
        capacity.push(predict(outcome.params(), f64::from(cycle)));
    }

    CurveGrid { cycles, capacity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DegradationParams, FitQuality};

    #[test]
    fn round_trips_a_fitted_model() {
        let outcome = FitOutcome::Converged {
            params: DegradationParams {
                a1: 0.2,
                k1: 0.01,
                a2: 0.05,
                k2: 0.001,
                baseline: 0.75,
            },
            quality: FitQuality {
                sse: 1.2e-5,
                rmse: 4.0e-4,
                n: 75,
            },
        };
        let stats = SeriesStats {
            n_points: 75,
            cycle_min: 0,
            cycle_max: 740,
            capacity_min: 0.76,
            capacity_max: 1.0,
        };

        let path = std::env::temp_dir().join("soh_curves_test_model.json");
        write_curve_json(&path, &outcome, &stats).unwrap();
        let curve = read_curve_json(&path).unwrap();

        assert_eq!(curve.tool, "soh");
        assert_eq!(curve.model, *outcome.params());
        assert_eq!(curve.fallback_reason, None);
        assert_eq!(curve.grid.cycles.len(), curve.grid.capacity.len());
        assert_eq!(*curve.grid.cycles.first().unwrap(), 0);
        assert_eq!(*curve.grid.cycles.last().unwrap(), 740);
    }
}
