//! Export per-point fit results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per conditioned measurement with its fitted value and
//! residual.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::PointResidual;
use crate::error::AppError;

/// Write per-point results to a CSV file.
pub fn write_results_csv(path: &Path, residuals: &[PointResidual]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::contract(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "cycle,capacity,fitted,residual")
        .map_err(|e| AppError::contract(format!("Failed to write export CSV header: {e}")))?;

    for r in residuals {
        writeln!(
            file,
            "{},{:.10},{:.10},{:.10}",
            r.point.cycle, r.point.capacity, r.fitted, r.residual
        )
        .map_err(|e| AppError::contract(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
