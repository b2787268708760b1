//! Reporting utilities: residuals, fitted grids, and formatted output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{
    CycleSeries, DegradationParams, EolPrediction, FitOutcome, PointResidual, RunConfig,
};
use crate::error::AppError;
use crate::io::ingest::ConditionedData;
use crate::models::predict;

/// Compute fitted values and residuals for each conditioned point.
pub fn compute_residuals(
    series: &CycleSeries,
    params: &DegradationParams,
) -> Result<Vec<PointResidual>, AppError> {
    let mut out = Vec::with_capacity(series.len());
    for p in &series.points {
        let fitted = predict(params, f64::from(p.cycle));
        if !fitted.is_finite() {
            return Err(AppError::internal(
                "Non-finite model prediction during residual computation.",
            ));
        }
        out.push(PointResidual {
            point: *p,
            fitted,
            residual: p.capacity - fitted,
        });
    }
    Ok(out)
}

/// Evaluate the fitted model on an arbitrary cycle grid (plotting convenience).
pub fn fitted_grid(params: &DegradationParams, cycles: &[u32]) -> Vec<f64> {
    cycles
        .iter()
        .map(|&c| predict(params, f64::from(c)))
        .collect()
}

/// Format the full run summary (dataset stats + fit diagnostics + prediction).
pub fn format_run_summary(
    conditioned: &ConditionedData,
    outcome: &FitOutcome,
    eol: &EolPrediction,
    adjusted: Option<f64>,
    config: &RunConfig,
) -> String {
    let mut out = String::new();
    let stats = &conditioned.stats;

    out.push_str("=== soh - Battery SOH Forecast ===\n");
    out.push_str(&format!(
        "Data: rows={} used={} dropped={}\n",
        conditioned.rows_read,
        conditioned.rows_used,
        conditioned.row_errors.len()
    ));
    out.push_str(&format!(
        "Points: n={} | cycle=[{}, {}] | capacity=[{:.4}, {:.4}]\n",
        stats.n_points, stats.cycle_min, stats.cycle_max, stats.capacity_min, stats.capacity_max
    ));

    out.push_str("\nFit diagnostics:\n");
    let q = outcome.quality();
    match outcome.fallback_reason() {
        None => out.push_str(&format!(
            "- converged | SSE={:.6} RMSE={:.6} n={}\n",
            q.sse, q.rmse, q.n
        )),
        Some(reason) => out.push_str(&format!(
            "- FALLBACK (linear): {reason} | SSE={:.6} RMSE={:.6} n={}\n",
            q.sse, q.rmse, q.n
        )),
    }

    let p = outcome.params();
    out.push_str("\nModel parameters:\n");
    out.push_str(&format!("- a1       = {:.6}\n", p.a1));
    out.push_str(&format!("- k1       = {:.6}\n", p.k1));
    out.push_str(&format!("- a2       = {:.6}\n", p.a2));
    out.push_str(&format!("- k2       = {:.6}\n", p.k2));
    out.push_str(&format!("- baseline = {:.6}\n", p.baseline));
    out.push_str(&format!(
        "- capacity(0) = {:.6}\n",
        p.initial_capacity()
    ));

    out.push('\n');
    out.push_str(&format_prediction(eol, adjusted, config));
    out
}

/// Format the lifetime prediction and engineering summary.
pub fn format_prediction(
    eol: &EolPrediction,
    adjusted: Option<f64>,
    config: &RunConfig,
) -> String {
    let mut out = String::new();
    let threshold_pct = config.soh_threshold * 100.0;

    match eol {
        EolPrediction::Found { cycle } => {
            out.push_str(&format!(
                "Estimated life until {threshold_pct:.0}% SOH: {cycle} cycles\n"
            ));
        }
        EolPrediction::NotFound => {
            out.push_str(&format!(
                "Estimated life until {threshold_pct:.0}% SOH: unavailable \
                 (no crossing within {} cycles; fade too small or model flat)\n",
                config.engine.eol_horizon
            ));
        }
    }

    match adjusted {
        Some(adjusted) => out.push_str(&format!(
            "Adjusted for {:.1}C at {:.0} degC: {:.0} cycles\n",
            config.stress.fast_charge_rate, config.stress.temperature_c, adjusted
        )),
        None => out.push_str("Adjusted life: unavailable (no baseline EOL estimate)\n"),
    }

    out.push_str("\nNotes:\n");
    out.push_str("- Higher charging C-rate accelerates SEI growth and lithium plating.\n");
    out.push_str("- Higher temperature speeds up electrolyte decomposition.\n");
    out.push_str("- The stress adjustment is a scalar derating, not a kinetic model.\n");

    out
}
