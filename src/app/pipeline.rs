//! Shared "fit pipeline" logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV conditioning -> model fit -> residuals -> EOL search -> stress adjust
//!
//! The CLI front-end then focuses on presentation (printing vs exports).

use crate::domain::{EolPrediction, FitOutcome, PointResidual, RunConfig};
use crate::error::AppError;
use crate::io::ingest::{ConditionedData, load_cycle_series};

/// All computed outputs of a single `soh fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub conditioned: ConditionedData,
    pub outcome: FitOutcome,
    pub residuals: Vec<PointResidual>,
    pub eol: EolPrediction,
    /// Stress-adjusted cycle count; `None` whenever `eol` is `NotFound`.
    pub adjusted_life: Option<f64>,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    // 1) Condition the raw table (data-contract errors propagate).
    let conditioned = load_cycle_series(&config.csv_path)?;

    // 2) Fit; numerical failure is absorbed into the fallback outcome.
    let outcome = crate::fit::fit(&conditioned.series, &config.engine);

    // 3) Residuals for reporting/export.
    let residuals = crate::report::compute_residuals(&conditioned.series, outcome.params())?;

    // 4) EOL search on the fitted parameters only.
    let eol = crate::eol::predict_eol(
        outcome.params(),
        config.soh_threshold,
        config.engine.eol_horizon,
    );

    // 5) Stress adjustment; short-circuits to `None` when EOL is unavailable.
    let adjusted_life = crate::stress::adjusted_life(&eol, &config.stress);

    Ok(RunOutput {
        conditioned,
        outcome,
        residuals,
        eol,
        adjusted_life,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, generate_series, write_sample_csv};
    use crate::domain::{EngineConfig, StressFactors};

    fn pipeline_config(csv: std::path::PathBuf) -> RunConfig {
        RunConfig {
            csv_path: csv,
            soh_threshold: 0.8,
            stress: StressFactors {
                fast_charge_rate: 2.0,
                temperature_c: 35.0,
            },
            engine: EngineConfig::default(),
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_results: None,
            export_curve: None,
        }
    }

    #[test]
    fn end_to_end_on_synthetic_data() {
        // Reference curve: initial capacity 1.0, crosses 80% SOH at cycle 280.
        let sample = SampleConfig {
            noise_sigma: 0.0,
            count: 80,
            cycle_step: 10,
            ..SampleConfig::default()
        };
        let series = generate_series(&sample).unwrap();

        let csv = std::env::temp_dir().join("soh_curves_test_pipeline.csv");
        write_sample_csv(&csv, &series).unwrap();

        let run = run_fit(&pipeline_config(csv)).unwrap();

        assert_eq!(run.conditioned.rows_used, 80);
        assert!(!run.outcome.is_fallback());
        assert_eq!(run.residuals.len(), 80);

        // The fitted curve should cross close to the true model's cycle 280.
        let eol = run.eol.cycle().expect("expected an EOL crossing");
        assert!(
            (260..=300).contains(&eol),
            "EOL {eol} too far from reference 280"
        );

        let adjusted = run.adjusted_life.expect("adjusted life available");
        assert!((adjusted - f64::from(eol) / 2.4).abs() < 1e-9);
    }

    #[test]
    fn flat_data_reports_unavailable_everywhere() {
        let csv = std::env::temp_dir().join("soh_curves_test_pipeline_flat.csv");
        let series = crate::domain::CycleSeries::new(
            (0..20)
                .map(|i| crate::domain::CyclePoint {
                    cycle: i * 10,
                    capacity: 0.9,
                })
                .collect(),
        );
        write_sample_csv(&csv, &series).unwrap();

        let run = run_fit(&pipeline_config(csv)).unwrap();
        assert!(run.outcome.is_fallback());
        assert_eq!(run.eol, EolPrediction::NotFound);
        assert_eq!(run.adjusted_life, None);
    }
}
