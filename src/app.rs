//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - conditions the input CSV
//! - runs the fit + EOL + stress-adjustment pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, FitArgs, PlotArgs, PredictArgs, SampleArgs};
use crate::domain::{EngineConfig, ParamBounds, RunConfig, StressFactors};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `soh` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Predict(args) => handle_predict(args),
        Command::Sample(args) => handle_sample(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(
            &run.conditioned,
            &run.outcome,
            &run.eol,
            run.adjusted_life,
            &config,
        )
    );

    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &run.residuals,
            run.outcome.params(),
            &run.eol,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.residuals)?;
    }
    if let Some(path) = &config.export_curve {
        crate::io::curve::write_curve_json(path, &run.outcome, &run.conditioned.stats)?;
    }

    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    validate_threshold(args.threshold)?;
    let stress = StressFactors {
        fast_charge_rate: args.fast_charge,
        temperature_c: args.temp,
    };
    stress.validate()?;

    let curve = crate::io::curve::read_curve_json(&args.curve)?;

    // The EOL search consumes only the saved parameters; no refit needed.
    let eol = crate::eol::predict_eol(&curve.model, args.threshold, args.horizon);
    let adjusted = crate::stress::adjusted_life(&eol, &stress);

    let config = RunConfig {
        csv_path: args.curve.clone(),
        soh_threshold: args.threshold,
        stress,
        engine: EngineConfig {
            eol_horizon: args.horizon,
            ..EngineConfig::default()
        },
        plot: false,
        plot_width: 0,
        plot_height: 0,
        export_results: None,
        export_curve: None,
    };
    print!("{}", crate::report::format_prediction(&eol, adjusted, &config));

    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = crate::data::SampleConfig {
        count: args.count,
        cycle_step: args.step,
        noise_sigma: args.noise,
        seed: args.seed,
        ..crate::data::SampleConfig::default()
    };
    let series = crate::data::generate_series(&config)?;
    crate::data::write_sample_csv(&args.out, &series)?;

    println!(
        "Wrote {} synthetic points to '{}' (seed {}).",
        series.len(),
        args.out.display(),
        args.seed
    );
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

pub fn run_config_from_args(args: &FitArgs) -> Result<RunConfig, AppError> {
    validate_threshold(args.threshold)?;
    if args.horizon == 0 {
        return Err(AppError::contract("EOL horizon must be > 0 cycles."));
    }
    if !(args.rate_min_ratio.is_finite() && args.rate_min_ratio >= 1.0) {
        return Err(AppError::contract(format!(
            "Rate ratio {} must be >= 1 (k1 is the faster decay).",
            args.rate_min_ratio
        )));
    }

    let stress = StressFactors {
        fast_charge_rate: args.fast_charge,
        temperature_c: args.temp,
    };
    stress.validate()?;

    let bounds = ParamBounds {
        amp_max: args.amp_max,
        rate_max: args.rate_max,
        baseline_max: args.baseline_max,
        ..ParamBounds::default()
    };

    Ok(RunConfig {
        csv_path: args.csv.clone(),
        soh_threshold: args.threshold,
        stress,
        engine: EngineConfig {
            bounds,
            rate_grid_steps: args.rate_steps,
            rate_min_ratio: args.rate_min_ratio,
            refine_passes: args.refine_passes,
            max_evaluations: args.max_evals,
            eol_horizon: args.horizon,
        },
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_curve: args.export_curve.clone(),
    })
}

fn validate_threshold(threshold: f64) -> Result<(), AppError> {
    if !(threshold.is_finite() && threshold > 0.0 && threshold < 1.0) {
        return Err(AppError::contract(format!(
            "SOH threshold {threshold} must lie strictly between 0 and 1."
        )));
    }
    Ok(())
}
