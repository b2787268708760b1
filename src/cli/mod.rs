//! Command-line parsing for the battery SOH forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "soh", version, about = "Battery SOH forecaster (capacity-fade curve fitting)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Condition a cycling CSV, fit the degradation model, and predict EOL.
    Fit(FitArgs),
    /// Re-run the EOL search against a previously exported model JSON.
    Predict(PredictArgs),
    /// Generate a synthetic cycling CSV (seeded, reproducible).
    Sample(SampleArgs),
    /// Plot a previously exported model JSON.
    Plot(PlotArgs),
}

/// Options for fitting a measured series.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Input CSV with (at least) `cycle` and `capacity` columns.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// SOH fraction defining end-of-life (e.g. 0.8 = 80%).
    #[arg(long, default_value_t = 0.8)]
    pub threshold: f64,

    /// EOL search horizon in cycles.
    #[arg(long, default_value_t = 5_000)]
    pub horizon: u32,

    /// Fast-charge C-rate used in the stress adjustment (>= 1).
    #[arg(long = "fast-charge", default_value_t = 1.0)]
    pub fast_charge: f64,

    /// Operating temperature (degC) used in the stress adjustment.
    #[arg(long, default_value_t = 25.0)]
    pub temp: f64,

    /// Log-spaced steps per rate dimension in the (k1, k2) grid search.
    #[arg(long, default_value_t = 24)]
    pub rate_steps: usize,

    /// Minimum ratio k1/k2 between the fast and slow decay rates (>= 1).
    #[arg(long = "rate-min-ratio", default_value_t = 2.0)]
    pub rate_min_ratio: f64,

    /// Zoom-in refinement passes around the best rate pair.
    #[arg(long, default_value_t = 3)]
    pub refine_passes: usize,

    /// Cap on candidate least-squares solves per fit.
    #[arg(long, default_value_t = 20_000)]
    pub max_evals: usize,

    /// Upper bound for the amplitudes a1/a2 (input capacity units).
    #[arg(long, default_value_t = 10.0)]
    pub amp_max: f64,

    /// Upper bound for the decay rates k1/k2 (per cycle).
    #[arg(long, default_value_t = 1.0)]
    pub rate_max: f64,

    /// Upper bound for the baseline asymptote (input capacity units).
    #[arg(long, default_value_t = 2.0)]
    pub baseline_max: f64,

    /// Render an ASCII plot in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-point results (cycle, capacity, fitted, residual) to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fitted model (params + quality + grid) to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

/// Options for re-running the EOL search on a saved model.
#[derive(Debug, Parser)]
pub struct PredictArgs {
    /// Model JSON file produced by `soh fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// SOH fraction defining end-of-life.
    #[arg(long, default_value_t = 0.8)]
    pub threshold: f64,

    /// EOL search horizon in cycles.
    #[arg(long, default_value_t = 5_000)]
    pub horizon: u32,

    /// Fast-charge C-rate used in the stress adjustment (>= 1).
    #[arg(long = "fast-charge", default_value_t = 1.0)]
    pub fast_charge: f64,

    /// Operating temperature (degC) used in the stress adjustment.
    #[arg(long, default_value_t = 25.0)]
    pub temp: f64,
}

/// Options for synthetic sample generation.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Number of points to generate.
    #[arg(long, default_value_t = 100)]
    pub count: usize,

    /// Cycle spacing between consecutive points.
    #[arg(long, default_value_t = 10)]
    pub step: u32,

    /// Gaussian measurement-noise standard deviation.
    #[arg(long, default_value_t = 0.002)]
    pub noise: f64,

    /// RNG seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for plotting a saved model.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Model JSON file produced by `soh fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
