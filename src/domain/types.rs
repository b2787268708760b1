//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or repeated EOL searches

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One measured charge/discharge observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CyclePoint {
    /// Cycle number (non-negative by construction).
    pub cycle: u32,
    /// Measured capacity at that cycle. Units are whatever the input uses
    /// (Ah, mAh, or normalized SOH); bounds must be configured to match.
    pub capacity: f64,
}

/// One battery's conditioned degradation history.
///
/// Entries preserve the relative order of the input rows; we never sort.
/// Downstream heuristics (the "last sample" baseline guess in particular)
/// assume the caller supplied samples in non-decreasing cycle order.
#[derive(Debug, Clone, Default)]
pub struct CycleSeries {
    pub points: Vec<CyclePoint>,
}

impl CycleSeries {
    pub fn new(points: Vec<CyclePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Cycle numbers as `f64`, in input order (model evaluation domain).
    pub fn cycles_f64(&self) -> Vec<f64> {
        self.points.iter().map(|p| f64::from(p.cycle)).collect()
    }

    /// Capacities in input order.
    pub fn capacities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.capacity).collect()
    }

    pub fn capacity_min(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.capacity)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
    }

    pub fn capacity_max(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.capacity)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    /// Capacity of the last retained sample (baseline guess for the fit).
    pub fn last_capacity(&self) -> Option<f64> {
        self.points.last().map(|p| p.capacity)
    }
}

/// Fitted double-exponential degradation parameters:
///
/// `capacity(x) = a1·exp(-k1·x) + a2·exp(-k2·x) + baseline`
///
/// The two decay terms capture the commonly observed two-phase fade: a fast
/// initial transient (`a1`, `k1`) plus a slow long-term decay (`a2`, `k2`),
/// with the asymptote kept explicit in `baseline`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegradationParams {
    pub a1: f64,
    pub k1: f64,
    pub a2: f64,
    pub k2: f64,
    pub baseline: f64,
}

impl DegradationParams {
    /// Model value at cycle 0 (`a1 + a2 + baseline`).
    pub fn initial_capacity(&self) -> f64 {
        self.a1 + self.a2 + self.baseline
    }

    /// The degenerate flat/fallback form `(0,0,0,0,intercept)`.
    pub fn fallback(intercept: f64) -> Self {
        Self {
            a1: 0.0,
            k1: 0.0,
            a2: 0.0,
            k2: 0.0,
            baseline: intercept,
        }
    }
}

/// Box constraints on the fitted parameters.
///
/// Units follow the input capacity column: the defaults suit capacities on the
/// order of 0–2 (Ah or normalized SOH). Callers working in mAh or other scales
/// must widen the amplitude/baseline bounds accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamBounds {
    pub amp_min: f64,
    pub amp_max: f64,
    pub rate_min: f64,
    pub rate_max: f64,
    pub baseline_min: f64,
    pub baseline_max: f64,
}

impl Default for ParamBounds {
    fn default() -> Self {
        Self {
            amp_min: 0.0,
            amp_max: 10.0,
            rate_min: 0.0,
            rate_max: 1.0,
            baseline_min: 0.0,
            baseline_max: 2.0,
        }
    }
}

impl ParamBounds {
    /// Whether all five parameters lie within the box.
    pub fn contains(&self, p: &DegradationParams) -> bool {
        let in_range = |v: f64, lo: f64, hi: f64| v.is_finite() && v >= lo && v <= hi;
        in_range(p.a1, self.amp_min, self.amp_max)
            && in_range(p.a2, self.amp_min, self.amp_max)
            && in_range(p.k1, self.rate_min, self.rate_max)
            && in_range(p.k2, self.rate_min, self.rate_max)
            && in_range(p.baseline, self.baseline_min, self.baseline_max)
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
}

/// Why the nonlinear solve was abandoned in favor of the linear fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Fewer points than needed to determine five parameters.
    TooFewPoints { n: usize },
    /// Zero capacity spread; the amplitude guess degenerates to 0.
    FlatCapacity,
    /// Every candidate rate pair produced out-of-bounds linear parameters.
    NoCandidateInBounds,
    /// The least-squares solve returned non-finite values.
    NonFiniteSolve,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::TooFewPoints { n } => {
                write!(f, "too few points for a 5-parameter model (n={n})")
            }
            FallbackReason::FlatCapacity => write!(f, "flat capacity (no measurable fade)"),
            FallbackReason::NoCandidateInBounds => {
                write!(f, "no candidate satisfied the parameter bounds")
            }
            FallbackReason::NonFiniteSolve => write!(f, "least-squares solve was non-finite"),
        }
    }
}

/// Result of one fit call.
///
/// `fit` never fails for a non-empty conditioned series: numerical trouble is
/// absorbed into the `Fallback` variant so callers always receive a usable
/// (if crude) model, and can still distinguish the two cases without
/// inspecting parameter values.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Converged {
        params: DegradationParams,
        quality: FitQuality,
    },
    Fallback {
        params: DegradationParams,
        reason: FallbackReason,
        quality: FitQuality,
    },
}

impl FitOutcome {
    pub fn params(&self) -> &DegradationParams {
        match self {
            FitOutcome::Converged { params, .. } | FitOutcome::Fallback { params, .. } => params,
        }
    }

    pub fn quality(&self) -> &FitQuality {
        match self {
            FitOutcome::Converged { quality, .. } | FitOutcome::Fallback { quality, .. } => quality,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            FitOutcome::Converged { .. } => None,
            FitOutcome::Fallback { reason, .. } => Some(*reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FitOutcome::Fallback { .. })
    }
}

/// End-of-life search outcome.
///
/// `NotFound` is a normal result (the model never crosses the threshold within
/// the search horizon), not an error, and must never be collapsed to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EolPrediction {
    Found { cycle: u32 },
    NotFound,
}

impl EolPrediction {
    pub fn cycle(&self) -> Option<u32> {
        match self {
            EolPrediction::Found { cycle } => Some(*cycle),
            EolPrediction::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, EolPrediction::Found { .. })
    }
}

/// User-specified operating stress factors for the post-hoc derating step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressFactors {
    /// Charge C-rate (1.0 = 1C). Must be >= 1.
    pub fast_charge_rate: f64,
    /// Operating temperature in degrees Celsius.
    pub temperature_c: f64,
}

/// Knobs of the fitting and EOL engines.
///
/// These are explicit configuration values, not embedded literals, so callers
/// can adapt them to different capacity scales and search depths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub bounds: ParamBounds,
    /// Log-spaced steps per rate dimension in the (k1, k2) grid search.
    pub rate_grid_steps: usize,
    /// Minimum ratio `k1 / k2` between the fast and slow decay rates.
    pub rate_min_ratio: f64,
    /// Zoom-in passes around the best grid candidate.
    pub refine_passes: usize,
    /// Cap on total candidate least-squares solves per fit call.
    pub max_evaluations: usize,
    /// EOL forward-scan horizon in cycles.
    pub eol_horizon: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bounds: ParamBounds::default(),
            rate_grid_steps: 24,
            rate_min_ratio: 2.0,
            refine_passes: 3,
            max_evaluations: 20_000,
            eol_horizon: 5_000,
        }
    }
}

/// Fitted values and residual for one measured point.
#[derive(Debug, Clone)]
pub struct PointResidual {
    pub point: CyclePoint,
    pub fitted: f64,
    pub residual: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub csv_path: PathBuf,
    /// SOH fraction at which the battery is considered end-of-life.
    pub soh_threshold: f64,
    pub stress: StressFactors,
    pub engine: EngineConfig,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

/// A saved model file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub model: DegradationParams,
    pub fit_quality: FitQuality,
    /// Present when the fit fell back to the degenerate linear model.
    pub fallback_reason: Option<FallbackReason>,
    pub grid: CurveGrid,
}

/// Fitted curve evaluated over the input cycle range (plotting convenience).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub cycles: Vec<u32>,
    pub capacity: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_accept_typical_fade_params() {
        let b = ParamBounds::default();
        let ok = DegradationParams {
            a1: 0.2,
            k1: 0.01,
            a2: 0.05,
            k2: 0.001,
            baseline: 0.75,
        };
        assert!(b.contains(&ok));

        let too_steep = DegradationParams { k1: 1.5, ..ok };
        assert!(!b.contains(&too_steep));

        let negative_amp = DegradationParams { a1: -0.1, ..ok };
        assert!(!b.contains(&negative_amp));
    }

    #[test]
    fn fallback_params_are_degenerate_flat() {
        let p = DegradationParams::fallback(0.92);
        assert_eq!(p.a1, 0.0);
        assert_eq!(p.k1, 0.0);
        assert_eq!(p.a2, 0.0);
        assert_eq!(p.k2, 0.0);
        assert!((p.initial_capacity() - 0.92).abs() < 1e-15);
    }

    #[test]
    fn eol_prediction_never_reads_as_zero() {
        assert_eq!(EolPrediction::NotFound.cycle(), None);
        assert_eq!(EolPrediction::Found { cycle: 280 }.cycle(), Some(280));
    }
}
