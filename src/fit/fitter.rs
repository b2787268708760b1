//! Capacity-fade fitting with guaranteed fallback.
//!
//! Given a conditioned `(cycle, capacity)` series we fit
//!
//! `capacity(x) = a1·exp(-k1·x) + a2·exp(-k2·x) + baseline`
//!
//! under box constraints. The model is linear in `(a1, a2, baseline)` for a
//! fixed rate pair, so the bounded nonlinear solve is separable:
//!
//! - search a log-spaced `(k1, k2)` grid (seeded with the heuristic guess)
//! - solve the linear parameters per candidate by least squares
//! - reject candidates whose linear parameters leave the bounds
//! - zoom the grid around the best candidate for a few refinement passes
//!
//! Total candidate solves are capped by `EngineConfig::max_evaluations`.
//!
//! The contract is that `fit` never errors: underdetermined, degenerate, or
//! numerically hostile input falls back to an ordinary least-squares line
//! fit reported as the degenerate parameters `(0,0,0,0,intercept)`, with the
//! reason recorded for diagnostics.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{
    CycleSeries, DegradationParams, EngineConfig, FallbackReason, FitOutcome, FitQuality,
    ParamBounds,
};
use crate::fit::rate_grid::{log_space, rate_pairs};
use crate::math::linear_fit;
use crate::models::{LINEAR_PARAM_COUNT, fill_design_row, predict};

/// Minimum points required before attempting the 5-parameter model.
pub const MIN_FIT_POINTS: usize = 5;

/// Floor for the rate grid's lower edge (log spacing needs > 0).
const RATE_FLOOR: f64 = 1e-6;

/// Heuristic initial parameter guess, derived from the data itself so the
/// search starts near a physically plausible region regardless of the data's
/// absolute scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialGuess {
    pub a1: f64,
    pub k1: f64,
    pub a2: f64,
    pub k2: f64,
    pub baseline: f64,
}

/// Derive the initial guess:
///
/// - `a1 = max(capacity) - min(capacity)` (total observed fade)
/// - `a2 = 0.1 · a1`
/// - `k1 = 1e-3`, `k2 = 1e-4` (slow vs. very-slow decay)
/// - `baseline = capacity of the last sample`
///
/// Returns `None` for an empty series.
pub fn initial_guess(series: &CycleSeries) -> Option<InitialGuess> {
    let cap_max = series.capacity_max()?;
    let cap_min = series.capacity_min()?;
    let baseline = series.last_capacity()?;

    let spread = cap_max - cap_min;
    Some(InitialGuess {
        a1: spread,
        k1: 1e-3,
        a2: 0.1 * spread,
        k2: 1e-4,
        baseline,
    })
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    params: DegradationParams,
    sse: f64,
}

/// Fit the degradation model to a conditioned series.
///
/// Never panics and never errors; see the module docs for the fallback
/// contract. The series is expected to be non-empty (the conditioner rejects
/// empty tables); an empty series still yields a harmless flat fallback.
pub fn fit(series: &CycleSeries, config: &EngineConfig) -> FitOutcome {
    let x = series.cycles_f64();
    let y = series.capacities();

    if series.len() < MIN_FIT_POINTS {
        return fallback(&x, &y, FallbackReason::TooFewPoints { n: series.len() });
    }

    // With zero capacity spread the amplitude guess degenerates and the
    // exponential terms have nothing to explain.
    let spread = match (series.capacity_max(), series.capacity_min()) {
        (Some(max), Some(min)) => max - min,
        _ => 0.0,
    };
    if !(spread > 0.0) {
        return fallback(&x, &y, FallbackReason::FlatCapacity);
    }

    let bounds = config.bounds;
    let rate_lo = bounds.rate_min.max(RATE_FLOOR);
    let rate_hi = bounds.rate_max;
    if !(rate_hi.is_finite() && rate_hi > rate_lo) {
        return fallback(&x, &y, FallbackReason::NoCandidateInBounds);
    }

    let Ok(values) = log_space(rate_lo, rate_hi, config.rate_grid_steps.max(2)) else {
        return fallback(&x, &y, FallbackReason::NoCandidateInBounds);
    };
    let mut pairs = rate_pairs(&values, config.rate_min_ratio);

    // Seed the heuristic guess pair so the canonical slow/very-slow starting
    // point is always among the candidates.
    if let Some(guess) = initial_guess(series) {
        let k2 = guess.k2.clamp(rate_lo, rate_hi);
        let k1 = guess.k1.clamp(rate_lo, rate_hi).max(k2);
        if k1 > k2 {
            pairs.insert(0, (k1, k2));
        }
    }

    // Ratio between adjacent global grid values; refinement windows start at
    // one grid cell on each side and shrink by square root per pass.
    let spacing = (rate_hi / rate_lo).powf(1.0 / (config.rate_grid_steps.max(2) as f64 - 1.0));

    let mut best: Option<Candidate> = None;
    let mut evals = 0usize;
    let mut width = spacing;

    for pass in 0..=config.refine_passes {
        if pass > 0 {
            let Some(center) = &best else { break };
            let p = &center.params;
            let k1_values =
                match log_space((p.k1 / width).max(rate_lo), (p.k1 * width).min(rate_hi).max(rate_lo * (1.0 + 1e-12)), config.rate_grid_steps.max(2)) {
                    Ok(v) => v,
                    Err(_) => break,
                };
            let k2_values =
                match log_space((p.k2 / width).max(rate_lo), (p.k2 * width).min(rate_hi).max(rate_lo * (1.0 + 1e-12)), config.rate_grid_steps.max(2)) {
                    Ok(v) => v,
                    Err(_) => break,
                };
            pairs = Vec::with_capacity(k1_values.len() * k2_values.len());
            for &k2 in &k2_values {
                for &k1 in &k1_values {
                    if k1 >= k2 * config.rate_min_ratio.max(1.0) {
                        pairs.push((k1, k2));
                    }
                }
            }
            width = width.sqrt();
        }

        let remaining = config.max_evaluations.saturating_sub(evals);
        if remaining == 0 || pairs.is_empty() {
            break;
        }
        pairs.truncate(remaining);
        evals += pairs.len();

        let candidates: Vec<Candidate> = pairs
            .par_iter()
            .enumerate()
            .filter_map(|(idx, &(k1, k2))| {
                evaluate_candidate(k1, k2, &x, &y, &bounds)
                    .map(|(params, sse)| Candidate { idx, params, sse })
            })
            .collect();

        // Deterministic selection: minimum SSE, ties broken by grid index.
        let pass_best = candidates.into_iter().reduce(|a, b| {
            if b.sse < a.sse || (b.sse == a.sse && b.idx < a.idx) {
                b
            } else {
                a
            }
        });

        match (pass_best, &best) {
            (Some(c), Some(b)) if c.sse < b.sse => best = Some(c),
            (Some(c), None) => best = Some(c),
            _ => {}
        }

        if pass == 0 && best.is_none() {
            // Nothing on the global grid satisfied the bounds; refinement has
            // no center to zoom on.
            return fallback(&x, &y, FallbackReason::NoCandidateInBounds);
        }
    }

    match best {
        Some(c) if c.sse.is_finite() => FitOutcome::Converged {
            params: c.params,
            quality: quality_of(&c.params, &x, &y),
        },
        _ => fallback(&x, &y, FallbackReason::NonFiniteSolve),
    }
}

fn evaluate_candidate(
    k1: f64,
    k2: f64,
    x: &[f64],
    y: &[f64],
    bounds: &ParamBounds,
) -> Option<(DegradationParams, f64)> {
    let n = x.len();
    let mut design = DMatrix::<f64>::zeros(n, LINEAR_PARAM_COUNT);
    let mut row = [0.0; LINEAR_PARAM_COUNT];
    for i in 0..n {
        fill_design_row(k1, k2, x[i], &mut row);
        for (j, &v) in row.iter().enumerate() {
            design[(i, j)] = v;
        }
    }
    let rhs = DVector::from_row_slice(y);

    let beta = crate::math::solve_least_squares(&design, &rhs)?;
    let params = DegradationParams {
        a1: beta[0],
        k1,
        a2: beta[1],
        k2,
        baseline: beta[2],
    };

    if !bounds.contains(&params) {
        return None;
    }

    let mut sse = 0.0;
    for i in 0..n {
        let r = y[i] - predict(&params, x[i]);
        sse += r * r;
    }

    if sse.is_finite() { Some((params, sse)) } else { None }
}

/// Ordinary least-squares line fit, reported as the degenerate flat model.
fn fallback(x: &[f64], y: &[f64], reason: FallbackReason) -> FitOutcome {
    let intercept = match linear_fit(x, y) {
        Some((_slope, intercept)) if intercept.is_finite() => intercept,
        // Last resort for pathological input: mean capacity, or 0 when empty.
        _ => {
            if y.is_empty() {
                0.0
            } else {
                y.iter().sum::<f64>() / y.len() as f64
            }
        }
    };

    let params = DegradationParams::fallback(intercept);
    FitOutcome::Fallback {
        params,
        reason,
        quality: quality_of(&params, x, y),
    }
}

fn quality_of(params: &DegradationParams, x: &[f64], y: &[f64]) -> FitQuality {
    let n = x.len();
    if n == 0 {
        return FitQuality {
            sse: 0.0,
            rmse: 0.0,
            n: 0,
        };
    }
    let mut sse = 0.0;
    for i in 0..n {
        let r = y[i] - predict(params, x[i]);
        sse += r * r;
    }
    FitQuality {
        sse,
        rmse: (sse / n as f64).sqrt(),
        n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CyclePoint;

    fn series_from(params: &DegradationParams, cycles: impl Iterator<Item = u32>) -> CycleSeries {
        CycleSeries::new(
            cycles
                .map(|c| CyclePoint {
                    cycle: c,
                    capacity: predict(params, f64::from(c)),
                })
                .collect(),
        )
    }

    fn reference_params() -> DegradationParams {
        DegradationParams {
            a1: 0.2,
            k1: 0.01,
            a2: 0.05,
            k2: 0.001,
            baseline: 0.75,
        }
    }

    #[test]
    fn initial_guess_follows_data() {
        let series = CycleSeries::new(vec![
            CyclePoint { cycle: 0, capacity: 1.0 },
            CyclePoint { cycle: 100, capacity: 0.95 },
            CyclePoint { cycle: 200, capacity: 0.9 },
        ]);
        let g = initial_guess(&series).unwrap();
        assert!((g.a1 - 0.1).abs() < 1e-12);
        assert!((g.a2 - 0.01).abs() < 1e-12);
        assert!((g.k1 - 1e-3).abs() < 1e-15);
        assert!((g.k2 - 1e-4).abs() < 1e-15);
        assert!((g.baseline - 0.9).abs() < 1e-12);
    }

    #[test]
    fn fit_recovers_noiseless_double_exponential() {
        let truth = reference_params();
        let series = series_from(&truth, (0..60).map(|i| i * 10));

        let outcome = fit(&series, &EngineConfig::default());
        assert!(!outcome.is_fallback(), "expected converged fit");

        let q = outcome.quality();
        assert!(q.sse < 1e-3, "sse too large: {}", q.sse);
        assert!(EngineConfig::default().bounds.contains(outcome.params()));
    }

    #[test]
    fn fit_tolerates_small_noise() {
        use rand::prelude::*;
        use rand::rngs::StdRng;
        use rand_distr::Normal;

        let truth = reference_params();
        let mut rng = StdRng::seed_from_u64(7);
        let normal = Normal::new(0.0, 0.002).unwrap();

        let points: Vec<CyclePoint> = (0..80)
            .map(|i| {
                let cycle = i * 10;
                CyclePoint {
                    cycle,
                    capacity: predict(&truth, f64::from(cycle)) + normal.sample(&mut rng),
                }
            })
            .collect();
        let series = CycleSeries::new(points);

        let outcome = fit(&series, &EngineConfig::default());
        assert!(!outcome.is_fallback());
        assert!(outcome.quality().rmse < 0.01);
        assert!(EngineConfig::default().bounds.contains(outcome.params()));
    }

    #[test]
    fn constant_capacity_falls_back_to_intercept() {
        let points: Vec<CyclePoint> = (0..20)
            .map(|i| CyclePoint {
                cycle: i * 5,
                capacity: 0.9,
            })
            .collect();
        let series = CycleSeries::new(points);

        let outcome = fit(&series, &EngineConfig::default());
        assert_eq!(outcome.fallback_reason(), Some(FallbackReason::FlatCapacity));

        let p = outcome.params();
        assert_eq!((p.a1, p.k1, p.a2, p.k2), (0.0, 0.0, 0.0, 0.0));
        assert!((p.baseline - 0.9).abs() < 1e-9);
    }

    #[test]
    fn too_few_points_falls_back() {
        let series = CycleSeries::new(vec![
            CyclePoint { cycle: 0, capacity: 1.0 },
            CyclePoint { cycle: 50, capacity: 0.97 },
            CyclePoint { cycle: 100, capacity: 0.94 },
        ]);

        let outcome = fit(&series, &EngineConfig::default());
        assert_eq!(
            outcome.fallback_reason(),
            Some(FallbackReason::TooFewPoints { n: 3 })
        );

        // Intercept of the least-squares line through the three points.
        let p = outcome.params();
        assert!((p.baseline - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fallback_never_panics_on_degenerate_input() {
        let empty = CycleSeries::default();
        let outcome = fit(&empty, &EngineConfig::default());
        assert!(outcome.is_fallback());

        let single = CycleSeries::new(vec![CyclePoint { cycle: 3, capacity: 4.0 }]);
        let outcome = fit(&single, &EngineConfig::default());
        assert_eq!(
            outcome.fallback_reason(),
            Some(FallbackReason::TooFewPoints { n: 1 })
        );
        assert!((outcome.params().baseline - 4.0).abs() < 1e-12);
    }

    #[test]
    fn evaluation_budget_is_respected() {
        // A budget of 1 leaves room for at most one candidate; the fit must
        // still terminate and return something usable.
        let truth = reference_params();
        let series = series_from(&truth, (0..40).map(|i| i * 25));

        let config = EngineConfig {
            max_evaluations: 1,
            ..EngineConfig::default()
        };
        let outcome = fit(&series, &config);
        assert!(outcome.quality().sse.is_finite());
    }
}
