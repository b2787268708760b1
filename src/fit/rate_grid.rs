//! Decay-rate grid generation.
//!
//! The double-exponential model is fitted by a deterministic grid search over
//! the nonlinear rate pair `(k1, k2)`, with the linear parameters solved
//! exactly per candidate.
//!
//! Why grid search?
//! - It avoids the local-minima issues common in nonlinear optimization of
//!   sums of exponentials.
//! - It is deterministic given the same inputs/flags.
//! - With two nonlinear parameters, a modest grid plus zoom passes is fast
//!   enough for interactive use.

use crate::error::AppError;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::contract(format!(
            "Invalid rate range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::contract("Rate grid steps must be >= 2."));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_min + step * i as f64).exp());
    }
    Ok(out)
}

/// Build `(k1, k2)` candidate pairs with `k1 >= min_ratio * k2`.
///
/// `k1` is the fast (initial transient) rate and `k2` the slow (long-term)
/// rate; the ratio constraint keeps the two phases separated so the
/// exponential columns stay distinguishable.
pub fn rate_pairs(values: &[f64], min_ratio: f64) -> Vec<(f64, f64)> {
    let min_ratio = min_ratio.max(1.0);
    let mut out = Vec::new();
    for i in 0..values.len() {
        for j in (i + 1)..values.len() {
            if values[j] >= values[i] * min_ratio {
                out.push((values[j], values[i]));
            }
        }
    }
    out
}

/// Log-spaced `(k1, k2)` grid over `[min, max]`.
pub fn rate_grid(
    min: f64,
    max: f64,
    steps: usize,
    min_ratio: f64,
) -> Result<Vec<(f64, f64)>, AppError> {
    let values = log_space(min, max, steps)?;
    Ok(rate_pairs(&values, min_ratio))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_space_includes_endpoints() {
        let v = log_space(1e-5, 1.0, 6).unwrap();
        assert!((v[0] - 1e-5).abs() < 1e-17);
        assert!((v[v.len() - 1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn log_space_rejects_non_positive_range() {
        assert!(log_space(0.0, 1.0, 5).is_err());
        assert!(log_space(1.0, 0.5, 5).is_err());
        assert!(log_space(0.1, 1.0, 1).is_err());
    }

    #[test]
    fn rate_pairs_keep_fast_above_slow() {
        let grid = rate_grid(1e-5, 1.0, 10, 2.0).unwrap();
        assert!(!grid.is_empty());
        for (k1, k2) in grid {
            assert!(k1 >= 2.0 * k2, "k1={k1} should be >= 2*k2={k2}");
        }
    }
}
