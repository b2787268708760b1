//! Model evaluation for the double-exponential capacity fade curve.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given cycle and rate pair (for OLS over the
//!   linear parameters `a1`, `a2`, `baseline`)
//! - predict `capacity(x)` given full parameters (for residuals/plots/EOL)

use crate::domain::DegradationParams;

/// Number of linear parameters solved per rate candidate.
pub const LINEAR_PARAM_COUNT: usize = 3;

/// Fill a design row `[exp(-k1·x), exp(-k2·x), 1]` for cycle `x`.
///
/// # Panics
/// Panics if `out` does not have length [`LINEAR_PARAM_COUNT`]. Callers should
/// size the array correctly.
pub fn fill_design_row(k1: f64, k2: f64, x: f64, out: &mut [f64]) {
    out[0] = (-k1 * x).exp();
    out[1] = (-k2 * x).exp();
    out[2] = 1.0;
}

/// Predict modeled capacity at cycle `x`.
pub fn predict(params: &DegradationParams, x: f64) -> f64 {
    params.a1 * (-params.k1 * x).exp() + params.a2 * (-params.k2 * x).exp() + params.baseline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_at_zero_equals_initial_capacity() {
        let p = DegradationParams {
            a1: 0.2,
            k1: 0.01,
            a2: 0.05,
            k2: 0.001,
            baseline: 0.75,
        };
        assert!((predict(&p, 0.0) - p.initial_capacity()).abs() < 1e-15);
        assert!((predict(&p, 0.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn predict_decays_toward_baseline() {
        let p = DegradationParams {
            a1: 0.2,
            k1: 0.01,
            a2: 0.05,
            k2: 0.001,
            baseline: 0.75,
        };
        let early = predict(&p, 10.0);
        let late = predict(&p, 4000.0);
        assert!(early > late);
        assert!((late - p.baseline).abs() < 0.01);
    }

    #[test]
    fn design_row_matches_prediction() {
        let p = DegradationParams {
            a1: 1.5,
            k1: 0.02,
            a2: 0.3,
            k2: 0.002,
            baseline: 0.5,
        };
        let x = 123.0;
        let mut row = [0.0; LINEAR_PARAM_COUNT];
        fill_design_row(p.k1, p.k2, x, &mut row);

        let via_row = p.a1 * row[0] + p.a2 * row[1] + p.baseline * row[2];
        assert!((via_row - predict(&p, x)).abs() < 1e-12);
    }
}
