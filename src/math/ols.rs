//! Least squares solvers.
//!
//! The degradation model is linear in `(a1, a2, baseline)` once the decay
//! rates `(k1, k2)` are fixed, so the fit repeatedly solves small linear
//! regression problems of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - We use SVD to solve the least-squares problem robustly even when the
//!   design matrix is tall (more rows than columns). (Nalgebra's `QR::solve`
//!   is intended for square systems and will panic for non-square matrices.)
//! - Exponential columns become nearly collinear when `k1 ≈ k2` or both rates
//!   are tiny, so we retry with progressively looser singular-value
//!   tolerances before giving up.
//! - The parameter dimension is tiny (2–3 columns), so SVD cost is negligible
//!   next to the rate grid search.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Ordinary least-squares line fit `y ≈ slope·x + intercept`.
///
/// This is the fallback model used when the nonlinear fit is abandoned.
/// Returns `None` only when the inputs are empty, mismatched, or non-finite.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    // A single observation determines only the intercept.
    if x.len() == 1 {
        return Some((0.0, y[0]));
    }

    let n = x.len();
    let mut design = DMatrix::<f64>::zeros(n, 2);
    for i in 0..n {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = x[i];
    }
    let rhs = DVector::from_row_slice(y);

    let beta = solve_least_squares(&design, &rhs)?;
    Some((beta[1], beta[0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn linear_fit_recovers_slope_and_intercept() {
        let x = [0.0, 10.0, 20.0, 30.0];
        let y: Vec<f64> = x.iter().map(|&v| 1.0 - 0.002 * v).collect();

        let (slope, intercept) = linear_fit(&x, &y).unwrap();
        assert!((slope + 0.002).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_fit_constant_series_has_zero_slope() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.9, 0.9, 0.9, 0.9];

        let (slope, intercept) = linear_fit(&x, &y).unwrap();
        assert!(slope.abs() < 1e-12);
        assert!((intercept - 0.9).abs() < 1e-12);
    }
}
