//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - measured points: `o`
//! - fitted curve: `-` line
//! - EOL crossing (when found and inside the cycle range): `|` column of `:`

use crate::domain::{CurveFile, DegradationParams, EolPrediction, PointResidual};
use crate::models::predict;

/// Render a plot for an in-memory fit result.
pub fn render_ascii_plot(
    residuals: &[PointResidual],
    params: &DegradationParams,
    eol: &EolPrediction,
    width: usize,
    height: usize,
) -> String {
    let (c_min, c_max) = cycle_range_from_residuals(residuals).unwrap_or((0.0, 1000.0));
    let curve = sample_curve(params, c_min, c_max, width.max(2));
    render_plot(residuals, &curve, c_min, c_max, width, height, eol.cycle())
}

/// Render a plot from a saved model JSON file (curve only, no overlay points).
pub fn render_ascii_plot_from_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let (c_min, c_max) = curve_cycle_range(curve).unwrap_or((0.0, 1000.0));
    let curve_points: Vec<(f64, f64)> = curve
        .grid
        .cycles
        .iter()
        .zip(curve.grid.capacity.iter())
        .map(|(&c, &y)| (f64::from(c), y))
        .collect();

    render_plot(&[], &curve_points, c_min, c_max, width, height, None)
}

fn render_plot(
    residuals: &[PointResidual],
    curve_points: &[(f64, f64)],
    c_min: f64,
    c_max: f64,
    width: usize,
    height: usize,
    eol_cycle: Option<u32>,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = y_range(residuals, curve_points).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // EOL marker first, then the curve, then points on top.
    if let Some(eol) = eol_cycle {
        let eol = f64::from(eol);
        if eol >= c_min && eol <= c_max {
            let x = map_x(eol, c_min, c_max, width);
            for row in grid.iter_mut() {
                row[x] = ':';
            }
        }
    }

    draw_curve(&mut grid, curve_points, c_min, c_max, y_min, y_max);

    for r in residuals {
        let x = map_x(f64::from(r.point.cycle), c_min, c_max, width);
        let y = map_y(r.point.capacity, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: cycle=[{c_min:.0}, {c_max:.0}] | capacity=[{y_min:.4}, {y_max:.4}]"
    ));
    if let Some(eol) = eol_cycle {
        out.push_str(&format!(" | EOL at cycle {eol} (:)"));
    }
    out.push('\n');

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn sample_curve(params: &DegradationParams, c_min: f64, c_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let c = c_min + u * (c_max - c_min);
            (c, predict(params, c))
        })
        .collect()
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    c_min: f64,
    c_max: f64,
    y_min: f64,
    y_max: f64,
) {
    let height = grid.len();
    let width = grid.first().map_or(0, Vec::len);
    if width == 0 {
        return;
    }

    for &(c, y) in curve {
        if !(c.is_finite() && y.is_finite()) {
            continue;
        }
        if y < y_min || y > y_max {
            continue;
        }
        let x = map_x(c, c_min, c_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][x] = '-';
    }
}

fn cycle_range_from_residuals(residuals: &[PointResidual]) -> Option<(f64, f64)> {
    let mut min_c = f64::INFINITY;
    let mut max_c = f64::NEG_INFINITY;
    for r in residuals {
        let c = f64::from(r.point.cycle);
        min_c = min_c.min(c);
        max_c = max_c.max(c);
    }
    if min_c.is_finite() && max_c.is_finite() && max_c > min_c {
        Some((min_c, max_c))
    } else {
        None
    }
}

fn curve_cycle_range(curve: &CurveFile) -> Option<(f64, f64)> {
    let first = curve.grid.cycles.first().copied()?;
    let last = curve.grid.cycles.last().copied()?;
    if last > first {
        Some((f64::from(first), f64::from(last)))
    } else {
        None
    }
}

fn y_range(residuals: &[PointResidual], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for r in residuals {
        y_min = y_min.min(r.point.capacity);
        y_max = y_max.max(r.point.capacity);
    }
    for &(_, y) in curve {
        if y.is_finite() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }

    if y_min.is_finite() && y_max.is_finite() && y_max >= y_min {
        Some((y_min, y_max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs().max(1e-9);
    (min - span * frac, max + span * frac)
}

fn map_x(c: f64, c_min: f64, c_max: f64, width: usize) -> usize {
    let u = ((c - c_min) / (c_max - c_min)).clamp(0.0, 1.0);
    ((u * (width as f64 - 1.0)).round() as usize).min(width - 1)
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top of the grid.
    let row = ((1.0 - u) * (height as f64 - 1.0)).round() as usize;
    row.min(height - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CyclePoint;

    #[test]
    fn plot_is_deterministic_and_well_formed() {
        let params = DegradationParams {
            a1: 0.2,
            k1: 0.01,
            a2: 0.05,
            k2: 0.001,
            baseline: 0.75,
        };
        let residuals: Vec<PointResidual> = (0..10)
            .map(|i| {
                let cycle = i * 50;
                let fitted = predict(&params, f64::from(cycle));
                PointResidual {
                    point: CyclePoint {
                        cycle,
                        capacity: fitted,
                    },
                    fitted,
                    residual: 0.0,
                }
            })
            .collect();

        let a = render_ascii_plot(&residuals, &params, &EolPrediction::Found { cycle: 280 }, 60, 15);
        let b = render_ascii_plot(&residuals, &params, &EolPrediction::Found { cycle: 280 }, 60, 15);
        assert_eq!(a, b);

        // Header + `height` grid rows.
        assert_eq!(a.lines().count(), 16);
        assert!(a.contains("EOL at cycle 280"));
        assert!(a.contains('o'));
        assert!(a.contains(':'));
    }
}
