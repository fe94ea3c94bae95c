//! Ordinary least squares for straight-line trends.
//!
//! The forecaster fits `y ≈ slope * x + intercept` over a handful of yearly
//! points. We build the two-column design matrix `[1, x - x̄]` and solve it with
//! SVD:
//! - centring `x` keeps calendar years (≈2000) from producing a badly
//!   conditioned matrix
//! - SVD handles the tall (rows > columns) system directly
//!   (nalgebra's `QR::solve` is intended for square systems)

use nalgebra::{DMatrix, DVector};

/// A fitted straight line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit a degree-1 polynomial through `(x, y)` pairs.
///
/// Needs at least two distinct `x` values; returns `None` otherwise.
pub fn fit_line(points: &[(f64, f64)]) -> Option<LineFit> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len();
    let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
    if points.iter().all(|(x, _)| (x - x_mean).abs() < f64::EPSILON) {
        return None;
    }

    let design = DMatrix::from_fn(n, 2, |row, col| match col {
        0 => 1.0,
        _ => points[row].0 - x_mean,
    });
    let y = DVector::from_iterator(n, points.iter().map(|(_, y)| *y));

    let beta = solve_least_squares(&design, &y)?;
    let slope = beta[1];
    let intercept = beta[0] - slope * x_mean;
    Some(LineFit { slope, intercept })
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
    fn fit_line_recovers_exact_trend_on_calendar_years() {
        let fit = fit_line(&[(2016.0, 10.0), (2017.0, 20.0), (2018.0, 30.0)]).unwrap();
        assert!((fit.slope - 10.0).abs() < 1e-9);
        assert!((fit.eval(2019.0) - 40.0).abs() < 1e-6);
    }

    #[test]
    fn fit_line_matches_closed_form_on_noisy_points() {
        // Closed form for x = [0, 1, 2, 3], y = [1, 3, 2, 5]: slope 1.1, intercept 1.1.
        let fit = fit_line(&[(0.0, 1.0), (1.0, 3.0), (2.0, 2.0), (3.0, 5.0)]).unwrap();
        assert!((fit.slope - 1.1).abs() < 1e-9);
        assert!((fit.intercept - 1.1).abs() < 1e-9);
    }

    #[test]
    fn fit_line_needs_two_distinct_x() {
        assert!(fit_line(&[(2018.0, 5.0)]).is_none());
        assert!(fit_line(&[(2018.0, 5.0), (2018.0, 7.0)]).is_none());
    }
}
