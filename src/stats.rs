//! Numeric kernel shared by the generator, the estimators and the query
//! handlers.
//!
//! Every summary statistic skips `NaN` cells. Degenerate inputs (empty,
//! constant) produce `NaN`; callers that must not surface `NaN` pass the
//! value through [`or_zero`].

use statrs::statistics::Statistics;

/// Mean of the non-`NaN` values; `NaN` when there are none.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    values.iter().filter(|v| !v.is_nan()).mean()
}

/// Sample standard deviation of the non-`NaN` values; `NaN` below two values.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    values.iter().filter(|v| !v.is_nan()).std_dev()
}

/// Pearson correlation over rows where both values are finite.
///
/// `NaN` when fewer than two such rows exist or either side is constant.
#[must_use]
pub fn correlation(xs: &[f64], ys: &[f64]) -> f64 {
    let (x, y): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();
    if x.len() < 2 {
        return f64::NAN;
    }

    let mx = x.iter().mean();
    let my = y.iter().mean();
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(&y) {
        let (da, db) = (a - mx, b - my);
        sxy += da * db;
        sxx += da * da;
        syy += db * db;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Maps a non-finite value to zero.
#[must_use]
pub fn or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
#[must_use]
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Logistic link.
#[must_use]
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

const PIVOT_EPS: f64 = 1e-10;

/// Ordinary least squares with an intercept.
///
/// `regressors` are column vectors of equal length to `y`. Rows with a
/// non-finite value anywhere are dropped. Returns `[intercept, b_1, ..]`,
/// or `None` when the design is rank deficient or has too few rows.
#[must_use]
pub fn least_squares(regressors: &[&[f64]], y: &[f64]) -> Option<Vec<f64>> {
    let rows = complete_rows(regressors, y);
    let p = regressors.len() + 1;
    if rows.len() < p {
        return None;
    }

    // Normal equations X'X b = X'y.
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    let mut row = vec![0.0; p];
    for &r in &rows {
        design_row(regressors, r, &mut row);
        for i in 0..p {
            xty[i] += row[i] * y[r];
            for j in 0..p {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    solve(xtx, xty)
}

/// Logistic regression with an intercept, fitted by Newton-Raphson.
///
/// A small ridge term keeps the Hessian invertible under separation.
/// Returns `[intercept, b_1, ..]` or `None` if the fit diverges.
#[must_use]
pub fn logistic_regression(regressors: &[&[f64]], y: &[f64]) -> Option<Vec<f64>> {
    const MAX_ITER: usize = 50;
    const TOLERANCE: f64 = 1e-8;
    const RIDGE: f64 = 1e-6;

    let rows = complete_rows(regressors, y);
    let p = regressors.len() + 1;
    if rows.is_empty() {
        return None;
    }

    let mut beta = vec![0.0; p];
    let mut row = vec![0.0; p];
    for _ in 0..MAX_ITER {
        let mut grad = vec![0.0; p];
        let mut hess = vec![vec![0.0; p]; p];
        for &r in &rows {
            design_row(regressors, r, &mut row);
            let z: f64 = row.iter().zip(&beta).map(|(x, b)| x * b).sum();
            let mu = sigmoid(z);
            let w = (mu * (1.0 - mu)).max(1e-12);
            for i in 0..p {
                grad[i] += row[i] * (y[r] - mu);
                for j in 0..p {
                    hess[i][j] += w * row[i] * row[j];
                }
            }
        }
        for i in 0..p {
            grad[i] -= RIDGE * beta[i];
            hess[i][i] += RIDGE;
        }

        let step = solve(hess, grad)?;
        let mut change = 0.0_f64;
        for (b, s) in beta.iter_mut().zip(&step) {
            *b += s;
            change = change.max(s.abs());
        }
        if beta.iter().any(|b| !b.is_finite()) {
            return None;
        }
        if change < TOLERANCE {
            break;
        }
    }
    Some(beta)
}

/// Linear predictor of a fitted model for one row.
#[must_use]
pub fn linear_predictor(coefficients: &[f64], regressors: &[&[f64]], row: usize) -> f64 {
    coefficients[0]
        + coefficients[1..]
            .iter()
            .zip(regressors)
            .map(|(b, col)| b * col[row])
            .sum::<f64>()
}

fn complete_rows(regressors: &[&[f64]], y: &[f64]) -> Vec<usize> {
    (0..y.len())
        .filter(|&r| y[r].is_finite() && regressors.iter().all(|col| col[r].is_finite()))
        .collect()
}

fn design_row(regressors: &[&[f64]], r: usize, row: &mut [f64]) {
    row[0] = 1.0;
    for (slot, col) in row[1..].iter_mut().zip(regressors) {
        *slot = col[r];
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flat_map(|r| r.iter())
        .fold(0.0_f64, |m, v| m.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < PIVOT_EPS * scale {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for r in (col + 1)..n {
            let factor = a[r][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a[r][c] -= factor * a[col][c];
            }
            b[r] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for r in (0..n).rev() {
        let tail: f64 = ((r + 1)..n).map(|c| a[r][c] * x[c]).sum();
        x[r] = (b[r] - tail) / a[r][r];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std_skip_nan() {
        let v = [1.0, f64::NAN, 3.0];
        assert!((mean(&v) - 2.0).abs() < 1e-12);
        assert!((std_dev(&v) - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!(mean(&[]).is_nan());
        assert!(std_dev(&[1.0]).is_nan());
    }

    #[test]
    fn test_correlation_basic_and_degenerate() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((correlation(&x, &y) - 1.0).abs() < 1e-12);

        let neg = [4.0, 3.0, 2.0, 1.0];
        assert!((correlation(&x, &neg) + 1.0).abs() < 1e-12);

        assert!(correlation(&x, &[5.0; 4]).is_nan());
        assert!(correlation(&[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_or_zero() {
        assert_eq!(or_zero(f64::NAN), 0.0);
        assert_eq!(or_zero(f64::INFINITY), 0.0);
        assert_eq!(or_zero(-1.5), -1.5);
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.5, 3.0, 6), vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0]);
        assert_eq!(linspace(0.5, 3.0, 1), vec![0.5]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_least_squares_exact_fit() {
        let x1 = [0.0, 1.0, 2.0, 3.0, 4.0];
        let x2 = [1.0, 0.0, 1.0, 0.0, 2.0];
        let y: Vec<f64> = x1
            .iter()
            .zip(&x2)
            .map(|(a, b)| 1.0 + 2.0 * a - 3.0 * b)
            .collect();
        let beta = least_squares(&[&x1, &x2], &y).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-9);
        assert!((beta[1] - 2.0).abs() < 1e-9);
        assert!((beta[2] + 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_least_squares_singular() {
        let x = [1.0, 2.0, 3.0];
        let dup = [2.0, 4.0, 6.0];
        assert!(least_squares(&[&x, &dup], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_least_squares_drops_nan_rows() {
        let x = [0.0, 1.0, f64::NAN, 2.0];
        let y = [1.0, 3.0, 100.0, 5.0];
        let beta = least_squares(&[&x], &y).unwrap();
        assert!((beta[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_logistic_regression_direction() {
        let x: Vec<f64> = (0..40).map(|i| f64::from(i) / 10.0 - 2.0).collect();
        // Noisy threshold so the data is not perfectly separable.
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| if (*v > 0.0) ^ (i % 7 == 0) { 1.0 } else { 0.0 })
            .collect();
        let beta = logistic_regression(&[&x], &y).unwrap();
        assert!(beta[1] > 0.0);
        let p_low = sigmoid(linear_predictor(&beta, &[&x], 0));
        let p_high = sigmoid(linear_predictor(&beta, &[&x], 39));
        assert!(p_low < 0.5 && p_high > 0.5);
    }
}
