//! Gap filling for numeric columns.
//!
//! Interior gaps are filled with a third-degree interpolating spline through
//! every known value (not-a-knot end conditions, so a cubic polynomial is
//! reproduced exactly). Columns with two or three known values fall back to
//! linear interpolation. Leading and trailing gaps are left missing.

use crate::error::{ForecastError, Result};

/// Minimum number of known points for the cubic spline.
pub const CUBIC_MIN_POINTS: usize = 4;

/// Interpolating cubic spline with not-a-knot end conditions.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit through `(x, y)`; `x` must be strictly increasing with at least four points.
    pub fn not_a_knot(x: &[f64], y: &[f64]) -> Result<Self> {
        let n = x.len();
        if n != y.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "x and y lengths differ: {} vs {}",
                n,
                y.len()
            )));
        }
        if n < CUBIC_MIN_POINTS {
            return Err(ForecastError::InsufficientData {
                needed: CUBIC_MIN_POINTS,
                got: n,
            });
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::InvalidParameter(
                "spline knots must be strictly increasing".to_string(),
            ));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let slope = |i: usize| (y[i + 1] - y[i]) / h[i];

        // Unknowns are m[1..n-1]; m[0] and m[n-1] are eliminated through
        // the third-derivative continuity at x[1] and x[n-2].
        let size = n - 2;
        let mut sub = vec![0.0; size];
        let mut diag = vec![0.0; size];
        let mut sup = vec![0.0; size];
        let mut rhs = vec![0.0; size];

        for r in 0..size {
            let i = r + 1;
            sub[r] = h[i - 1];
            diag[r] = 2.0 * (h[i - 1] + h[i]);
            sup[r] = h[i];
            rhs[r] = 6.0 * (slope(i) - slope(i - 1));
        }

        let (h0, h1) = (h[0], h[1]);
        diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
        sup[0] = (h1 * h1 - h0 * h0) / h1;

        let (p, q) = (h[n - 3], h[n - 2]);
        sub[size - 1] = (p * p - q * q) / p;
        diag[size - 1] = (p + q) * (2.0 * p + q) / p;

        let inner = solve_tridiagonal(&sub, &diag, &sup, &rhs)?;

        let mut m = Vec::with_capacity(n);
        m.push(((h0 + h1) * inner[0] - h0 * inner[1]) / h1);
        m.extend_from_slice(&inner);
        m.push(((p + q) * inner[size - 1] - q * inner[size - 2]) / p);

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    /// Evaluate inside `[x[0], x[n-1]]`; `None` outside.
    pub fn evaluate(&self, t: f64) -> Option<f64> {
        let n = self.x.len();
        if t < self.x[0] || t > self.x[n - 1] {
            return None;
        }
        let k = match self.x.binary_search_by(|knot| knot.total_cmp(&t)) {
            Ok(i) => return Some(self.y[i]),
            Err(i) => i - 1,
        };

        let h = self.x[k + 1] - self.x[k];
        let a = self.x[k + 1] - t;
        let b = t - self.x[k];
        Some(
            self.m[k] * a.powi(3) / (6.0 * h)
                + self.m[k + 1] * b.powi(3) / (6.0 * h)
                + (self.y[k] / h - self.m[k] * h / 6.0) * a
                + (self.y[k + 1] / h - self.m[k + 1] * h / 6.0) * b,
        )
    }
}

/// Thomas algorithm; `sub[0]` and `sup[n-1]` are ignored.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Result<Vec<f64>> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    let mut denom = diag[0];
    if denom == 0.0 {
        return Err(ForecastError::InvalidParameter(
            "singular spline system".to_string(),
        ));
    }
    c[0] = sup[0] / denom;
    d[0] = rhs[0] / denom;
    for i in 1..n {
        denom = diag[i] - sub[i] * c[i - 1];
        if denom == 0.0 {
            return Err(ForecastError::InvalidParameter(
                "singular spline system".to_string(),
            ));
        }
        c[i] = sup[i] / denom;
        d[i] = (rhs[i] - sub[i] * d[i - 1]) / denom;
    }

    let mut out = vec![0.0; n];
    out[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        out[i] = d[i] - c[i] * out[i + 1];
    }
    Ok(out)
}

/// Fill interior gaps of an evenly spaced series.
///
/// Positions are the x coordinates. Known values are never changed; only
/// `None` cells are filled. Non-finite values are kept as they are but do not
/// serve as knots.
pub fn fill_gaps(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let known: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i as f64, x)))
        .collect();

    let first = known.first().map(|&(x, _)| x as usize);
    let last = known.last().map(|&(x, _)| x as usize);
    let (first, last) = match (first, last) {
        (Some(f), Some(l)) if l > f => (f, l),
        _ => return values.to_vec(),
    };
    if values[first..=last].iter().all(Option::is_some) {
        return values.to_vec();
    }

    if known.len() >= CUBIC_MIN_POINTS {
        let (x, y): (Vec<f64>, Vec<f64>) = known.iter().copied().unzip();
        if let Ok(spline) = CubicSpline::not_a_knot(&x, &y) {
            return values
                .iter()
                .enumerate()
                .map(|(i, v)| match v {
                    Some(x) => Some(*x),
                    None if i > first && i < last => spline.evaluate(i as f64),
                    None => None,
                })
                .collect();
        }
    }

    fill_linear(values, &known)
}

/// Linear interpolation of `None` cells between the surrounding knots.
fn fill_linear(values: &[Option<f64>], knots: &[(f64, f64)]) -> Vec<Option<f64>> {
    let mut result = values.to_vec();
    for pair in knots.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let (lo, hi) = (x0 as usize, x1 as usize);
        for (idx, cell) in result.iter_mut().enumerate().take(hi).skip(lo + 1) {
            if cell.is_none() {
                let t = (idx as f64 - x0) / (x1 - x0);
                *cell = Some(y0 + t * (y1 - y0));
            }
        }
    }
    result
}
