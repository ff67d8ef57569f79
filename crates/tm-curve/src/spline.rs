//! Cubic smoothing splines (Reinsch).
//!
//! For knots `t` and data `y` the fitted spline `g` minimizes
//! `integral g''(t)^2 dt` subject to `sum (g(t_i) - y_i)^2 <= s`.
//! Internally this is the penalized problem
//! `(R + lambda Q^T Q) gamma = Q^T y`, `g = y - lambda Q gamma`, where
//! `gamma` are the second derivatives at interior knots (zero at both ends,
//! i.e. natural boundary conditions). `lambda` is searched so that the
//! residual sum of squares matches `s`.

use tm_core::Error;
use tracing::trace;

/// Minimum number of knots for a cubic fit.
pub const MIN_SPLINE_POINTS: usize = 4;

const MAX_BRACKET_STEPS: usize = 64;
const MAX_BISECT_STEPS: usize = 200;
/// Relative tolerance on the residual target.
const RESIDUAL_TOL: f64 = 1e-3;

/// A fitted natural cubic spline in value/second-derivative form.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    second: Vec<f64>,
    residual: f64,
}

impl SmoothingSpline {
    /// Fits `y(t)`; `s == 0` interpolates every point.
    pub fn fit(t: &[f64], y: &[f64], s: f64) -> Result<Self, Error> {
        let mut fits = fit_joint(t, &[y], s)?;
        Ok(fits.remove(0))
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Fitted values at the knots.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Residual sum of squares against the data.
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// Value at `x`. Outside the knot range the spline continues linearly.
    pub fn eval(&self, x: f64) -> f64 {
        let t = &self.knots;
        let g = &self.values;
        let c = &self.second;
        let n = t.len();

        if x < t[0] {
            let h = t[1] - t[0];
            let slope = (g[1] - g[0]) / h - h * c[1] / 6.0;
            return g[0] + slope * (x - t[0]);
        }
        if x > t[n - 1] {
            let h = t[n - 1] - t[n - 2];
            let slope = (g[n - 1] - g[n - 2]) / h + h * c[n - 2] / 6.0;
            return g[n - 1] + slope * (x - t[n - 1]);
        }

        let j = t.partition_point(|&k| k <= x).clamp(1, n - 1) - 1;
        let h = t[j + 1] - t[j];
        let a = x - t[j];
        let b = t[j + 1] - x;
        (a * g[j + 1] + b * g[j]) / h
            - a * b / 6.0 * ((1.0 + a / h) * c[j + 1] + (1.0 + b / h) * c[j])
    }

    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

/// Fits one spline per data series over shared knots, with a single
/// smoothing weight chosen so the combined residual over all series
/// is `s`. Used for parametric curves where `x(u)` and `y(u)` are smoothed
/// together.
pub fn fit_joint(t: &[f64], ys: &[&[f64]], s: f64) -> Result<Vec<SmoothingSpline>, Error> {
    let n = t.len();
    if n < MIN_SPLINE_POINTS {
        return Err(Error::fitting(format!(
            "cubic spline needs at least {MIN_SPLINE_POINTS} points, got {n}"
        )));
    }
    for y in ys {
        if y.len() != n {
            return Err(Error::SizeMismatch {
                expected: n,
                actual: y.len(),
            });
        }
    }
    if !s.is_finite() || s < 0.0 {
        return Err(Error::invalid(format!("smoothing factor must be >= 0, got {s}")));
    }

    let h: Vec<f64> = t.windows(2).map(|w| w[1] - w[0]).collect();
    if h.iter().any(|&hi| hi <= 0.0 || hi.is_nan()) {
        return Err(Error::fitting("knots must be strictly increasing"));
    }

    let system = ReinschSystem::new(&h);
    let qty: Vec<Vec<f64>> = ys.iter().map(|y| system.qt_mul(y)).collect();

    if s == 0.0 {
        return ys
            .iter()
            .zip(&qty)
            .map(|(y, rhs)| system.solve(0.0, y, rhs).map(|sol| sol.into_spline(t)))
            .collect();
    }

    let linear: Vec<LinearFit> = ys.iter().map(|y| LinearFit::new(t, y)).collect();
    let linear_rss: f64 = linear.iter().map(|l| l.rss).sum();
    if s >= linear_rss {
        trace!(s, linear_rss, "smoothing factor exceeds straight-line residual");
        return Ok(linear.iter().map(|l| l.to_spline(t)).collect());
    }

    let rss_at = |lambda: f64| -> Result<f64, Error> {
        let mut total = 0.0;
        for (y, rhs) in ys.iter().zip(&qty) {
            total += system.solve(lambda, y, rhs)?.residual;
        }
        Ok(total)
    };

    let mean_h = (t[n - 1] - t[0]) / (n - 1) as f64;
    let mut lo = mean_h.powi(3);
    let mut hi = lo;
    if rss_at(lo)? < s {
        for _ in 0..MAX_BRACKET_STEPS {
            hi *= 10.0;
            if rss_at(hi)? >= s {
                break;
            }
        }
    } else {
        for _ in 0..MAX_BRACKET_STEPS {
            lo /= 10.0;
            if rss_at(lo)? <= s {
                break;
            }
        }
    }

    let mut lambda = (lo * hi).sqrt();
    for _ in 0..MAX_BISECT_STEPS {
        let rss = rss_at(lambda)?;
        if (rss - s).abs() <= RESIDUAL_TOL * s {
            break;
        }
        if rss < s {
            lo = lambda;
        } else {
            hi = lambda;
        }
        lambda = (lo * hi).sqrt();
    }
    trace!(s, lambda, "smoothing weight found");

    ys.iter()
        .zip(&qty)
        .map(|(y, rhs)| system.solve(lambda, y, rhs).map(|sol| sol.into_spline(t)))
        .collect()
}

/// Banded pieces of the Reinsch system for one knot vector.
struct ReinschSystem {
    /// Tridiagonal `R`: diagonal and first super-diagonal.
    r_diag: Vec<f64>,
    r_off: Vec<f64>,
    /// Pentadiagonal `Q^T Q`: diagonal, first and second super-diagonals.
    qq_diag: Vec<f64>,
    qq_off1: Vec<f64>,
    qq_off2: Vec<f64>,
    /// Non-zero entries of column `j` of `Q`, rows `j, j+1, j+2`.
    q: Vec<[f64; 3]>,
}

impl ReinschSystem {
    fn new(h: &[f64]) -> Self {
        let m = h.len() - 1;
        let q: Vec<[f64; 3]> = (0..m)
            .map(|j| {
                let a = 1.0 / h[j];
                let b = 1.0 / h[j + 1];
                [a, -(a + b), b]
            })
            .collect();

        let r_diag = (0..m).map(|j| (h[j] + h[j + 1]) / 3.0).collect();
        let r_off = (0..m.saturating_sub(1)).map(|j| h[j + 1] / 6.0).collect();
        let qq_diag = q.iter().map(|c| c[0] * c[0] + c[1] * c[1] + c[2] * c[2]).collect();
        let qq_off1 = (0..m.saturating_sub(1))
            .map(|j| q[j][1] * q[j + 1][0] + q[j][2] * q[j + 1][1])
            .collect();
        let qq_off2 = (0..m.saturating_sub(2))
            .map(|j| q[j][2] * q[j + 2][0])
            .collect();

        Self {
            r_diag,
            r_off,
            qq_diag,
            qq_off1,
            qq_off2,
            q,
        }
    }

    fn qt_mul(&self, y: &[f64]) -> Vec<f64> {
        self.q
            .iter()
            .enumerate()
            .map(|(j, c)| c[0] * y[j] + c[1] * y[j + 1] + c[2] * y[j + 2])
            .collect()
    }

    fn solve(&self, lambda: f64, y: &[f64], qty: &[f64]) -> Result<Solution, Error> {
        let m = self.q.len();
        let d: Vec<f64> = (0..m)
            .map(|j| self.r_diag[j] + lambda * self.qq_diag[j])
            .collect();
        let e1: Vec<f64> = (0..m.saturating_sub(1))
            .map(|j| self.r_off[j] + lambda * self.qq_off1[j])
            .collect();
        let e2: Vec<f64> = self.qq_off2.iter().map(|&v| lambda * v).collect();

        let gamma = solve_pentadiagonal(&d, &e1, &e2, qty)?;

        // g = y - lambda * Q gamma
        let mut values = y.to_vec();
        let mut residual = 0.0;
        if lambda > 0.0 {
            let mut qg = vec![0.0f64; y.len()];
            for (j, (c, &gj)) in self.q.iter().zip(&gamma).enumerate() {
                qg[j] += c[0] * gj;
                qg[j + 1] += c[1] * gj;
                qg[j + 2] += c[2] * gj;
            }
            for (v, &r) in values.iter_mut().zip(&qg) {
                let delta = lambda * r;
                *v -= delta;
                residual += delta * delta;
            }
        }

        Ok(Solution {
            values,
            gamma,
            residual,
        })
    }
}

struct Solution {
    values: Vec<f64>,
    gamma: Vec<f64>,
    residual: f64,
}

impl Solution {
    fn into_spline(self, t: &[f64]) -> SmoothingSpline {
        let mut second = Vec::with_capacity(t.len());
        second.push(0.0);
        second.extend_from_slice(&self.gamma);
        second.push(0.0);
        SmoothingSpline {
            knots: t.to_vec(),
            values: self.values,
            second,
            residual: self.residual,
        }
    }
}

struct LinearFit {
    intercept: f64,
    slope: f64,
    rss: f64,
}

impl LinearFit {
    fn new(t: &[f64], y: &[f64]) -> Self {
        let n = t.len() as f64;
        let t_mean = t.iter().sum::<f64>() / n;
        let y_mean = y.iter().sum::<f64>() / n;
        let mut stt = 0.0;
        let mut sty = 0.0;
        for (&ti, &yi) in t.iter().zip(y) {
            stt += (ti - t_mean) * (ti - t_mean);
            sty += (ti - t_mean) * (yi - y_mean);
        }
        let slope = sty / stt;
        let intercept = y_mean - slope * t_mean;
        let rss = t
            .iter()
            .zip(y)
            .map(|(&ti, &yi)| {
                let r = yi - (intercept + slope * ti);
                r * r
            })
            .sum();
        Self {
            intercept,
            slope,
            rss,
        }
    }

    fn to_spline(&self, t: &[f64]) -> SmoothingSpline {
        SmoothingSpline {
            knots: t.to_vec(),
            values: t.iter().map(|&ti| self.intercept + self.slope * ti).collect(),
            second: vec![0.0; t.len()],
            residual: self.rss,
        }
    }
}

/// Solves a symmetric positive definite pentadiagonal system by banded
/// `L D L^T` factorization. `e1`/`e2` are the first/second super-diagonals.
fn solve_pentadiagonal(d: &[f64], e1: &[f64], e2: &[f64], b: &[f64]) -> Result<Vec<f64>, Error> {
    let m = d.len();
    let mut dd = vec![0.0f64; m];
    let mut l1 = vec![0.0f64; m];
    let mut l2 = vec![0.0f64; m];

    for i in 0..m {
        let mut di = d[i];
        if i >= 1 {
            di -= l1[i - 1] * l1[i - 1] * dd[i - 1];
        }
        if i >= 2 {
            di -= l2[i - 2] * l2[i - 2] * dd[i - 2];
        }
        if di <= 0.0 || !di.is_finite() {
            return Err(Error::fitting("spline system is not positive definite"));
        }
        dd[i] = di;

        if i + 1 < m {
            let mut v = e1[i];
            if i >= 1 {
                v -= l2[i - 1] * l1[i - 1] * dd[i - 1];
            }
            l1[i] = v / di;
        }
        if i + 2 < m {
            l2[i] = e2[i] / di;
        }
    }

    let mut z = b.to_vec();
    for i in 0..m {
        if i >= 1 {
            z[i] -= l1[i - 1] * z[i - 1];
        }
        if i >= 2 {
            z[i] -= l2[i - 2] * z[i - 2];
        }
    }
    for (zi, &di) in z.iter_mut().zip(&dd) {
        *zi /= di;
    }
    for i in (0..m).rev() {
        if i + 1 < m {
            z[i] -= l1[i] * z[i + 1];
        }
        if i + 2 < m {
            z[i] -= l2[i] * z[i + 2];
        }
    }
    Ok(z)
}
