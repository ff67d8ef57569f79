use nalgebra::{DMatrix, DVector};
use tm_core::{Error, ensure_same_len};

/// Least-squares polynomial in a centered, scaled abscissa
/// `u = (x - center) / half_range`, which keeps the Vandermonde system
/// well conditioned for large `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// Coefficients in ascending powers of `u`.
    coeffs: Vec<f64>,
    center: f64,
    half_range: f64,
}

impl Polynomial {
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn eval(&self, x: f64) -> f64 {
        let u = (x - self.center) / self.half_range;
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * u + c)
    }

    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

/// Fits a degree-`deg` polynomial to `y(x)` by SVD least squares.
///
/// Fails with [`Error::Fitting`] when there are fewer than `deg + 1` points or
/// the design matrix is rank deficient (e.g. too few distinct `x` values).
pub fn polyfit(x: &[f64], y: &[f64], deg: usize) -> Result<Polynomial, Error> {
    let n = ensure_same_len(x, y)?;
    let cols = deg + 1;
    if n < cols {
        return Err(Error::fitting(format!(
            "degree {deg} fit needs at least {cols} points, got {n}"
        )));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(Error::invalid("polynomial fit input must be finite"));
    }

    let (min_x, max_x) = min_max(x);
    let center = 0.5 * (min_x + max_x);
    let half_range = match 0.5 * (max_x - min_x) {
        r if r > 0.0 => r,
        _ => 1.0,
    };

    let a = DMatrix::from_fn(n, cols, |r, c| {
        ((x[r] - center) / half_range).powi(c as i32)
    });
    let b = DVector::from_column_slice(y);

    let svd = a.svd(true, true);
    let s_max = svd.singular_values.max();
    let s_min = svd.singular_values.min();
    let rcond = n as f64 * f64::EPSILON;
    if s_min <= rcond * s_max {
        return Err(Error::fitting(format!(
            "degree {deg} fit is rank deficient for the given x values"
        )));
    }

    let sol = svd
        .solve(&b, rcond * s_max)
        .map_err(|e| Error::fitting(e.to_string()))?;

    Ok(Polynomial {
        coeffs: sol.iter().copied().collect(),
        center,
        half_range,
    })
}

pub(crate) fn min_max(v: &[f64]) -> (f64, f64) {
    v.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
        (lo.min(x), hi.max(x))
    })
}
