use tm_core::{Error, ensure_same_len, linspace};
use tracing::debug;

use crate::arclength::cumulative_arc_length;
use crate::gradient::curve_gradient;
use crate::polyfit::{min_max, polyfit};
use crate::spline::{SmoothingSpline, fit_joint};

/// Resampling strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "mode", rename_all = "snake_case")
)]
pub enum ResampleMode {
    /// Joint smoothing spline of `x(u)`, `y(u)` over normalized chord length.
    /// Handles closed, vertical and self-intersecting curves.
    ParametricSpline { s: f64 },
    /// Least-squares polynomial `y(x)`; `y` must be single-valued in `x`.
    Polynomial { deg: usize },
    /// Univariate smoothing spline `y(x)`; `x` must be strictly increasing.
    Spline { s: f64 },
}

impl Default for ResampleMode {
    fn default() -> Self {
        Self::ParametricSpline { s: 0.0 }
    }
}

/// Uniformly resampled curve with per-sample slope and direction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResampledCurve {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub grad: Vec<f64>,
    pub posang: Vec<f64>,
}

impl ResampledCurve {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    fn annotate(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, Error> {
        let g = curve_gradient(&xs, &ys)?;
        Ok(Self {
            xs,
            ys,
            grad: g.grad,
            posang: g.posang,
        })
    }
}

/// Resamples `(x, y)` to `length` points with the chosen strategy.
pub fn resample(
    x: &[f64],
    y: &[f64],
    length: usize,
    mode: ResampleMode,
) -> Result<ResampledCurve, Error> {
    let n = ensure_same_len(x, y)?;
    if length < 2 {
        return Err(Error::invalid(format!(
            "resampled length must be >= 2, got {length}"
        )));
    }
    debug!(?mode, points = n, length, "resampling curve");

    match mode {
        ResampleMode::ParametricSpline { s } => resample_parametric(x, y, length, s),
        ResampleMode::Polynomial { deg } => resample_polynomial(x, y, length, deg),
        ResampleMode::Spline { s } => resample_spline(x, y, length, s),
    }
}

fn resample_parametric(
    x: &[f64],
    y: &[f64],
    length: usize,
    s: f64,
) -> Result<ResampledCurve, Error> {
    let mut u = cumulative_arc_length(x, y)?;
    let total = u.last().copied().unwrap_or(0.0);
    if total <= 0.0 || !total.is_finite() {
        return Err(Error::fitting("curve has zero length"));
    }
    for v in &mut u {
        *v /= total;
    }

    let fits = fit_joint(&u, &[x, y], s)?;
    let unew = linspace(0.0, 1.0, length);
    ResampledCurve::annotate(fits[0].eval_many(&unew), fits[1].eval_many(&unew))
}

fn resample_polynomial(
    x: &[f64],
    y: &[f64],
    length: usize,
    deg: usize,
) -> Result<ResampledCurve, Error> {
    let poly = polyfit(x, y, deg)?;
    let (lo, hi) = min_max(x);
    let xs = linspace(lo, hi, length);
    let ys = poly.eval_many(&xs);
    ResampledCurve::annotate(xs, ys)
}

fn resample_spline(x: &[f64], y: &[f64], length: usize, s: f64) -> Result<ResampledCurve, Error> {
    let spline = SmoothingSpline::fit(x, y, s)?;
    let (lo, hi) = min_max(x);
    let xs = linspace(lo, hi, length);
    let ys = spline.eval_many(&xs);
    ResampledCurve::annotate(xs, ys)
}

#[cfg(test)]
mod tests {
    use core::f64::consts::{FRAC_PI_2, PI};

    use tm_core::{Error, linspace};

    use super::{ResampleMode, resample};

    #[test]
    fn polynomial_reproduces_line_for_any_length() {
        let x = [0.0, 0.3, 1.1, 2.0, 4.5];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();

        for length in [2, 3, 17, 100] {
            let c = resample(&x, &y, length, ResampleMode::Polynomial { deg: 1 }).expect("fit");
            assert_eq!(c.len(), length);
            assert_eq!(c.ys.len(), length);
            assert_eq!(c.grad.len(), length);
            assert_eq!(c.posang.len(), length);
            assert!((c.xs[0] - 0.0).abs() < 1e-15);
            assert!((c.xs[length - 1] - 4.5).abs() < 1e-15);
            for (&xs, &ys) in c.xs.iter().zip(&c.ys) {
                assert!((ys - (2.0 * xs + 1.0)).abs() < 1e-9);
            }
            for &g in &c.grad {
                assert!((g - 2.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn spline_mode_spans_x_range() {
        let x = linspace(1.0, 3.0, 9);
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let c = resample(&x, &y, 21, ResampleMode::Spline { s: 0.0 }).expect("fit");

        assert_eq!(c.len(), 21);
        assert!((c.xs[10] - 2.0).abs() < 1e-12);
        assert!((c.ys[10] - 4.0).abs() < 1e-12);
        assert!((c.grad[10] - 4.0).abs() < 0.05);
    }

    #[test]
    fn parametric_spline_follows_vertical_segment() {
        let x = [1.0; 5];
        let y = [0.0, 1.0, 2.0, 3.0, 4.0];
        let c = resample(&x, &y, 9, ResampleMode::ParametricSpline { s: 0.0 }).expect("fit");

        for (i, (&xs, &ys)) in c.xs.iter().zip(&c.ys).enumerate() {
            assert!((xs - 1.0).abs() < 1e-12);
            assert!((ys - 0.5 * i as f64).abs() < 1e-12);
        }
        assert!(c.posang.iter().all(|&a| (a - FRAC_PI_2).abs() < 1e-9));
    }

    #[test]
    fn parametric_spline_on_circle() {
        let theta = linspace(0.0, 2.0 * PI, 25);
        let x: Vec<f64> = theta.iter().map(|t| t.cos()).collect();
        let y: Vec<f64> = theta.iter().map(|t| t.sin()).collect();
        let c = resample(&x, &y, 50, ResampleMode::default()).expect("fit");

        assert!((c.xs[0] - 1.0).abs() < 1e-12 && c.ys[0].abs() < 1e-12);
        assert!((c.xs[49] - 1.0).abs() < 1e-12);
        for (&xs, &ys) in c.xs.iter().zip(&c.ys) {
            assert!((xs.hypot(ys) - 1.0).abs() < 2e-2);
        }
    }

    #[test]
    fn failure_modes() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 0.0];

        assert!(matches!(
            resample(&x, &y, 1, ResampleMode::Polynomial { deg: 1 }),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            resample(&x, &y, 10, ResampleMode::Polynomial { deg: 3 }),
            Err(Error::Fitting(_))
        ));
        assert!(matches!(
            resample(&[0.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 2.0, 0.0], 10, ResampleMode::Spline {
                s: 0.0
            }),
            Err(Error::Fitting(_))
        ));
        assert!(matches!(
            resample(&[1.0; 4], &[2.0; 4], 10, ResampleMode::default()),
            Err(Error::Fitting(_))
        ));
        assert!(matches!(
            resample(&x, &y[..2], 10, ResampleMode::default()),
            Err(Error::SizeMismatch { .. })
        ));
    }
}
