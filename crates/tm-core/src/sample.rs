use crate::border::{BorderMode, fetch, map_index};
use crate::image::{Image, ImageView, to_f64};

/// Pole of the cubic B-spline interpolation filter, `sqrt(3) - 2`.
const POLE: f64 = -0.267_949_192_431_122_7;
/// Relative tolerance used to truncate the causal initialization sum.
const INIT_TOL: f64 = 1e-15;

/// Cubic B-spline interpolator over a prefiltered copy of an image.
///
/// Coefficients are computed once with mirror-symmetric boundary conditions,
/// so sampling at integer coordinates reproduces pixel values exactly.
/// Coefficients outside the image are resolved with `border`.
#[derive(Debug, Clone)]
pub struct CubicSpline2D {
    coeffs: Image<f64>,
    border: BorderMode<f64>,
}

impl CubicSpline2D {
    pub fn new<T: Copy + Into<f64>>(img: &ImageView<'_, T>, border: BorderMode<f64>) -> Self {
        let mut coeffs = to_f64(img);
        let (w, h) = (coeffs.width(), coeffs.height());

        for y in 0..h {
            prefilter_line(coeffs.row_mut(y));
        }

        let mut col = vec![0.0f64; h];
        for x in 0..w {
            for (y, dst) in col.iter_mut().enumerate() {
                *dst = coeffs.data()[y * w + x];
            }
            prefilter_line(&mut col);
            for (y, &v) in col.iter().enumerate() {
                coeffs.data_mut()[y * w + x] = v;
            }
        }

        Self { coeffs, border }
    }

    pub fn width(&self) -> usize {
        self.coeffs.width()
    }

    pub fn height(&self) -> usize {
        self.coeffs.height()
    }

    /// Interpolated value at column `x`, row `y` (pixel-center coordinates).
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        if !x.is_finite() || !y.is_finite() || self.width() == 0 || self.height() == 0 {
            return f64::NAN;
        }

        let x0 = x.floor() as isize - 1;
        let y0 = y.floor() as isize - 1;
        let wx: [f64; 4] = core::array::from_fn(|i| bspline3(x - (x0 + i as isize) as f64));
        let wy: [f64; 4] = core::array::from_fn(|j| bspline3(y - (y0 + j as isize) as f64));

        let view = self.coeffs.as_view();
        let mut acc = 0.0;
        for (j, &wyj) in wy.iter().enumerate() {
            let row_val = match map_index(y0 + j as isize, self.height(), &self.border) {
                Some(r) => {
                    let row = view.row(r);
                    wx.iter()
                        .enumerate()
                        .map(|(i, &wxi)| wxi * fetch(row, x0 + i as isize, &self.border))
                        .sum::<f64>()
                }
                None => match self.border {
                    BorderMode::Constant(c) => c * wx.iter().sum::<f64>(),
                    _ => f64::NAN,
                },
            };
            acc += wyj * row_val;
        }
        acc
    }
}

#[inline]
fn bspline3(t: f64) -> f64 {
    let a = t.abs();
    if a < 1.0 {
        2.0 / 3.0 - a * a + 0.5 * a * a * a
    } else if a < 2.0 {
        let b = 2.0 - a;
        b * b * b / 6.0
    } else {
        0.0
    }
}

/// In-place conversion of samples to cubic B-spline coefficients
/// (causal + anti-causal recursive filter, mirror boundary).
fn prefilter_line(c: &mut [f64]) {
    let n = c.len();
    if n < 2 {
        return;
    }

    let z = POLE;
    let gain = (1.0 - z) * (1.0 - 1.0 / z);
    for v in c.iter_mut() {
        *v *= gain;
    }

    let horizon = (INIT_TOL.ln() / z.abs().ln()).ceil() as usize;
    c[0] = if horizon < n {
        let mut zk = z;
        let mut sum = c[0];
        for &ck in c.iter().take(horizon).skip(1) {
            sum += zk * ck;
            zk *= z;
        }
        sum
    } else {
        let zn = z.powi((n - 1) as i32);
        let z2n = zn * zn;
        let mut zi = z;
        let mut zi2 = z2n / z;
        let mut sum = c[0] + zn * c[n - 1];
        for &ci in c.iter().take(n - 1).skip(1) {
            sum += (zi + zi2) * ci;
            zi *= z;
            zi2 /= z;
        }
        sum / (1.0 - z2n)
    };

    for i in 1..n {
        c[i] += z * c[i - 1];
    }

    c[n - 1] = (z / (z * z - 1.0)) * (c[n - 1] + z * c[n - 2]);
    for i in (0..n - 1).rev() {
        c[i] = z * (c[i + 1] - c[i]);
    }
}
