use crate::image::Image;

/// Rotated elliptical 2D Gaussian with a constant offset.
///
/// `theta` rotates the `(sigma_x, sigma_y)` axes counter-clockwise, in
/// radians. `(xo, yo)` is the center in column/row coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gaussian2D {
    pub amplitude: f64,
    pub xo: f64,
    pub yo: f64,
    pub sigma_x: f64,
    pub sigma_y: f64,
    pub theta: f64,
    pub offset: f64,
}

impl Default for Gaussian2D {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            xo: 0.0,
            yo: 0.0,
            sigma_x: 1.0,
            sigma_y: 1.0,
            theta: 0.0,
            offset: 0.0,
        }
    }
}

impl Gaussian2D {
    /// Quadratic-form coefficients `(a, b, c)` of the exponent.
    pub fn quadratic_form(&self) -> (f64, f64, f64) {
        let (sin_t, cos_t) = self.theta.sin_cos();
        let sin_2t = (2.0 * self.theta).sin();
        let sx2 = self.sigma_x * self.sigma_x;
        let sy2 = self.sigma_y * self.sigma_y;

        let a = cos_t * cos_t / (2.0 * sx2) + sin_t * sin_t / (2.0 * sy2);
        let b = -sin_2t / (4.0 * sx2) + sin_2t / (4.0 * sy2);
        let c = sin_t * sin_t / (2.0 * sx2) + cos_t * cos_t / (2.0 * sy2);
        (a, b, c)
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let (a, b, c) = self.quadratic_form();
        self.eval_with(a, b, c, x, y)
    }

    #[inline]
    fn eval_with(&self, a: f64, b: f64, c: f64, x: f64, y: f64) -> f64 {
        let dx = x - self.xo;
        let dy = y - self.yo;
        self.offset + self.amplitude * (-(a * dx * dx + 2.0 * b * dx * dy + c * dy * dy)).exp()
    }

    /// Renders the model on the integer pixel grid of a `width x height` image.
    pub fn eval_grid(&self, width: usize, height: usize) -> Image<f64> {
        let (a, b, c) = self.quadratic_form();
        let mut img = Image::new_fill(width, height, 0.0);
        for y in 0..height {
            for (x, dst) in img.row_mut(y).iter_mut().enumerate() {
                *dst = self.eval_with(a, b, c, x as f64, y as f64);
            }
        }
        img
    }
}

#[cfg(test)]
mod tests {
    use super::Gaussian2D;

    #[test]
    fn peak_at_center_and_offset_far_away() {
        let g = Gaussian2D {
            amplitude: 3.0,
            xo: 4.0,
            yo: 2.0,
            sigma_x: 1.5,
            sigma_y: 0.7,
            theta: 0.4,
            offset: 0.5,
        };
        assert!((g.eval(4.0, 2.0) - 3.5).abs() < 1e-12);
        assert!((g.eval(400.0, -300.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn axis_aligned_matches_separable_form() {
        let g = Gaussian2D {
            sigma_x: 2.0,
            sigma_y: 1.0,
            ..Gaussian2D::default()
        };
        let expected = (-(1.0f64 / 8.0) - 0.5).exp();
        assert!((g.eval(1.0, 1.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn quarter_turn_swaps_axes() {
        let base = Gaussian2D {
            sigma_x: 2.0,
            sigma_y: 0.5,
            ..Gaussian2D::default()
        };
        let rotated = Gaussian2D {
            theta: core::f64::consts::FRAC_PI_2,
            ..base
        };
        assert!((base.eval(1.3, 0.0) - rotated.eval(0.0, 1.3)).abs() < 1e-12);
    }

    #[test]
    fn grid_matches_pointwise_eval() {
        let g = Gaussian2D {
            xo: 2.0,
            yo: 1.0,
            ..Gaussian2D::default()
        };
        let img = g.eval_grid(5, 3);
        assert_eq!(img.width(), 5);
        assert_eq!(img.height(), 3);
        let v = *img.as_view().get(3, 2).expect("in bounds");
        assert!((v - g.eval(3.0, 2.0)).abs() < 1e-15);
    }
}
