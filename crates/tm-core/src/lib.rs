//! Foundational primitives for curve and image-profile metrology.
//!
//! ## Image Views and Stride
//! Images use element stride (not byte stride). `stride` is the distance, in
//! elements, between adjacent row starts and may be greater than `width`.
//! Pixels are addressed as `(x, y)` = `(column, row)`.
//!
//! ## Border Modes
//! Sampling supports clamp, constant fill, and reflect-101 behavior.
//! Reflect-101 mirrors around edge pixels without repeating edge elements,
//! which is also the boundary used to prefilter cubic B-spline coefficients.
//!
//! ## Errors
//! Every crate in the workspace reports failures through [`Error`]:
//! `InvalidInput` for shape/range problems caught up front, `Fitting` for
//! singular or under-determined fits. Numeric degeneracies (zero variance,
//! zero-length segments) are not errors and propagate as NaN/inf.

mod border;
mod error;
mod gauss;
mod geom;
mod image;
mod sample;

pub use border::{BorderMode, fetch, map_index};
pub use error::{Error, ensure_same_len};
pub use gauss::Gaussian2D;
pub use geom::{Point2, Vec2, zip_points};
pub use image::{Image, ImageView, to_f64};
pub use sample::CubicSpline2D;

/// `n` evenly spaced samples over `[start, stop]`, endpoints included.
///
/// `n == 1` yields `[start]`; `n == 0` yields an empty vector.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = stop;
            out
        }
    }
}
