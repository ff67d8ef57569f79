//! Curve geometry primitives: chordal distance, tangent estimation, and
//! uniform resampling of irregularly sampled 2D curves.
//!
//! Curves are passed as parallel `x`/`y` slices. Resampling returns a
//! [`ResampledCurve`] whose four arrays always share the requested length.
//!
//! Resampling strategies ([`ResampleMode`]):
//! - `ParametricSpline`: chord-length parametrized smoothing spline, for
//!   curves that are not single-valued in `x`.
//! - `Polynomial`: least-squares polynomial `y(x)`.
//! - `Spline`: univariate smoothing spline `y(x)`.
//!
//! Smoothing splines are natural cubic splines whose residual sum of squares
//! is bounded by the smoothing factor `s`; `s = 0` interpolates.
//!
//! Gradients use centered differences in the interior and one-sided
//! differences at the ends. Zero-length steps are not special-cased and
//! propagate as inf/NaN slopes.

pub mod arclength;
pub mod gradient;
pub mod polyfit;
pub mod resample;
pub mod spline;

pub use arclength::{cumulative_arc_length, find_dist};
pub use gradient::{CurveGradient, curve_gradient};
pub use polyfit::{Polynomial, polyfit};
pub use resample::{ResampleMode, ResampledCurve, resample};
pub use spline::{MIN_SPLINE_POINTS, SmoothingSpline, fit_joint};
