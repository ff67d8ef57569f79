//! Umbrella crate for the `trace-metrology` workspace.
//!
//! Re-exports the algorithm crates so downstream code can depend on a
//! single crate:
//! - [`tm_core`]: errors, geometry, images, cubic image sampling, 2-D Gaussian model.
//! - [`tm_curve`]: arc length, tangents and curve resampling.
//! - [`tm_profile`]: intensity profiles along image paths.
//! - [`tm_xcorr`]: normalized cross-correlation and pairwise lag maps.

pub use tm_core::*;
pub use tm_curve::*;
pub use tm_profile::*;
pub use tm_xcorr::*;
