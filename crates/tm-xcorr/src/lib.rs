//! Normalized cross-correlation of 1-D signals and all-pairs
//! similarity/lag maps over a stack of rows.
//!
//! [`c_correlate`] standardizes both inputs and returns the "same"-length
//! correlation sequence; index `(n - 1) / 2` is zero lag. [`xcorr_map`]
//! optionally re-grids every row with a smoothing spline, then records the
//! peak correlation and its lag for every unordered pair of rows.
//!
//! Row spectra are computed once and shared across pairs. With the `rayon`
//! feature enabled the pairs of each `idx1` row are correlated in parallel.

mod correlate;
pub mod map;
pub mod matrix;

pub use correlate::c_correlate;
pub use map::{CorrelationMap, PairOutcome, PairResult, XCorrConfig, pair_outcomes, xcorr_map};
pub use matrix::Matrix;
