use tm_core::{Error, linspace};
use tm_curve::SmoothingSpline;
use tracing::{debug, trace};

use crate::correlate::{RowSpectra, peak};
use crate::matrix::Matrix;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Oversampling factor of the common fine axis when re-gridding rows.
const FINE_AXIS_FACTOR: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XCorrConfig {
    /// Re-grid every row onto a 10x finer axis with a smoothing spline
    /// (`s` = row sample count) before correlating.
    pub resample: bool,
}

impl Default for XCorrConfig {
    fn default() -> Self {
        Self { resample: true }
    }
}

/// Result of correlating one pair of rows.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum PairOutcome {
    /// Peak correlation and its lag in fine-axis samples.
    Computed { value: f64, lag: isize },
    /// At least one of the rows sums to exactly zero.
    Degenerate,
}

impl PairOutcome {
    /// `(value, lag)` as stored in the map; degenerate pairs become `(0, 0)`.
    pub fn value_lag(self) -> (f64, f64) {
        match self {
            Self::Computed { value, lag } => (value, lag as f64),
            Self::Degenerate => (0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairResult {
    pub idx1: usize,
    pub idx2: usize,
    pub outcome: PairOutcome,
}

/// All-pairs correlation map of a signal stack.
///
/// Matrices are `(m - 1) x (m - 1)`. Pair `(idx1, idx2)` with `idx2 < idx1`
/// lands in cell `(idx2, idx1 - 1)` and its mirror `(idx1 - 1, idx2)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationMap {
    pub ccmax: Matrix,
    pub ccpeak: Matrix,
    pub ya: Matrix,
    pub yv: Matrix,
    pub yidxa: Matrix,
    pub yidxv: Matrix,
    /// Rows actually correlated (re-gridded or a copy of the input).
    pub zfit: Vec<Vec<f64>>,
    pub xfit: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub nx: usize,
    pub nxfit: usize,
    pub ny: usize,
}

/// Builds the pairwise correlation map of `z` (`m` rows over axis `x`,
/// labelled by `y`).
pub fn xcorr_map(
    z: &[Vec<f64>],
    x: &[f64],
    y: &[f64],
    cfg: &XCorrConfig,
) -> Result<CorrelationMap, Error> {
    validate_stack(z, x, y)?;
    let (m, k) = (z.len(), x.len());

    let (zfit, xfit) = if cfg.resample {
        regrid(z, x)?
    } else {
        (z.to_vec(), x.to_vec())
    };
    let nxfit = xfit.len();
    debug!(rows = m, samples = k, nxfit, resample = cfg.resample, "building correlation map");

    let pairs = pair_outcomes(&zfit)?;

    let n = m - 1;
    let mut map = CorrelationMap {
        ccmax: Matrix::nan(n, n),
        ccpeak: Matrix::nan(n, n),
        ya: Matrix::nan(n, n),
        yv: Matrix::nan(n, n),
        yidxa: Matrix::nan(n, n),
        yidxv: Matrix::nan(n, n),
        zfit,
        xfit,
        x: x.to_vec(),
        y: y.to_vec(),
        nx: k,
        nxfit,
        ny: m,
    };

    for PairResult { idx1, idx2, outcome } in pairs {
        let (value, lag) = outcome.value_lag();
        let a = idx1 - 1;
        map.write(idx2, a, value, lag, (y[a], a), (y[idx2], idx2));
        if a != idx2 {
            map.write(a, idx2, value, lag, (y[idx2], idx2), (y[a], a));
        }
    }

    Ok(map)
}

impl CorrelationMap {
    fn write(
        &mut self,
        r: usize,
        c: usize,
        value: f64,
        lag: f64,
        (ya, idxa): (f64, usize),
        (yv, idxv): (f64, usize),
    ) {
        self.ccmax.set(r, c, value);
        self.ccpeak.set(r, c, lag);
        self.ya.set(r, c, ya);
        self.yv.set(r, c, yv);
        self.yidxa.set(r, c, idxa as f64);
        self.yidxv.set(r, c, idxv as f64);
    }
}

/// Correlates every pair `idx2 < idx1` of equal-length rows.
///
/// Pairs are returned ordered by `idx1`, then `idx2`.
pub fn pair_outcomes(rows: &[Vec<f64>]) -> Result<Vec<PairResult>, Error> {
    let len = rows.first().map_or(0, Vec::len);
    if len == 0 {
        return Err(Error::invalid("signal rows must be non-empty"));
    }
    if let Some(bad) = rows.iter().find(|r| r.len() != len) {
        return Err(Error::SizeMismatch {
            expected: len,
            actual: bad.len(),
        });
    }

    let refs: Vec<&[f64]> = rows.iter().map(Vec::as_slice).collect();
    let spectra = RowSpectra::new(&refs);
    let zero_sum: Vec<bool> = rows.iter().map(|r| r.iter().sum::<f64>() == 0.0).collect();

    let per_row = collect_rows(rows.len(), |idx1| {
        (0..idx1)
            .map(|idx2| PairResult {
                idx1,
                idx2,
                outcome: pair_outcome(&spectra, &zero_sum, idx1, idx2),
            })
            .collect()
    });
    Ok(per_row.into_iter().flatten().collect())
}

fn pair_outcome(spectra: &RowSpectra, zero_sum: &[bool], idx1: usize, idx2: usize) -> PairOutcome {
    if zero_sum[idx1] || zero_sum[idx2] {
        trace!(idx1, idx2, "degenerate pair");
        return PairOutcome::Degenerate;
    }
    let cc = spectra.correlate(idx1, idx2);
    let (value, at) = peak(&cc);
    PairOutcome::Computed {
        value,
        lag: at as isize - ((spectra.len() - 1) / 2) as isize,
    }
}

#[cfg(feature = "rayon")]
fn collect_rows<F>(m: usize, f: F) -> Vec<Vec<PairResult>>
where
    F: Fn(usize) -> Vec<PairResult> + Sync + Send,
{
    (1..m).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "rayon"))]
fn collect_rows<F>(m: usize, f: F) -> Vec<Vec<PairResult>>
where
    F: Fn(usize) -> Vec<PairResult>,
{
    (1..m).map(f).collect()
}

fn validate_stack(z: &[Vec<f64>], x: &[f64], y: &[f64]) -> Result<(), Error> {
    if z.len() < 2 {
        return Err(Error::invalid(format!(
            "correlation map needs at least 2 rows, got {}",
            z.len()
        )));
    }
    if y.len() != z.len() {
        return Err(Error::invalid(format!(
            "expected {} row labels, got {}",
            z.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(Error::invalid("signal axis needs at least 2 samples"));
    }
    if let Some((i, row)) = z.iter().enumerate().find(|(_, r)| r.len() != x.len()) {
        return Err(Error::invalid(format!(
            "row {i} has {} samples, axis has {}",
            row.len(),
            x.len()
        )));
    }
    Ok(())
}

fn regrid(z: &[Vec<f64>], x: &[f64]) -> Result<(Vec<Vec<f64>>, Vec<f64>), Error> {
    let k = x.len();
    let xfit = linspace(x[0], x[k - 1], FINE_AXIS_FACTOR * k + 1);
    let zfit = z
        .iter()
        .map(|row| SmoothingSpline::fit(x, row, k as f64).map(|sp| sp.eval_many(&xfit)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((zfit, xfit))
}

#[cfg(test)]
mod tests {
    use tm_core::{Error, linspace};

    use super::{PairOutcome, XCorrConfig, pair_outcomes, xcorr_map};

    fn pulse(k: usize, center: f64) -> Vec<f64> {
        (0..k)
            .map(|i| (-(i as f64 - center).powi(2) / 8.0).exp())
            .collect()
    }

    fn raw() -> XCorrConfig {
        XCorrConfig { resample: false }
    }

    #[test]
    fn three_rows_give_symmetric_2x2_map() {
        let x = linspace(0.0, 1.0, 40);
        let z = vec![pulse(40, 15.0), pulse(40, 18.0), pulse(40, 22.0)];
        let y = [10.0, 20.0, 30.0];
        let map = xcorr_map(&z, &x, &y, &raw()).expect("valid stack");

        assert_eq!((map.ccmax.rows(), map.ccmax.cols()), (2, 2));
        assert_eq!((map.nx, map.nxfit, map.ny), (40, 40, 3));
        assert!(map.ccmax.is_symmetric());
        assert!(map.ccpeak.is_symmetric());
        assert!(map.ccmax.data().iter().all(|v| v.is_finite()));

        // (idx1, idx2) = (1, 0) -> (0, 0); (2, 1) -> (1, 1); (2, 0) -> (0, 1)
        assert_eq!(map.ccpeak.get(0, 0), 3.0);
        assert_eq!(map.ccpeak.get(1, 1), 4.0);
        assert_eq!(map.ccpeak.get(0, 1), 7.0);

        assert_eq!(map.ya.get(0, 1), 20.0);
        assert_eq!(map.yv.get(0, 1), 10.0);
        assert_eq!(map.yidxa.get(0, 1), 1.0);
        assert_eq!(map.yidxv.get(0, 1), 0.0);
        assert_eq!(map.ya.get(1, 0), 10.0);
        assert_eq!(map.yv.get(1, 0), 20.0);
        assert_eq!(map.yidxa.get(1, 0), 0.0);
        assert_eq!(map.yidxv.get(1, 0), 1.0);
    }

    #[test]
    fn delayed_row_has_positive_lag() {
        let x = linspace(0.0, 63.0, 64);
        let z = vec![pulse(64, 30.0), pulse(64, 35.0)];
        let map = xcorr_map(&z, &x, &[0.0, 1.0], &raw()).expect("valid stack");
        assert_eq!(map.ccpeak.get(0, 0), 5.0);
        assert!(map.ccmax.get(0, 0) > 0.9);
    }

    #[test]
    fn zero_row_is_degenerate() {
        let x = linspace(0.0, 1.0, 16);
        let z = vec![pulse(16, 7.0), vec![0.0; 16], pulse(16, 9.0)];
        let pairs = pair_outcomes(&z).expect("valid rows");
        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[0].idx1, pairs[0].idx2), (1, 0));
        assert_eq!(pairs[0].outcome, PairOutcome::Degenerate);
        assert_eq!(pairs[2].outcome, PairOutcome::Degenerate);
        assert!(matches!(pairs[1].outcome, PairOutcome::Computed { lag: 2, .. }));

        let map = xcorr_map(&z, &x, &[0.0, 1.0, 2.0], &raw()).expect("valid stack");
        assert_eq!(map.ccmax.get(0, 0), 0.0);
        assert_eq!(map.ccpeak.get(0, 0), 0.0);
        assert_eq!(map.ccmax.get(1, 1), 0.0);
        assert!(map.ccmax.get(0, 1) > 0.8);
    }

    #[test]
    fn identical_sinusoids_with_regridding() {
        let x = linspace(0.0, 10.0, 100);
        let row: Vec<f64> = x.iter().map(|v| (v * 1.7).sin()).collect();
        let z = vec![row.clone(), row];
        for cfg in [XCorrConfig::default(), raw()] {
            let map = xcorr_map(&z, &x, &[0.0, 1.0], &cfg).expect("valid stack");
            assert_eq!(map.ccpeak.get(0, 0), 0.0);
            assert!((map.ccmax.get(0, 0) - 1.0).abs() < 1e-6);
        }

        let map = xcorr_map(&z, &x, &[0.0, 1.0], &XCorrConfig::default()).expect("valid stack");
        assert_eq!(map.nxfit, 1001);
        assert_eq!(map.zfit.len(), 2);
        assert_eq!(map.zfit[0].len(), 1001);
        assert_eq!(map.xfit[0], 0.0);
        assert_eq!(map.xfit[1000], 10.0);
    }

    #[test]
    fn constant_row_propagates_nan() {
        let x = linspace(0.0, 1.0, 8);
        let z = vec![vec![1.0; 8], pulse(8, 3.0)];
        let pairs = pair_outcomes(&z).expect("valid rows");
        match pairs[0].outcome {
            PairOutcome::Computed { value, lag } => {
                assert!(value.is_nan());
                assert_eq!(lag, -3);
            }
            PairOutcome::Degenerate => panic!("constant row is not degenerate"),
        }
        let map = xcorr_map(&z, &x, &[0.0, 1.0], &raw()).expect("valid stack");
        assert!(map.ccmax.get(0, 0).is_nan());
    }

    #[test]
    fn rejects_malformed_stacks() {
        let x = linspace(0.0, 1.0, 8);
        let row = pulse(8, 3.0);
        assert!(matches!(
            xcorr_map(&[row.clone()], &x, &[0.0], &raw()),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            xcorr_map(&[row.clone(), row.clone()], &x, &[0.0], &raw()),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            xcorr_map(&[row.clone(), row[..7].to_vec()], &x, &[0.0, 1.0], &raw()),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            xcorr_map(&[vec![1.0; 3], vec![2.0; 3]], &[0.0, 1.0, 2.0], &[0.0, 1.0], &XCorrConfig::default()),
            Err(Error::Fitting(_))
        ));
        assert!(matches!(
            pair_outcomes(&[vec![1.0, 2.0], vec![1.0]]),
            Err(Error::SizeMismatch { .. })
        ));
    }
}
