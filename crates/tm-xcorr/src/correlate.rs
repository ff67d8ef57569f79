use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use tm_core::{Error, ensure_same_len};

/// Standardized forward spectra of equal-length rows, zero padded so that
/// circular correlation of any two rows equals their linear correlation.
pub(crate) struct RowSpectra {
    len: usize,
    padded: usize,
    rows: Vec<Vec<Complex64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl RowSpectra {
    /// All rows must share one non-zero length.
    pub(crate) fn new(rows: &[&[f64]]) -> Self {
        let len = rows.first().map_or(0, |r| r.len());
        let padded = (2 * len).saturating_sub(1).max(1).next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(padded);
        let inverse = planner.plan_fft_inverse(padded);

        let rows = rows
            .iter()
            .map(|row| {
                let mut buf = vec![Complex64::new(0.0, 0.0); padded];
                for (dst, v) in buf.iter_mut().zip(standardize(row)) {
                    dst.re = v;
                }
                forward.process(&mut buf);
                buf
            })
            .collect();

        Self {
            len,
            padded,
            rows,
            inverse,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Same-length normalized correlation of row `a` against row `v`.
    pub(crate) fn correlate(&self, a: usize, v: usize) -> Vec<f64> {
        let mut buf: Vec<Complex64> = self.rows[a]
            .iter()
            .zip(&self.rows[v])
            .map(|(x, y)| x * y.conj())
            .collect();
        self.inverse.process(&mut buf);

        let scale = 1.0 / (self.padded as f64 * self.len as f64);
        let half = (self.len - 1) / 2;
        (0..self.len)
            .map(|i| {
                // lag k = i - half, wrapped into the padded buffer
                let idx = (i + self.padded - half) % self.padded;
                buf[idx].re * scale
            })
            .collect()
    }
}

/// `(row - mean) / std` with population standard deviation. Constant rows
/// produce NaN/inf, which later show up in the correlation.
fn standardize(row: &[f64]) -> impl Iterator<Item = f64> + '_ {
    let n = row.len() as f64;
    let mean = row.iter().sum::<f64>() / n;
    let var = row.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = var.sqrt();
    row.iter().map(move |v| (v - mean) / std)
}

/// Normalized cross-correlation of `a` and `v` in "same" mode.
///
/// Both inputs are standardized; `a` is additionally divided by its length,
/// so identical inputs peak at exactly 1. Output index `(n - 1) / 2` is zero
/// lag and index `i` holds `sum_m a'[m + k] * v'[m]` with
/// `k = i - (n - 1) / 2`. A positive peak lag means `a` is delayed relative
/// to `v`.
pub fn c_correlate(a: &[f64], v: &[f64]) -> Result<Vec<f64>, Error> {
    let n = ensure_same_len(a, v)?;
    if n == 0 {
        return Err(Error::invalid("cannot correlate empty signals"));
    }
    Ok(RowSpectra::new(&[a, v]).correlate(0, 1))
}

/// `(max, argmax)` where the first NaN wins, otherwise the first
/// occurrence of the maximum.
pub(crate) fn peak(cc: &[f64]) -> (f64, usize) {
    let mut best = (f64::NEG_INFINITY, 0);
    for (i, &v) in cc.iter().enumerate() {
        if v.is_nan() {
            return (v, i);
        }
        if v > best.0 {
            best = (v, i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use tm_core::Error;

    use super::{c_correlate, peak};

    fn reference(a: &[f64], v: &[f64]) -> Vec<f64> {
        let n = a.len();
        let norm = |s: &[f64]| -> Vec<f64> {
            let mean = s.iter().sum::<f64>() / n as f64;
            let std = (s.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
            s.iter().map(|x| (x - mean) / std).collect()
        };
        let an: Vec<f64> = norm(a).iter().map(|x| x / n as f64).collect();
        let vn = norm(v);
        let half = (n as isize - 1) / 2;
        (0..n as isize)
            .map(|i| {
                let k = i - half;
                (0..n as isize)
                    .filter(|m| (0..n as isize).contains(&(m + k)))
                    .map(|m| an[(m + k) as usize] * vn[m as usize])
                    .sum()
            })
            .collect()
    }

    #[test]
    fn matches_direct_summation() {
        let a = [0.3, -1.2, 2.5, 0.7, 0.0, 1.1, -0.4];
        let v = [1.0, 0.2, -0.5, 2.2, 0.9, -1.3, 0.6];
        for (a, v) in [(&a[..], &v[..]), (&a[..6], &v[..6])] {
            let got = c_correlate(a, v).expect("valid");
            let want = reference(a, v);
            assert_eq!(got.len(), a.len());
            for (g, w) in got.iter().zip(&want) {
                assert!((g - w).abs() < 1e-12, "{g} vs {w}");
            }
        }
    }

    #[test]
    fn identical_sinusoids_peak_at_zero_lag() {
        let s: Vec<f64> = (0..100).map(|i| (i as f64 * 0.3).sin()).collect();
        let cc = c_correlate(&s, &s).expect("valid");
        let (max, at) = peak(&cc);
        assert_eq!(at, 49);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn negated_signal_anticorrelates() {
        let s: Vec<f64> = (0..31).map(|i| ((i * 7) % 5) as f64 + 0.1 * i as f64).collect();
        let neg: Vec<f64> = s.iter().map(|v| -v).collect();
        let cc = c_correlate(&s, &neg).expect("valid");
        assert!((cc[15] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn delayed_signal_has_positive_lag() {
        let pulse = |c: f64| -> Vec<f64> {
            (0..64)
                .map(|i| (-(i as f64 - c).powi(2) / 8.0).exp())
                .collect()
        };
        let cc = c_correlate(&pulse(35.0), &pulse(30.0)).expect("valid");
        let (_, at) = peak(&cc);
        assert_eq!(at as isize - 31, 5);
    }

    #[test]
    fn constant_input_propagates_nan() {
        let cc = c_correlate(&[2.0; 8], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).expect("valid");
        assert!(cc.iter().all(|v| v.is_nan()));
        assert_eq!(peak(&cc).1, 0);
    }

    #[test]
    fn peak_prefers_first_nan_then_first_max() {
        assert_eq!(peak(&[1.0, 3.0, 3.0, 2.0]), (3.0, 1));
        let (v, i) = peak(&[1.0, 5.0, f64::NAN, f64::NAN]);
        assert!(v.is_nan());
        assert_eq!(i, 2);
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(
            c_correlate(&[1.0, 2.0], &[1.0]),
            Err(Error::SizeMismatch { .. })
        ));
        assert!(matches!(c_correlate(&[], &[]), Err(Error::InvalidInput(_))));
    }
}
