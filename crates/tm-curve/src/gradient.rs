use tm_core::{Error, Vec2, ensure_same_len};

/// Per-sample slope and tangent direction of a sampled curve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveGradient {
    /// `dy/dx`; +-inf or NaN where `dx == 0`.
    pub grad: Vec<f64>,
    /// `atan2(dy, dx)` in radians, range `(-pi, pi]`.
    pub posang: Vec<f64>,
}

/// Centered differences in the interior, one-sided differences at the two
/// ends. No wraparound: the first and last samples only see their single
/// neighbour.
pub fn curve_gradient(x: &[f64], y: &[f64]) -> Result<CurveGradient, Error> {
    let n = ensure_same_len(x, y)?;
    if n < 2 {
        return Err(Error::invalid("gradient needs at least two points"));
    }

    let delta = |v: &[f64], i: usize| -> f64 {
        if i == 0 {
            v[1] - v[0]
        } else if i == n - 1 {
            v[n - 1] - v[n - 2]
        } else {
            v[i + 1] - v[i - 1]
        }
    };

    let mut grad = Vec::with_capacity(n);
    let mut posang = Vec::with_capacity(n);
    for i in 0..n {
        let d = Vec2 {
            x: delta(x, i),
            y: delta(y, i),
        };
        grad.push(d.y / d.x);
        posang.push(d.angle());
    }

    Ok(CurveGradient { grad, posang })
}
