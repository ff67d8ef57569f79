use tm_core::{Error, ensure_same_len};

/// Per-step chordal distance along a point sequence.
///
/// Element 0 is `0.0`; element `i >= 1` is the distance between points
/// `i - 1` and `i`. This is not a running total, see
/// [`cumulative_arc_length`] for that.
pub fn find_dist(x: &[f64], y: &[f64]) -> Result<Vec<f64>, Error> {
    let n = ensure_same_len(x, y)?;
    if n < 1 {
        return Err(Error::invalid("need at least one point"));
    }

    let mut out = Vec::with_capacity(n);
    out.push(0.0);
    out.extend(
        x.windows(2)
            .zip(y.windows(2))
            .map(|(xw, yw)| (xw[1] - xw[0]).hypot(yw[1] - yw[0])),
    );
    Ok(out)
}

/// Running sum of [`find_dist`]: arc length from the first point.
pub fn cumulative_arc_length(x: &[f64], y: &[f64]) -> Result<Vec<f64>, Error> {
    let mut acc = find_dist(x, y)?;
    for i in 1..acc.len() {
        acc[i] += acc[i - 1];
    }
    Ok(acc)
}
