/// How samples outside `[0, len)` are resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderMode<T> {
    /// Repeat the edge sample.
    Clamp,
    /// Substitute a fixed value.
    Constant(T),
    /// Mirror around the edge sample without repeating it (`dcb|abcd|cba`).
    Reflect101,
}

/// Maps a possibly out-of-range index into `[0, len)`.
///
/// Returns `None` for `Constant` borders (the caller substitutes the fill
/// value) and for empty axes.
pub fn map_index<T>(i: isize, len: usize, mode: &BorderMode<T>) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if (0..len as isize).contains(&i) {
        return Some(i as usize);
    }

    match mode {
        BorderMode::Constant(_) => None,
        BorderMode::Clamp => Some(if i < 0 { 0 } else { len - 1 }),
        BorderMode::Reflect101 => {
            if len == 1 {
                return Some(0);
            }
            let period = (2 * len - 2) as isize;
            let r = i.rem_euclid(period) as usize;
            Some(if r < len { r } else { period as usize - r })
        }
    }
}

/// Fetches `line[i]` under the given border policy.
pub fn fetch(line: &[f64], i: isize, mode: &BorderMode<f64>) -> f64 {
    match map_index(i, line.len(), mode) {
        Some(idx) => line[idx],
        None => match mode {
            BorderMode::Constant(c) => *c,
            _ => f64::NAN,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{BorderMode, fetch, map_index};

    #[test]
    fn clamp_and_constant_mapping() {
        let clamp = BorderMode::<f64>::Clamp;
        assert_eq!(map_index(-3, 5, &clamp), Some(0));
        assert_eq!(map_index(4, 5, &clamp), Some(4));
        assert_eq!(map_index(99, 5, &clamp), Some(4));

        let constant = BorderMode::Constant(7.0);
        assert_eq!(map_index(2, 5, &constant), Some(2));
        assert_eq!(map_index(5, 5, &constant), None);
        assert_eq!(fetch(&[1.0, 2.0], -1, &constant), 7.0);
        assert_eq!(map_index(0, 0, &clamp), None);
    }

    #[test]
    fn reflect101_mirrors_without_repeating_edges() {
        let mode = BorderMode::<f64>::Reflect101;

        for i in -4..=4 {
            assert_eq!(map_index(i, 1, &mode), Some(0));
        }

        let cases_len4 = [(-3, 3), (-2, 2), (-1, 1), (0, 0), (3, 3), (4, 2), (5, 1), (6, 0), (7, 1)];
        for (i, expected) in cases_len4 {
            assert_eq!(map_index(i, 4, &mode), Some(expected), "index {i}");
        }

        let line = [10.0, 20.0, 30.0];
        assert_eq!(fetch(&line, -1, &mode), 20.0);
        assert_eq!(fetch(&line, 3, &mode), 20.0);
    }
}
