use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("out of bounds")]
    OutOfBounds,
    #[error("invalid stride")]
    InvalidStride,
    /// Shape, count or range problem detected before any numeric work.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Singular or under-determined curve fit.
    #[error("fitting failed: {0}")]
    Fitting(String),
}

impl Error {
    pub fn fitting(msg: impl Into<String>) -> Self {
        Self::Fitting(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Checks that two coordinate slices have the same length.
pub fn ensure_same_len(a: &[f64], b: &[f64]) -> Result<usize, Error> {
    if a.len() != b.len() {
        return Err(Error::SizeMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.len())
}

#[cfg(test)]
mod tests {
    use super::{Error, ensure_same_len};

    #[test]
    fn display_messages() {
        let e = Error::SizeMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(e.to_string(), "size mismatch: expected 3, got 2");
        assert_eq!(
            Error::invalid("xi out of range").to_string(),
            "invalid input: xi out of range"
        );
    }

    #[test]
    fn same_len_check() {
        assert_eq!(ensure_same_len(&[1.0, 2.0], &[3.0, 4.0]), Ok(2));
        assert!(matches!(
            ensure_same_len(&[1.0], &[3.0, 4.0]),
            Err(Error::SizeMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }
}
