/// Crate-level error type for matrix profile computation.
///
/// Validation variants are raised before any work starts. `Numerical` and
/// `Cancelled` abort a request that was already running; in every case no
/// partial profile is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum MatrixProfileError {
    /// Subsequence length is below 2 or longer than one of the inputs.
    #[error("invalid subsequence length m={m} for series of length {len} (need 2 <= m <= len)")]
    InvalidWindow { m: usize, len: usize },

    /// More motifs/discords requested than the profile holds.
    #[error("requested {n} entries but the profile only has {available}")]
    TooManyRequested { n: usize, available: usize },

    /// A window index outside the profile.
    #[error("index {index} out of range for profile of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Engine configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input series contains NaN or an infinity.
    #[error("series contains a non-finite value at index {index}")]
    NonFinite { index: usize },

    /// Two arrays that must be parallel have different lengths.
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    /// The similarity transform or distance evaluation failed.
    #[error("numerical failure: {0}")]
    Numerical(String),

    /// The caller raised the cancellation flag between tiles.
    #[error("computation cancelled")]
    Cancelled,
}

impl MatrixProfileError {
    /// Creates a `MatrixProfileError::Numerical`.
    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }

    /// Creates a `MatrixProfileError::InvalidConfig`.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for errors caused by bad input rather than a failed computation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidWindow { .. }
                | Self::TooManyRequested { .. }
                | Self::IndexOutOfRange { .. }
                | Self::InvalidConfig(_)
                | Self::NonFinite { .. }
                | Self::LengthMismatch { .. }
        )
    }
}

/// Convenience Result type for matrix profile operations.
pub type Result<T> = std::result::Result<T, MatrixProfileError>;

/// Check `2 <= m <= len`.
pub(crate) fn check_window(m: usize, len: usize) -> Result<()> {
    if m < 2 || m > len {
        return Err(MatrixProfileError::InvalidWindow { m, len });
    }
    Ok(())
}

/// Reject NaN and infinities.
pub(crate) fn check_finite(ts: &[f64]) -> Result<()> {
    match ts.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(MatrixProfileError::NonFinite { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        assert!(check_window(2, 2).is_ok());
        assert!(check_window(5, 10).is_ok());
        assert_eq!(
            check_window(1, 10),
            Err(MatrixProfileError::InvalidWindow { m: 1, len: 10 })
        );
        assert_eq!(
            check_window(11, 10),
            Err(MatrixProfileError::InvalidWindow { m: 11, len: 10 })
        );
    }

    #[test]
    fn test_finite_check_reports_first_offender() {
        let ts = [1.0, 2.0, f64::NAN, f64::INFINITY];
        assert_eq!(
            check_finite(&ts),
            Err(MatrixProfileError::NonFinite { index: 2 })
        );
        assert!(check_finite(&[0.0, -1.5]).is_ok());
    }

    #[test]
    fn test_validation_vs_numerical() {
        let window = MatrixProfileError::InvalidWindow { m: 1, len: 3 };
        assert!(window.is_validation());
        let too_many = MatrixProfileError::TooManyRequested { n: 4, available: 3 };
        assert!(too_many.is_validation());
        assert!(!MatrixProfileError::numerical("fft").is_validation());
        assert!(!MatrixProfileError::Cancelled.is_validation());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            MatrixProfileError::Cancelled.to_string(),
            "computation cancelled"
        );
        assert_eq!(
            MatrixProfileError::numerical("inverse transform").to_string(),
            "numerical failure: inverse transform"
        );
    }
}
