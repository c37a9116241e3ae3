//! Error types for skeleton reconstruction.

use thiserror::Error;

/// Errors returned by the reconstruction core and its temporal stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconstructError {
    /// A construction parameter is outside its valid range.
    #[error("invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// A direction could not be derived (zero-length vector, degenerate quaternion).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Per-field input sequences had different lengths and were truncated.
    #[error("sequence length mismatch: truncated to {shortest} frames (longest input {longest})")]
    SequenceLengthMismatch {
        /// Length of the shortest input, which is the output length.
        shortest: usize,
        /// Length of the longest input.
        longest: usize,
    },

    /// A frame arrived with a timestamp not after the previous one.
    #[error("out-of-order frame: {current} is not after {previous}")]
    OutOfOrderFrame {
        /// Timestamp of the previously accepted frame.
        previous: f64,
        /// Rejected timestamp.
        current: f64,
    },

    /// Not enough samples to perform the operation.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

impl ReconstructError {
    #[must_use]
    pub fn invalid_parameter(name: &'static str, value: impl Into<f64>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry(reason.into())
    }

    #[must_use]
    pub const fn out_of_order(previous: f64, current: f64) -> Self {
        Self::OutOfOrderFrame { previous, current }
    }

    #[must_use]
    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        Self::InsufficientData(reason.into())
    }

    /// True for errors a live stream should absorb by reusing the previous frame.
    #[must_use]
    pub const fn is_frame_local(&self) -> bool {
        matches!(self, Self::DegenerateGeometry(_))
    }
}

/// Result type for reconstruction operations.
pub type Result<T> = std::result::Result<T, ReconstructError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_parameter() {
        let err = ReconstructError::invalid_parameter("height", -1.0_f32);
        assert!(err.to_string().contains("invalid parameter"));
        assert!(err.to_string().contains("height"));
    }

    #[test]
    fn error_degenerate() {
        let err = ReconstructError::degenerate("forearm coincides with shoulder");
        assert!(err.to_string().contains("degenerate geometry"));
        assert!(err.is_frame_local());
    }

    #[test]
    fn error_sequence_mismatch() {
        let err = ReconstructError::SequenceLengthMismatch {
            shortest: 3,
            longest: 5,
        };
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains('5'));
        assert!(!err.is_frame_local());
    }

    #[test]
    fn error_out_of_order() {
        let err = ReconstructError::out_of_order(2.0, 1.5);
        assert!(err.to_string().contains("out-of-order"));
    }
}
