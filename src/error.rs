//! Error types for cvxatoms.

use thiserror::Error;

/// Error type for cvxatoms operations.
#[derive(Debug, Error)]
pub enum CvxError {
    /// Atom data failed validation at construction time.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Wrong number of arguments handed to an atom.
    #[error("{atom} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        atom: &'static str,
        expected: usize,
        got: usize,
    },

    /// A variable or parameter has no bound value.
    #[error("Missing value: {0}")]
    MissingValue(String),

    /// Auxiliary data does not match what the atom produces.
    #[error("Malformed atom data: {0}")]
    MalformedData(String),

    /// Expression is outside the supported affine fragment.
    #[error("Expression is not DCP: {0}")]
    NotDcp(String),
}

impl CvxError {
    pub(crate) fn shape_mismatch(expected: impl ToString, got: impl ToString) -> Self {
        CvxError::ShapeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

/// Result type for cvxatoms operations.
pub type Result<T> = std::result::Result<T, CvxError>;
