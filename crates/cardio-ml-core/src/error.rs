use thiserror::Error;

/// Error type shared by every cardio-ml library crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MlError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Index out of bounds: index {index} for axis {axis} with size {size}")]
    IndexOutOfBounds {
        index: usize,
        axis: usize,
        size: usize,
    },

    #[error("Invalid axis: {axis} for tensor with {ndim} dimensions")]
    InvalidAxis { axis: usize, ndim: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Empty tensor")]
    EmptyTensor,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Positive label {label:?} is not one of the classes {classes:?}")]
    UnknownLabel { label: String, classes: Vec<String> },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Estimator is not fitted yet")]
    NotFitted,

    #[error("No candidates to select from")]
    EmptyCandidates,

    #[error("Score of candidate '{candidate}' cannot be compared")]
    NonComparableScore { candidate: String },

    #[error("Candidate '{candidate}' has no fitted best estimator")]
    MissingEstimator { candidate: String },
}

impl MlError {
    /// Shorthand for [`MlError::InvalidParameter`].
    pub fn invalid_param(name: &str, reason: impl Into<String>) -> Self {
        MlError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the configuration errors raised before any fitting starts.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            MlError::InvalidArgument(_)
                | MlError::UnknownLabel { .. }
                | MlError::InvalidParameter { .. }
        )
    }
}

pub type MlResult<T> = Result<T, MlError>;
