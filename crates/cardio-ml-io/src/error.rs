use cardio_ml_core::MlError;
use thiserror::Error;

/// Errors raised while reading or writing workflow files.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Ml(#[from] MlError),
}

pub type IoResult<T> = Result<T, IoError>;
