//! Error types for fl-output.

use thiserror::Error;

use fl_ware::WareError;

/// Errors that can occur when writing variable output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("run environment has no `{0}` entry")]
    MissingEnv(&'static str),

    #[error("output written before the file was opened")]
    NotOpen,
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;

impl From<OutputError> for WareError {
    fn from(e: OutputError) -> Self {
        WareError::Failed(e.to_string())
    }
}
