use thiserror::Error;

/// Errors from canonical serialization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for canonical serialization.
pub type CanonResult<T> = Result<T, CanonError>;
