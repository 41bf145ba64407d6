use strata_blob::BlobError;
use strata_canon::CanonError;
use strata_types::TypeError;
use thiserror::Error;

/// Errors from container and pipeline operations.
#[derive(Debug, Error)]
pub enum DocError {
    /// The container JSON is not a well-formed object or lacks its tree.
    #[error("invalid container: {0}")]
    InputFormat(String),

    /// Failure inside the external document codec.
    #[error("document codec error: {0}")]
    DocumentCodec(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Canon(#[from] CanonError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for container and pipeline operations.
pub type DocResult<T> = Result<T, DocError>;
