use strata_canon::CanonError;
use thiserror::Error;

/// Errors from patch operations.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The outermost spec node has no id.
    #[error("patch root must carry an id")]
    MissingRootId,

    /// The outermost spec names an id absent from the target tree.
    #[error("patch root id {0} does not exist in the tree")]
    UnknownRootId(String),

    /// The addressed node is not an object and cannot take layer fields.
    #[error("patch target {0} is not an object node")]
    TargetNotObject(String),

    #[error(transparent)]
    Canon(#[from] CanonError),
}

/// Result alias for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;
