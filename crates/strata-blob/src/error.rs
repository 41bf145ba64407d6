use strata_types::TypeError;
use thiserror::Error;

/// Errors from blob store operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Decoded image dimensions disagree with the recorded dimensions.
    #[error(
        "dimension mismatch for {file}: recorded {expected_width}x{expected_height}, \
         decoded {actual_width}x{actual_height}"
    )]
    DimensionMismatch {
        file: String,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// Recomputed digest of a hydrated raw payload disagrees with the
    /// recorded digest. Signals blob-directory corruption or tampering.
    #[error("checksum mismatch for {file}: expected {expected}, computed {computed}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        computed: String,
    },

    /// A blob file holds fewer bytes than its reference records.
    #[error("blob {file} too short: recorded {recorded} bytes, file holds {available}")]
    TruncatedBlob {
        file: String,
        recorded: usize,
        available: usize,
    },

    /// A payload the externalization codec cannot represent.
    #[error("unsupported payload: {0}")]
    UnsupportedPayload(String),

    /// Raster codec failure while encoding or decoding a blob file.
    #[error("raster codec error for {file}: {reason}")]
    Codec { file: String, reason: String },

    /// A value that looks like a blob reference but does not parse as one.
    #[error("malformed blob reference: {0}")]
    MalformedReference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;
