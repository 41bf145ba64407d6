use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// A raster payload whose buffer does not match its dimensions.
    #[error("raster payload shape mismatch: {width}x{height} needs {expected} bytes, got {actual}")]
    RasterShape {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// A binary leaf reached a JSON-only conversion path.
    #[error("binary payload ({0}) has no plain JSON representation")]
    BinaryLeaf(&'static str),

    #[error("unknown buffer kind: {0}")]
    UnknownBufferKind(String),
}
