//! The document codec boundary.
//!
//! Parsing and writing the native layered-image format is not Strata's job.
//! A codec implementation (e.g. a PSD reader/writer) sits at this boundary
//! and exchanges hydrated document trees with the pipelines.

use strata_types::Value;

use crate::error::DocResult;

/// Converts between native document bytes and hydrated document trees.
pub trait DocumentCodec: Send + Sync {
    /// Parse native document bytes into a document tree.
    fn decode(&self, bytes: &[u8]) -> DocResult<Value>;

    /// Write a document tree back out as native document bytes.
    fn encode(&self, tree: &Value) -> DocResult<Vec<u8>>;

    /// File extension of the native format (without the dot).
    fn extension(&self) -> &'static str;
}
