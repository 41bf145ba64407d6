//! Foundation types for Strata.
//!
//! Strata moves layered-image documents between an in-memory tree with
//! embedded binary payloads and a content-addressed on-disk form. This crate
//! provides the types every other Strata crate depends on.
//!
//! # Key Types
//!
//! - [`Digest`] — Content address (BLAKE3 hash, lowercase hex on the wire)
//! - [`Value`] — Document-tree node: JSON-like data plus binary leaves
//! - [`Raster`] — An RGBA8 pixel surface (canvas or image-data payload)
//! - [`RawBuffer`] — A raw typed byte buffer
//! - [`NodeKind`] — Layer classification (group, text, pixel, ...)

pub mod digest;
pub mod error;
pub mod kind;
pub mod value;

pub use digest::Digest;
pub use error::TypeError;
pub use kind::NodeKind;
pub use value::{BufferKind, Raster, RasterKind, RawBuffer, Value};
