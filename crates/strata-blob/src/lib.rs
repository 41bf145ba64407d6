//! Content-addressed blob storage for Strata document trees.
//!
//! A hydrated document tree embeds binary payloads (pixel surfaces, raw
//! typed buffers) that JSON cannot carry. This crate moves those payloads
//! out into a flat directory of digest-named image files and back:
//!
//! - [`BlobStore::externalize`] — tree with payloads → JSON-safe tree +
//!   blob files
//! - [`BlobStore::hydrate`] — JSON-safe tree + blob files → tree with
//!   payloads, with per-blob integrity checks
//!
//! Raw byte buffers are packed into one-row images (width ⌈len/4⌉) so a
//! single raster codec covers every payload shape. The digest of a raw blob
//! always covers the original unpadded bytes.
//!
//! The image format itself is behind the [`RasterCodec`] boundary; this
//! crate never decodes or encodes an image format on its own.

pub mod error;
pub mod raster;
pub mod reference;
pub mod store;

pub use error::{BlobError, BlobResult};
pub use raster::{DecodedImage, FlatRasterCodec, RasterCodec};
pub use reference::BlobRef;
pub use store::BlobStore;
