//! The blob store: externalization and hydration walks.
//!
//! `externalize` rewrites a hydrated document tree into a JSON-safe tree,
//! moving every binary payload into a content-addressed file under the blob
//! directory. `hydrate` is the exact inverse. Both walk the tree recursively
//! and touch nothing but binary payloads and blob references.
//!
//! Files are written once per digest: an existing blob file is never
//! rewritten, and identical raw payloads within one run are memoized so the
//! encoder runs once per unique content. Nothing here deletes files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_types::{Digest, Raster, RasterKind, RawBuffer, Value};
use tracing::debug;

use crate::error::{BlobError, BlobResult};
use crate::raster::RasterCodec;
use crate::reference::BlobRef;

/// A blob directory plus the state of one externalization run.
///
/// The store owns the per-run digest memo; create a fresh store per
/// conversion. Concurrent runs against one directory are not coordinated —
/// callers must serialize them.
pub struct BlobStore {
    assets_dir: PathBuf,
    codec: Arc<dyn RasterCodec>,
    memo: HashMap<Digest, String>,
}

impl BlobStore {
    /// Open a store over `assets_dir`, creating the directory if needed.
    pub fn new(assets_dir: impl Into<PathBuf>, codec: Arc<dyn RasterCodec>) -> BlobResult<Self> {
        let assets_dir = assets_dir.into();
        fs::create_dir_all(&assets_dir)?;
        Ok(Self {
            assets_dir,
            codec,
            memo: HashMap::new(),
        })
    }

    /// The directory blob files live in.
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    // ---------------------------------------------------------------
    // Externalize
    // ---------------------------------------------------------------

    /// Rewrite a tree into JSON-safe form, writing binary payloads to
    /// content-addressed files and replacing them with [`BlobRef`]s.
    pub fn externalize(&mut self, value: &Value) -> BlobResult<serde_json::Value> {
        match value {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Number(n) => Ok(serde_json::Value::Number(n.clone())),
            Value::String(s) => Ok(serde_json::Value::String(s.clone())),
            Value::Array(items) => Ok(serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| self.externalize(item))
                    .collect::<BlobResult<Vec<_>>>()?,
            )),
            Value::Map(map) => {
                let mut out = serde_json::Map::new();
                for (key, item) in map {
                    out.insert(key.clone(), self.externalize(item)?);
                }
                Ok(serde_json::Value::Object(out))
            }
            Value::Raster(raster) => {
                let reference = self.write_raster(raster)?;
                serde_json::to_value(&reference)
                    .map_err(|e| BlobError::MalformedReference(e.to_string()))
            }
            Value::Buffer(buffer) => {
                let reference = self.write_raw(buffer)?;
                serde_json::to_value(&reference)
                    .map_err(|e| BlobError::MalformedReference(e.to_string()))
            }
        }
    }

    fn write_raster(&mut self, raster: &Raster) -> BlobResult<BlobRef> {
        let expected = raster.width as usize * raster.height as usize * 4;
        if raster.data.len() != expected {
            return Err(BlobError::UnsupportedPayload(format!(
                "raster buffer of {} bytes for {}x{} surface",
                raster.data.len(),
                raster.width,
                raster.height
            )));
        }
        let encoded = self.codec.encode(raster.width, raster.height, &raster.data)?;
        let digest = Digest::from_bytes(&encoded);
        let file = self.blob_file_name(&digest);
        self.write_if_absent(&file, &encoded)?;
        Ok(match raster.kind {
            RasterKind::Canvas => BlobRef::Canvas {
                file,
                digest,
                width: raster.width,
                height: raster.height,
            },
            RasterKind::ImageData => BlobRef::ImageData {
                file,
                digest,
                width: raster.width,
                height: raster.height,
            },
        })
    }

    fn write_raw(&mut self, buffer: &RawBuffer) -> BlobResult<BlobRef> {
        // The digest covers the original bytes, not the padded pixel row.
        let digest = Digest::from_bytes(&buffer.bytes);
        let file = match self.memo.get(&digest) {
            Some(file) => file.clone(),
            None => {
                let (width, row) = pack_row(&buffer.bytes);
                let encoded = self.codec.encode(width, 1, &row)?;
                let file = self.blob_file_name(&digest);
                self.write_if_absent(&file, &encoded)?;
                self.memo.insert(digest, file.clone());
                file
            }
        };
        Ok(BlobRef::Raw {
            file,
            digest: Some(digest),
            typed_array_kind: buffer.kind,
            byte_length: buffer.bytes.len(),
        })
    }

    fn blob_file_name(&self, digest: &Digest) -> String {
        format!("{}.{}", digest.to_hex(), self.codec.extension())
    }

    fn write_if_absent(&self, file: &str, bytes: &[u8]) -> BlobResult<()> {
        let path = self.assets_dir.join(file);
        if path.exists() {
            debug!(file, "blob already present, skipping write");
            return Ok(());
        }
        fs::write(&path, bytes)?;
        debug!(file, size = bytes.len(), "wrote blob");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Hydrate
    // ---------------------------------------------------------------

    /// Resolve every [`BlobRef`] in a JSON-safe tree back into its binary
    /// payload. Reads only; never writes.
    pub fn hydrate(&self, value: &serde_json::Value) -> BlobResult<Value> {
        match value {
            serde_json::Value::Array(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.hydrate(item))
                    .collect::<BlobResult<Vec<_>>>()?,
            )),
            serde_json::Value::Object(map) => {
                if let Some(reference) = BlobRef::detect(map) {
                    return self.hydrate_ref(&reference?);
                }
                let mut out = std::collections::BTreeMap::new();
                for (key, item) in map {
                    out.insert(key.clone(), self.hydrate(item)?);
                }
                Ok(Value::Map(out))
            }
            scalar => Ok(Value::from_json(scalar.clone())),
        }
    }

    fn hydrate_ref(&self, reference: &BlobRef) -> BlobResult<Value> {
        let bytes = fs::read(self.assets_dir.join(reference.file()))?;
        let decoded = self.codec.decode(&bytes).map_err(|e| match e {
            BlobError::Codec { reason, .. } => BlobError::Codec {
                file: reference.file().to_string(),
                reason,
            },
            other => other,
        })?;
        match reference {
            BlobRef::Canvas { file, width, height, .. }
            | BlobRef::ImageData { file, width, height, .. } => {
                if decoded.width != *width || decoded.height != *height {
                    return Err(BlobError::DimensionMismatch {
                        file: file.clone(),
                        expected_width: *width,
                        expected_height: *height,
                        actual_width: decoded.width,
                        actual_height: decoded.height,
                    });
                }
                let kind = match reference {
                    BlobRef::Canvas { .. } => RasterKind::Canvas,
                    _ => RasterKind::ImageData,
                };
                Ok(Value::Raster(Raster::new(
                    kind,
                    decoded.width,
                    decoded.height,
                    decoded.rgba,
                )?))
            }
            BlobRef::Raw {
                file,
                digest,
                typed_array_kind,
                byte_length,
            } => {
                if *byte_length > decoded.rgba.len() {
                    return Err(BlobError::TruncatedBlob {
                        file: file.clone(),
                        recorded: *byte_length,
                        available: decoded.rgba.len(),
                    });
                }
                // Undo the zero-padding, then verify against the recorded
                // digest of the original bytes. References from other
                // producers may carry no digest; those hydrate unchecked.
                let bytes = decoded.rgba[..*byte_length].to_vec();
                if let Some(digest) = digest {
                    let computed = Digest::from_bytes(&bytes);
                    if computed != *digest {
                        return Err(BlobError::ChecksumMismatch {
                            file: file.clone(),
                            expected: digest.to_hex(),
                            computed: computed.to_hex(),
                        });
                    }
                }
                Ok(Value::Buffer(RawBuffer::new(*typed_array_kind, bytes)))
            }
        }
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("assets_dir", &self.assets_dir)
            .field("memoized", &self.memo.len())
            .finish()
    }
}

/// Pack raw bytes into a one-row RGBA surface: width = ⌈len / 4⌉ (at least
/// one pixel), zero-padded to the 4-byte pixel boundary.
fn pack_row(bytes: &[u8]) -> (u32, Vec<u8>) {
    let pixels = bytes.len().div_ceil(4).max(1);
    let mut row = vec![0u8; pixels * 4];
    row[..bytes.len()].copy_from_slice(bytes);
    (pixels as u32, row)
}
