//! The raster codec boundary.
//!
//! Strata stores every blob as an image file but does not implement any
//! image format itself. Callers plug in a codec (typically PNG-backed) that
//! converts between `(width, height, RGBA8 bytes)` and encoded file bytes.

use crate::error::{BlobError, BlobResult};

/// A decoded raster image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, row-major; `width * height * 4` long.
    pub rgba: Vec<u8>,
}

/// Converts pixel surfaces to and from an image file format.
///
/// Implementations must be lossless over RGBA8: `decode(encode(w, h, px))`
/// must return exactly `(w, h, px)`. Lossy codecs would break document
/// round-tripping and raw-byte recovery.
pub trait RasterCodec: Send + Sync {
    /// Encode an RGBA8 surface into file bytes.
    fn encode(&self, width: u32, height: u32, rgba: &[u8]) -> BlobResult<Vec<u8>>;

    /// Decode file bytes into an RGBA8 surface.
    fn decode(&self, bytes: &[u8]) -> BlobResult<DecodedImage>;

    /// File extension for blobs written by this codec (without the dot).
    fn extension(&self) -> &'static str;
}

/// Uncompressed raster codec: a 12-byte header followed by raw RGBA8 rows.
///
/// Deterministic and lossless, with no external format dependency. Useful
/// for tests and for pipelines that post-process blobs themselves; real
/// deployments normally supply a PNG codec instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatRasterCodec;

const FLAT_MAGIC: &[u8; 4] = b"SRF0";

impl RasterCodec for FlatRasterCodec {
    fn encode(&self, width: u32, height: u32, rgba: &[u8]) -> BlobResult<Vec<u8>> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(BlobError::UnsupportedPayload(format!(
                "flat codec: {width}x{height} needs {expected} bytes, got {}",
                rgba.len()
            )));
        }
        let mut out = Vec::with_capacity(12 + rgba.len());
        out.extend_from_slice(FLAT_MAGIC);
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(rgba);
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> BlobResult<DecodedImage> {
        if bytes.len() < 12 || &bytes[..4] != FLAT_MAGIC {
            return Err(BlobError::Codec {
                file: String::new(),
                reason: "not a flat raster stream".to_string(),
            });
        }
        let width = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let height = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let expected = width as usize * height as usize * 4;
        let rgba = &bytes[12..];
        if rgba.len() != expected {
            return Err(BlobError::Codec {
                file: String::new(),
                reason: format!(
                    "flat raster payload length {} does not match {width}x{height}",
                    rgba.len()
                ),
            });
        }
        Ok(DecodedImage {
            width,
            height,
            rgba: rgba.to_vec(),
        })
    }

    fn extension(&self) -> &'static str {
        "srf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_codec_roundtrip() {
        let codec = FlatRasterCodec;
        let rgba: Vec<u8> = (0..2 * 3 * 4).map(|i| i as u8).collect();
        let encoded = codec.encode(2, 3, &rgba).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.width, 2);
        assert_eq!(decoded.height, 3);
        assert_eq!(decoded.rgba, rgba);
    }

    #[test]
    fn flat_codec_rejects_bad_length() {
        let codec = FlatRasterCodec;
        assert!(codec.encode(2, 2, &[0; 15]).is_err());
    }

    #[test]
    fn flat_codec_rejects_foreign_bytes() {
        let codec = FlatRasterCodec;
        assert!(codec.decode(b"definitely not a raster").is_err());
    }
}
