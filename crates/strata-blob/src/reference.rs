//! The persisted blob reference.
//!
//! After externalization a binary payload is replaced in the tree by a small
//! JSON object pointing at its content-addressed file. The `kind` tag
//! records which payload shape to rebuild on hydration.

use serde::{Deserialize, Serialize};
use strata_types::{BufferKind, Digest};

use crate::error::{BlobError, BlobResult};

/// A content-addressed reference to an externalized binary payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BlobRef {
    /// A canvas pixel surface.
    Canvas {
        file: String,
        digest: Digest,
        width: u32,
        height: u32,
    },
    /// An image-data pixel surface.
    ImageData {
        file: String,
        digest: Digest,
        width: u32,
        height: u32,
    },
    /// A raw typed byte buffer, packed into a one-row image.
    ///
    /// The digest is optional on the wire: references written by other
    /// producers may omit it, in which case hydration skips the checksum
    /// comparison.
    Raw {
        file: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        digest: Option<Digest>,
        #[serde(rename = "typedArrayKind")]
        typed_array_kind: BufferKind,
        #[serde(rename = "byteLength")]
        byte_length: usize,
    },
}

impl BlobRef {
    /// File name of the referenced blob, relative to the blob directory.
    pub fn file(&self) -> &str {
        match self {
            Self::Canvas { file, .. } | Self::ImageData { file, .. } | Self::Raw { file, .. } => {
                file
            }
        }
    }

    /// Content digest of the referenced payload, when one was recorded.
    pub fn digest(&self) -> Option<&Digest> {
        match self {
            Self::Canvas { digest, .. } | Self::ImageData { digest, .. } => Some(digest),
            Self::Raw { digest, .. } => digest.as_ref(),
        }
    }

    /// Recognize a blob reference inside a JSON-safe tree.
    ///
    /// Returns `None` for ordinary maps. A map carrying both marker keys
    /// (`kind`, `file`) is committed to being a reference; if it then fails
    /// to parse that is an input error, not a plain map.
    pub fn detect(map: &serde_json::Map<String, serde_json::Value>) -> Option<BlobResult<Self>> {
        if !(map.contains_key("kind") && map.contains_key("file")) {
            return None;
        }
        let parsed = serde_json::from_value(serde_json::Value::Object(map.clone()))
            .map_err(|e| BlobError::MalformedReference(e.to_string()));
        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_key_names() {
        let reference = BlobRef::Raw {
            file: "ab.srf".to_string(),
            digest: Some(Digest::from_bytes(b"x")),
            typed_array_kind: BufferKind::F32,
            byte_length: 12,
        };
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["kind"], "Raw");
        assert_eq!(json["typedArrayKind"], "f32");
        assert_eq!(json["byteLength"], 12);
        assert_eq!(json["digest"], Digest::from_bytes(b"x").to_hex());
    }

    #[test]
    fn raw_reference_without_digest_still_detects() {
        let map = serde_json::json!({
            "kind": "Raw",
            "file": "dd.srf",
            "typedArrayKind": "u8",
            "byteLength": 3,
        });
        let serde_json::Value::Object(map) = map else { unreachable!() };
        let parsed = BlobRef::detect(&map).unwrap().unwrap();
        assert!(parsed.digest().is_none());
        assert_eq!(parsed.file(), "dd.srf");
        // The omitted digest never serializes as an explicit null.
        let json = serde_json::to_value(&parsed).unwrap();
        assert!(json.get("digest").is_none());
    }

    #[test]
    fn detect_ignores_plain_maps() {
        let map = serde_json::json!({"name": "layer", "kind": "group"});
        let serde_json::Value::Object(map) = map else { unreachable!() };
        assert!(BlobRef::detect(&map).is_none());
    }

    #[test]
    fn detect_rejects_malformed_reference() {
        let map = serde_json::json!({
            "kind": "Canvas",
            "file": "aa.srf",
            "digest": "not-hex",
            "width": 1,
            "height": 1,
        });
        let serde_json::Value::Object(map) = map else { unreachable!() };
        let result = BlobRef::detect(&map).unwrap();
        assert!(matches!(result, Err(BlobError::MalformedReference(_))));
    }

    #[test]
    fn roundtrip_canvas_reference() {
        let reference = BlobRef::Canvas {
            file: "cc.srf".to_string(),
            digest: Digest::from_bytes(b"pixels"),
            width: 4,
            height: 2,
        };
        let json = serde_json::to_value(&reference).unwrap();
        let serde_json::Value::Object(map) = json else { unreachable!() };
        let parsed = BlobRef::detect(&map).unwrap().unwrap();
        assert_eq!(parsed, reference);
    }
}
