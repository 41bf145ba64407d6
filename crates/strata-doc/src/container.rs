//! The persisted container: metadata plus the JSON-safe document tree.
//!
//! A container file is UTF-8 JSON with two top-level keys, `meta` and
//! `tree`. The tree is the externalized document; `meta.assetsDir` locates
//! the blob directory relative to the container file so the pair can be
//! moved together.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_types::Digest;

use crate::error::{DocError, DocResult};

/// Name of the tool recorded in container metadata.
pub const TOOL_NAME: &str = "strata";

/// Container metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerMeta {
    /// Producing tool, always [`TOOL_NAME`] for containers written here.
    pub tool: String,
    /// Version of the producing tool.
    pub version: String,
    /// When the container was written.
    pub created_at: DateTime<Utc>,
    /// File name of the source document, when exported from one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_file_name: Option<String>,
    /// Byte size of the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_size: Option<u64>,
    /// Blob directory, slash-normalized, relative to the container file.
    pub assets_dir: String,
    /// Digest of the canonical form of `tree`.
    pub canonical_digest: Digest,
}

/// A persisted document: metadata and the JSON-safe tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub meta: ContainerMeta,
    pub tree: serde_json::Value,
}

impl Container {
    /// Load a container from disk.
    ///
    /// Fails fast with [`DocError::InputFormat`] when the file is not a
    /// JSON object or has no `tree` field; nothing is partially loaded.
    pub fn load(path: &Path) -> DocResult<Self> {
        let text = fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| DocError::InputFormat(format!("not well-formed JSON: {e}")))?;
        let serde_json::Value::Object(ref map) = json else {
            return Err(DocError::InputFormat("top level is not an object".to_string()));
        };
        if !map.contains_key("tree") {
            return Err(DocError::InputFormat("missing \"tree\" field".to_string()));
        }
        serde_json::from_value(json).map_err(|e| DocError::InputFormat(e.to_string()))
    }

    /// Write the container to disk as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> DocResult<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| DocError::Serialization(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Absolute blob directory for a container stored at `container_path`.
    pub fn assets_dir_abs(&self, container_path: &Path) -> PathBuf {
        let base = container_path.parent().unwrap_or_else(|| Path::new("."));
        base.join(normalize_slashes(&self.meta.assets_dir))
    }
}

/// Normalize a relative path to forward slashes for storage in metadata.
pub fn normalize_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Render a path relative to the container's directory for `assetsDir`.
pub fn relative_assets_dir(container_path: &Path, assets_dir: &Path) -> String {
    let base = container_path.parent().unwrap_or_else(|| Path::new("."));
    let rel = assets_dir.strip_prefix(base).unwrap_or(assets_dir);
    let rendered = rel.to_string_lossy();
    if rendered.is_empty() {
        ".".to_string()
    } else {
        normalize_slashes(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meta() -> ContainerMeta {
        ContainerMeta {
            tool: TOOL_NAME.to_string(),
            version: "0.1.0".to_string(),
            created_at: Utc::now(),
            input_file_name: Some("art.psd".to_string()),
            input_size: Some(1024),
            assets_dir: "images".to_string(),
            canonical_digest: Digest::from_bytes(b"tree"),
        }
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let container = Container {
            meta: sample_meta(),
            tree: serde_json::json!({"children": [{"id": 1}]}),
        };
        container.save(&path).unwrap();
        let loaded = Container::load(&path).unwrap();
        assert_eq!(loaded, container);
    }

    #[test]
    fn meta_uses_camel_case_keys() {
        let json = serde_json::to_value(sample_meta()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("inputFileName").is_some());
        assert!(json.get("assetsDir").is_some());
        assert!(json.get("canonicalDigest").is_some());
    }

    #[test]
    fn load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Container::load(&path),
            Err(DocError::InputFormat(_))
        ));
    }

    #[test]
    fn load_rejects_missing_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-tree.json");
        fs::write(&path, r#"{"meta": {}}"#).unwrap();
        assert!(matches!(
            Container::load(&path),
            Err(DocError::InputFormat(_))
        ));
    }

    #[test]
    fn load_rejects_non_object_top_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("array.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            Container::load(&path),
            Err(DocError::InputFormat(_))
        ));
    }

    #[test]
    fn assets_dir_resolves_next_to_container() {
        let container = Container {
            meta: sample_meta(),
            tree: serde_json::json!({}),
        };
        let abs = container.assets_dir_abs(Path::new("/out/doc.json"));
        assert_eq!(abs, PathBuf::from("/out/images"));
    }

    #[test]
    fn relative_assets_dir_is_slash_normalized() {
        let rel = relative_assets_dir(Path::new("/out/doc.json"), Path::new("/out/images"));
        assert_eq!(rel, "images");
        let dot = relative_assets_dir(Path::new("/out/doc.json"), Path::new("/out"));
        assert_eq!(dot, ".");
    }
}
