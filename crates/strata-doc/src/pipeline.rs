//! Export and import pipelines.
//!
//! Export: document tree → externalized blobs + container file + layer-info
//! sidecar. Import: container file → verified blobs → hydrated document
//! tree. The document codec at the outer edge is only touched by the
//! `*_file` wrappers; the tree-level entry points are codec-free.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use strata_blob::{BlobStore, RasterCodec};
use strata_canon::canonical_digest_json;
use strata_types::{RasterKind, Value};
use tracing::{debug, warn};

use crate::codec::DocumentCodec;
use crate::container::{relative_assets_dir, Container, ContainerMeta, TOOL_NAME};
use crate::error::DocResult;
use crate::project::project_layers;

/// Options for exporting a document tree.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Blob directory, relative to the container file.
    pub assets_dir: String,
    /// Source file name recorded in metadata.
    pub input_file_name: Option<String>,
    /// Source file size recorded in metadata.
    pub input_size: Option<u64>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            assets_dir: "images".to_string(),
            input_file_name: None,
            input_size: None,
        }
    }
}

/// Externalize a document tree and persist it as a container.
///
/// Writes blob files under the assets directory, the container itself at
/// `container_path`, and a best-effort `.layers.json` sidecar next to it.
pub fn export_tree(
    doc: &Value,
    container_path: &Path,
    options: &ExportOptions,
    raster: Arc<dyn RasterCodec>,
) -> DocResult<Container> {
    let base = container_path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(base)?;
    let assets_abs = base.join(&options.assets_dir);

    let mut store = BlobStore::new(&assets_abs, raster)?;
    let tree = store.externalize(doc)?;
    let canonical_digest = canonical_digest_json(&tree)?;

    let container = Container {
        meta: ContainerMeta {
            tool: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            input_file_name: options.input_file_name.clone(),
            input_size: options.input_size,
            assets_dir: relative_assets_dir(container_path, &assets_abs),
            canonical_digest,
        },
        tree,
    };
    container.save(container_path)?;
    debug!(
        path = %container_path.display(),
        digest = %canonical_digest.short_hex(),
        "wrote container"
    );

    // The sidecar is a convenience view; its failure must not undo the
    // container write.
    if let Err(e) = write_layers_sidecar(&container, container_path) {
        warn!(error = %e, "failed to write layer-info sidecar");
    }
    Ok(container)
}

/// Load a container and hydrate its tree back into a document.
///
/// The per-blob integrity checks are enforced; the container-wide canonical
/// digest is advisory and only logged on mismatch.
pub fn import_tree(container_path: &Path, raster: Arc<dyn RasterCodec>) -> DocResult<Value> {
    let container = Container::load(container_path)?;

    match canonical_digest_json(&container.tree) {
        Ok(computed) if computed != container.meta.canonical_digest => warn!(
            recorded = %container.meta.canonical_digest.short_hex(),
            computed = %computed.short_hex(),
            "canonical digest mismatch; container was edited after export"
        ),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not recompute canonical digest"),
    }

    let store = BlobStore::new(container.assets_dir_abs(container_path), raster)?;
    let mut doc = store.hydrate(&container.tree)?;
    normalize_rasters(&mut doc);
    Ok(doc)
}

/// Export straight from a native document file.
pub fn export_file(
    input: &Path,
    container_path: &Path,
    options: &ExportOptions,
    codec: &dyn DocumentCodec,
    raster: Arc<dyn RasterCodec>,
) -> DocResult<Container> {
    let bytes = fs::read(input)?;
    let doc = codec.decode(&bytes)?;
    let options = ExportOptions {
        assets_dir: options.assets_dir.clone(),
        input_file_name: input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
        input_size: Some(bytes.len() as u64),
    };
    export_tree(&doc, container_path, &options, raster)
}

/// Import a container and write the native document file.
pub fn import_file(
    container_path: &Path,
    output: &Path,
    codec: &dyn DocumentCodec,
    raster: Arc<dyn RasterCodec>,
) -> DocResult<()> {
    let doc = import_tree(container_path, raster)?;
    let bytes = codec.encode(&doc)?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, bytes)?;
    Ok(())
}

/// Path of the layer-info sidecar for a container file.
pub fn layers_sidecar_path(container_path: &Path) -> PathBuf {
    let stem = container_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "container".to_string());
    container_path.with_file_name(format!("{stem}.layers.json"))
}

fn write_layers_sidecar(container: &Container, container_path: &Path) -> DocResult<()> {
    let layers = project_layers(&container.tree, &container.meta.assets_dir);
    let text = serde_json::to_string_pretty(&layers)
        .map_err(|e| crate::error::DocError::Serialization(e.to_string()))?;
    fs::write(layers_sidecar_path(container_path), text)?;
    Ok(())
}

/// Move hydrated canvas payloads under the `imageData` key.
///
/// Document writers consume `imageData`; a decoded canvas is the same pixels
/// without a live drawing surface, so after hydration the `canvas` key is
/// retired and its payload re-tagged.
pub fn normalize_rasters(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(normalize_rasters),
        Value::Map(map) => {
            if matches!(map.get("canvas"), Some(Value::Raster(_))) {
                if let Some(Value::Raster(mut raster)) = map.remove("canvas") {
                    if !map.contains_key("imageData") {
                        raster.kind = RasterKind::ImageData;
                        map.insert("imageData".to_string(), Value::Raster(raster));
                    }
                }
            }
            map.values_mut().for_each(normalize_rasters);
        }
        _ => {}
    }
}
