//! Container persistence and conversion pipelines for Strata.
//!
//! A document lives in two shapes: a hydrated tree full of binary payloads
//! on the codec side, and a persisted container (JSON tree + metadata +
//! blob directory) on disk. This crate owns the container format, the
//! export/import pipelines between the shapes, and the human-editable
//! layer-info projection written alongside each container.

pub mod codec;
pub mod container;
pub mod error;
pub mod pipeline;
pub mod project;

pub use codec::DocumentCodec;
pub use container::{normalize_slashes, relative_assets_dir, Container, ContainerMeta, TOOL_NAME};
pub use error::{DocError, DocResult};
pub use pipeline::{
    export_file, export_tree, import_file, import_tree, layers_sidecar_path, normalize_rasters,
    ExportOptions,
};
pub use project::{project_layers, LayerId, LayerInfo};
