//! Id-addressed partial patching of Strata layer trees.
//!
//! A patch is a partial spec whose outermost node names an existing layer
//! id. Nested spec nodes reuse existing layers by id or describe new ones;
//! the engine rebuilds the addressed subtree accordingly, allocates fresh
//! ids for new layers, prunes groups left empty, and refreshes the
//! container's canonical digest and layer projection.
//!
//! All operations are in-memory; filesystem I/O is the responsibility of
//! the CLI layer.

pub mod engine;
pub mod error;
pub mod index;
pub mod spec;

pub use engine::apply_patch;
pub use error::{PatchError, PatchResult};
pub use index::{id_key, NodePath, TreeIndex};
pub use spec::PartialSpec;
