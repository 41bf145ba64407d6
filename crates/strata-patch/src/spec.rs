//! The partial specification supplied by a patch caller.
//!
//! A spec mirrors the layer-info shape: the known fields are typed, and
//! anything else rides along in `extra` and is copied verbatim onto
//! synthesized nodes. The outermost node must name an existing id; nested
//! nodes without ids describe layers to create.

use serde::{Deserialize, Serialize};
use strata_doc::LayerId;

/// One node of a patch specification.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<LayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PartialSpec>>,
    /// Arbitrary passthrough fields, preserved on synthesized nodes.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PartialSpec {
    /// Non-structural fields for a node synthesized from this spec.
    ///
    /// `id` and `children` are excluded: the engine forces a fresh id and
    /// builds children itself.
    pub fn node_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        if let Some(name) = &self.name {
            map.insert("name".to_string(), serde_json::json!(name));
        }
        if let Some(kind) = &self.kind {
            map.insert("type".to_string(), serde_json::json!(kind));
        }
        if let Some(image) = &self.image {
            map.insert("image".to_string(), serde_json::json!(image));
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    /// Child specs, or an empty slice.
    pub fn children(&self) -> &[PartialSpec] {
        self.children.as_deref().unwrap_or_default()
    }
}
