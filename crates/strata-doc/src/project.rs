//! The layer-info projection: a reduced, human-editable view of the tree.
//!
//! Carries only `id`, `name`, `type`, `image`, and `children`. It is written
//! alongside the container for inspection and patch authoring; the container
//! tree stays the source of truth for round-tripping.

use serde::{Deserialize, Serialize};
use strata_types::NodeKind;

/// Identifier of a projected layer: the source tree may use either strings
/// or integers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerId {
    Number(i64),
    Text(String),
}

impl LayerId {
    /// String key form, used for id-index lookups.
    pub fn key(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One projected layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub id: LayerId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<LayerInfo>>,
}

/// Project the top-level layers of a JSON-safe tree.
///
/// Nodes without an id get the next unused sequential integer starting at 1,
/// scoped to this call; nothing is written back to the tree. Explicit
/// `type` and `image` fields win over structural detection.
pub fn project_layers(tree: &serde_json::Value, assets_dir_rel: &str) -> Vec<LayerInfo> {
    let mut next_auto = 1i64;
    tree.get("children")
        .and_then(|c| c.as_array())
        .map(|children| {
            children
                .iter()
                .map(|child| project_node(child, assets_dir_rel, &mut next_auto))
                .collect()
        })
        .unwrap_or_default()
}

fn project_node(node: &serde_json::Value, assets_dir_rel: &str, next_auto: &mut i64) -> LayerInfo {
    let explicit_id = match node.get("id") {
        Some(serde_json::Value::Number(n)) => n.as_i64().map(LayerId::Number),
        Some(serde_json::Value::String(s)) => Some(LayerId::Text(s.clone())),
        _ => None,
    };
    let id = explicit_id.unwrap_or_else(|| {
        let id = LayerId::Number(*next_auto);
        *next_auto += 1;
        id
    });
    let name = node
        .get("name")
        .and_then(|n| n.as_str())
        .unwrap_or_default()
        .to_string();
    let kind = match node.get("type").and_then(|t| t.as_str()) {
        Some(explicit) => explicit.to_string(),
        None => match node.as_object() {
            Some(map) => NodeKind::classify(map).as_str().to_string(),
            None => NodeKind::Layer.as_str().to_string(),
        },
    };
    let image = match node.get("image").and_then(|i| i.as_str()) {
        Some(explicit) => Some(explicit.to_string()),
        None => pick_blob_file(node).map(|file| join_assets_path(assets_dir_rel, &file)),
    };
    let children = node
        .get("children")
        .and_then(|c| c.as_array())
        .filter(|c| !c.is_empty())
        .map(|c| {
            c.iter()
                .map(|child| project_node(child, assets_dir_rel, next_auto))
                .collect()
        });
    LayerInfo {
        id,
        name,
        kind,
        image,
        children,
    }
}

/// Blob file referenced by a node's pixel payload, canvas first.
fn pick_blob_file(node: &serde_json::Value) -> Option<String> {
    for key in ["canvas", "imageData"] {
        if let Some(file) = node
            .get(key)
            .and_then(|payload| payload.get("file"))
            .and_then(|f| f.as_str())
        {
            return Some(file.to_string());
        }
    }
    None
}

fn join_assets_path(assets_dir_rel: &str, file: &str) -> String {
    let dir = assets_dir_rel.replace('\\', "/");
    if dir.is_empty() || dir == "." {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}
