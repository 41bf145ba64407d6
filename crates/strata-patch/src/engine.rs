//! The patch engine.
//!
//! `apply_patch` resolves a partial spec against a container's layer tree:
//! the root spec must address an existing node; nested specs either reuse
//! indexed nodes by id or synthesize new nodes under freshly allocated ids.
//! Groups whose resolved children come up empty are pruned. Only the
//! addressed subtree changes; afterwards the container's canonical digest
//! is recomputed and the layer projection regenerated with the caller's
//! `type`/`image`/`name` overrides re-applied.

use std::collections::BTreeMap;

use strata_canon::canonical_digest_json;
use strata_doc::{project_layers, Container, LayerInfo};
use tracing::warn;

use crate::error::{PatchError, PatchResult};
use crate::index::TreeIndex;
use crate::spec::PartialSpec;

/// Apply a partial spec to a container's tree, in memory.
///
/// On success the container's tree and canonical digest are updated and the
/// regenerated layer projection (with spec overrides merged) is returned.
/// On error the container is untouched.
pub fn apply_patch(container: &mut Container, spec: &PartialSpec) -> PatchResult<Vec<LayerInfo>> {
    let root_id = spec.id.as_ref().ok_or(PatchError::MissingRootId)?.key();
    let index = TreeIndex::build(&container.tree);
    let target_path = index
        .path(&root_id)
        .ok_or_else(|| PatchError::UnknownRootId(root_id.clone()))?
        .to_vec();

    // Resolve the replacement children against the unmodified tree first;
    // the tree is only mutated once resolution has fully succeeded.
    let mut next_id = index.max_numeric_id();
    let new_children = if spec.children().is_empty() {
        None
    } else {
        let resolved = spec
            .children()
            .iter()
            .map(|child| resolve_node(&container.tree, &index, &mut next_id, child, Some(&target_path)))
            .collect::<PatchResult<Vec<_>>>()?;
        Some(prune_empty_groups(resolved))
    };

    let target = TreeIndex::resolve_mut(&mut container.tree, &target_path)
        .ok_or_else(|| PatchError::UnknownRootId(root_id.clone()))?;
    let target = target
        .as_object_mut()
        .ok_or_else(|| PatchError::TargetNotObject(root_id.clone()))?;
    if let Some(name) = &spec.name {
        target.insert("name".to_string(), serde_json::json!(name));
    }
    match new_children {
        Some(children) if !children.is_empty() => {
            target.insert("children".to_string(), serde_json::Value::Array(children));
        }
        // A node with no children is never a group; drop the field outright.
        _ => {
            target.remove("children");
        }
    }

    container.meta.canonical_digest = canonical_digest_json(&container.tree)?;

    let mut layers = project_layers(&container.tree, &container.meta.assets_dir);
    let overrides = collect_overrides(spec);
    merge_overrides(&mut layers, &overrides);
    Ok(layers)
}

/// Resolve one child spec into a concrete tree node.
fn resolve_node(
    tree: &serde_json::Value,
    index: &TreeIndex,
    next_id: &mut i64,
    spec: &PartialSpec,
    parent_path: Option<&[usize]>,
) -> PatchResult<serde_json::Value> {
    let existing_path = spec
        .id
        .as_ref()
        .and_then(|id| index.path(&id.key()))
        .map(|p| p.to_vec());

    let (mut node, own_path) = match existing_path {
        Some(path) => {
            let foreign = match parent_path {
                Some(parent) => path.is_empty() || &path[..path.len() - 1] != parent,
                None => true,
            };
            if foreign {
                // The original stays where it is; the patched position gets
                // a copy. Single-parent enforcement is the caller's problem.
                warn!(
                    id = %spec.id.as_ref().map(|i| i.key()).unwrap_or_default(),
                    "patch reuses a layer nested under a different parent; copying it"
                );
            }
            let node = TreeIndex::resolve(tree, &path)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            (node, Some(path))
        }
        None => {
            // Fresh layer: monotonically allocated integer id, all spec
            // fields copied through.
            *next_id += 1;
            let mut fields = spec.node_fields();
            fields.insert("id".to_string(), serde_json::json!(*next_id));
            (serde_json::Value::Object(fields), None)
        }
    };

    if own_path.is_some() {
        if let (Some(name), Some(map)) = (&spec.name, node.as_object_mut()) {
            map.insert("name".to_string(), serde_json::json!(name));
        }
    }

    let built = if spec.children().is_empty() {
        Vec::new()
    } else {
        let resolved = spec
            .children()
            .iter()
            .map(|child| resolve_node(tree, index, next_id, child, own_path.as_deref()))
            .collect::<PatchResult<Vec<_>>>()?;
        prune_empty_groups(resolved)
    };
    if let Some(map) = node.as_object_mut() {
        if built.is_empty() {
            map.remove("children");
        } else {
            map.insert("children".to_string(), serde_json::Value::Array(built));
        }
    }
    Ok(node)
}

/// Drop resolved children that declare themselves groups but ended up with
/// no children of their own.
fn prune_empty_groups(children: Vec<serde_json::Value>) -> Vec<serde_json::Value> {
    children
        .into_iter()
        .filter(|child| {
            let is_group = child.get("type").and_then(|t| t.as_str()) == Some("group");
            let has_children = child
                .get("children")
                .and_then(|c| c.as_array())
                .is_some_and(|c| !c.is_empty());
            !is_group || has_children
        })
        .collect()
}

#[derive(Default)]
struct Override {
    name: Option<String>,
    kind: Option<String>,
    image: Option<String>,
}

/// Caller-supplied presentation overrides, keyed by spec id.
fn collect_overrides(spec: &PartialSpec) -> BTreeMap<String, Override> {
    fn walk(spec: &PartialSpec, out: &mut BTreeMap<String, Override>) {
        if let Some(id) = &spec.id {
            if spec.name.is_some() || spec.kind.is_some() || spec.image.is_some() {
                out.insert(
                    id.key(),
                    Override {
                        name: spec.name.clone(),
                        kind: spec.kind.clone(),
                        image: spec.image.clone(),
                    },
                );
            }
        }
        for child in spec.children() {
            walk(child, out);
        }
    }
    let mut out = BTreeMap::new();
    walk(spec, &mut out);
    out
}

/// Re-apply spec overrides onto the regenerated projection so the sidecar
/// reflects caller intent even where structural detection would differ.
fn merge_overrides(layers: &mut [LayerInfo], overrides: &BTreeMap<String, Override>) {
    for layer in layers {
        if let Some(over) = overrides.get(&layer.id.key()) {
            if let Some(name) = &over.name {
                layer.name = name.clone();
            }
            if let Some(kind) = &over.kind {
                layer.kind = kind.clone();
            }
            if let Some(image) = &over.image {
                layer.image = Some(image.clone());
            }
        }
        if let Some(children) = &mut layer.children {
            merge_overrides(children, overrides);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use strata_doc::{ContainerMeta, LayerId, TOOL_NAME};

    fn container(tree: serde_json::Value) -> Container {
        let canonical_digest = canonical_digest_json(&tree).unwrap();
        Container {
            meta: ContainerMeta {
                tool: TOOL_NAME.to_string(),
                version: "0.1.0".to_string(),
                created_at: Utc::now(),
                input_file_name: None,
                input_size: None,
                assets_dir: "images".to_string(),
                canonical_digest,
            },
            tree,
        }
    }

    fn spec(json: serde_json::Value) -> PartialSpec {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn missing_root_id_is_rejected_before_mutation() {
        let mut c = container(serde_json::json!({"children": [{"id": 1}]}));
        let before = c.tree.clone();
        let err = apply_patch(&mut c, &spec(serde_json::json!({"name": "x"}))).unwrap_err();
        assert!(matches!(err, PatchError::MissingRootId));
        assert_eq!(c.tree, before);
    }

    #[test]
    fn unknown_root_id_is_rejected_before_mutation() {
        let mut c = container(serde_json::json!({"children": [{"id": 1}]}));
        let before = c.tree.clone();
        let err = apply_patch(&mut c, &spec(serde_json::json!({"id": 42}))).unwrap_err();
        assert!(matches!(err, PatchError::UnknownRootId(id) if id == "42"));
        assert_eq!(c.tree, before);
    }

    #[test]
    fn renames_a_reused_child_in_place() {
        let mut c = container(serde_json::json!({
            "children": [{"id": 1, "type": "group", "children": [
                {"id": 2, "type": "pixel", "opacity": 0.3},
            ]}],
        }));
        apply_patch(
            &mut c,
            &spec(serde_json::json!({"id": 1, "children": [{"id": 2, "name": "renamed"}]})),
        )
        .unwrap();
        let children = c.tree["children"][0]["children"].as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["id"], 2);
        assert_eq!(children[0]["name"], "renamed");
        // Non-spec fields of the reused node survive.
        assert_eq!(children[0]["opacity"], 0.3);
    }

    #[test]
    fn new_empty_group_is_allocated_then_pruned() {
        let mut c = container(serde_json::json!({
            "children": [{"id": 1, "type": "group", "children": [
                {"id": 2, "type": "pixel"},
            ]}],
        }));
        apply_patch(
            &mut c,
            &spec(serde_json::json!({"id": 1, "children": [{"type": "group"}]})),
        )
        .unwrap();
        assert!(c.tree["children"][0].get("children").is_none());
    }

    #[test]
    fn synthesized_nodes_get_distinct_fresh_ids() {
        let mut c = container(serde_json::json!({
            "children": [{"id": 7, "type": "group", "children": [{"id": 3}]}],
        }));
        apply_patch(
            &mut c,
            &spec(serde_json::json!({"id": 7, "children": [
                {"name": "a"},
                {"name": "b", "children": [{"name": "c"}]},
            ]})),
        )
        .unwrap();
        let children = c.tree["children"][0]["children"].as_array().unwrap();
        let a = children[0]["id"].as_i64().unwrap();
        let b = children[1]["id"].as_i64().unwrap();
        let inner = children[1]["children"][0]["id"].as_i64().unwrap();
        let mut ids = vec![a, b, inner];
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        // Allocation starts above the highest pre-existing id.
        assert!(ids.iter().all(|id| *id > 7));
    }

    #[test]
    fn synthesized_nodes_carry_passthrough_fields() {
        let mut c = container(serde_json::json!({"children": [{"id": 1}]}));
        apply_patch(
            &mut c,
            &spec(serde_json::json!({"id": 1, "children": [
                {"name": "fx", "type": "adjustment", "blendMode": "screen"},
            ]})),
        )
        .unwrap();
        let child = &c.tree["children"][0]["children"][0];
        assert_eq!(child["name"], "fx");
        assert_eq!(child["type"], "adjustment");
        assert_eq!(child["blendMode"], "screen");
        assert_eq!(child["id"], 2);
    }

    #[test]
    fn untouched_siblings_stay_byte_identical() {
        let sibling = serde_json::json!({"id": 9, "name": "keep", "children": [{"id": 10}]});
        let mut c = container(serde_json::json!({
            "children": [
                {"id": 1, "type": "group", "children": [{"id": 2}]},
                sibling,
            ],
        }));
        let sibling_digest = canonical_digest_json(&c.tree["children"][1]).unwrap();
        apply_patch(
            &mut c,
            &spec(serde_json::json!({"id": 1, "name": "edited", "children": [{"id": 2}]})),
        )
        .unwrap();
        assert_eq!(
            canonical_digest_json(&c.tree["children"][1]).unwrap(),
            sibling_digest
        );
    }

    #[test]
    fn digest_is_recomputed_over_the_mutated_tree() {
        let mut c = container(serde_json::json!({"children": [{"id": 1}]}));
        let before = c.meta.canonical_digest;
        apply_patch(&mut c, &spec(serde_json::json!({"id": 1, "name": "after"}))).unwrap();
        assert_ne!(c.meta.canonical_digest, before);
        assert_eq!(
            c.meta.canonical_digest,
            canonical_digest_json(&c.tree).unwrap()
        );
    }

    #[test]
    fn root_patch_without_children_clears_them() {
        let mut c = container(serde_json::json!({
            "children": [{"id": 1, "children": [{"id": 2}]}],
        }));
        apply_patch(&mut c, &spec(serde_json::json!({"id": 1, "name": "flat"}))).unwrap();
        assert!(c.tree["children"][0].get("children").is_none());
        assert_eq!(c.tree["children"][0]["name"], "flat");
    }

    #[test]
    fn foreign_id_reuse_copies_without_detaching() {
        let mut c = container(serde_json::json!({
            "children": [
                {"id": 1, "type": "group", "children": [{"id": 2}]},
                {"id": 3, "type": "group", "children": [{"id": 4, "name": "orig"}]},
            ],
        }));
        apply_patch(
            &mut c,
            &spec(serde_json::json!({"id": 1, "children": [{"id": 4}]})),
        )
        .unwrap();
        // Copied under node 1...
        assert_eq!(c.tree["children"][0]["children"][0]["id"], 4);
        // ...while the original position is untouched.
        assert_eq!(c.tree["children"][1]["children"][0]["name"], "orig");
    }

    #[test]
    fn projection_reflects_spec_overrides() {
        let mut c = container(serde_json::json!({
            "children": [{"id": 1, "type": "group", "children": [
                {"id": 2, "imageData": {"file": "aa.srf"}},
            ]}],
        }));
        let layers = apply_patch(
            &mut c,
            &spec(serde_json::json!({"id": 1, "children": [
                {"id": 2, "type": "pixel", "image": "custom/path.png"},
            ]})),
        )
        .unwrap();
        let child = &layers[0].children.as_ref().unwrap()[0];
        assert_eq!(child.id, LayerId::Number(2));
        assert_eq!(child.kind, "pixel");
        assert_eq!(child.image.as_deref(), Some("custom/path.png"));
    }

    #[test]
    fn string_ids_address_nodes_too() {
        let mut c = container(serde_json::json!({
            "children": [{"id": "hero", "children": [{"id": 2}]}],
        }));
        apply_patch(
            &mut c,
            &spec(serde_json::json!({"id": "hero", "name": "renamed"})),
        )
        .unwrap();
        assert_eq!(c.tree["children"][0]["name"], "renamed");
    }
}
