//! The identifier index over an existing layer tree.
//!
//! One pre-order walk records, for every node carrying an `id`, the path of
//! child positions leading to it, plus the maximum numeric id seen (the
//! basis for fresh-id allocation). All node access goes through id-keyed
//! path lookups; nothing holds direct references into the tree.

use std::collections::BTreeMap;

/// Child-position path from the tree root to a node.
pub type NodePath = Vec<usize>;

/// Id → path index over one tree, valid until the tree's structure changes.
#[derive(Clone, Debug)]
pub struct TreeIndex {
    paths: BTreeMap<String, NodePath>,
    max_numeric: i64,
}

impl TreeIndex {
    /// Build the index with one pre-order walk.
    ///
    /// Ids are keyed by their string form; numeric ids (and strings that
    /// parse as integers) contribute to the allocation maximum. A duplicate
    /// id keeps the last occurrence, matching pre-order overwrite.
    pub fn build(tree: &serde_json::Value) -> Self {
        let mut index = Self {
            paths: BTreeMap::new(),
            max_numeric: 0,
        };
        index.walk(tree, Vec::new());
        index
    }

    fn walk(&mut self, node: &serde_json::Value, path: NodePath) {
        let Some(map) = node.as_object() else { return };
        if let Some(key) = id_key(map.get("id")) {
            if let Ok(numeric) = key.parse::<i64>() {
                self.max_numeric = self.max_numeric.max(numeric);
            }
            self.paths.insert(key, path.clone());
        }
        if let Some(children) = map.get("children").and_then(|c| c.as_array()) {
            for (position, child) in children.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(position);
                self.walk(child, child_path);
            }
        }
    }

    /// Path of the node carrying `id`, if indexed.
    pub fn path(&self, id: &str) -> Option<&[usize]> {
        self.paths.get(id).map(|p| p.as_slice())
    }

    /// Highest numeric id observed; fresh ids start one above this.
    pub fn max_numeric_id(&self) -> i64 {
        self.max_numeric
    }

    /// Number of indexed ids.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Follow a path to a node.
    pub fn resolve<'a>(tree: &'a serde_json::Value, path: &[usize]) -> Option<&'a serde_json::Value> {
        let mut node = tree;
        for position in path {
            node = node.get("children")?.get(position)?;
        }
        Some(node)
    }

    /// Follow a path to a node, mutably.
    pub fn resolve_mut<'a>(
        tree: &'a mut serde_json::Value,
        path: &[usize],
    ) -> Option<&'a mut serde_json::Value> {
        let mut node = tree;
        for position in path {
            node = node.get_mut("children")?.get_mut(position)?;
        }
        Some(node)
    }
}

/// String key form of an id value; `None` for missing or non-scalar ids.
pub fn id_key(id: Option<&serde_json::Value>) -> Option<String> {
    match id {
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> serde_json::Value {
        serde_json::json!({
            "children": [
                {"id": 1, "children": [
                    {"id": 4, "name": "deep"},
                    {"id": "label", "name": "string id"},
                ]},
                {"id": 2},
            ],
        })
    }

    #[test]
    fn indexes_every_id_with_its_path() {
        let tree = sample_tree();
        let index = TreeIndex::build(&tree);
        assert_eq!(index.len(), 4);
        assert_eq!(index.path("1"), Some(&[0][..]));
        assert_eq!(index.path("4"), Some(&[0, 0][..]));
        assert_eq!(index.path("label"), Some(&[0, 1][..]));
        assert_eq!(index.path("2"), Some(&[1][..]));
        assert_eq!(index.path("99"), None);
    }

    #[test]
    fn max_numeric_skips_non_numeric_ids() {
        let index = TreeIndex::build(&sample_tree());
        assert_eq!(index.max_numeric_id(), 4);
    }

    #[test]
    fn numeric_strings_count_toward_max() {
        let tree = serde_json::json!({"children": [{"id": "17"}]});
        let index = TreeIndex::build(&tree);
        assert_eq!(index.max_numeric_id(), 17);
        assert_eq!(index.path("17"), Some(&[0][..]));
    }

    #[test]
    fn resolve_follows_paths() {
        let tree = sample_tree();
        let index = TreeIndex::build(&tree);
        let node = TreeIndex::resolve(&tree, index.path("4").unwrap()).unwrap();
        assert_eq!(node["name"], "deep");
    }

    #[test]
    fn resolve_mut_reaches_the_same_node() {
        let mut tree = sample_tree();
        let index = TreeIndex::build(&tree);
        let path = index.path("2").unwrap().to_vec();
        let node = TreeIndex::resolve_mut(&mut tree, &path).unwrap();
        node["name"] = serde_json::json!("renamed");
        assert_eq!(tree["children"][1]["name"], "renamed");
    }

    #[test]
    fn empty_tree_indexes_nothing() {
        let index = TreeIndex::build(&serde_json::json!({"children": []}));
        assert!(index.is_empty());
        assert_eq!(index.max_numeric_id(), 0);
    }
}
