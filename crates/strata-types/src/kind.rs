//! Structural layer classification.
//!
//! Source documents rarely tag their layers; the kind of a node is derived
//! from which attributes it carries. The predicates run in a fixed order so
//! classification is deterministic: group → text → smartObject → adjustment
//! → shape → pixel → layer. This is the single place where shape-sniffing
//! is allowed; everything else works off the result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic kind of a document-tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Group,
    Text,
    SmartObject,
    Adjustment,
    Shape,
    Pixel,
    /// Fallback: a plain layer with none of the recognized attributes.
    Layer,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Text => "text",
            Self::SmartObject => "smartObject",
            Self::Adjustment => "adjustment",
            Self::Shape => "shape",
            Self::Pixel => "pixel",
            Self::Layer => "layer",
        }
    }

    /// Classify a JSON-safe node by its attributes.
    ///
    /// A node counts as a group only while it has a non-empty `children`
    /// sequence; shape attributes beat pixel payloads; anything else falls
    /// through to `Layer`.
    pub fn classify(node: &serde_json::Map<String, serde_json::Value>) -> Self {
        if node
            .get("children")
            .and_then(|c| c.as_array())
            .is_some_and(|c| !c.is_empty())
        {
            return Self::Group;
        }
        if node.get("text").is_some_and(|v| v.is_object()) {
            return Self::Text;
        }
        if node.get("smartObject").is_some_and(|v| v.is_object()) {
            return Self::SmartObject;
        }
        if node.get("adjustment").is_some_and(is_truthy) {
            return Self::Adjustment;
        }
        const SHAPE_KEYS: [&str; 6] = [
            "vectorMask",
            "path",
            "shape",
            "strokeStyle",
            "fill",
            "gradientMap",
        ];
        if SHAPE_KEYS
            .iter()
            .any(|k| node.get(*k).is_some_and(is_truthy))
        {
            return Self::Shape;
        }
        if node.contains_key("canvas") || node.contains_key("imageData") {
            return Self::Pixel;
        }
        Self::Layer
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Source documents carry attributes with script-style falsiness: null,
// false, zero, and the empty string all mean "not set".
fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => false,
        serde_json::Value::Number(n) => n.as_f64() != Some(0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(json: serde_json::Value) -> NodeKind {
        match json {
            serde_json::Value::Object(map) => NodeKind::classify(&map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn non_empty_children_wins() {
        let kind = classify(serde_json::json!({
            "children": [{"name": "inner"}],
            "text": {"value": "hello"},
        }));
        assert_eq!(kind, NodeKind::Group);
    }

    #[test]
    fn empty_children_is_not_a_group() {
        let kind = classify(serde_json::json!({"children": []}));
        assert_eq!(kind, NodeKind::Layer);
    }

    #[test]
    fn text_beats_smart_object() {
        let kind = classify(serde_json::json!({
            "text": {"value": "t"},
            "smartObject": {"linked": true},
        }));
        assert_eq!(kind, NodeKind::Text);
    }

    #[test]
    fn adjustment_requires_truthy_value() {
        assert_eq!(classify(serde_json::json!({"adjustment": {"curves": []}})), NodeKind::Adjustment);
        assert_eq!(classify(serde_json::json!({"adjustment": false})), NodeKind::Layer);
        assert_eq!(classify(serde_json::json!({"adjustment": null})), NodeKind::Layer);
        assert_eq!(classify(serde_json::json!({"adjustment": 0})), NodeKind::Layer);
        assert_eq!(classify(serde_json::json!({"adjustment": ""})), NodeKind::Layer);
        assert_eq!(classify(serde_json::json!({"adjustment": 0.0})), NodeKind::Layer);
    }

    #[test]
    fn falsy_shape_keys_fall_through() {
        assert_eq!(
            classify(serde_json::json!({"vectorMask": null, "canvas": {}})),
            NodeKind::Pixel
        );
        assert_eq!(classify(serde_json::json!({"path": ""})), NodeKind::Layer);
        assert_eq!(classify(serde_json::json!({"fill": false})), NodeKind::Layer);
    }

    #[test]
    fn shape_attributes_beat_pixels() {
        let kind = classify(serde_json::json!({
            "vectorMask": {"paths": []},
            "canvas": {"file": "aa.png"},
        }));
        assert_eq!(kind, NodeKind::Shape);
    }

    #[test]
    fn pixel_payload_detected() {
        assert_eq!(classify(serde_json::json!({"canvas": {}})), NodeKind::Pixel);
        assert_eq!(classify(serde_json::json!({"imageData": {}})), NodeKind::Pixel);
    }

    #[test]
    fn bare_node_is_plain_layer() {
        assert_eq!(classify(serde_json::json!({"name": "empty"})), NodeKind::Layer);
    }

    #[test]
    fn kind_serializes_camel_case() {
        let json = serde_json::to_string(&NodeKind::SmartObject).unwrap();
        assert_eq!(json, "\"smartObject\"");
    }
}
