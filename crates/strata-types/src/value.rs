//! The document-tree value model.
//!
//! A layered-image document is a recursive tree of [`Value`]s: the JSON-like
//! shapes (`Null`..`Map`) carry layer attributes and children, while the two
//! binary leaves carry pixel surfaces and raw byte buffers. The document
//! codec at the boundary emits these as a discriminated union — there is no
//! shape-sniffing of "canvas-like" objects inside the tree itself.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The discriminator for a pixel-surface payload.
///
/// `Canvas` and `ImageData` hydrate to the same RGBA8 surface; the tag is
/// preserved so a round-tripped tree reconstructs the payload the document
/// codec originally produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RasterKind {
    Canvas,
    ImageData,
}

impl RasterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canvas => "Canvas",
            Self::ImageData => "ImageData",
        }
    }
}

impl fmt::Display for RasterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An RGBA8 pixel surface embedded in a document tree.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    pub kind: RasterKind,
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, row-major; always `width * height * 4` long.
    pub data: Vec<u8>,
}

impl Raster {
    /// Create a raster, validating that the buffer matches the dimensions.
    pub fn new(kind: RasterKind, width: u32, height: u32, data: Vec<u8>) -> Result<Self, TypeError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TypeError::RasterShape {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            kind,
            width,
            height,
            data,
        })
    }
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data", &format_args!("{} bytes", self.data.len()))
            .finish()
    }
}

/// Element type tag for a raw byte buffer.
///
/// Hydration reinterprets recovered bytes under this tag; the bytes
/// themselves are stored untyped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl BufferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s {
            "u8" => Ok(Self::U8),
            "i8" => Ok(Self::I8),
            "u16" => Ok(Self::U16),
            "i16" => Ok(Self::I16),
            "u32" => Ok(Self::U32),
            "i32" => Ok(Self::I32),
            "u64" => Ok(Self::U64),
            "i64" => Ok(Self::I64),
            "f32" => Ok(Self::F32),
            "f64" => Ok(Self::F64),
            other => Err(TypeError::UnknownBufferKind(other.to_string())),
        }
    }

    /// Size in bytes of one element.
    pub fn element_size(&self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw typed byte buffer embedded in a document tree.
#[derive(Clone, PartialEq, Eq)]
pub struct RawBuffer {
    pub kind: BufferKind,
    pub bytes: Vec<u8>,
}

impl RawBuffer {
    pub fn new(kind: BufferKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for RawBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("kind", &self.kind)
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .finish()
    }
}

/// A node in the document tree.
///
/// JSON-safe trees (as persisted in a container) never contain the binary
/// leaves; those only exist in hydrated trees on their way to or from the
/// document codec.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Raster(Raster),
    Buffer(RawBuffer),
}

impl Value {
    /// Build a tree from plain JSON. Total: JSON has no binary leaves.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as plain JSON.
    ///
    /// Fails on binary leaves: those must be externalized to blob references
    /// first (or encoded through the canonical serializer).
    pub fn to_json(&self) -> Result<serde_json::Value, TypeError> {
        match self {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Number(n) => Ok(serde_json::Value::Number(n.clone())),
            Value::String(s) => Ok(serde_json::Value::String(s.clone())),
            Value::Array(items) => Ok(serde_json::Value::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Value::Map(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), v.to_json()?);
                }
                Ok(serde_json::Value::Object(out))
            }
            Value::Raster(_) => Err(TypeError::BinaryLeaf("raster")),
            Value::Buffer(_) => Err(TypeError::BinaryLeaf("buffer")),
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Map-key lookup; `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip_preserves_structure() {
        let json: serde_json::Value = serde_json::json!({
            "name": "background",
            "opacity": 0.5,
            "children": [{"id": 1}, {"id": 2}],
            "hidden": false,
            "mask": null,
        });
        let value = Value::from_json(json.clone());
        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn binary_leaves_refuse_plain_json() {
        let raster = Raster::new(RasterKind::Canvas, 1, 1, vec![0; 4]).unwrap();
        assert_eq!(
            Value::Raster(raster).to_json(),
            Err(TypeError::BinaryLeaf("raster"))
        );
        let buffer = RawBuffer::new(BufferKind::U8, vec![1, 2, 3]);
        assert_eq!(
            Value::Buffer(buffer).to_json(),
            Err(TypeError::BinaryLeaf("buffer"))
        );
    }

    #[test]
    fn raster_rejects_mismatched_buffer() {
        let err = Raster::new(RasterKind::ImageData, 2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, TypeError::RasterShape { expected: 16, actual: 15, .. }));
    }

    #[test]
    fn buffer_kind_parse_roundtrip() {
        for kind in [
            BufferKind::U8,
            BufferKind::I8,
            BufferKind::U16,
            BufferKind::I16,
            BufferKind::U32,
            BufferKind::I32,
            BufferKind::U64,
            BufferKind::I64,
            BufferKind::F32,
            BufferKind::F64,
        ] {
            assert_eq!(BufferKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(BufferKind::parse("float32").is_err());
    }

    #[test]
    fn map_get_walks_keys() {
        let value = Value::from_json(serde_json::json!({"a": {"b": 7}}));
        let inner = value.get("a").unwrap();
        assert_eq!(inner.get("b"), Some(&Value::Number(7.into())));
    }
}
