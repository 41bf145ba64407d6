//! Canonical form serialization for Strata document trees.
//!
//! Two structurally equal trees must digest identically regardless of how
//! their maps were built or how their binary payloads are represented, so
//! the container checksum is computed over a canonical byte rendering:
//!
//! - map keys in lexicographic order at every level
//! - arrays in element order
//! - numbers and strings rendered by serde_json's deterministic formatters
//! - binary leaves encoded as tagged base64 objects
//!
//! The canonical form exists only to be digested. It is never persisted and
//! never parsed back.

pub mod error;

pub use error::{CanonError, CanonResult};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use strata_types::{Digest, Value};

/// Render a tree to its canonical byte form.
pub fn canonical_bytes(value: &Value) -> CanonResult<Vec<u8>> {
    let mut out = Vec::new();
    write_value(&mut out, value)?;
    Ok(out)
}

/// Digest of the canonical byte form: the container integrity checksum.
pub fn canonical_digest(value: &Value) -> CanonResult<Digest> {
    Ok(Digest::from_bytes(&canonical_bytes(value)?))
}

/// Canonical digest of a JSON-safe tree (e.g. a persisted container tree).
pub fn canonical_digest_json(value: &serde_json::Value) -> CanonResult<Digest> {
    canonical_digest(&Value::from_json(value.clone()))
}

fn write_value(out: &mut Vec<u8>, value: &Value) -> CanonResult<()> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => write_json(out, n)?,
        Value::String(s) => write_json(out, s)?,
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(out, item)?;
            }
            out.push(b']');
        }
        // BTreeMap iteration order is the canonical key order.
        Value::Map(map) => {
            out.push(b'{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_json(out, key)?;
                out.push(b':');
                write_value(out, item)?;
            }
            out.push(b'}');
        }
        Value::Raster(raster) => {
            out.push(b'{');
            out.extend_from_slice(b"\"base64\":");
            write_json(out, &BASE64.encode(&raster.data))?;
            out.extend_from_slice(b",\"height\":");
            write_json(out, &raster.height)?;
            out.extend_from_slice(b",\"kind\":");
            write_json(out, raster.kind.as_str())?;
            out.extend_from_slice(b",\"width\":");
            write_json(out, &raster.width)?;
            out.push(b'}');
        }
        Value::Buffer(buffer) => {
            out.push(b'{');
            out.extend_from_slice(b"\"base64\":");
            write_json(out, &BASE64.encode(&buffer.bytes))?;
            out.extend_from_slice(b",\"kind\":");
            write_json(out, buffer.kind.as_str())?;
            out.push(b'}');
        }
    }
    Ok(())
}

fn write_json<T: serde::Serialize + ?Sized>(out: &mut Vec<u8>, value: &T) -> CanonResult<()> {
    serde_json::to_writer(&mut *out, value).map_err(|e| CanonError::Serialization(e.to_string()))
}
