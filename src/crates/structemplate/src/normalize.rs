//! Value normalization for injected parameter values
//!
//! Documents are re-encoded as YAML or JSON, so every scalar written into a
//! tree is narrowed to one of: null, bool, i64, f64, string.

use crate::error::{Result, TemplateError};
use serde::Serialize;
use serde_json::{Map, Number, Value as JsonValue};

/// Normalize a tree value so every integer fits in an `i64`.
pub fn normalize_value(value: JsonValue) -> Result<JsonValue> {
    match value {
        JsonValue::Number(n) => normalize_number(n).map(JsonValue::Number),
        JsonValue::Array(arr) => {
            let normalized: Result<Vec<JsonValue>> =
                arr.into_iter().map(normalize_value).collect();
            Ok(JsonValue::Array(normalized?))
        }
        JsonValue::Object(obj) => {
            let mut normalized = Map::with_capacity(obj.len());
            for (key, child) in obj {
                normalized.insert(key, normalize_value(child)?);
            }
            Ok(JsonValue::Object(normalized))
        }
        scalar => Ok(scalar),
    }
}

fn normalize_number(n: Number) -> Result<Number> {
    if n.is_i64() || n.is_f64() {
        return Ok(n);
    }
    // Only u64 values above i64::MAX remain here.
    match n.as_u64().map(i64::try_from) {
        Some(Ok(signed)) => Ok(Number::from(signed)),
        _ => Err(TemplateError::UnsupportedScalarShape(format!(
            "integer {} does not fit in a signed 64-bit value",
            n
        ))),
    }
}

/// Convert any serializable Rust value into a normalized tree value.
///
/// Vectors of any element type become generic arrays, bounded integers are
/// widened to `i64` and `f32` to `f64`.
pub fn to_tree_value<T: Serialize + ?Sized>(value: &T) -> Result<JsonValue> {
    let tree = serde_json::to_value(value).map_err(|e| {
        TemplateError::UnsupportedScalarShape(format!("value cannot be represented: {}", e))
    })?;
    normalize_value(tree)
}
