//! Reading, writing and copying values at a path

use super::parse::{format_path, parse_path, PathSegment};
use super::SetMode;
use crate::error::{kind_name, Result, TemplateError};
use serde_json::{Map, Value as JsonValue};

/// Largest array `set` will create to reach an index that does not exist yet.
pub const MAX_CREATED_ARRAY_LEN: usize = 4096;

/// Borrow the value at `expr` without copying it.
pub fn get_ref<'a>(tree: &'a JsonValue, expr: &str) -> Result<&'a JsonValue> {
    let segments = parse_path(expr)?;
    let mut node = tree;

    for (position, segment) in segments.iter().enumerate() {
        let next = match (node, segment) {
            (JsonValue::Object(map), PathSegment::Key(key)) => map.get(key),
            (JsonValue::Array(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        };
        node = next.ok_or_else(|| {
            TemplateError::not_found(format_path(&segments[..=position]), segment.to_string())
        })?;
    }

    Ok(node)
}

/// Read the value at `expr` as an independent deep copy.
///
/// An empty path returns a copy of the whole tree.
pub fn get(tree: &JsonValue, expr: &str) -> Result<JsonValue> {
    get_ref(tree, expr).map(deep_copy)
}

/// Write `value` at `expr`, creating missing intermediate nodes.
///
/// Missing map keys become empty objects, or arrays sized `index + 1` when
/// the following segment is an array index. Null array slots on the way are
/// replaced by empty objects. The write segment itself never grows an
/// existing array.
pub fn set(tree: &mut JsonValue, expr: &str, value: JsonValue, mode: SetMode) -> Result<()> {
    let segments = parse_path(expr)?;
    set_segments(tree, &segments, value, mode)
}

/// Write `value` at already-parsed `segments`.
///
/// Key segments are used verbatim, so a final key may contain `.`.
pub fn set_segments(
    tree: &mut JsonValue,
    segments: &[PathSegment],
    value: JsonValue,
    mode: SetMode,
) -> Result<()> {
    let Some((write_segment, traversal)) = segments.split_last() else {
        return Err(TemplateError::invalid_path(
            format_path(segments),
            "path is empty; the document root cannot be replaced",
        ));
    };

    let mut cursor = tree;
    for (position, segment) in traversal.iter().enumerate() {
        let next = &segments[position + 1];
        cursor = step_into(cursor, segment, next, &segments[..=position])?;
    }

    match mode {
        SetMode::Replace => replace_at(cursor, write_segment, value, segments),
        SetMode::AppendArray => append_at(cursor, write_segment, value, segments),
    }
}

/// Descend one traversal segment, auto-creating the child when needed.
fn step_into<'a>(
    node: &'a mut JsonValue,
    segment: &PathSegment,
    next: &PathSegment,
    walked: &[PathSegment],
) -> Result<&'a mut JsonValue> {
    match (node, segment) {
        (JsonValue::Array(items), PathSegment::Index(index)) => {
            let len = items.len();
            let slot = items
                .get_mut(*index)
                .ok_or_else(|| TemplateError::IndexOutOfBounds {
                    path: format_path(walked),
                    index: *index,
                    len,
                })?;
            if slot.is_null() {
                *slot = JsonValue::Object(Map::new());
            }
            Ok(slot)
        }
        (JsonValue::Object(map), PathSegment::Key(key)) => {
            let created = match map.get(key) {
                Some(existing) if !existing.is_null() => None,
                _ => Some(vivify(next, walked)?),
            };
            let child = map.entry(key.clone()).or_insert(JsonValue::Null);
            if let Some(created) = created {
                *child = created;
            }
            Ok(child)
        }
        (other, segment) => Err(TemplateError::NotIndexable {
            path: format_path(walked),
            segment: segment.to_string(),
            found: kind_name(other),
        }),
    }
}

/// The empty node created ahead of `next`.
fn vivify(next: &PathSegment, walked: &[PathSegment]) -> Result<JsonValue> {
    match next {
        PathSegment::Index(index) => {
            let len = index
                .checked_add(1)
                .filter(|len| *len <= MAX_CREATED_ARRAY_LEN)
                .ok_or_else(|| {
                    TemplateError::invalid_path(
                        format_path(walked),
                        format!(
                            "index [{}] exceeds the {} element limit for created arrays",
                            index, MAX_CREATED_ARRAY_LEN
                        ),
                    )
                })?;
            Ok(JsonValue::Array(vec![JsonValue::Null; len]))
        }
        PathSegment::Key(_) => Ok(JsonValue::Object(Map::new())),
    }
}

fn replace_at(
    node: &mut JsonValue,
    segment: &PathSegment,
    value: JsonValue,
    segments: &[PathSegment],
) -> Result<()> {
    match (node, segment) {
        (JsonValue::Object(map), PathSegment::Key(key)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (JsonValue::Array(items), PathSegment::Index(index)) => {
            let len = items.len();
            match items.get_mut(*index) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(TemplateError::IndexOutOfBounds {
                    path: format_path(segments),
                    index: *index,
                    len,
                }),
            }
        }
        (other, segment) => Err(TemplateError::NotIndexable {
            path: format_path(segments),
            segment: segment.to_string(),
            found: kind_name(other),
        }),
    }
}

fn append_at(
    node: &mut JsonValue,
    segment: &PathSegment,
    value: JsonValue,
    segments: &[PathSegment],
) -> Result<()> {
    let found = kind_name(node);
    let (JsonValue::Object(map), PathSegment::Key(key)) = (node, segment) else {
        return Err(TemplateError::NotIndexable {
            path: format_path(segments),
            segment: segment.to_string(),
            found,
        });
    };

    let field = map.entry(key.clone()).or_insert(JsonValue::Null);
    if field.is_null() {
        *field = JsonValue::Array(Vec::new());
    }

    match field {
        JsonValue::Array(items) => {
            match value {
                JsonValue::Array(values) => items.extend(values),
                single => items.push(single),
            }
            Ok(())
        }
        other => Err(TemplateError::NotAnArray {
            path: format_path(segments),
            found: kind_name(other),
        }),
    }
}

/// Recursively copy a tree so the result shares nothing with the source
pub fn deep_copy(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), deep_copy(child)))
                .collect(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(deep_copy).collect()),
        JsonValue::Null => JsonValue::Null,
        JsonValue::Bool(b) => JsonValue::Bool(*b),
        JsonValue::Number(n) => JsonValue::Number(n.clone()),
        JsonValue::String(s) => JsonValue::String(s.clone()),
    }
}
