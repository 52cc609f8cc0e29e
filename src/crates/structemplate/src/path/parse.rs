//! Path expression parsing

use crate::error::{Result, TemplateError};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static ARRAY_INDEX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d+)\]$").unwrap());

/// One step of a parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Checks if a raw segment has the `[<digits>]` array-index form
pub fn is_array_index(segment: &str) -> bool {
    ARRAY_INDEX_REGEX.is_match(segment)
}

/// Parses a raw `[<digits>]` segment into its zero-based index
pub fn parse_array_index(segment: &str) -> Result<usize> {
    let digits = ARRAY_INDEX_REGEX
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            TemplateError::invalid_path(segment, "array index must have the form [<digits>]")
        })?;

    digits.as_str().parse::<usize>().map_err(|e| {
        TemplateError::invalid_path(segment, format!("array index is not addressable: {}", e))
    })
}

/// Split a path expression into segments.
///
/// An empty expression (or one made only of `$` and `.`) yields no segments,
/// which addresses the document root. Empty segments between consecutive dots
/// are skipped. A segment starting with `[` must be a valid array index.
pub fn parse_path(expr: &str) -> Result<Vec<PathSegment>> {
    let trimmed = expr.trim_matches('$').trim_matches('.');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    for raw in trimmed.split('.') {
        if raw.is_empty() {
            continue;
        }
        if raw.starts_with('[') {
            let index = parse_array_index(raw).map_err(|e| match e {
                TemplateError::InvalidPath { message, .. } => TemplateError::invalid_path(
                    expr,
                    format!("segment \"{}\": {}", raw, message),
                ),
                other => other,
            })?;
            segments.push(PathSegment::Index(index));
        } else {
            segments.push(PathSegment::Key(raw.to_string()));
        }
    }
    Ok(segments)
}

/// Render segments back into the canonical `.a.[0].b` form.
pub fn format_path(segments: &[PathSegment]) -> String {
    if segments.is_empty() {
        return ".".to_string();
    }
    segments.iter().map(|s| format!(".{}", s)).collect()
}
