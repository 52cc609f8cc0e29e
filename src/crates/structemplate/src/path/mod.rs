//! Path-addressed reads and writes over generic document trees.
//!
//! A path expression is a `.`-separated list of segments. A segment of the
//! form `[<digits>]` addresses an array element; any other segment is a
//! literal map key. Leading `$` and leading/trailing `.` are ignored, so
//! `$.spec.rules.[0].backendRefs` and `spec.rules.[0].backendRefs` are the
//! same path.
//!
//! ```rust
//! use serde_json::json;
//! use structemplate::path::{get, set, SetMode};
//!
//! let mut doc = json!({"spec": {"hostnames": ["a"]}});
//! set(&mut doc, ".spec.hostnames", json!("b"), SetMode::AppendArray).unwrap();
//! set(&mut doc, ".spec.port", json!(443), SetMode::Replace).unwrap();
//!
//! assert_eq!(get(&doc, ".spec.hostnames.[1]").unwrap(), json!("b"));
//! assert_eq!(get(&doc, ".spec.port").unwrap(), json!(443));
//! ```

mod access;
mod parse;

pub use access::{deep_copy, get, get_ref, set, set_segments, MAX_CREATED_ARRAY_LEN};
pub use parse::{format_path, is_array_index, parse_array_index, parse_path, PathSegment};

/// How `set` merges a value into the node at the write segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Overwrite the node (or insert it when absent).
    Replace,
    /// Treat the node as a named array field and append to it. A sequence
    /// value is spliced element by element.
    AppendArray,
}
