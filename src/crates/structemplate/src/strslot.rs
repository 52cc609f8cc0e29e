//! StrSlot rendering: `${NAME}` placeholder substitution in manifest text.
//!
//! Supported forms:
//!
//! | Form              | Result                                          |
//! |-------------------|-------------------------------------------------|
//! | `${NAME}`, `$NAME`| the value of `NAME`                             |
//! | `${NAME:-text}`   | `text` when `NAME` is unset or empty            |
//! | `${NAME-text}`    | `text` when `NAME` is unset                     |
//! | `$$`              | a literal `$`                                   |
//!
//! String values are inserted verbatim; any other value is inserted as
//! compact JSON. A name with no value and no fallback renders as an empty
//! string and is reported in [`StrSlotOutput::missing_keys`]. Fallback text
//! is literal; a nested `${` inside an expression is a syntax error.

use crate::error::{Result, TemplateError};
use crate::model::ValueMap;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

static BARE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap());

static BRACED_EXPR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)(?:(:-|-)(.*))?$").unwrap());

/// The rendered text and the names that had no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrSlotOutput {
    pub rendered: String,
    /// Unresolved names, each once, in order of first appearance.
    pub missing_keys: Vec<String>,
}

/// Substitute `${NAME}` placeholders in `template` with values from `values`.
pub fn render_str_slot_template(template: &str, values: &ValueMap) -> Result<StrSlotOutput> {
    let mut rendered = String::with_capacity(template.len());
    let mut missing_keys: Vec<String> = Vec::new();
    let mut rest = template;
    let mut offset = 0;

    while let Some(dollar) = rest.find('$') {
        rendered.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        let position = offset + dollar;

        let consumed = if after.starts_with('$') {
            rendered.push('$');
            2
        } else if let Some(braced) = after.strip_prefix('{') {
            let close = braced.find('}').ok_or_else(|| TemplateError::TemplateSyntax {
                offset: position,
                message: "unterminated ${ expression".to_string(),
            })?;
            let expr = &braced[..close];
            if expr.contains("${") {
                return Err(TemplateError::TemplateSyntax {
                    offset: position,
                    message: "nested ${ expressions are not supported".to_string(),
                });
            }
            let caps = BRACED_EXPR_REGEX
                .captures(expr)
                .ok_or_else(|| TemplateError::TemplateSyntax {
                    offset: position,
                    message: format!("unsupported expression \"${{{}}}\"", expr),
                })?;

            let name = &caps[1];
            let fallback = caps
                .get(2)
                .map(|op| (op.as_str(), caps.get(3).map_or("", |m| m.as_str())));
            let text = substitute(name, fallback, values, &mut missing_keys);
            rendered.push_str(&text);
            close + 3
        } else if let Some(name) = BARE_NAME_REGEX.find(after) {
            let text = substitute(name.as_str(), None, values, &mut missing_keys);
            rendered.push_str(&text);
            name.end() + 1
        } else {
            rendered.push('$');
            1
        };

        rest = &rest[dollar + consumed..];
        offset = position + consumed;
    }
    rendered.push_str(rest);

    Ok(StrSlotOutput {
        rendered,
        missing_keys,
    })
}

/// Resolve one placeholder, recording `name` as missing when nothing applies.
fn substitute(
    name: &str,
    fallback: Option<(&str, &str)>,
    values: &ValueMap,
    missing_keys: &mut Vec<String>,
) -> String {
    let value = values.get(name).filter(|v| !v.is_null());
    let is_empty = matches!(value, Some(JsonValue::String(s)) if s.is_empty());

    match (value, fallback) {
        (Some(_), Some((":-", text))) if is_empty => text.to_string(),
        (Some(value), _) => value_to_text(value),
        (None, Some((_, text))) => text.to_string(),
        (None, None) => {
            if !missing_keys.iter().any(|k| k == name) {
                missing_keys.push(name.to_string());
            }
            String::new()
        }
    }
}

fn value_to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
