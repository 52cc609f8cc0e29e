//! Manifest decoding into documents and re-encoding to YAML or JSON

use crate::error::{Result, TemplateError};
use crate::model::{Document, DocumentSet};
use crate::normalize::normalize_value;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Decode a multi-document YAML (or JSON) manifest.
///
/// Empty documents are skipped; every other document must be a mapping with
/// `apiVersion` and `kind`.
pub fn parse_manifest(text: &str) -> Result<DocumentSet> {
    let mut documents = DocumentSet::new();

    for (position, raw) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = JsonValue::deserialize(raw).map_err(|e| {
            TemplateError::Manifest(format!("document {} cannot be decoded: {}", position, e))
        })?;
        if value.is_null() {
            continue;
        }

        let value = normalize_value(value)?;
        let document = Document::from_value(value).map_err(|e| match e {
            TemplateError::Manifest(message) => {
                TemplateError::Manifest(format!("document {}: {}", position, message))
            }
            other => other,
        })?;
        documents.push(document);
    }

    tracing::debug!(
        documents = documents.len(),
        kinds = documents.kinds().len(),
        "parsed manifest"
    );
    Ok(documents)
}

/// Encode documents as a `---` separated YAML stream, in manifest order.
pub fn to_yaml(documents: &DocumentSet) -> Result<String> {
    let encoded: Result<Vec<String>> = documents
        .iter()
        .map(|doc| serde_yaml::to_string(doc.object()).map_err(TemplateError::from))
        .collect();
    Ok(encoded?.join("---\n"))
}

/// Encode documents as a pretty-printed JSON array, in manifest order.
pub fn to_json(documents: &DocumentSet) -> Result<String> {
    let objects: Vec<&JsonValue> = documents.iter().map(Document::object).collect();
    Ok(serde_json::to_string_pretty(&objects)?)
}
