//! Manifest documents and their grouping by kind

use crate::error::{kind_name, Result, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Label key/value pairs a document must carry to be selected.
pub type LabelSelector = BTreeMap<String, String>;

/// Identifies a family of documents by API group, version and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DocumentKind {
    #[serde(default, alias = "Group")]
    pub group: String,
    #[serde(default, alias = "Version")]
    pub version: String,
    #[serde(alias = "Kind")]
    pub kind: String,
}

impl DocumentKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Build a kind from an `apiVersion` of the form `group/version` or `version`.
    pub fn from_api_version(api_version: &str, kind: impl Into<String>) -> Self {
        match api_version.split_once('/') {
            Some((group, version)) => Self::new(group, version, kind),
            None => Self::new("", api_version, kind),
        }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}

/// One decoded manifest object.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    kind: DocumentKind,
    object: JsonValue,
}

impl Document {
    /// Wrap a decoded object. It must be a mapping carrying string
    /// `apiVersion` and `kind` fields.
    pub fn from_value(object: JsonValue) -> Result<Self> {
        let kind = kind_of(&object)?;
        Ok(Self { kind, object })
    }

    pub fn kind(&self) -> &DocumentKind {
        &self.kind
    }

    pub fn object(&self) -> &JsonValue {
        &self.object
    }

    /// Mutate the object in place, then re-derive the kind from its
    /// `apiVersion` and `kind` fields.
    ///
    /// When the write leaves those fields unusable the previous kind is kept.
    pub fn update<T>(&mut self, write: impl FnOnce(&mut JsonValue) -> Result<T>) -> Result<T> {
        let result = write(&mut self.object);
        self.refresh_kind();
        result
    }

    fn refresh_kind(&mut self) {
        match kind_of(&self.object) {
            Ok(kind) if kind != self.kind => {
                tracing::debug!(from = %self.kind, to = %kind, "document kind changed");
                self.kind = kind;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "keeping previous document kind");
            }
        }
    }

    pub fn into_value(self) -> JsonValue {
        self.object
    }

    pub fn name(&self) -> Option<&str> {
        self.object
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(JsonValue::as_str)
    }

    /// String-valued entries of `metadata.labels`.
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.object
            .get("metadata")
            .and_then(|m| m.get("labels"))
            .and_then(JsonValue::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when every selector entry is present in the labels with an
    /// equal value. An empty selector matches every document.
    pub fn matches_selector(&self, selector: &LabelSelector) -> bool {
        if selector.is_empty() {
            return true;
        }
        let labels = self.labels();
        selector
            .iter()
            .all(|(key, expected)| labels.get(key) == Some(expected))
    }
}

fn kind_of(object: &JsonValue) -> Result<DocumentKind> {
    let JsonValue::Object(map) = object else {
        return Err(TemplateError::Manifest(format!(
            "document must be an object, found {}",
            kind_name(object)
        )));
    };

    let api_version = map
        .get("apiVersion")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| TemplateError::Manifest("document is missing apiVersion".to_string()))?;
    let kind = map
        .get("kind")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| TemplateError::Manifest("document is missing kind".to_string()))?;
    Ok(DocumentKind::from_api_version(api_version, kind))
}

/// Documents in manifest order, selectable by kind.
///
/// Kind lookups read each document's current kind, so a write that changes
/// `kind` or `apiVersion` moves the document for every later lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet {
    documents: Vec<Document>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents_of_kind(&self, kind: &DocumentKind) -> Vec<&Document> {
        self.documents.iter().filter(|d| d.kind() == kind).collect()
    }

    pub fn documents_of_kind_mut<'a>(
        &'a mut self,
        kind: &'a DocumentKind,
    ) -> impl Iterator<Item = &'a mut Document> + 'a {
        self.documents.iter_mut().filter(move |d| d.kind() == kind)
    }

    /// Kinds present in the set, in order of first appearance.
    pub fn kinds(&self) -> Vec<&DocumentKind> {
        let mut kinds: Vec<&DocumentKind> = Vec::new();
        for document in &self.documents {
            if !kinds.contains(&document.kind()) {
                kinds.push(document.kind());
            }
        }
        kinds
    }

    /// Iterate documents in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> + '_ {
        self.documents.iter()
    }

    /// Consume the set, returning documents in manifest order.
    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

impl FromIterator<Document> for DocumentSet {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(name: &str, env: &str) -> Document {
        Document::from_value(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"name": name, "labels": {"env": env, "tier": "web"}}
        }))
        .unwrap()
    }

    #[test]
    fn test_kind_from_api_version() {
        let kind = DocumentKind::from_api_version("gateway.networking.k8s.io/v1alpha2", "TLSRoute");
        assert_eq!(kind.group, "gateway.networking.k8s.io");
        assert_eq!(kind.version, "v1alpha2");
        assert_eq!(kind.to_string(), "gateway.networking.k8s.io/v1alpha2, Kind=TLSRoute");

        let core = DocumentKind::from_api_version("v1", "Service");
        assert_eq!(core.group, "");
        assert_eq!(core.api_version(), "v1");
    }

    #[test]
    fn test_kind_accepts_capitalized_fields() {
        let kind: DocumentKind =
            serde_json::from_value(json!({"Group": "apps", "Version": "v1", "Kind": "Deployment"}))
                .unwrap();
        assert_eq!(kind, DocumentKind::new("apps", "v1", "Deployment"));
    }

    #[test]
    fn test_document_requires_kind_and_api_version() {
        assert!(Document::from_value(json!({"kind": "Service"})).is_err());
        assert!(Document::from_value(json!({"apiVersion": "v1"})).is_err());
        assert!(Document::from_value(json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_selector_matching() {
        let doc = service("a", "prod");
        let mut selector = LabelSelector::new();
        assert!(doc.matches_selector(&selector));

        selector.insert("env".to_string(), "prod".to_string());
        assert!(doc.matches_selector(&selector));

        selector.insert("tier".to_string(), "db".to_string());
        assert!(!doc.matches_selector(&selector));
    }

    #[test]
    fn test_selector_on_unlabeled_document() {
        let doc = Document::from_value(json!({"apiVersion": "v1", "kind": "Service"})).unwrap();
        let selector: LabelSelector = [("env".to_string(), "prod".to_string())].into();
        assert!(!doc.matches_selector(&selector));
        assert!(doc.labels().is_empty());
    }

    #[test]
    fn test_document_set_preserves_order() {
        let deployment = Document::from_value(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "d"}
        }))
        .unwrap();
        let set: DocumentSet = vec![service("a", "prod"), deployment, service("b", "dev")]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 3);
        assert_eq!(set.kinds().len(), 2);
        let service_kind = DocumentKind::new("", "v1", "Service");
        assert_eq!(set.documents_of_kind(&service_kind).len(), 2);

        let names: Vec<_> = set.iter().filter_map(Document::name).map(String::from).collect();
        assert_eq!(names, vec!["a", "d", "b"]);

        let names: Vec<_> = set
            .into_documents()
            .iter()
            .filter_map(|d| d.name().map(String::from))
            .collect();
        assert_eq!(names, vec!["a", "d", "b"]);
    }

    #[test]
    fn test_documents_of_unknown_kind_is_empty() {
        let mut set = DocumentSet::new();
        let kind = DocumentKind::new("", "v1", "ConfigMap");
        assert_eq!(set.documents_of_kind_mut(&kind).count(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_update_refreshes_kind() {
        let mut set: DocumentSet = vec![service("a", "prod")].into_iter().collect();
        let service_kind = DocumentKind::new("", "v1", "Service");
        let config_kind = DocumentKind::new("", "v1", "ConfigMap");

        for document in set.documents_of_kind_mut(&service_kind) {
            document
                .update(|object| {
                    object["kind"] = json!("ConfigMap");
                    Ok(())
                })
                .unwrap();
        }

        assert!(set.documents_of_kind(&service_kind).is_empty());
        assert_eq!(set.documents_of_kind(&config_kind).len(), 1);
        assert_eq!(set.kinds(), vec![&config_kind]);
    }

    #[test]
    fn test_update_keeps_kind_when_fields_become_invalid() {
        let mut doc = service("a", "prod");
        let err = doc
            .update(|object| {
                object["kind"] = json!(7);
                Err::<(), _>(TemplateError::Config("rejected".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, TemplateError::Config(_)));
        assert_eq!(doc.kind(), &DocumentKind::new("", "v1", "Service"));
    }
}
