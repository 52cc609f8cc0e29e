//! Injection of path-target parameter values into documents.
//!
//! For each path-target parameter and each of its targets, the value is
//! resolved (supplied, then default), documents of the target kind are
//! filtered by the label selector, and the value is written with the
//! parameter's write mode.
//!
//! Rendering is fail-fast and not transactional: the first error aborts the
//! call and earlier writes stay in place. Use [`render_path_params_atomic`]
//! to get all-or-nothing behavior.

use crate::error::{Result, TemplateError};
use crate::model::{
    Document, DocumentSet, InjectionTarget, ParamType, ParameterDefinition, ValueMap, WriteMode,
};
use crate::normalize::normalize_value;
use crate::path::{self, PathSegment, SetMode};
use serde_json::Value as JsonValue;

/// Resolve the value for a parameter: the supplied value, else its default.
///
/// Returns `Ok(None)` for an optional parameter with no value. A JSON `null`
/// counts as no value.
pub fn resolve_value(param: &ParameterDefinition, values: &ValueMap) -> Result<Option<JsonValue>> {
    let value = values
        .get(&param.code)
        .filter(|v| !v.is_null())
        .or(param.default.as_ref().filter(|v| !v.is_null()));

    match value {
        Some(value) => Ok(Some(value.clone())),
        None if param.optional => Ok(None),
        None => Err(TemplateError::RequiredParameterMissing {
            code: param.code.clone(),
        }),
    }
}

/// Write every path-target parameter into the matching documents.
///
/// StrSlot parameters are skipped.
pub fn render_path_params(
    documents: &mut DocumentSet,
    params: &[ParameterDefinition],
    values: &ValueMap,
) -> Result<()> {
    for param in params {
        if param.param_type != ParamType::PathTarget {
            continue;
        }

        for target in &param.targets {
            let Some(value) = resolve_value(param, values)? else {
                tracing::debug!(code = %param.code, "optional parameter has no value, skipping");
                continue;
            };

            let applied = apply_to_target(documents, param, target, &value)?;
            tracing::debug!(
                code = %param.code,
                target = %target,
                documents = applied,
                "injected parameter"
            );
        }
    }
    Ok(())
}

/// Render into a copy of `documents` and keep it only if every injection
/// succeeds. On error `documents` is left untouched.
pub fn render_path_params_atomic(
    documents: &mut DocumentSet,
    params: &[ParameterDefinition],
    values: &ValueMap,
) -> Result<()> {
    let mut staged = documents.clone();
    render_path_params(&mut staged, params, values)?;
    *documents = staged;
    Ok(())
}

/// Apply one target to every selected document, returning how many were written.
fn apply_to_target(
    documents: &mut DocumentSet,
    param: &ParameterDefinition,
    target: &InjectionTarget,
    value: &JsonValue,
) -> Result<usize> {
    let mut applied = 0;
    for document in documents.documents_of_kind_mut(&target.document_kind) {
        if !document.matches_selector(&target.label_selector) {
            continue;
        }

        tracing::trace!(
            code = %param.code,
            document = document.name().unwrap_or("<unnamed>"),
            path = %target.path,
            "applying parameter to document"
        );
        apply_to_document(document, &target.path, value, &param.write_mode).map_err(|e| {
            TemplateError::Injection {
                code: param.code.clone(),
                target: target.to_string(),
                source: Box::new(e),
            }
        })?;
        applied += 1;
    }
    Ok(applied)
}

/// Write `value` into one document at `path` using `mode`.
pub fn apply_to_document(
    document: &mut Document,
    path: &str,
    value: &JsonValue,
    mode: &WriteMode,
) -> Result<()> {
    match mode {
        WriteMode::AppendArray => document
            .update(|tree| path::set(tree, path, value.clone(), SetMode::AppendArray)),
        WriteMode::InsertMapKey(key) => {
            let value = normalize_value(value.clone())?;
            let mut segments = path::parse_path(path)?;
            segments.push(PathSegment::Key(key.clone()));
            document.update(|tree| path::set_segments(tree, &segments, value, SetMode::Replace))
        }
        WriteMode::Replace => {
            let value = normalize_value(value.clone())?;
            document.update(|tree| path::set(tree, path, value, SetMode::Replace))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentKind;
    use serde_json::json;

    fn route_kind() -> DocumentKind {
        DocumentKind::new("gateway.networking.k8s.io", "v1alpha2", "TLSRoute")
    }

    fn route(name: &str, env: &str) -> Document {
        Document::from_value(json!({
            "apiVersion": "gateway.networking.k8s.io/v1alpha2",
            "kind": "TLSRoute",
            "metadata": {"name": name, "labels": {"env": env}},
            "spec": {"hostnames": ["a", "b"]}
        }))
        .unwrap()
    }

    fn documents() -> DocumentSet {
        vec![route("prod-route", "prod"), route("dev-route", "dev")]
            .into_iter()
            .collect()
    }

    fn hostnames(documents: &DocumentSet, index: usize) -> JsonValue {
        let routes = documents.documents_of_kind(&route_kind());
        routes[index].object()["spec"]["hostnames"].clone()
    }

    #[test]
    fn test_resolve_prefers_supplied_value() {
        let param = ParameterDefinition::path_target("HOST", Vec::new()).with_default(json!("d"));
        let values: ValueMap = [("HOST".to_string(), json!("s"))].into();
        assert_eq!(resolve_value(&param, &values).unwrap(), Some(json!("s")));
        assert_eq!(resolve_value(&param, &ValueMap::new()).unwrap(), Some(json!("d")));
    }

    #[test]
    fn test_resolve_null_falls_back_to_default() {
        let param = ParameterDefinition::path_target("HOST", Vec::new()).with_default(json!("d"));
        let values: ValueMap = [("HOST".to_string(), JsonValue::Null)].into();
        assert_eq!(resolve_value(&param, &values).unwrap(), Some(json!("d")));
    }

    #[test]
    fn test_resolve_optional_and_required() {
        let optional = ParameterDefinition::path_target("OPT", Vec::new()).with_optional(true);
        assert_eq!(resolve_value(&optional, &ValueMap::new()).unwrap(), None);

        let required = ParameterDefinition::path_target("REQ", Vec::new());
        match resolve_value(&required, &ValueMap::new()) {
            Err(TemplateError::RequiredParameterMissing { code }) => assert_eq!(code, "REQ"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_render_filters_by_label_selector() {
        let mut docs = documents();
        let target = InjectionTarget::new(route_kind(), ".spec.hostnames").with_label("env", "prod");
        let params = vec![ParameterDefinition::path_target("HOSTS", vec![target])
            .with_write_mode(WriteMode::AppendArray)];
        let values: ValueMap = [("HOSTS".to_string(), json!("c"))].into();

        render_path_params(&mut docs, &params, &values).unwrap();

        assert_eq!(hostnames(&docs, 0), json!(["a", "b", "c"]));
        assert_eq!(hostnames(&docs, 1), json!(["a", "b"]));
    }

    #[test]
    fn test_render_applies_repeated_targets_independently() {
        let mut docs = documents();
        let params = vec![ParameterDefinition::path_target(
            "PORT",
            vec![
                InjectionTarget::new(route_kind(), ".spec.port").with_label("env", "prod"),
                InjectionTarget::new(route_kind(), ".spec.listener.port"),
            ],
        )];
        let values: ValueMap = [("PORT".to_string(), json!(8443))].into();

        render_path_params(&mut docs, &params, &values).unwrap();

        let routes = docs.documents_of_kind(&route_kind());
        assert_eq!(routes[0].object()["spec"]["port"], json!(8443));
        assert!(routes[1].object()["spec"].get("port").is_none());
        assert_eq!(routes[1].object()["spec"]["listener"]["port"], json!(8443));
    }

    #[test]
    fn test_render_skips_str_slot_params() {
        let mut docs = documents();
        let before = docs.clone();
        let mut param = ParameterDefinition::str_slot("NAME");
        param.targets = vec![InjectionTarget::new(route_kind(), ".spec.name")];

        render_path_params(&mut docs, &[param], &ValueMap::new()).unwrap();
        assert_eq!(docs, before);
    }

    #[test]
    fn test_render_ignores_unknown_kind() {
        let mut docs = documents();
        let before = docs.clone();
        let target = InjectionTarget::new(DocumentKind::new("", "v1", "Service"), ".spec.x");
        let params = vec![ParameterDefinition::path_target("X", vec![target])];
        let values: ValueMap = [("X".to_string(), json!(1))].into();

        render_path_params(&mut docs, &params, &values).unwrap();
        assert_eq!(docs, before);
    }

    #[test]
    fn test_render_is_fail_fast_not_transactional() {
        let mut docs = documents();
        let params = vec![
            ParameterDefinition::path_target(
                "FIRST",
                vec![InjectionTarget::new(route_kind(), ".spec.first")],
            ),
            ParameterDefinition::path_target(
                "MISSING",
                vec![InjectionTarget::new(route_kind(), ".spec.second")],
            ),
        ];
        let values: ValueMap = [("FIRST".to_string(), json!(1))].into();

        let err = render_path_params(&mut docs, &params, &values).unwrap_err();
        assert!(matches!(err, TemplateError::RequiredParameterMissing { ref code } if code == "MISSING"));

        let routes = docs.documents_of_kind(&route_kind());
        assert_eq!(routes[0].object()["spec"]["first"], json!(1));
        assert!(routes[0].object()["spec"].get("second").is_none());
    }

    #[test]
    fn test_atomic_render_leaves_documents_untouched_on_error() {
        let mut docs = documents();
        let before = docs.clone();
        let params = vec![
            ParameterDefinition::path_target(
                "FIRST",
                vec![InjectionTarget::new(route_kind(), ".spec.first")],
            ),
            ParameterDefinition::path_target(
                "BAD",
                vec![InjectionTarget::new(route_kind(), ".spec.hostnames.[5]")],
            ),
        ];
        let values: ValueMap = [
            ("FIRST".to_string(), json!(1)),
            ("BAD".to_string(), json!("x")),
        ]
        .into();

        let err = render_path_params_atomic(&mut docs, &params, &values).unwrap_err();
        assert!(matches!(err.root_cause(), TemplateError::IndexOutOfBounds { .. }));
        assert_eq!(docs, before);

        let values: ValueMap = [("FIRST".to_string(), json!(1))].into();
        render_path_params_atomic(&mut docs, &params[..1], &values).unwrap();
        assert_eq!(
            docs.documents_of_kind(&route_kind())[0].object()["spec"]["first"],
            json!(1)
        );
    }

    #[test]
    fn test_injection_error_names_parameter_and_target() {
        let mut docs = documents();
        let params = vec![ParameterDefinition::path_target(
            "HOSTS",
            vec![InjectionTarget::new(route_kind(), ".spec.hostnames.fakeKey")],
        )];
        let values: ValueMap = [("HOSTS".to_string(), json!("x"))].into();

        match render_path_params(&mut docs, &params, &values).unwrap_err() {
            TemplateError::Injection { code, target, source } => {
                assert_eq!(code, "HOSTS");
                assert!(target.contains(".spec.hostnames.fakeKey"));
                assert!(matches!(*source, TemplateError::NotIndexable { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_apply_insert_map_key() {
        let mut doc = route("r", "prod");
        apply_to_document(
            &mut doc,
            ".spec",
            &json!("newObjectValue"),
            &WriteMode::InsertMapKey("newObjectKey".to_string()),
        )
        .unwrap();
        assert_eq!(doc.object()["spec"]["newObjectKey"], json!("newObjectValue"));
        assert_eq!(doc.object()["spec"]["hostnames"], json!(["a", "b"]));
    }

    #[test]
    fn test_apply_insert_dotted_map_key() {
        let mut doc = route("r", "prod");
        apply_to_document(
            &mut doc,
            ".metadata.labels",
            &json!("web"),
            &WriteMode::InsertMapKey("app.kubernetes.io/name".to_string()),
        )
        .unwrap();
        assert_eq!(
            doc.object()["metadata"]["labels"],
            json!({"env": "prod", "app.kubernetes.io/name": "web"})
        );
    }

    #[test]
    fn test_kind_rewrite_moves_document_for_later_targets() {
        let mut docs = documents();
        let renamed = DocumentKind::new("gateway.networking.k8s.io", "v1alpha2", "TCPRoute");
        let params = vec![
            ParameterDefinition::path_target(
                "KIND",
                vec![InjectionTarget::new(route_kind(), ".kind").with_label("env", "prod")],
            ),
            ParameterDefinition::path_target(
                "PORT",
                vec![InjectionTarget::new(route_kind(), ".spec.port")],
            ),
            ParameterDefinition::path_target(
                "TIMEOUT",
                vec![InjectionTarget::new(renamed.clone(), ".spec.timeout")],
            ),
        ];
        let values: ValueMap = [
            ("KIND".to_string(), json!("TCPRoute")),
            ("PORT".to_string(), json!(8443)),
            ("TIMEOUT".to_string(), json!("5s")),
        ]
        .into();

        render_path_params(&mut docs, &params, &values).unwrap();

        let tcp = docs.documents_of_kind(&renamed);
        assert_eq!(tcp.len(), 1);
        assert_eq!(tcp[0].name(), Some("prod-route"));
        assert!(tcp[0].object()["spec"].get("port").is_none());
        assert_eq!(tcp[0].object()["spec"]["timeout"], json!("5s"));

        let tls = docs.documents_of_kind(&route_kind());
        assert_eq!(tls.len(), 1);
        assert_eq!(tls[0].object()["spec"]["port"], json!(8443));
        assert!(tls[0].object()["spec"].get("timeout").is_none());
    }

    #[test]
    fn test_apply_replace_rejects_unsupported_integer() {
        let mut doc = route("r", "prod");
        let err = apply_to_document(&mut doc, ".spec.big", &json!(u64::MAX), &WriteMode::Replace)
            .unwrap_err();
        assert!(matches!(err, TemplateError::UnsupportedScalarShape(_)));
    }
}
