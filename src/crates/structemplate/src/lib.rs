//! structemplate - parameter injection for YAML/JSON manifest templates
//!
//! A template is a manifest plus a list of parameter definitions. Parameters
//! reach the documents in one of two ways:
//!
//! - **StrSlot** parameters replace `${CODE}` placeholders in the manifest text
//!   before it is decoded.
//! - **PathTarget** parameters are written into the decoded documents at a path
//!   expression such as `.spec.rules.[0].backendRefs`, selected by document
//!   kind and an optional label selector.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use structemplate::{
//!     parse_manifest, render_path_params, DocumentKind, InjectionTarget,
//!     ParameterDefinition, ValueMap, WriteMode,
//! };
//!
//! let mut documents = parse_manifest(
//!     "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\nspec:\n  ports: []\n",
//! )
//! .unwrap();
//!
//! let service = DocumentKind::new("", "v1", "Service");
//! let params = vec![
//!     ParameterDefinition::path_target("PORT", vec![InjectionTarget::new(service, ".spec.ports")])
//!         .with_write_mode(WriteMode::AppendArray),
//! ];
//! let values: ValueMap = [("PORT".to_string(), json!({"port": 443}))].into();
//!
//! render_path_params(&mut documents, &params, &values).unwrap();
//! let doc = documents.iter().next().unwrap();
//! assert_eq!(doc.object()["spec"]["ports"], json!([{"port": 443}]));
//! ```

pub mod config;
pub mod error;
pub mod manifest;
pub mod model;
pub mod normalize;
pub mod path;
pub mod render;
pub mod strslot;
pub mod template;

pub use config::RenderOptions;
pub use error::{Result, TemplateError};
pub use manifest::{parse_manifest, to_json, to_yaml};
pub use model::{
    split_params_by_type, Document, DocumentKind, DocumentSet, InjectionTarget, LabelSelector,
    ParamType, ParameterDefinition, ParamsByType, ValueMap, WriteMode,
};
pub use normalize::{normalize_value, to_tree_value};
pub use path::{deep_copy, get, set, set_segments, PathSegment, SetMode};
pub use render::{apply_to_document, render_path_params, render_path_params_atomic, resolve_value};
pub use strslot::{render_str_slot_template, StrSlotOutput};
pub use template::{RenderedTemplate, Template};
