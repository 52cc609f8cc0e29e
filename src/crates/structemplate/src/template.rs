//! End-to-end template rendering: StrSlot substitution, manifest decoding,
//! then path-target injection.

use crate::config::{load_params_file, RenderOptions};
use crate::error::{Result, TemplateError};
use crate::manifest::parse_manifest;
use crate::model::{split_params_by_type, DocumentSet, ParameterDefinition, ValueMap};
use crate::render::render_path_params;
use crate::strslot::render_str_slot_template;
use std::path::Path;

/// A manifest plus the parameters it accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub manifest: String,
    pub params: Vec<ParameterDefinition>,
}

/// Output of [`Template::render`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTemplate {
    pub documents: DocumentSet,
    /// StrSlot names that rendered as empty strings.
    pub missing_keys: Vec<String>,
}

impl Template {
    pub fn new(manifest: impl Into<String>, params: Vec<ParameterDefinition>) -> Self {
        Self {
            manifest: manifest.into(),
            params,
        }
    }

    /// Read the manifest text and, optionally, a parameter definition file.
    pub fn load(manifest_path: impl AsRef<Path>, params_path: Option<&Path>) -> Result<Self> {
        let manifest = std::fs::read_to_string(manifest_path.as_ref())?;
        let params = match params_path {
            Some(path) => load_params_file(path)?,
            None => Vec::new(),
        };
        Ok(Self::new(manifest, params))
    }

    /// Render the template with `values`.
    ///
    /// Documents are decoded fresh for every call and only returned when all
    /// injections succeed.
    pub fn render(&self, values: &ValueMap, options: &RenderOptions) -> Result<RenderedTemplate> {
        let split = split_params_by_type(&self.params);

        let mut slot_values = values.clone();
        for param in &split.str_slot {
            let supplied = slot_values.get(&param.code).is_some_and(|v| !v.is_null());
            if let (false, Some(default)) = (supplied, &param.default) {
                slot_values.insert(param.code.clone(), default.clone());
            }
        }

        let output = render_str_slot_template(&self.manifest, &slot_values)?;
        for key in &output.missing_keys {
            let optional = split
                .by_code
                .get(key.as_str())
                .is_some_and(|param| param.optional);
            if options.strict && !optional {
                return Err(TemplateError::RequiredParameterMissing { code: key.clone() });
            }
            tracing::warn!(code = %key, "StrSlot parameter has no value, rendered as empty");
        }

        let mut documents = parse_manifest(&output.rendered)?;
        render_path_params(&mut documents, &self.params, values)?;

        Ok(RenderedTemplate {
            documents,
            missing_keys: output.missing_keys,
        })
    }
}
