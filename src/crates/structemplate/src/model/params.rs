//! Parameter definitions and injection targets

use super::document::{DocumentKind, LabelSelector};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

/// Supplied parameter values keyed by parameter code.
pub type ValueMap = HashMap<String, JsonValue>;

/// How a parameter's value reaches a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParamType {
    /// `${CODE}` placeholders substituted in the manifest text.
    #[default]
    StrSlot,
    /// Values written into decoded documents at a path.
    #[serde(alias = "JsonPath")]
    PathTarget,
}

/// Where a path-target value is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionTarget {
    #[serde(alias = "targetGVK")]
    pub document_kind: DocumentKind,
    #[serde(alias = "paramJsonPath")]
    pub path: String,
    #[serde(
        default,
        alias = "objectDistinctLabel",
        skip_serializing_if = "LabelSelector::is_empty"
    )]
    pub label_selector: LabelSelector,
}

impl InjectionTarget {
    pub fn new(document_kind: DocumentKind, path: impl Into<String>) -> Self {
        Self {
            document_kind,
            path: path.into(),
            label_selector: LabelSelector::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.label_selector.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for InjectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] at \"{}\"", self.document_kind, self.path)?;
        if !self.label_selector.is_empty() {
            let selector: Vec<String> = self
                .label_selector
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, " selecting {}", selector.join(","))?;
        }
        Ok(())
    }
}

/// How a resolved value is merged at the target path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Overwrite the node at the path.
    #[default]
    Replace,
    /// Append to the array field at the path.
    AppendArray,
    /// Insert the value under this key of the map at the path.
    InsertMapKey(String),
}

/// One injectable value of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ParameterSpec", into = "ParameterSpec")]
pub struct ParameterDefinition {
    pub code: String,
    pub name: String,
    pub description: String,
    pub function_scope: String,
    pub param_type: ParamType,
    pub targets: Vec<InjectionTarget>,
    pub optional: bool,
    pub default: Option<JsonValue>,
    pub available_options: Vec<JsonValue>,
    pub customizable: bool,
    pub value_data_type: String,
    pub write_mode: WriteMode,
}

impl ParameterDefinition {
    /// A required path-target parameter writing to `targets` in replace mode.
    pub fn path_target(code: impl Into<String>, targets: Vec<InjectionTarget>) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            description: String::new(),
            function_scope: String::new(),
            param_type: ParamType::PathTarget,
            targets,
            optional: false,
            default: None,
            available_options: Vec::new(),
            customizable: true,
            value_data_type: String::new(),
            write_mode: WriteMode::Replace,
        }
    }

    /// A required StrSlot parameter.
    pub fn str_slot(code: impl Into<String>) -> Self {
        Self {
            param_type: ParamType::StrSlot,
            ..Self::path_target(code, Vec::new())
        }
    }

    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }
}

/// Wire shape of a parameter definition. `appendArray` and `mapKey` are two
/// independent fields here and collapse into a single `WriteMode`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ParameterSpec {
    #[serde(alias = "paramCode")]
    code: String,
    #[serde(alias = "paramName")]
    name: String,
    #[serde(alias = "brief")]
    description: String,
    function_scope: String,
    #[serde(rename = "type", alias = "paramType")]
    param_type: ParamType,
    #[serde(alias = "valueInjectTargets")]
    targets: Vec<InjectionTarget>,
    optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    available_options: Vec<JsonValue>,
    #[serde(default = "customizable_by_default")]
    customizable: bool,
    #[serde(rename = "dataType", skip_serializing_if = "String::is_empty")]
    value_data_type: String,
    append_array: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    map_key: String,
}

fn customizable_by_default() -> bool {
    true
}

impl From<ParameterSpec> for ParameterDefinition {
    fn from(spec: ParameterSpec) -> Self {
        let write_mode = match (spec.append_array, spec.map_key.is_empty()) {
            (true, false) => {
                tracing::warn!(
                    code = %spec.code,
                    map_key = %spec.map_key,
                    "parameter sets both appendArray and mapKey; appending and ignoring mapKey"
                );
                WriteMode::AppendArray
            }
            (true, true) => WriteMode::AppendArray,
            (false, false) => WriteMode::InsertMapKey(spec.map_key),
            (false, true) => WriteMode::Replace,
        };

        Self {
            code: spec.code,
            name: spec.name,
            description: spec.description,
            function_scope: spec.function_scope,
            param_type: spec.param_type,
            targets: spec.targets,
            optional: spec.optional,
            default: spec.default,
            available_options: spec.available_options,
            customizable: spec.customizable,
            value_data_type: spec.value_data_type,
            write_mode,
        }
    }
}

impl From<ParameterDefinition> for ParameterSpec {
    fn from(param: ParameterDefinition) -> Self {
        let (append_array, map_key) = match param.write_mode {
            WriteMode::Replace => (false, String::new()),
            WriteMode::AppendArray => (true, String::new()),
            WriteMode::InsertMapKey(key) => (false, key),
        };

        Self {
            code: param.code,
            name: param.name,
            description: param.description,
            function_scope: param.function_scope,
            param_type: param.param_type,
            targets: param.targets,
            optional: param.optional,
            default: param.default,
            available_options: param.available_options,
            customizable: param.customizable,
            value_data_type: param.value_data_type,
            append_array,
            map_key,
        }
    }
}

/// Parameters split by how they are rendered.
#[derive(Debug, Default)]
pub struct ParamsByType<'a> {
    pub str_slot: Vec<&'a ParameterDefinition>,
    pub path_target: Vec<&'a ParameterDefinition>,
    /// Every parameter by code; a later definition shadows an earlier one.
    pub by_code: HashMap<&'a str, &'a ParameterDefinition>,
}

/// Split parameters into StrSlot and PathTarget groups and index them by code.
pub fn split_params_by_type(params: &[ParameterDefinition]) -> ParamsByType<'_> {
    let mut split = ParamsByType::default();
    for param in params {
        match param.param_type {
            ParamType::StrSlot => split.str_slot.push(param),
            ParamType::PathTarget => split.path_target.push(param),
        }
        split.by_code.insert(param.code.as_str(), param);
    }
    split
}
