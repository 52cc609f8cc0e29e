//! Configuration loading: parameter and value files, render options.
//!
//! Parameter definitions and supplied values are read from YAML or JSON
//! files, with the format picked from the file extension. Render options
//! can also come from the environment: `STRUCTEMPLATE_STRICT` makes an
//! unresolved StrSlot placeholder an error unless its parameter is optional.

use crate::error::{Result, TemplateError};
use crate::model::{ParameterDefinition, ValueMap};
use crate::normalize::normalize_value;
use serde::de::DeserializeOwned;
use std::path::Path;

pub const STRICT_ENV: &str = "STRUCTEMPLATE_STRICT";

/// Options controlling a template render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Treat unresolved StrSlot placeholders as errors unless their
    /// parameter is declared optional.
    pub strict: bool,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Read options from the environment, defaulting unset variables to `false`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            strict: env_bool_or(STRICT_ENV, false)?,
        })
    }
}

/// Parse a boolean flag value (`true/1/yes/on`, `false/0/no/off`).
pub fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(TemplateError::Config(format!(
            "Invalid boolean value for '{}': {}",
            key, value
        ))),
    }
}

fn env_bool_or(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(value) => parse_bool(key, &value),
        Err(_) => Ok(default),
    }
}

/// Encodings accepted for parameter and value files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    fn detect(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                TemplateError::Config(format!("{:?} has no extension to pick a format from", path))
            })?;

        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(TemplateError::Config(format!(
                "{:?}: unsupported extension '{}', expected yaml, yml or json",
                path, other
            ))),
        }
    }

    fn decode<T: DeserializeOwned>(self, path: &Path, content: &str) -> Result<T> {
        let decoded = match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        decoded.map_err(|e| TemplateError::Config(format!("{:?} ({:?}): {}", path, self, e)))
    }
}

/// Read a YAML or JSON file, picking the decoder from the extension.
fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = FileFormat::detect(path)?;
    let content = std::fs::read_to_string(path)?;
    format.decode(path, &content)
}

/// Load a list of parameter definitions.
pub fn load_params_file(path: impl AsRef<Path>) -> Result<Vec<ParameterDefinition>> {
    let params: Vec<ParameterDefinition> = read_file(path.as_ref())?;
    tracing::debug!(path = ?path.as_ref(), params = params.len(), "loaded parameter definitions");
    Ok(params)
}

/// Load supplied values keyed by parameter code.
pub fn load_values_file(path: impl AsRef<Path>) -> Result<ValueMap> {
    let raw: ValueMap = read_file(path.as_ref())?;
    raw.into_iter()
        .map(|(code, value)| Ok((code, normalize_value(value)?)))
        .collect()
}
