//! Error types for template rendering and path operations.

use thiserror::Error;

/// Result type alias for structemplate operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors that can occur while reading, writing, or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Empty path expression or malformed array-index segment.
    #[error("Invalid path \"{path}\": {message}")]
    InvalidPath { path: String, message: String },

    /// A read walked through an absent key or an out-of-bounds index.
    #[error("Path not found: \"{path}\" (missing segment \"{segment}\")")]
    PathNotFound { path: String, segment: String },

    /// A traversal step hit a node that cannot be indexed by the segment.
    #[error("Element cannot be indexed at segment \"{segment}\" of \"{path}\": found {found}")]
    NotIndexable {
        path: String,
        segment: String,
        found: &'static str,
    },

    /// An append-mode target exists but is not a sequence.
    #[error("Append failed at \"{path}\": target is {found}, not an array")]
    NotAnArray { path: String, found: &'static str },

    /// A fixed-index write past the end of an existing sequence.
    #[error("Index {index} out of bounds at \"{path}\" (array length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    /// A non-optional parameter has neither a supplied value nor a default.
    #[error("Required parameter missing: {code}")]
    RequiredParameterMissing { code: String },

    /// A value outside the scalar/mapping/sequence set accepted by the tree.
    #[error("Unsupported scalar shape: {0}")]
    UnsupportedScalarShape(String),

    /// A single injection failed; wraps the underlying path error.
    #[error("Injecting parameter \"{code}\" into {target} failed: {source}")]
    Injection {
        code: String,
        target: String,
        #[source]
        source: Box<TemplateError>,
    },

    /// The manifest could not be decoded into documents.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// The StrSlot template text is malformed.
    #[error("Template syntax error at offset {offset}: {message}")]
    TemplateSyntax { offset: usize, message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        TemplateError::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn not_found(path: impl Into<String>, segment: impl Into<String>) -> Self {
        TemplateError::PathNotFound {
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// The innermost error, unwrapping any injection context.
    pub fn root_cause(&self) -> &TemplateError {
        match self {
            TemplateError::Injection { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for TemplateError {
    fn from(err: serde_json::Error) -> Self {
        TemplateError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for TemplateError {
    fn from(err: serde_yaml::Error) -> Self {
        TemplateError::Serialization(err.to_string())
    }
}

/// Short name of a tree node's shape, used in error messages.
pub(crate) fn kind_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
