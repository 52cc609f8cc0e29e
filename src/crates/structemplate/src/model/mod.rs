//! Documents, parameter definitions and injection targets

mod document;
mod params;

pub use document::{Document, DocumentKind, DocumentSet, LabelSelector};
pub use params::{
    split_params_by_type, InjectionTarget, ParamType, ParameterDefinition, ParamsByType,
    ValueMap, WriteMode,
};
