//! Shared value model and workflow document schema for effectflow.
//!
//! - [`value`]: the dynamically typed [`Value`] threaded through workflow contexts
//! - [`workflow`]: the YAML document schema, its fail-fast validation, and a fluent builder

pub mod value;
pub mod workflow;

pub use value::{Value, ValueMap};
pub use workflow::{
    ConfigBinding, ConfigEntry, DEFAULT_WORKFLOW_NAME, DocumentError, EffectDeclaration, ValueType, WorkflowDocument,
    WorkflowDocumentBuilder, WorkflowSection, validation::validate_value_type,
};
