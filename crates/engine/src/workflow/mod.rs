//! Workflow definitions and their late-bound effect configuration.
//!
//! [`document`] turns parsed documents into [`WorkflowDefinition`]s; [`bindings`] holds the
//! per-step configuration that is resolved against the context just before a step runs.

pub mod bindings;
pub mod document;

pub use bindings::{EffectArgs, EffectBinding, resolve_config_value};
pub use document::{WorkflowDefinition, build_workflow};
