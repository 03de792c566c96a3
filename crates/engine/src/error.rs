//! Error types for workflow definition, plugin resolution, binding resolution, and execution.
//!
//! Everything that can go wrong while a step is being prepared or run is funnelled into a
//! [`StepFailure`], which always carries the declared name of the offending step, the context
//! the step was handed, and the underlying [`StepError`].

use std::path::PathBuf;

use effectflow_types::{DocumentError, ValueType};
use thiserror::Error;

use crate::context::Context;

/// Malformed workflow definitions; raised before any effect runs.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read workflow file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("invalid initial context override: {0}")]
    Override(#[from] ContextError),
}

/// Failures to map a declared class or plugin identifier to an effect constructor.
#[derive(Debug, Error)]
pub enum PluginResolutionError {
    #[error("effect class '{class}' is not registered (available: {})", list_or_none(.available))]
    Unregistered { class: String, available: Vec<String> },

    #[error("invalid effect plugin identifier '{identifier}': expected 'module::path::Name'")]
    InvalidIdentifier { identifier: String },

    #[error("could not find effect plugin module '{module}'")]
    ModuleNotFound { module: String },

    #[error("effect plugin module '{module}' has no export named '{name}'")]
    ExportNotFound { module: String, name: String },

    #[error("'{identifier}' is a {kind}, not an effect")]
    NotAnEffect { identifier: String, kind: String },
}

/// Failures while turning configuration bindings into constructor arguments.
#[derive(Debug, Error)]
pub enum BindingResolutionError {
    #[error("parameter '{parameter}': {source}")]
    Path {
        parameter: String,
        #[source]
        source: ContextError,
    },

    #[error("parameter '{parameter}' declared as {}: {reason}", .expected.as_str())]
    TypeMismatch {
        parameter: String,
        expected: ValueType,
        reason: String,
    },

    #[error("effect class '{class}' rejected its configuration: {source:#}")]
    Construction {
        class: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Problems with context paths and `path=value` assignments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("malformed context path '{path}': {reason}")]
    MalformedPath { path: String, reason: &'static str },

    #[error("invalid context assignment '{0}': expected '<path>=<value>'")]
    InvalidAssignment(String),
}

/// Why a step failed.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("plugin resolution error: {0}")]
    Plugin(#[from] PluginResolutionError),

    #[error("binding resolution error: {0}")]
    Binding(#[from] BindingResolutionError),

    #[error("effect execution error: {0:#}")]
    Execution(anyhow::Error),
}

/// Which step failed, and why.
#[derive(Debug, Error)]
#[error("step '{step}' failed: {cause}")]
pub struct StepFailure {
    /// Declared name of the binding that failed.
    pub step: String,
    pub cause: StepError,
    /// Context the failing step received; holds every write made by the steps before it.
    pub context: Context,
}

impl StepFailure {
    pub fn new(step: impl Into<String>, cause: impl Into<StepError>, context: Context) -> Self {
        Self {
            step: step.into(),
            cause: cause.into(),
            context,
        }
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
