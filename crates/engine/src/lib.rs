//! # Effectflow Engine
//!
//! The Effectflow Engine compiles a declared, ordered list of configuration-bound effects
//! into a single unit of work that threads a context through each step and stops at the
//! first failure.
//!
//! ## Key Features
//!
//! - **Copy-on-write context**: dotted-path reads and writes over a shared value tree
//! - **Late binding**: each step's configuration is resolved against the context produced
//!   by the steps before it
//! - **Short-circuiting**: the first failing step stops the run and is named in the error
//! - **Pluggable effects**: short class names plus qualified `module::path::Name` plugins
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use effectflow_engine::{EffectRegistry, build_workflow, parse_workflow_file, Effect};
//!
//! let temp_dir = tempfile::tempdir()?;
//! let workflow_path = temp_dir.path().join("workflow.yaml");
//! std::fs::write(&workflow_path, r#"
//! workflow:
//!   name: double
//!   context: { x: 2 }
//!   effects:
//!     - name: double_x
//!       class: Multiply
//!       config:
//!         path: x
//!         factor: 2
//! "#)?;
//!
//! let definition = parse_workflow_file(&workflow_path, Arc::new(EffectRegistry::with_builtins()))?;
//! let (context, pipeline) = build_workflow(definition);
//! let result = pipeline.execute(&context)?;
//! assert_eq!(result.get("x").and_then(|value| value.as_i64()), Some(4));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`context`**: the copy-on-write [`Context`] and its path helpers
//! - **`outcome`**: the short-circuiting [`Outcome`] type
//! - **`effect`**: the [`Effect`] trait and its composites
//! - **`workflow`**: definitions and late-bound [`EffectBinding`]s
//! - **`executor`**: the [`ExecutionBuilder`] that compiles bindings into one effect
//! - **`registry`** / **`plugin`**: class lookup and qualified plugin resolution
//! - **`effects`**: the built-in effect set

use std::{fs, path::Path, sync::Arc};

use effectflow_types::WorkflowDocument;

pub mod context;
pub mod effect;
pub mod effects;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod plugin;
pub mod registry;
pub mod workflow;

// Re-export commonly used types for convenience
pub use context::Context;
pub use effect::{ConfigurableEffect, Conditional, Effect, EffectId, FunctionEffect, Identity, Sequential};
pub use error::{BindingResolutionError, ContextError, DefinitionError, PluginResolutionError, StepError, StepFailure};
pub use executor::ExecutionBuilder;
pub use outcome::Outcome;
pub use plugin::{PluginCatalog, PluginExport, PluginModule, register_effect_plugins};
pub use registry::{EffectFactory, EffectLookup, EffectRegistry};
pub use workflow::{EffectArgs, EffectBinding, WorkflowDefinition, build_workflow};

/// Reads and parses a workflow document, binding its effects to `lookup`.
///
/// # Errors
///
/// Returns a [`DefinitionError`] when the file cannot be read, is not valid YAML, lacks a
/// `workflow` section, or declares an effect without a `name` or `class`. Effect classes are
/// not resolved here; an unknown class fails the run before its first step.
pub fn parse_workflow_file(file_path: impl AsRef<Path>, lookup: Arc<dyn EffectLookup>) -> Result<WorkflowDefinition, DefinitionError> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).map_err(|source| DefinitionError::Read {
        path: file_path.to_path_buf(),
        source,
    })?;
    parse_workflow_str(&content, lookup)
}

/// Parses a workflow document held in memory.
pub fn parse_workflow_str(content: &str, lookup: Arc<dyn EffectLookup>) -> Result<WorkflowDefinition, DefinitionError> {
    let document = WorkflowDocument::from_yaml_str(content)?;
    WorkflowDefinition::from_document(document, lookup)
}

#[cfg(test)]
mod tests {
    use effectflow_types::{DocumentError, Value};

    use super::*;

    fn lookup() -> Arc<dyn EffectLookup> {
        Arc::new(EffectRegistry::with_builtins())
    }

    #[test]
    fn parse_workflow_file_reads_documents() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let workflow_path = temp_dir.path().join("workflow.yaml");
        fs::write(
            &workflow_path,
            r#"
workflow:
  name: test-workflow
  context:
    app: { name: demo }
  effects:
    - name: announce
      class: Print
      config:
        value:
          context: app.name
"#,
        )?;

        let definition = parse_workflow_file(&workflow_path, lookup())?;
        assert_eq!(definition.name(), "test-workflow");
        assert_eq!(definition.bindings().len(), 1);
        assert_eq!(definition.context().get("app.name"), Some(&Value::from("demo")));
        Ok(())
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let error = parse_workflow_file("/definitely/not/here.yaml", lookup()).expect_err("missing file");
        assert!(matches!(error, DefinitionError::Read { .. }));
        assert!(error.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn structural_problems_name_the_entry_index() {
        let missing_workflow = parse_workflow_str("effects: []\n", lookup()).expect_err("no workflow key");
        assert!(matches!(missing_workflow, DefinitionError::Document(DocumentError::MissingWorkflow)));

        let missing_class = parse_workflow_str(
            "workflow:\n  effects:\n    - name: ok\n      class: Print\n    - name: broken\n",
            lookup(),
        )
        .expect_err("second entry lacks a class");
        assert!(matches!(
            missing_class,
            DefinitionError::Document(DocumentError::MissingClass { index: 1, .. })
        ));

        let missing_name = parse_workflow_str("workflow:\n  effects:\n    - class: Print\n", lookup()).expect_err("no name");
        assert_eq!(missing_name.to_string(), "effect at index 0 must have a 'name'");
    }

    #[test]
    fn invalid_yaml_is_a_syntax_error() {
        let error = parse_workflow_str("workflow: [unclosed", lookup()).expect_err("invalid yaml");
        assert!(matches!(error, DefinitionError::Document(DocumentError::Syntax(_))));
    }

    #[test]
    fn unknown_classes_are_not_rejected_at_parse_time() -> anyhow::Result<()> {
        let definition = parse_workflow_str("workflow:\n  effects:\n    - name: later\n      class: Unknown\n", lookup())?;
        assert_eq!(definition.bindings()[0].class(), "Unknown");
        Ok(())
    }
}
