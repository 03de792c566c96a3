//! Conversion from parsed documents into runnable workflow definitions.
//!
//! The parser in `effectflow_types::workflow` only guarantees structure. This layer turns
//! each declaration into an [`EffectBinding`] wired to the process-wide effect lookup and
//! builds the initial [`Context`].

use std::sync::Arc;

use effectflow_types::{WorkflowDocument, WorkflowSection};
use tracing::debug;

use crate::{
    context::Context,
    effect::FunctionEffect,
    error::DefinitionError,
    executor::ExecutionBuilder,
    registry::EffectLookup,
    workflow::bindings::EffectBinding,
};

/// A parsed workflow: its name, its ordered bindings, and its initial context.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    name: String,
    bindings: Vec<EffectBinding>,
    context: Context,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>, bindings: Vec<EffectBinding>, context: Context) -> Self {
        Self {
            name: name.into(),
            bindings,
            context,
        }
    }

    /// Validates `document` and binds every declared effect to `lookup`.
    pub fn from_document(document: WorkflowDocument, lookup: Arc<dyn EffectLookup>) -> Result<Self, DefinitionError> {
        let section = document.into_section()?;
        Ok(Self::from_section(section, lookup))
    }

    /// Binds an already validated section.
    pub fn from_section(section: WorkflowSection, lookup: Arc<dyn EffectLookup>) -> Self {
        let bindings = section
            .effects
            .into_iter()
            .map(|declaration| {
                let config = declaration
                    .config
                    .into_iter()
                    .map(|(parameter, entry)| (parameter, entry.into_binding()))
                    .collect();
                EffectBinding::new(declaration.name, declaration.class, config, Arc::clone(&lookup))
            })
            .collect::<Vec<_>>();

        debug!(workflow = %section.name, steps = bindings.len(), "parsed workflow definition");

        Self {
            name: section.name,
            bindings,
            context: Context::from_map(section.context),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &[EffectBinding] {
        &self.bindings
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Applies `path=value` assignments to the initial context, later ones winning.
    pub fn with_overrides<I, S>(mut self, assignments: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for assignment in assignments {
            self.context = self.context.apply_assignment(assignment.as_ref())?;
        }
        Ok(self)
    }

    pub fn into_parts(self) -> (String, Vec<EffectBinding>, Context) {
        (self.name, self.bindings, self.context)
    }
}

/// Compiles a definition into its initial context and a single runnable effect.
pub fn build_workflow(definition: WorkflowDefinition) -> (Context, FunctionEffect) {
    let (name, bindings, context) = definition.into_parts();
    let builder = bindings
        .into_iter()
        .fold(ExecutionBuilder::named(name), |builder, binding| builder.add_step(binding));
    (context, builder.compile())
}
