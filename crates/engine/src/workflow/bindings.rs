//! Late-bound effect configuration.
//!
//! An [`EffectBinding`] pairs a declared class with configuration parameters that point into
//! the context. Nothing is resolved when the binding is created: [`EffectBinding::init`]
//! looks the class up and evaluates every parameter against the context that is current
//! when the step is about to run, so earlier steps can feed later ones.

use std::{fmt, sync::Arc};

use anyhow::anyhow;
use effectflow_types::{ConfigBinding, Value, validate_value_type};
use indexmap::IndexMap;
use tracing::debug;

use crate::{
    context::{Context, validate_path},
    effect::{Effect, EffectId},
    error::{BindingResolutionError, PluginResolutionError, StepError},
    registry::{EffectFactory, EffectLookup},
};

/// Resolved constructor arguments handed to an effect factory.
///
/// Every declared parameter is present; a parameter whose binding resolved to nothing is
/// stored as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectArgs {
    id: EffectId,
    values: IndexMap<String, Option<Value>>,
}

impl EffectArgs {
    pub fn new(id: impl Into<EffectId>) -> Self {
        Self {
            id: id.into(),
            values: IndexMap::new(),
        }
    }

    /// Adds a resolved parameter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), Some(value.into()));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.values.insert(name.into(), value);
    }

    /// Id the constructed effect must carry.
    pub fn id(&self) -> &EffectId {
        &self.id
    }

    /// Returns the resolved value, or `None` when the parameter is undeclared or unresolved.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn require(&self, name: &str) -> anyhow::Result<&Value> {
        self.get(name)
            .ok_or_else(|| anyhow!("missing required parameter '{name}' for effect {}", self.id))
    }

    pub fn require_str(&self, name: &str) -> anyhow::Result<&str> {
        let value = self.require(name)?;
        value
            .as_str()
            .ok_or_else(|| anyhow!("parameter '{name}' must be a string, found {}", value.type_name()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An effect class and its configuration, resolved lazily against the running context.
#[derive(Clone)]
pub struct EffectBinding {
    name: String,
    class: String,
    config: IndexMap<String, ConfigBinding>,
    lookup: Arc<dyn EffectLookup>,
}

impl EffectBinding {
    pub fn new(
        name: impl Into<String>,
        class: impl Into<String>,
        config: IndexMap<String, ConfigBinding>,
        lookup: Arc<dyn EffectLookup>,
    ) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            config,
            lookup,
        }
    }

    /// Declared step name; becomes the effect id.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn config(&self) -> &IndexMap<String, ConfigBinding> {
        &self.config
    }

    /// Looks up the constructor for this binding's class.
    pub fn factory(&self) -> Result<EffectFactory, PluginResolutionError> {
        self.lookup.resolve(&self.class)
    }

    /// Evaluates every configuration parameter against `context`.
    pub fn resolve_arguments(&self, context: &Context) -> Result<EffectArgs, BindingResolutionError> {
        let mut args = EffectArgs::new(self.name.as_str());
        for (parameter, binding) in &self.config {
            let value = resolve_config_value(parameter, binding, context)?;
            args.insert(parameter.as_str(), value);
        }
        Ok(args)
    }

    /// Resolves the class and arguments against `context` and constructs the effect.
    pub fn init(&self, context: &Context) -> Result<Box<dyn Effect>, StepError> {
        let factory = self.factory()?;
        let args = self.resolve_arguments(context)?;
        debug!(
            step = %self.name,
            class = %self.class,
            parameters = ?args.names().collect::<Vec<_>>(),
            "resolved effect binding"
        );
        let effect = factory(args).map_err(|source| BindingResolutionError::Construction {
            class: self.class.clone(),
            source,
        })?;
        Ok(effect)
    }
}

impl fmt::Debug for EffectBinding {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EffectBinding")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Resolves one parameter: the context value when present and truthy, otherwise the
/// declared default, otherwise nothing.
///
/// Falsy context values (`0`, `""`, `false`, `null`, empty collections) fall through to the
/// default. A declared `type` is checked against whatever value was picked.
pub fn resolve_config_value(
    parameter: &str,
    binding: &ConfigBinding,
    context: &Context,
) -> Result<Option<Value>, BindingResolutionError> {
    let from_context = match binding.context.as_deref() {
        Some(path) => {
            validate_path(path).map_err(|source| BindingResolutionError::Path {
                parameter: parameter.to_string(),
                source,
            })?;
            context.get(path).filter(|value| value.is_truthy())
        }
        None => None,
    };

    let resolved = from_context.or(binding.default.as_ref()).cloned();

    if let (Some(value), Some(expected)) = (&resolved, binding.value_type) {
        validate_value_type(value, expected).map_err(|reason| BindingResolutionError::TypeMismatch {
            parameter: parameter.to_string(),
            expected,
            reason,
        })?;
    }

    Ok(resolved)
}
