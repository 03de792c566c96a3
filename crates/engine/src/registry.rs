//! Effect registry and class lookup.
//!
//! Bindings never hold concrete effect types. They hold a class name and an
//! [`EffectLookup`], and ask it for an [`EffectFactory`] at the moment the step runs.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{
    effect::{ConfigurableEffect, Effect},
    effects,
    error::PluginResolutionError,
    workflow::bindings::EffectArgs,
};

/// Builds an effect from resolved arguments.
pub type EffectFactory = Arc<dyn Fn(EffectArgs) -> anyhow::Result<Box<dyn Effect>> + Send + Sync>;

/// Wraps a [`ConfigurableEffect`] constructor as a type-erased factory.
pub fn factory_for<T: ConfigurableEffect>() -> EffectFactory {
    Arc::new(|args: EffectArgs| -> anyhow::Result<Box<dyn Effect>> { Ok(Box::new(T::from_args(args)?)) })
}

/// Maps effect class names to constructors.
pub trait EffectLookup: Send + Sync {
    fn lookup(&self, class: &str) -> Option<EffectFactory>;

    /// Names that [`EffectLookup::lookup`] can resolve, in registration order.
    fn available(&self) -> Vec<String>;

    fn resolve(&self, class: &str) -> Result<EffectFactory, PluginResolutionError> {
        self.lookup(class).ok_or_else(|| PluginResolutionError::Unregistered {
            class: class.to_string(),
            available: self.available(),
        })
    }
}

/// Registry of effect constructors keyed by class name.
#[derive(Clone, Default)]
pub struct EffectRegistry {
    factories: IndexMap<String, EffectFactory>,
}

impl EffectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in effect under its short class name.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        effects::register_builtins(&mut registry);
        registry
    }

    /// Register a factory under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, factory: EffectFactory) -> &mut Self {
        self.factories.insert(name.into(), factory);
        self
    }

    /// Register a configurable effect under its class name.
    pub fn register_effect<T: ConfigurableEffect>(&mut self) -> &mut Self {
        self.register(T::CLASS, factory_for::<T>())
    }

    pub fn get(&self, name: &str) -> Option<EffectFactory> {
        self.factories.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl EffectLookup for EffectRegistry {
    fn lookup(&self, class: &str) -> Option<EffectFactory> {
        self.get(class)
    }

    fn available(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("EffectRegistry").field("effects", &self.names()).finish()
    }
}
