//! Plugin catalog for qualified effect identifiers.
//!
//! Effects beyond the short built-in names are requested as `module::path::Name`. The
//! catalog is a static table of modules and their exports, populated at process start;
//! [`register_effect_plugins`] resolves each requested identifier against it and registers
//! the constructor under the full identifier.

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    effect::ConfigurableEffect,
    effects,
    error::PluginResolutionError,
    registry::{EffectFactory, EffectRegistry, factory_for},
};

/// Something a plugin module exposes.
#[derive(Clone)]
pub enum PluginExport {
    /// An effect constructor.
    Effect(EffectFactory),
    /// Any other item; `kind` describes it in error messages.
    Item { kind: &'static str },
}

impl fmt::Debug for PluginExport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginExport::Effect(_) => formatter.write_str("Effect(..)"),
            PluginExport::Item { kind } => formatter.debug_struct("Item").field("kind", kind).finish(),
        }
    }
}

/// A named group of exports.
#[derive(Debug, Clone)]
pub struct PluginModule {
    path: String,
    exports: IndexMap<String, PluginExport>,
}

impl PluginModule {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            exports: IndexMap::new(),
        }
    }

    /// Exports a configurable effect under its class name.
    pub fn with_effect<T: ConfigurableEffect>(self) -> Self {
        self.with_factory(T::CLASS, factory_for::<T>())
    }

    pub fn with_factory(mut self, name: impl Into<String>, factory: EffectFactory) -> Self {
        self.exports.insert(name.into(), PluginExport::Effect(factory));
        self
    }

    pub fn with_item(mut self, name: impl Into<String>, kind: &'static str) -> Self {
        self.exports.insert(name.into(), PluginExport::Item { kind });
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn export(&self, name: &str) -> Option<&PluginExport> {
        self.exports.get(name)
    }
}

/// Every plugin module known to the process.
#[derive(Debug, Clone, Default)]
pub struct PluginCatalog {
    modules: IndexMap<String, PluginModule>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog containing the built-in effect module.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.add_module(effects::plugin_module());
        catalog
    }

    pub fn add_module(&mut self, module: PluginModule) -> &mut Self {
        self.modules.insert(module.path.clone(), module);
        self
    }

    pub fn module(&self, path: &str) -> Option<&PluginModule> {
        self.modules.get(path)
    }

    /// Resolves a qualified identifier to an effect constructor.
    pub fn resolve(&self, identifier: &str) -> Result<EffectFactory, PluginResolutionError> {
        let (module_path, export_name) = split_identifier(identifier)?;
        let module = self.module(&module_path.replace('.', "::")).ok_or_else(|| PluginResolutionError::ModuleNotFound {
            module: module_path.to_string(),
        })?;
        match module.export(export_name) {
            Some(PluginExport::Effect(factory)) => Ok(factory.clone()),
            Some(PluginExport::Item { kind }) => Err(PluginResolutionError::NotAnEffect {
                identifier: identifier.trim().to_string(),
                kind: kind.to_string(),
            }),
            None => Err(PluginResolutionError::ExportNotFound {
                module: module_path.to_string(),
                name: export_name.to_string(),
            }),
        }
    }
}

/// Splits `module::path::Name` (or `module.path.Name`) into module path and export name.
pub fn split_identifier(identifier: &str) -> Result<(&str, &str), PluginResolutionError> {
    let trimmed = identifier.trim();
    let invalid = || PluginResolutionError::InvalidIdentifier {
        identifier: identifier.to_string(),
    };

    let (module_path, name, separator) = match trimmed.rsplit_once("::") {
        Some((module_path, name)) => (module_path, name, "::"),
        None => {
            let (module_path, name) = trimmed.rsplit_once('.').ok_or_else(invalid)?;
            (module_path, name, ".")
        }
    };

    let valid_segment = |segment: &str| {
        !segment.is_empty() && segment.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    };
    if !valid_segment(name) || !module_path.split(separator).all(valid_segment) {
        return Err(invalid());
    }
    Ok((module_path, name))
}

/// Resolves each identifier against `catalog` and registers it in `registry` under the
/// full identifier. Blank entries are skipped.
///
/// Returns the identifiers that were registered.
pub fn register_effect_plugins<I, S>(
    registry: &mut EffectRegistry,
    catalog: &PluginCatalog,
    identifiers: I,
) -> Result<Vec<String>, PluginResolutionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut registered = Vec::new();
    for identifier in identifiers {
        let identifier = identifier.as_ref().trim();
        if identifier.is_empty() {
            continue;
        }
        let factory = catalog.resolve(identifier)?;
        registry.register(identifier, factory);
        debug!(plugin = identifier, "registered effect plugin");
        registered.push(identifier.to_string());
    }
    Ok(registered)
}
