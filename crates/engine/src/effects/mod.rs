//! Built-in effects.
//!
//! Each effect is registered under its short class name by [`register_builtins`] and is also
//! exported from the `effectflow::effects` plugin module so it can be requested by its
//! qualified identifier.

pub mod context_ops;
pub mod files;
pub mod print;
pub mod sleep;

pub use context_ops::{AssertEquals, Multiply, Set};
pub use files::{ListFiles, TouchFile};
pub use print::{Fail, Print};
pub use sleep::Sleep;

use crate::{plugin::PluginModule, registry::EffectRegistry};

/// Module path the built-in effects are exported under.
pub const PLUGIN_MODULE_PATH: &str = "effectflow::effects";

pub fn register_builtins(registry: &mut EffectRegistry) {
    registry
        .register_effect::<Print>()
        .register_effect::<Fail>()
        .register_effect::<Sleep>()
        .register_effect::<TouchFile>()
        .register_effect::<ListFiles>()
        .register_effect::<Set>()
        .register_effect::<Multiply>()
        .register_effect::<AssertEquals>();
}

/// The built-in effects as a plugin module.
pub fn plugin_module() -> PluginModule {
    PluginModule::new(PLUGIN_MODULE_PATH)
        .with_effect::<Print>()
        .with_effect::<Fail>()
        .with_effect::<Sleep>()
        .with_effect::<TouchFile>()
        .with_effect::<ListFiles>()
        .with_effect::<Set>()
        .with_effect::<Multiply>()
        .with_effect::<AssertEquals>()
        .with_item("register_builtins", "function")
        .with_item("plugin_module", "function")
        .with_item("PLUGIN_MODULE_PATH", "constant")
}
