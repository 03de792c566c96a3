//! The effect abstraction.
//!
//! An [`Effect`] takes a context and returns a new one, or fails. Concrete effects are
//! constructed from resolved configuration through [`ConfigurableEffect`]; the composite
//! forms in [`composite`] build larger units of work out of smaller ones.

pub mod composite;

use std::{fmt, sync::Arc};

use rand::Rng;

use crate::{context::Context, workflow::bindings::EffectArgs};

pub use composite::{Conditional, FunctionEffect, Identity, Sequential};

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const GENERATED_ID_LEN: usize = 16;

/// Stable identifier of an effect, used in diagnostics and as a context key by the
/// built-in effects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EffectId(String);

impl EffectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random 16 character identifier drawn from `A-Z0-9`.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..GENERATED_ID_LEN)
            .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for EffectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EffectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A unit of work that transforms a context.
///
/// Implementations must not retain the input context; every call is an independent
/// invocation that either yields the next context or an error.
pub trait Effect: Send + Sync {
    fn id(&self) -> &EffectId;

    fn execute(&self, context: &Context) -> anyhow::Result<Context>;
}

impl<E: Effect + ?Sized> Effect for Box<E> {
    fn id(&self) -> &EffectId {
        (**self).id()
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        (**self).execute(context)
    }
}

impl<E: Effect + ?Sized> Effect for Arc<E> {
    fn id(&self) -> &EffectId {
        (**self).id()
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        (**self).execute(context)
    }
}

/// An effect that can be built from resolved configuration arguments.
///
/// `CLASS` is the short name the effect is registered under.
pub trait ConfigurableEffect: Effect + Sized + 'static {
    const CLASS: &'static str;

    fn from_args(args: EffectArgs) -> anyhow::Result<Self>;
}
