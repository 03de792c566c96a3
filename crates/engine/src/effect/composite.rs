//! Composite effects: identity, plain functions, sequences, and conditional branches.

use std::{fmt, sync::Arc};

use anyhow::Context as _;

use super::{Effect, EffectId};
use crate::context::Context;

type ContextFn = dyn Fn(&Context) -> anyhow::Result<Context> + Send + Sync;
type Predicate = dyn Fn(&Context) -> bool + Send + Sync;

/// Returns its input unchanged.
#[derive(Debug, Clone)]
pub struct Identity {
    id: EffectId,
}

impl Identity {
    pub fn new() -> Self {
        Self { id: EffectId::generate() }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Identity {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        Ok(context.clone())
    }
}

/// Delegates to a closure.
#[derive(Clone)]
pub struct FunctionEffect {
    id: EffectId,
    function: Arc<ContextFn>,
}

impl FunctionEffect {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&Context) -> anyhow::Result<Context> + Send + Sync + 'static,
    {
        Self {
            id: EffectId::generate(),
            function: Arc::new(function),
        }
    }

    pub fn with_id(mut self, id: impl Into<EffectId>) -> Self {
        self.id = id.into();
        self
    }
}

impl fmt::Debug for FunctionEffect {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("FunctionEffect").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Effect for FunctionEffect {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        (self.function)(context)
    }
}

/// Runs effects left to right, feeding each one the previous output and stopping at the
/// first error.
pub struct Sequential {
    id: EffectId,
    effects: Vec<Box<dyn Effect>>,
}

impl Sequential {
    pub fn new(effects: Vec<Box<dyn Effect>>) -> Self {
        Self {
            id: EffectId::generate(),
            effects,
        }
    }

    pub fn with_id(mut self, id: impl Into<EffectId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn then(mut self, effect: impl Effect + 'static) -> Self {
        self.effects.push(Box::new(effect));
        self
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl Effect for Sequential {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        self.effects.iter().try_fold(context.clone(), |current, effect| {
            effect
                .execute(&current)
                .with_context(|| format!("effect {} failed", effect.id()))
        })
    }
}

/// Runs exactly one of two branches depending on a predicate over the context.
pub struct Conditional {
    id: EffectId,
    predicate: Arc<Predicate>,
    then_branch: Box<dyn Effect>,
    else_branch: Box<dyn Effect>,
}

impl Conditional {
    /// Builds a branch whose else arm is [`Identity`].
    pub fn new<P>(predicate: P, then_branch: impl Effect + 'static) -> Self
    where
        P: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        Self {
            id: EffectId::generate(),
            predicate: Arc::new(predicate),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(Identity::new()),
        }
    }

    /// Branches on the truthiness of the value at `path`.
    pub fn when_truthy(path: impl Into<String>, then_branch: impl Effect + 'static) -> Self {
        let path = path.into();
        Self::new(
            move |context: &Context| context.get(&path).is_some_and(|value| value.is_truthy()),
            then_branch,
        )
    }

    pub fn otherwise(mut self, else_branch: impl Effect + 'static) -> Self {
        self.else_branch = Box::new(else_branch);
        self
    }

    pub fn with_id(mut self, id: impl Into<EffectId>) -> Self {
        self.id = id.into();
        self
    }
}

impl Effect for Conditional {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        if (self.predicate)(context) {
            self.then_branch.execute(context)
        } else {
            self.else_branch.execute(context)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use effectflow_types::Value;

    use super::*;

    fn add(amount: i64) -> FunctionEffect {
        FunctionEffect::new(move |context: &Context| {
            let current = context.get("n").and_then(Value::as_i64).unwrap_or_default();
            Ok(context.set("n", current + amount))
        })
    }

    fn double() -> FunctionEffect {
        FunctionEffect::new(|context: &Context| {
            let current = context.get("n").and_then(Value::as_i64).unwrap_or_default();
            Ok(context.set("n", current * 2))
        })
    }

    #[test]
    fn sequential_matches_manual_composition() -> anyhow::Result<()> {
        let start = Context::new().set("n", 1);
        let sequence = Sequential::new(Vec::new()).then(add(3)).then(double()).then(add(-1));

        let manual = add(-1).execute(&double().execute(&add(3).execute(&start)?)?)?;
        let composed = sequence.execute(&start)?;

        assert_eq!(composed, manual);
        assert_eq!(composed.get("n"), Some(&Value::from(7)));
        assert_eq!(start.get("n"), Some(&Value::from(1)));
        Ok(())
    }

    #[test]
    fn sequential_stops_at_first_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sequence = Sequential::new(Vec::new())
            .then(add(1))
            .then(FunctionEffect::new(|_| anyhow::bail!("broken")).with_id("BROKEN"))
            .then(FunctionEffect::new(move |context: &Context| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(context.clone())
            }));

        let error = sequence.execute(&Context::new()).expect_err("second effect fails");
        assert_eq!(format!("{error:#}"), "effect BROKEN failed: broken");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_sequence_is_identity() -> anyhow::Result<()> {
        let start = Context::new().set("n", 4);
        assert_eq!(Sequential::new(Vec::new()).execute(&start)?, start);
        Ok(())
    }

    #[test]
    fn conditional_runs_exactly_one_branch() -> anyhow::Result<()> {
        let branch = Conditional::when_truthy("flag", add(10)).otherwise(add(-10));

        let taken = branch.execute(&Context::new().set("flag", true).set("n", 0))?;
        assert_eq!(taken.get("n"), Some(&Value::from(10)));

        let skipped = branch.execute(&Context::new().set("flag", 0).set("n", 0))?;
        assert_eq!(skipped.get("n"), Some(&Value::from(-10)));
        Ok(())
    }

    #[test]
    fn conditional_defaults_to_identity() -> anyhow::Result<()> {
        let branch = Conditional::new(|_| false, add(1));
        let start = Context::new().set("n", 5);
        assert_eq!(branch.execute(&start)?, start);
        Ok(())
    }
}
