//! Execution engine: compiles an ordered list of bindings into one effect.
//!
//! - Every binding's class is checked against its lookup before anything runs
//! - Each step resolves its binding against the current context, then executes it
//! - The first failure stops the pipeline and is reported as a [`StepFailure`]

use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn};

use crate::{
    context::Context,
    effect::{EffectId, FunctionEffect},
    error::{StepError, StepFailure},
    outcome::Outcome,
    workflow::bindings::EffectBinding,
};

/// Accumulates bindings in execution order.
#[derive(Debug, Clone)]
pub struct ExecutionBuilder {
    id: EffectId,
    steps: Vec<EffectBinding>,
}

impl Default for ExecutionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionBuilder {
    /// Creates a builder whose compiled effect carries a generated id.
    pub fn new() -> Self {
        Self {
            id: EffectId::generate(),
            steps: Vec::new(),
        }
    }

    /// Creates a builder whose compiled effect is identified by `name`.
    pub fn named(name: impl Into<EffectId>) -> Self {
        Self {
            id: name.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step. Duplicates are allowed and nothing is validated here.
    pub fn add_step(mut self, binding: EffectBinding) -> Self {
        self.steps.push(binding);
        self
    }

    pub fn steps(&self) -> &[EffectBinding] {
        &self.steps
    }

    pub fn id(&self) -> &EffectId {
        &self.id
    }

    /// Runs every step against `context`, stopping at the first failure.
    pub fn run(&self, context: &Context) -> Outcome<Context, StepFailure> {
        run_steps(&self.id, &self.steps, context)
    }

    /// Compiles the steps into a single effect.
    ///
    /// The effect fails with an [`anyhow::Error`] whose root cause is the [`StepFailure`],
    /// so callers can `downcast_ref::<StepFailure>()` to find the failing step.
    pub fn compile(self) -> FunctionEffect {
        let Self { id, steps } = self;
        let pipeline_id = id.clone();
        FunctionEffect::new(move |context: &Context| run_steps(&pipeline_id, &steps, context).get().map_err(anyhow::Error::new))
            .with_id(id)
    }
}

fn run_steps(id: &EffectId, steps: &[EffectBinding], context: &Context) -> Outcome<Context, StepFailure> {
    let span = info_span!("workflow", workflow = %id);
    let _guard = span.enter();
    let started = Instant::now();
    info!(steps = steps.len(), "starting workflow");

    let outcome = preflight(steps, context)
        .map(|()| context.clone())
        .flat_map(|initial| steps.iter().fold(Outcome::success(initial), |current, binding| current.flat_map(|context| run_step(binding, &context))));

    match &outcome {
        Outcome::Success(_) => {
            info!(elapsed_ms = elapsed_millis(started.elapsed()), "workflow finished");
        }
        Outcome::Failure(failure) => {
            warn!(step = %failure.step, error = %failure.cause, "workflow failed");
        }
    }
    outcome
}

/// Fails on the first binding whose class cannot be resolved.
fn preflight(steps: &[EffectBinding], context: &Context) -> Outcome<(), StepFailure> {
    let unresolved = steps
        .iter()
        .find_map(|binding| binding.factory().err().map(|error| StepFailure::new(binding.name(), error, context.clone())));
    match unresolved {
        Some(failure) => Outcome::failure(failure),
        None => Outcome::success(()),
    }
}

fn run_step(binding: &EffectBinding, context: &Context) -> Outcome<Context, StepFailure> {
    let span = info_span!("step", step = %binding.name(), class = %binding.class());
    let _guard = span.enter();

    Outcome::try_run(|| binding.init(context))
        .try_map(|effect| effect.execute(context).map_err(StepError::Execution))
        .map(|next| {
            debug!(keys = next.len(), "step completed");
            next
        })
        .map_failure(|cause| {
            warn!(error = %cause, "step failed");
            StepFailure::new(binding.name(), cause, context.clone())
        })
}

/// Milliseconds in `elapsed`, saturating at `u64::MAX`.
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
