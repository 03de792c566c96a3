//! `Sleep`: blocks the calling thread.

use std::{thread, time::Duration};

use anyhow::{anyhow, bail};
use effectflow_types::Value;

use crate::{
    context::Context,
    effect::{ConfigurableEffect, Effect, EffectId},
    workflow::bindings::EffectArgs,
};

#[derive(Debug, Clone)]
pub struct Sleep {
    id: EffectId,
    duration: Duration,
}

impl Sleep {
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Effect for Sleep {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        thread::sleep(self.duration);
        Ok(context.clone())
    }
}

impl ConfigurableEffect for Sleep {
    const CLASS: &'static str = "Sleep";

    fn from_args(args: EffectArgs) -> anyhow::Result<Self> {
        let seconds = parse_seconds(args.require("seconds")?)?;
        Ok(Self {
            id: args.id().clone(),
            duration: Duration::from_secs(seconds),
        })
    }
}

fn parse_seconds(value: &Value) -> anyhow::Result<u64> {
    let seconds = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| anyhow!("'seconds' must be an integer, found {value}"))?;

    if seconds < 0 {
        bail!("'seconds' must not be negative, found {seconds}");
    }
    Ok(seconds.unsigned_abs())
}
