//! `Print` and `Error`.

use anyhow::bail;
use effectflow_types::Value;

use crate::{
    context::Context,
    effect::{ConfigurableEffect, Effect, EffectId},
    workflow::bindings::EffectArgs,
};

/// Writes `value` to stdout and records it under the effect id.
#[derive(Debug, Clone)]
pub struct Print {
    id: EffectId,
    value: Value,
}

impl Print {
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Effect for Print {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        println!("{}", self.value);
        Ok(context.insert(self.id.as_str(), self.value.clone()))
    }
}

impl ConfigurableEffect for Print {
    const CLASS: &'static str = "Print";

    fn from_args(args: EffectArgs) -> anyhow::Result<Self> {
        Ok(Self {
            value: args.get("value").cloned().unwrap_or_default(),
            id: args.id().clone(),
        })
    }
}

/// Always fails. Registered as `Error`.
#[derive(Debug, Clone)]
pub struct Fail {
    id: EffectId,
}

impl Effect for Fail {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, _context: &Context) -> anyhow::Result<Context> {
        bail!("Error effect ({}) executed.", self.id)
    }
}

impl ConfigurableEffect for Fail {
    const CLASS: &'static str = "Error";

    fn from_args(args: EffectArgs) -> anyhow::Result<Self> {
        Ok(Self { id: args.id().clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_records_value_under_its_id() -> anyhow::Result<()> {
        let effect = Print::from_args(EffectArgs::new("greet").with("value", "hello"))?;
        let context = effect.execute(&Context::new().set("greet_count", 1))?;
        assert_eq!(context.get("greet"), Some(&Value::from("hello")));
        assert_eq!(context.get("greet_count"), Some(&Value::from(1)));
        Ok(())
    }

    #[test]
    fn print_without_value_records_null() -> anyhow::Result<()> {
        let effect = Print::from_args(EffectArgs::new("empty"))?;
        assert!(effect.value().is_null());
        assert_eq!(effect.execute(&Context::new())?.get("empty"), Some(&Value::Null));
        Ok(())
    }

    #[test]
    fn error_effect_always_fails() -> anyhow::Result<()> {
        let effect = Fail::from_args(EffectArgs::new("stop").with("value", "ignored"))?;
        let error = effect.execute(&Context::new()).expect_err("always fails");
        assert_eq!(error.to_string(), "Error effect (stop) executed.");
        Ok(())
    }
}
