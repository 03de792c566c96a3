//! Effects that read and write the context directly.

use anyhow::{anyhow, bail};
use effectflow_types::Value;

use crate::{
    context::{Context, validate_path},
    effect::{ConfigurableEffect, Effect, EffectId},
    workflow::bindings::EffectArgs,
};

/// Writes `value` at the dotted `path`.
#[derive(Debug, Clone)]
pub struct Set {
    id: EffectId,
    path: String,
    value: Value,
}

impl Effect for Set {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        Ok(context.set(&self.path, self.value.clone()))
    }
}

impl ConfigurableEffect for Set {
    const CLASS: &'static str = "Set";

    fn from_args(args: EffectArgs) -> anyhow::Result<Self> {
        let path = args.require_str("path")?.to_string();
        validate_path(&path)?;
        Ok(Self {
            value: args.get("value").cloned().unwrap_or_default(),
            id: args.id().clone(),
            path,
        })
    }
}

/// Multiplies the number at `path` by `factor` and writes the product to `target`
/// (defaults to `path`).
#[derive(Debug, Clone)]
pub struct Multiply {
    id: EffectId,
    path: String,
    factor: Value,
    target: String,
}

impl Effect for Multiply {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        let current = context
            .get(&self.path)
            .ok_or_else(|| anyhow!("no value at '{}' to multiply", self.path))?;
        let product = multiply(current, &self.factor)
            .ok_or_else(|| anyhow!("cannot multiply {} at '{}' by {}", current.type_name(), self.path, self.factor))?;
        Ok(context.set(&self.target, product))
    }
}

impl ConfigurableEffect for Multiply {
    const CLASS: &'static str = "Multiply";

    fn from_args(args: EffectArgs) -> anyhow::Result<Self> {
        let path = args.require_str("path")?.to_string();
        validate_path(&path)?;
        let target = match args.get("target") {
            Some(target) => target
                .as_str()
                .ok_or_else(|| anyhow!("'target' must be a string, found {}", target.type_name()))?
                .to_string(),
            None => path.clone(),
        };
        validate_path(&target)?;

        let factor = args.require("factor")?.clone();
        if as_number(&factor).is_none() {
            bail!("'factor' must be numeric, found {factor}");
        }

        Ok(Self {
            id: args.id().clone(),
            path,
            factor,
            target,
        })
    }
}

/// Fails unless `actual` equals `expected`. Numbers compare by value, so `4` equals `4.0`.
#[derive(Debug, Clone)]
pub struct AssertEquals {
    id: EffectId,
    actual: Value,
    expected: Value,
}

impl Effect for AssertEquals {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        if values_equal(&self.actual, &self.expected) {
            Ok(context.clone())
        } else {
            bail!(
                "assertion {} failed: expected {} but found {}",
                self.id,
                self.expected,
                self.actual
            )
        }
    }
}

impl ConfigurableEffect for AssertEquals {
    const CLASS: &'static str = "AssertEquals";

    fn from_args(args: EffectArgs) -> anyhow::Result<Self> {
        Ok(Self {
            actual: args.get("actual").cloned().unwrap_or_default(),
            expected: args.get("expected").cloned().unwrap_or_default(),
            id: args.id().clone(),
        })
    }
}

enum Numeric {
    Integer(i64),
    Float(f64),
}

impl Numeric {
    fn as_f64(&self) -> f64 {
        match *self {
            Numeric::Integer(value) => value as f64,
            Numeric::Float(value) => value,
        }
    }
}

fn as_number(value: &Value) -> Option<Numeric> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(Numeric::Integer)
            .or_else(|| number.as_f64().map(Numeric::Float)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .map(Numeric::Integer)
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(Numeric::Float))
        }
        _ => None,
    }
}

/// Integer products stay integral until they overflow `i64`. Products that are not finite
/// yield `None`.
fn multiply(value: &Value, factor: &Value) -> Option<Value> {
    match (as_number(value)?, as_number(factor)?) {
        (Numeric::Integer(left), Numeric::Integer(right)) => match left.checked_mul(right) {
            Some(product) => Some(Value::from(product)),
            None => finite(left as f64 * right as f64),
        },
        (left, right) => finite(left.as_f64() * right.as_f64()),
    }
}

fn finite(product: f64) -> Option<Value> {
    product.is_finite().then(|| Value::from_f64(product))
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => left.as_f64() == right.as_f64(),
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_writes_nested_paths() -> anyhow::Result<()> {
        let effect = Set::from_args(EffectArgs::new("set").with("path", "a.b").with("value", 3))?;
        let context = effect.execute(&Context::new().set("a.c", 1))?;
        assert_eq!(context.get("a.b"), Some(&Value::from(3)));
        assert_eq!(context.get("a.c"), Some(&Value::from(1)));
        Ok(())
    }

    #[test]
    fn set_rejects_malformed_paths() {
        assert!(Set::from_args(EffectArgs::new("set").with("path", "a..b")).is_err());
        assert!(Set::from_args(EffectArgs::new("set")).is_err());
    }

    #[test]
    fn multiply_keeps_integers_integral() -> anyhow::Result<()> {
        let effect = Multiply::from_args(EffectArgs::new("m").with("path", "x").with("factor", 2))?;
        let context = effect.execute(&Context::new().set("x", 2))?;
        assert_eq!(context.get("x"), Some(&Value::from(4)));
        Ok(())
    }

    #[test]
    fn multiply_mixes_floats_and_numeric_text() -> anyhow::Result<()> {
        let effect = Multiply::from_args(
            EffectArgs::new("m")
                .with("path", "x")
                .with("factor", "1.5")
                .with("target", "y"),
        )?;
        let context = effect.execute(&Context::new().set("x", 3))?;
        assert_eq!(context.get("y"), Some(&Value::from(4.5)));
        assert_eq!(context.get("x"), Some(&Value::from(3)));
        Ok(())
    }

    #[test]
    fn multiply_reports_missing_or_non_numeric_values() -> anyhow::Result<()> {
        let effect = Multiply::from_args(EffectArgs::new("m").with("path", "x").with("factor", 2))?;
        assert!(effect.execute(&Context::new()).is_err());
        assert!(effect.execute(&Context::new().set("x", "abc")).is_err());
        assert!(Multiply::from_args(EffectArgs::new("m").with("path", "x").with("factor", true)).is_err());
        Ok(())
    }

    #[test]
    fn multiply_rejects_products_that_overflow_to_infinity() -> anyhow::Result<()> {
        let effect = Multiply::from_args(EffectArgs::new("m").with("path", "x").with("factor", 1e308))?;
        let context = Context::new().set("x", 1e308);

        let error = effect.execute(&context).expect_err("product is infinite");
        assert!(error.to_string().starts_with("cannot multiply"), "{error}");
        assert_eq!(context.get("x"), Some(&Value::from(1e308)));
        Ok(())
    }

    #[test]
    fn multiply_widens_integer_overflow_to_float() -> anyhow::Result<()> {
        let effect = Multiply::from_args(EffectArgs::new("m").with("path", "x").with("factor", 2))?;
        let context = effect.execute(&Context::new().set("x", i64::MAX))?;
        assert_eq!(context.get("x").and_then(Value::as_f64), Some(i64::MAX as f64 * 2.0));
        Ok(())
    }

    #[test]
    fn assert_equals_compares_numbers_by_value() -> anyhow::Result<()> {
        let passing = AssertEquals::from_args(EffectArgs::new("check").with("actual", 4).with("expected", 4.0))?;
        let context = Context::new().set("x", 4);
        assert_eq!(passing.execute(&context)?, context);

        let failing = AssertEquals::from_args(EffectArgs::new("check").with("actual", 3).with("expected", 4))?;
        let error = failing.execute(&context).expect_err("values differ");
        assert_eq!(error.to_string(), "assertion check failed: expected 4 but found 3");
        Ok(())
    }
}
