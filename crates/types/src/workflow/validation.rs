//! Validation helpers for resolved configuration values.
//!
//! Only a light shape check is performed: a value declared as `integer` may arrive as an
//! integral number or as text that parses as one, mirroring how loosely typed documents are
//! usually authored. Nothing is coerced; callers receive the value untouched.

use super::ValueType;
use crate::value::Value;

/// Validates a resolved value against its declared type.
///
/// Returns a human readable reason on mismatch.
pub fn validate_value_type(value: &Value, expected: ValueType) -> Result<(), String> {
    let satisfied = match expected {
        ValueType::String => matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)),
        ValueType::Integer => match value {
            Value::Number(number) => number.is_i64() || number.is_u64() || number.as_f64().is_some_and(|float| float.fract() == 0.0),
            Value::String(text) => text.trim().parse::<i64>().is_ok(),
            _ => false,
        },
        ValueType::Number => match value {
            Value::Number(_) => true,
            Value::String(text) => text.trim().parse::<f64>().is_ok(),
            _ => false,
        },
        ValueType::Boolean => matches!(value, Value::Bool(_)),
        ValueType::Array => matches!(value, Value::Sequence(_)),
        ValueType::Object => matches!(value, Value::Mapping(_)),
    };

    if satisfied {
        Ok(())
    } else {
        Err(format!("expected {} but found {} ({})", expected.as_str(), value.type_name(), value))
    }
}
