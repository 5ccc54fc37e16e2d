//! Value coercion rules for requirement comparisons
//!
//! Stored comparison operands arrive as JSON and subject fields come
//! back as JSON, but the two sides are rarely the same type: a boolean
//! field compared against the string "true", a count compared against
//! "3". These helpers pin down the loose-comparison semantics so every
//! check agrees on them.

use serde_json::Value;

/// Loose equality between an actual field value and a stored operand.
///
/// Numbers compare numerically across integer/float/numeric-string
/// boundaries, booleans match the strings "true"/"false", and nulls
/// equal each other. Everything else falls back to strict equality.
pub fn loose_eq(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(b), other) | (other, Value::Bool(b)) => match other {
            Value::String(s) => (*b && s == "true") || (!*b && s == "false"),
            Value::Bool(o) => b == o,
            _ => false,
        },
        (a, b) => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Normalize a stored operand before using it as a relation filter.
///
/// The strings "true"/"false" become booleans and numeric strings
/// become numbers; numbers are never turned into booleans, so a stored
/// "0" filters against numeric zero rather than boolean false.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::String(s) if s == "true" => Value::Bool(true),
        Value::String(s) if s == "false" => Value::Bool(false),
        Value::String(s) => match s.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => match s.parse::<f64>() {
                Ok(f) if f.is_finite() => Value::from(f),
                _ => value.clone(),
            },
        },
        other => other.clone(),
    }
}

/// Coerce a value to f64 for ordinal comparisons. Non-numeric strings
/// and other types coerce to None.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Render a value for check messages without JSON string quoting
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
