//! Best-effort coercions from parameter values.
//!
//! Query strings carry everything as text, JSON bodies carry real numbers and
//! booleans. Filters usually do not care which, so these helpers accept
//! either. A value that cannot be coerced yields `None` and a debug line.

use serde_json::{Map, Value};
use tracing::debug;

/// Integers, floats truncated toward zero, numeric strings, and
/// `true`/`false` as 1/0.
pub fn to_int(value: &Value) -> Option<i64> {
    let out = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    if out.is_none() {
        debug!(%value, "value is not an int");
    }
    out
}

/// Booleans, ints (positive is true) and the usual yes/no words.
pub fn to_bool(value: &Value) -> Option<bool> {
    let out = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n > 0),
        Value::String(s) => match s.as_str() {
            "1" | "true" | "y" | "on" | "yes" => Some(true),
            "0" | "false" | "n" | "off" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    };
    if out.is_none() {
        debug!(%value, "value is not a bool");
    }
    out
}

/// Strings as-is, numbers in decimal, booleans as `"1"`/`"0"`.
pub fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_owned()),
        _ => {
            debug!(%value, "value is not a string");
            None
        }
    }
}

pub fn to_map(value: &Value) -> Option<&Map<String, Value>> {
    let out = value.as_object();
    if out.is_none() {
        debug!(%value, "value is not a map");
    }
    out
}

pub fn to_array(value: &Value) -> Option<&Vec<Value>> {
    let out = value.as_array();
    if out.is_none() {
        debug!(%value, "value is not an array");
    }
    out
}
