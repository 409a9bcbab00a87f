//! Lenient coercion of provider JSON into numbers and strings.
//!
//! Provider payloads are loosely typed: numbers arrive as JSON numbers, as
//! strings (sometimes with thousands separators), as `null`, or not at all.
//! Nothing here fails; unusable values fall back to a default.

use serde_json::Value;

/// Coerce to `f64`, defaulting to `0.0`.
pub fn safe_float(value: Option<&Value>) -> f64 {
    safe_float_or(value, 0.0)
}

/// Coerce to `f64` with an explicit default. Non-finite results are rejected.
pub fn safe_float_or(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.replace(',', "").parse::<f64>().ok()
            }
        }
        Some(_) => None,
    };

    parsed.filter(|f| f.is_finite()).unwrap_or(default)
}

/// Coerce to `i64`, defaulting to `0`. Fractional values are truncated.
pub fn safe_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Bool(b)) => i64::from(*b),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(_)) => {
            let f = safe_float_or(value, f64::NAN);
            if f.is_finite() {
                f.trunc() as i64
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Coerce to a non-empty string. Scalars are stringified; `null`, empty
/// strings, arrays and objects yield `None`.
pub fn opt_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Same as [`opt_string`] but empty when absent.
pub fn string_or_empty(value: Option<&Value>) -> String {
    opt_string(value).unwrap_or_default()
}

/// First key whose value is present and not `null`.
pub fn first_present<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

/// Length of an array field, `0` for anything else.
pub fn array_len(value: Option<&Value>) -> usize {
    value.and_then(Value::as_array).map_or(0, Vec::len)
}
