//! Lenient decoding of loosely-typed LLM output into the strict persisted
//! schema. Every helper is pure and total: given any `Value` it returns the
//! coerced value or the field default, never an error. A single malformed
//! field must never invalidate the rest of a record.

use serde_json::Value;

use crate::models::analysis::VALID_CONFIDENCE_LEVELS;

/// Locates a JSON object in raw LLM text by taking the substring between the
/// first `{` and the last `}` (greedy) and parsing it.
///
/// This is a heuristic, not a parser: prose and code fences around the object
/// are tolerated, and the outermost braces win. Returns `None` when no braces
/// are found, the substring is not valid JSON, or the parsed value is not an
/// object.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    let candidate = &text[start..=end];
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

/// Coerces a value to an integer score, falling back to `default`.
/// Accepts numbers (truncated) and numeric strings. Null, the literal string
/// "null", and anything unparseable yield the default.
pub fn to_int(value: Option<&Value>, default: i32) -> i32 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(|i| i as i32)
            .unwrap_or(default),
        Some(Value::String(s)) if s != "null" => s.trim().parse::<i32>().unwrap_or(default),
        _ => default,
    }
}

/// Coerces a value to an optional decimal (years, gaps). Null, "null", and
/// unparseable values yield `None` rather than an error.
pub fn to_decimal(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s != "null" => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Ensures a value is a list:
/// - a list passes through unchanged;
/// - a string is JSON-parsed as a list if possible, otherwise a non-empty
///   string is wrapped as a single-element list and an empty string becomes
///   an empty list;
/// - null and any other type become an empty list.
pub fn ensure_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) => {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s) {
                items
            } else if !s.is_empty() {
                vec![Value::String(s.clone())]
            } else {
                vec![]
            }
        }
        _ => vec![],
    }
}

/// Coerces a value to a string, falling back to `default` for null and
/// non-string types.
pub fn to_text(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}

/// Validates a confidence level against the fixed allowlist.
/// Absent or unrecognized values become MEDIUM.
pub fn to_confidence(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if VALID_CONFIDENCE_LEVELS.contains(&s.as_str()) => s.clone(),
        _ => "MEDIUM".to_string(),
    }
}
