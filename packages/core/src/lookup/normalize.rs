//! Defensive field extraction from loosely-typed provider JSON.
//!
//! Providers disagree on field names and types. These helpers never fail:
//! anything missing, empty or of an unexpected shape comes back as `None`.

use serde_json::Value;

/// First non-empty string (or number, rendered) under any of `keys`.
pub fn text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| scalar_text(value.get(*key)?))
}

/// First boolean-like value under any of `keys`.
///
/// Accepts JSON booleans, `0`/`1`, and yes/no words in English and Turkish.
pub fn flag(value: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "evet" | "var" => Some(true),
            "false" | "no" | "n" | "0" | "hayır" | "hayir" | "yok" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Join the `field` of every object in the array under `key` with ", ".
pub fn joined(value: &Value, key: &str, field: &str) -> Option<String> {
    let parts: Vec<String> = value
        .get(key)?
        .as_array()?
        .iter()
        .filter_map(|item| item.get(field).and_then(scalar_text))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// First element of an array, or the value itself when it is an object.
pub fn first_record(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first().filter(|item| item.is_object()),
        Value::Object(_) => Some(value),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
