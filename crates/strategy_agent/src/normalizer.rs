//! Best-effort decoding of model replies into JSON.
//!
//! Models wrap JSON in markdown fences, add prose, or answer with nothing
//! usable at all. [`parse_structured`] never fails; it reports whether the
//! text decoded so callers can tell a real empty answer from a parse failure.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```(?:json)?|```$").expect("valid fence regex"));

/// Result of normalizing one model reply
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Decoded(Value),
    Invalid { error: String },
}

impl Normalized {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Normalized::Invalid { .. })
    }

    /// Decoded value, or the empty object when decoding failed
    pub fn into_value(self) -> Value {
        match self {
            Normalized::Decoded(v) => v,
            Normalized::Invalid { .. } => Value::Object(Map::new()),
        }
    }

    /// Parse error, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            Normalized::Decoded(_) => None,
            Normalized::Invalid { error } => Some(error),
        }
    }
}

/// Remove code-fence markers at line starts (optionally tagged `json`) and line ends
pub fn strip_fences(text: &str) -> String {
    FENCE_RE.replace_all(text.trim(), "").trim().to_string()
}

pub fn parse_structured(text: &str) -> Normalized {
    let cleaned = strip_fences(text);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => Normalized::Decoded(value),
        Err(e) => Normalized::Invalid {
            error: e.to_string(),
        },
    }
}

/// True for null, empty strings, empty arrays and empty objects
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// The list a reply carries: either a bare array, or an array stored under
/// one of `wrapper_keys` in an object.
pub fn items(value: Value, wrapper_keys: &[&str]) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => wrapper_keys
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Strings out of a JSON list; objects contribute their `name` or `title`.
/// A single string is accepted as a one-item list.
pub fn string_list(value: &Value) -> Vec<String> {
    let entry = |item: &Value| -> Option<String> {
        match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(map) => ["name", "title"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(|s| s.trim().to_string()),
            Value::Number(_) | Value::Bool(_) => Some(item.to_string()),
            _ => None,
        }
    };
    match value {
        Value::Array(list) => list
            .iter()
            .filter_map(entry)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(_) => entry(value)
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}
