//! Tolerant field readers for externally supplied conversation JSON.
//!
//! Conversation payloads come from a remote service and are not guaranteed to
//! match the shape the window logic expects. Objects are read as a raw field
//! map first; the helpers here pull out the fields that have the expected
//! type and leave anything else in the map, so it is written back verbatim.

use serde_json::{Map, Value};

/// Remove and return `key` when it holds a string. Any other value stays in
/// `fields`.
pub(crate) fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(_)) => match fields.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

/// Remove and return `key` when it holds an object. Any other value,
/// including `null`, stays in `fields`.
pub(crate) fn take_object(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Option<Map<String, Value>> {
    match fields.get(key) {
        Some(Value::Object(_)) => match fields.remove(key) {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Read a list of strings; a non-array value becomes an empty list and
/// non-string entries are skipped.
pub(crate) fn string_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Implement `Deserialize` for a type by reading a raw field map and handing
/// it to the type's infallible `from_fields` constructor. Only a non-object
/// input is an error.
macro_rules! deserialize_from_fields {
    ($ty:ty) => {
        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let fields = <::serde_json::Map<String, ::serde_json::Value> as ::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                Ok(<$ty>::from_fields(fields))
            }
        }
    };
}
pub(crate) use deserialize_from_fields;
