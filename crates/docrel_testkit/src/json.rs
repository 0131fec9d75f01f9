//! JSON conversion for writing documents and filters in tests.
//!
//! Object identifiers use the extended JSON form `{"$oid": "<hex>"}`.
//! Floating-point numbers have no document representation and are
//! rejected.

use docrel_core::{Filter, ObjectId, Value};
use serde_json::{json, Map, Value as Json};

/// Converts JSON into a document value.
///
/// # Panics
///
/// Panics on floating-point numbers and malformed `$oid` objects.
pub fn value_from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Integer(n.as_i64().expect("only integer numbers are supported")),
        Json::String(s) => Value::Text(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(value_from_json).collect()),
        Json::Object(map) => {
            if let (1, Some(Json::String(hex))) = (map.len(), map.get("$oid")) {
                return Value::ObjectId(ObjectId::parse_str(hex).expect("invalid $oid"));
            }
            Value::document(map.iter().map(|(k, v)| (k.clone(), value_from_json(v))))
        }
    }
}

/// Converts a document value into JSON.
///
/// Byte strings become arrays of numbers and non-text map keys are written
/// in their debug form.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(n) => json!(n),
        Value::Bytes(bytes) => json!(bytes),
        Value::Text(s) => Json::String(s.clone()),
        Value::ObjectId(id) => json!({ "$oid": id.to_hex() }),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(pairs) => {
            let mut map = Map::new();
            for (k, v) in pairs {
                let key = match k {
                    Value::Text(s) => s.clone(),
                    other => format!("{other:?}"),
                };
                map.insert(key, value_to_json(v));
            }
            Json::Object(map)
        }
    }
}

/// Builds a filter from a JSON object.
///
/// # Panics
///
/// Panics if `json` is not an object or null.
pub fn filter_from_json(json: &Json) -> Filter {
    Filter::from_value(value_from_json(json)).expect("filter JSON must be an object")
}
