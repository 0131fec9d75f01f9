//! Property-based test generators using proptest.

use docrel_core::{ObjectId, Value};
use proptest::prelude::*;

/// Strategy for generating object identifiers.
pub fn object_id_strategy() -> impl Strategy<Value = ObjectId> {
    prop::array::uniform12(any::<u8>()).prop_map(ObjectId::from_bytes)
}

/// Strategy for generating valid 24-character identifier text.
pub fn hex_id_strategy() -> impl Strategy<Value = String> {
    object_id_strategy().prop_map(|id| id.to_hex())
}

/// Strategy for keys the default coercion heuristics treat as identifiers.
pub fn id_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("_id".to_string()),
        Just("id".to_string()),
        prop::string::string_regex("[a-z]{1,8}")
            .expect("Invalid regex")
            .prop_flat_map(|stem| {
                prop::sample::select(vec!["_id", "Id", "ID", "_ids", "Ids", "IDs"])
                    .prop_map(move |suffix| format!("{stem}{suffix}"))
            }),
    ]
}

/// Strategy for keys that never look like identifiers.
pub fn plain_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}")
        .expect("Invalid regex")
        .prop_filter("Key must not look like an identifier", |k| {
            k != "id" && !k.ends_with("id")
        })
}

/// Strategy for filter leaf values: short text, identifier text, integers
/// and booleans.
pub fn leaf_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::string::string_regex("[a-z]{0,12}")
            .expect("Invalid regex")
            .prop_map(Value::Text),
        hex_id_strategy().prop_map(Value::Text),
        any::<i64>().prop_map(Value::Integer),
        any::<bool>().prop_map(Value::Bool),
    ]
}

/// Strategy for nested filter documents mixing identifier and plain keys.
pub fn filter_document_strategy() -> impl Strategy<Value = Value> {
    let key = prop_oneof![id_key_strategy(), plain_key_strategy()];
    let leaf = leaf_value_strategy();
    leaf.prop_recursive(3, 32, 4, move |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((key.clone(), inner), 0..4).prop_map(Value::document),
        ]
    })
    .prop_map(|value| match value {
        Value::Map(_) => value,
        other => Value::document([("value", other)]),
    })
}

/// Strategy for per-record key lists drawn from a small pool, so that
/// records share keys.
pub fn key_lists_strategy(pool: usize, records: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0..pool, 0..4), 0..records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrel_core::CoercionConfig;

    proptest! {
        #[test]
        fn id_keys_match_default_heuristics(key in id_key_strategy()) {
            prop_assert!(CoercionConfig::default().key_looks_like_id(&key));
        }

        #[test]
        fn plain_keys_never_match(key in plain_key_strategy()) {
            prop_assert!(!CoercionConfig::default().key_looks_like_id(&key));
        }

        #[test]
        fn filters_are_maps(filter in filter_document_strategy()) {
            prop_assert!(filter.as_map().is_some());
        }
    }
}
