//! Property tests for codec round-trips over generated value trees.

use indexmap::IndexMap;
use proptest::prelude::*;

use qq::{codec, Encoding, Value};

/// Arbitrary finite value trees. Floats stay in a range that excludes
/// NaN/inf, which no text format round-trips.
fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9f64).prop_map(Value::Float),
        "[a-z0-9 ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            object_strategy(inner),
        ]
    })
}

fn object_strategy(inner: impl Strategy<Value = Value>) -> impl Strategy<Value = Value> {
    prop::collection::vec(("[a-z]{1,6}", inner), 0..4).prop_map(|pairs| {
        let mut obj = IndexMap::new();
        for (key, value) in pairs {
            obj.insert(key, value);
        }
        Value::Object(obj)
    })
}

/// Object-rooted trees, for formats where the root must be (or stay) a
/// single document.
fn object_root_strategy() -> impl Strategy<Value = Value> {
    object_strategy(value_strategy())
}

proptest! {
    #[test]
    fn json_roundtrip(value in value_strategy()) {
        let encoded = codec::encode(&value, Encoding::Json).unwrap();
        let decoded = codec::decode(&encoded, Encoding::Json).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn msgpack_roundtrip(value in value_strategy()) {
        let encoded = codec::encode(&value, Encoding::Msgpack).unwrap();
        let decoded = codec::decode(&encoded, Encoding::Msgpack).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn yaml_single_doc_roundtrip(value in object_root_strategy()) {
        let encoded = codec::encode(&value, Encoding::Yaml).unwrap();
        let decoded = codec::decode(&encoded, Encoding::Yaml).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn gron_roundtrip(value in object_root_strategy()) {
        // gron emits leaves only, so empty composites cannot round-trip
        prop_assume!(!has_empty_composite(&value));
        let encoded = codec::encode(&value, Encoding::Gron).unwrap();
        let decoded = codec::decode(&encoded, Encoding::Gron).unwrap();
        prop_assert_eq!(decoded, value);
    }
}

fn has_empty_composite(value: &Value) -> bool {
    match value {
        Value::Array(arr) => arr.is_empty() || arr.iter().any(has_empty_composite),
        Value::Object(obj) => obj.is_empty() || obj.values().any(has_empty_composite),
        _ => false,
    }
}

#[test]
fn jsonl_roundtrip_array_of_objects() {
    let value = codec::decode(br#"[{"id":1},{"id":2}]"#, Encoding::Json).unwrap();
    let encoded = codec::encode(&value, Encoding::Jsonl).unwrap();
    let decoded = codec::decode(&encoded, Encoding::Jsonl).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn properties_roundtrip_flat_string_map() {
    let value = codec::decode(br#"{"alpha":"1","beta":"two words"}"#, Encoding::Json).unwrap();
    let encoded = codec::encode(&value, Encoding::Properties).unwrap();
    let decoded = codec::decode(&encoded, Encoding::Properties).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn env_roundtrip_flat_string_map() {
    let value = codec::decode(br#"{"HOST":"localhost","MSG":"two words"}"#, Encoding::Json).unwrap();
    let encoded = codec::encode(&value, Encoding::Env).unwrap();
    let decoded = codec::decode(&encoded, Encoding::Env).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn toml_roundtrip_object() {
    let value = codec::decode(
        br#"{"name":"qq","deps":{"serde":"1"},"tags":["a","b"]}"#,
        Encoding::Json,
    )
    .unwrap();
    let encoded = codec::encode(&value, Encoding::Toml).unwrap();
    let decoded = codec::decode(&encoded, Encoding::Toml).unwrap();
    assert_eq!(decoded, value);
}
