//! The canonical value tree shared by every codec and the query engine.
//!
//! All decoders normalize into [`Value`]; all encoders consume it. The query
//! engine operates on this type exclusively, so format libraries with their
//! own ASTs are converted at the codec boundary and nowhere else.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A dynamically-typed configuration value.
///
/// Numbers that fit a 64-bit signed integer decode as [`Value::Int`];
/// everything else becomes [`Value::Float`]. Objects preserve insertion
/// order so output is stable across round-trips.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Check if this value is "truthy" in the jq sense (not null, not false).
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// Get the type name of this value, as reported in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// True for `{}`/`[]` roots that carry no leaves.
    pub fn is_empty_composite(&self) -> bool {
        match self {
            Value::Array(arr) => arr.is_empty(),
            Value::Object(obj) => obj.is_empty(),
            _ => false,
        }
    }

    /// Render a scalar the way it appears in text formats (unquoted).
    ///
    /// Composites fall back to their compact JSON form; this is used by
    /// cell-oriented encoders (CSV, INI, Parquet) that flatten everything
    /// to text.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(arr: Vec<T>) -> Self {
        Value::Array(arr.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(obj: IndexMap<String, Value>) -> Self {
        Value::Object(obj)
    }
}

/// Infer a scalar from a trimmed text token.
///
/// Shared by the codecs whose source formats carry untyped text leaves
/// (CSV, TSV, INI, line, XML). Tried in order: decimal integer, decimal
/// float, boolean, RFC 3339 timestamp, plain `YYYY-MM-DD` date, string.
/// Recognized timestamps and dates keep their original string form.
pub fn infer_scalar(token: &str) -> Value {
    let token = token.trim();

    if let Ok(n) = token.parse::<i64>() {
        return Value::Int(n);
    }
    if let Ok(f) = token.parse::<f64>() {
        // "inf"/"nan" parse as floats but make poor config values
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    match token {
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        _ => {}
    }
    if chrono::DateTime::parse_from_rfc3339(token).is_ok() {
        return Value::String(token.to_string());
    }
    if chrono::NaiveDate::parse_from_str(token, "%Y-%m-%d").is_ok() {
        return Value::String(token.to_string());
    }

    Value::String(token.to_string())
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for elem in arr {
                    seq.serialize_element(elem)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (key, value) in obj {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("any configuration value")
            }

            fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
                Ok(Value::Bool(b))
            }

            fn visit_i64<E>(self, n: i64) -> Result<Value, E> {
                Ok(Value::Int(n))
            }

            fn visit_u64<E>(self, n: u64) -> Result<Value, E> {
                // unsigned values past i64 range fold to float
                Ok(i64::try_from(n)
                    .map(Value::Int)
                    .unwrap_or(Value::Float(n as f64)))
            }

            fn visit_f64<E>(self, f: f64) -> Result<Value, E> {
                Ok(Value::Float(f))
            }

            fn visit_str<E>(self, s: &str) -> Result<Value, E> {
                Ok(Value::String(s.to_string()))
            }

            fn visit_string<E>(self, s: String) -> Result<Value, E> {
                Ok(Value::String(s))
            }

            fn visit_bytes<E>(self, b: &[u8]) -> Result<Value, E> {
                // binary blobs (msgpack bin) degrade to lossy text
                Ok(Value::String(String::from_utf8_lossy(b).into_owned()))
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut arr = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(elem) = seq.next_element()? {
                    arr.push(elem);
                }
                Ok(Value::Array(arr))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut obj = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<MapKey, Value>()? {
                    if obj.insert(key.0.clone(), value).is_some() {
                        return Err(de::Error::custom(format!("duplicate key: {}", key.0)));
                    }
                }
                Ok(Value::Object(obj))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Map key that coerces the scalars non-JSON formats allow as keys
/// (YAML `1: x`, TOML dates) into strings.
struct MapKey(String);

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D>(deserializer: D) -> Result<MapKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = MapKey;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object key")
            }

            fn visit_str<E>(self, s: &str) -> Result<MapKey, E> {
                Ok(MapKey(s.to_string()))
            }

            fn visit_string<E>(self, s: String) -> Result<MapKey, E> {
                Ok(MapKey(s))
            }

            fn visit_bool<E>(self, b: bool) -> Result<MapKey, E> {
                Ok(MapKey(b.to_string()))
            }

            fn visit_i64<E>(self, n: i64) -> Result<MapKey, E> {
                Ok(MapKey(n.to_string()))
            }

            fn visit_u64<E>(self, n: u64) -> Result<MapKey, E> {
                Ok(MapKey(n.to_string()))
            }

            fn visit_f64<E>(self, f: f64) -> Result<MapKey, E> {
                Ok(MapKey(f.to_string()))
            }

            fn visit_unit<E>(self) -> Result<MapKey, E> {
                Ok(MapKey("null".to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy()); // 0 is truthy in jq
        assert!(Value::String("".into()).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Int(42).type_name(), "number");
        assert_eq!(Value::Float(2.5).type_name(), "number");
        assert_eq!(Value::Object(IndexMap::new()).type_name(), "object");
    }

    #[test]
    fn test_infer_integer() {
        assert_eq!(infer_scalar("42"), Value::Int(42));
        assert_eq!(infer_scalar(" -7 "), Value::Int(-7));
    }

    #[test]
    fn test_infer_float() {
        assert_eq!(infer_scalar("3.14"), Value::Float(3.14));
        assert_eq!(infer_scalar("1e3"), Value::Float(1000.0));
    }

    #[test]
    fn test_infer_bool() {
        assert_eq!(infer_scalar("true"), Value::Bool(true));
        assert_eq!(infer_scalar("False"), Value::Bool(false));
        // only true/false spellings participate
        assert_eq!(infer_scalar("yes"), Value::String("yes".into()));
    }

    #[test]
    fn test_infer_timestamp_stays_string() {
        assert_eq!(
            infer_scalar("2024-01-02T03:04:05Z"),
            Value::String("2024-01-02T03:04:05Z".into())
        );
        assert_eq!(infer_scalar("2024-01-02"), Value::String("2024-01-02".into()));
    }

    #[test]
    fn test_infer_plain_string() {
        assert_eq!(infer_scalar("hello"), Value::String("hello".into()));
    }

    #[test]
    fn test_json_deserialize_preserves_order() {
        let v: Value = serde_json::from_str(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_json_deserialize_number_split() {
        let v: Value = serde_json::from_str("[1, 1.5, 18446744073709551615]").unwrap();
        let arr = v.as_array().unwrap();
        assert_eq!(arr[0], Value::Int(1));
        assert_eq!(arr[1], Value::Float(1.5));
        assert!(matches!(arr[2], Value::Float(_)));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = serde_json::from_str::<Value>(r#"{"a":1,"a":2}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let text = r#"{"a":1,"b":[true,null,"x"],"c":{"d":2.5}}"#;
        let v: Value = serde_json::from_str(text).unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), text);
    }
}
