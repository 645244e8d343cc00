//! JSON codec. The reference format: lossless for every value shape, used
//! as the output path for the decode-only formats.

use anyhow::Result;

use crate::value::Value;

/// Decode JSON, preserving object key insertion order.
pub fn decode(input: &[u8]) -> Result<Value> {
    Ok(serde_json::from_slice(input)?)
}

/// Encode as pretty-printed JSON: two-space indent, no HTML escaping,
/// no trailing newline.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_string_pretty(value)?.into_bytes())
}

/// Compact single-line rendering, used by the JSONL and GRON emitters.
pub fn encode_compact(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_string(value)?.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_preserves_order() {
        let v = decode(br#"{"b":1,"a":2}"#).unwrap();
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn test_encode_pretty() {
        let v = decode(br#"{"a":1,"b":[2,3]}"#).unwrap();
        let out = String::from_utf8(encode(&v).unwrap()).unwrap();
        assert_eq!(out, "{\n  \"a\": 1,\n  \"b\": [\n    2,\n    3\n  ]\n}");
    }

    #[test]
    fn test_html_not_escaped() {
        let v = Value::String("<b> & </b>".into());
        let out = String::from_utf8(encode(&v).unwrap()).unwrap();
        assert_eq!(out, "\"<b> & </b>\"");
    }

    #[test]
    fn test_roundtrip() {
        let text = br#"{"a":1,"b":[true,null,2.5],"c":{"d":"x"}}"#;
        let v = decode(text).unwrap();
        assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
    }
}
