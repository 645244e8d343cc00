//! .env codec: a flat map of string variables.
//!
//! Decoding accepts an optional `export` prefix, single- or double-quoted
//! values (double quotes honor `\n \t \" \\`) and `#` comments outside
//! quotes. Encoding emits `K=V`, quoting values that contain whitespace,
//! `#` or `=`.

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;

use crate::value::Value;

pub fn decode(input: &[u8]) -> Result<Value> {
    let mut map = IndexMap::new();
    for item in dotenvy::from_read_iter(input) {
        let (key, value) = item.context("invalid env line")?;
        map.insert(key, Value::String(value));
    }
    Ok(Value::Object(map))
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let Value::Object(obj) = value else {
        bail!("env output requires an object, got {}", value.type_name());
    };

    let mut out = String::new();
    for (key, val) in obj {
        match val {
            Value::Array(_) | Value::Object(_) => {
                bail!("env format only supports simple key-value pairs")
            }
            scalar => {
                out.push_str(key);
                out.push('=');
                out.push_str(&format_value(&scalar.to_plain_string()));
                out.push('\n');
            }
        }
    }
    Ok(out.into_bytes())
}

fn format_value(value: &str) -> String {
    let needs_quotes =
        value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '#' || c == '=');
    if !needs_quotes {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str(r"\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str(r"\n"),
            '\t' => quoted.push_str(r"\t"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_basic() {
        let v = decode(b"HOST=localhost\nPORT=8080\n").unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj["HOST"], Value::String("localhost".into()));
        // env values stay strings, no inference
        assert_eq!(obj["PORT"], Value::String("8080".into()));
    }

    #[test]
    fn test_decode_export_and_comments() {
        let v = decode(b"# config\nexport TOKEN=abc\n").unwrap();
        assert_eq!(
            v.as_object().unwrap()["TOKEN"],
            Value::String("abc".into())
        );
    }

    #[test]
    fn test_decode_quoted_values() {
        let v = decode(b"A=\"two words\"\nB='literal \\n'\n").unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj["A"], Value::String("two words".into()));
        assert_eq!(obj["B"], Value::String("literal \\n".into()));
    }

    #[test]
    fn test_decode_double_quote_escapes() {
        let v = decode(b"A=\"line1\\nline2\"\n").unwrap();
        assert_eq!(
            v.as_object().unwrap()["A"],
            Value::String("line1\nline2".into())
        );
    }

    #[test]
    fn test_encode_quotes_when_needed() {
        let v = decode(b"PLAIN=abc\n").unwrap();
        let out = String::from_utf8(encode(&v).unwrap()).unwrap();
        assert_eq!(out, "PLAIN=abc\n");

        let v = crate::codec::json::decode(br#"{"MSG": "hello world", "N": 3}"#).unwrap();
        let out = String::from_utf8(encode(&v).unwrap()).unwrap();
        assert_eq!(out, "MSG=\"hello world\"\nN=3\n");
    }

    #[test]
    fn test_roundtrip_flat_map() {
        let v = decode(b"A=plain\nB=\"with space\"\n").unwrap();
        assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
    }
}
