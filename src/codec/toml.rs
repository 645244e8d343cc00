//! TOML codec. Keys keep document order on decode; encoding a non-table
//! root is an error since TOML documents are tables by definition.

use anyhow::{bail, Result};

use crate::value::Value;

pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input)?;
    Ok(::toml::from_str(text)?)
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    if !matches!(value, Value::Object(_)) {
        bail!("toml output requires an object at the top level, got {}", value.type_name());
    }
    Ok(::toml::to_string_pretty(value)?.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_preserves_order() {
        let v = decode(b"zeta = 1\nalpha = 2\n").unwrap();
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }

    #[test]
    fn test_decode_tables_and_arrays() {
        let v = decode(b"[server]\nhost = \"localhost\"\nports = [80, 443]\n").unwrap();
        let server = v.as_object().unwrap()["server"].as_object().unwrap();
        assert_eq!(server["host"], Value::String("localhost".into()));
        assert_eq!(
            server["ports"],
            Value::Array(vec![Value::Int(80), Value::Int(443)])
        );
    }

    #[test]
    fn test_encode_rejects_non_object() {
        assert!(encode(&Value::Array(vec![Value::Int(1)])).is_err());
        assert!(encode(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_roundtrip_objects() {
        let v = decode(b"name = \"qq\"\n\n[deps]\nserde = \"1\"\ncount = 3\n").unwrap();
        assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
    }
}
