//! Base64 codec over JSON: decode unwraps base64 then parses JSON; encode
//! serializes to JSON and wraps in base64.

use anyhow::{Context, Result};

use ::base64::engine::general_purpose::STANDARD;
use ::base64::Engine;

use crate::value::Value;

use super::json;

pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input).context("input is not valid UTF-8")?;
    let decoded = STANDARD
        .decode(text.trim())
        .context("invalid base64")?;
    json::decode(&decoded)
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let json = json::encode_compact(value)?;
    Ok(STANDARD.encode(json).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let v = json::decode(br#"{"a":1}"#).unwrap();
        let encoded = encode(&v).unwrap();
        assert_eq!(encoded, b"eyJhIjoxfQ==");
        assert_eq!(decode(&encoded).unwrap(), v);
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(decode(b"!!!not base64!!!").is_err());
    }

    #[test]
    fn test_decode_rejects_non_json_payload() {
        let encoded = STANDARD.encode("not json at all{");
        assert!(decode(encoded.as_bytes()).is_err());
    }
}
