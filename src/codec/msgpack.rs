//! MessagePack codec (binary).

use anyhow::Result;

use crate::value::Value;

pub fn decode(input: &[u8]) -> Result<Value> {
    Ok(rmp_serde::from_slice(input)?)
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let v = crate::codec::json::decode(br#"{"a":1,"b":[true,null,"x"],"c":2.5}"#).unwrap();
        let bytes = encode(&v).unwrap();
        assert_eq!(decode(&bytes).unwrap(), v);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(&[0xc1]).is_err()); // 0xc1 is never used in msgpack
    }
}
