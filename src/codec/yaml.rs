//! YAML codec with multi-document support.
//!
//! A single-document stream decodes to the document's value directly; a
//! multi-document stream decodes to an array of documents. On the encode
//! side an array of objects is emitted as multi-document YAML with `---`
//! separators, which keeps `decode(encode(v))` stable for document sets.

use anyhow::Result;
use serde::Deserialize;

use crate::value::Value;

pub fn decode(input: &[u8]) -> Result<Value> {
    let mut docs = Vec::new();
    for doc in serde_yaml::Deserializer::from_slice(input) {
        docs.push(Value::deserialize(doc)?);
    }
    Ok(match docs.len() {
        0 => Value::Null,
        1 => docs.into_iter().next().unwrap(),
        _ => Value::Array(docs),
    })
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    if let Value::Array(docs) = value {
        if !docs.is_empty() && docs.iter().all(|d| matches!(d, Value::Object(_))) {
            let mut out = String::new();
            for (i, doc) in docs.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str("---\n");
                out.push_str(&serde_yaml::to_string(doc)?);
            }
            return Ok(out.into_bytes());
        }
    }
    Ok(serde_yaml::to_string(value)?.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_document_not_wrapped() {
        let v = decode(b"name: a\ncount: 2\n").unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj["name"], Value::String("a".into()));
        assert_eq!(obj["count"], Value::Int(2));
    }

    #[test]
    fn test_multi_document_becomes_array() {
        let v = decode(b"name: a\n---\nname: b\n").unwrap();
        let arr = v.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[1].as_object().unwrap()["name"], Value::String("b".into()));
    }

    #[test]
    fn test_integer_normalization() {
        // values past i64 fold to float so jq arithmetic stays consistent
        let v = decode(b"big: 18446744073709551615\nsmall: 3\n").unwrap();
        let obj = v.as_object().unwrap();
        assert!(matches!(obj["big"], Value::Float(_)));
        assert_eq!(obj["small"], Value::Int(3));
    }

    #[test]
    fn test_encode_object() {
        let v = decode(b"a: 1\n").unwrap();
        assert_eq!(encode(&v).unwrap(), b"a: 1\n");
    }

    #[test]
    fn test_encode_array_of_objects_multi_doc() {
        let v = decode(b"- name: a\n- name: b\n").unwrap();
        let out = String::from_utf8(encode(&v).unwrap()).unwrap();
        assert_eq!(out, "---\nname: a\n\n---\nname: b\n");
        // and it decodes back to the same two documents
        assert_eq!(decode(out.as_bytes()).unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_encode_scalar_array_single_doc() {
        let v = decode(b"- 1\n- 2\n").unwrap();
        let out = String::from_utf8(encode(&v).unwrap()).unwrap();
        assert_eq!(out, "- 1\n- 2\n");
    }

    #[test]
    fn test_roundtrip_single_doc() {
        let v = decode(b"a: 1\nb:\n  - x\n  - 2.5\nc: true\n").unwrap();
        assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
    }
}
