//! INI codec. Decodes to `{section → {key → inferred value}}`; entries in
//! the unnamed default section are dropped. On encode, top-level scalars
//! land in the default section and nested objects become sections.

use anyhow::{bail, Result};
use indexmap::IndexMap;

use ::ini::Ini;

use crate::value::{infer_scalar, Value};

pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input)?;
    let ini = Ini::load_from_str(text)?;

    let mut root = IndexMap::new();
    for (section, properties) in ini.iter() {
        let Some(name) = section else {
            continue;
        };
        let mut map = IndexMap::new();
        for (key, value) in properties.iter() {
            map.insert(key.to_string(), infer_scalar(value));
        }
        root.insert(name.to_string(), Value::Object(map));
    }
    Ok(Value::Object(root))
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let Value::Object(data) = value else {
        bail!("ini output requires an object, got {}", value.type_name());
    };

    let mut ini = Ini::new();
    for (section, section_value) in data {
        match section_value {
            Value::Object(entries) => {
                for (key, val) in entries {
                    ini.with_section(Some(section.as_str()))
                        .set(key.as_str(), val.to_plain_string());
                }
            }
            scalar => {
                ini.with_section(None::<String>)
                    .set(section.as_str(), scalar.to_plain_string());
            }
        }
    }

    let mut out = Vec::new();
    ini.write_to(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sections() {
        let v = decode(b"[server]\nhost=localhost\nport=8080\n\n[log]\nlevel=debug\n").unwrap();
        let server = v.as_object().unwrap()["server"].as_object().unwrap();
        assert_eq!(server["host"], Value::String("localhost".into()));
        assert_eq!(server["port"], Value::Int(8080));
        let log = v.as_object().unwrap()["log"].as_object().unwrap();
        assert_eq!(log["level"], Value::String("debug".into()));
    }

    #[test]
    fn test_default_section_dropped() {
        let v = decode(b"orphan=1\n[named]\nkey=2\n").unwrap();
        let obj = v.as_object().unwrap();
        assert!(!obj.contains_key("orphan"));
        assert!(obj.contains_key("named"));
    }

    #[test]
    fn test_encode_sections_in_order() {
        let v = decode(b"[b]\nx=1\n[a]\ny=2\n").unwrap();
        let out = String::from_utf8(encode(&v).unwrap()).unwrap();
        let b_pos = out.find("[b]").unwrap();
        let a_pos = out.find("[a]").unwrap();
        assert!(b_pos < a_pos);
    }

    #[test]
    fn test_encode_top_level_scalar_in_default_section() {
        let root = crate::codec::json::decode(br#"{"flag": true, "sec": {"k": "v"}}"#).unwrap();
        let out = String::from_utf8(encode(&root).unwrap()).unwrap();
        assert!(out.contains("flag=true"));
        assert!(out.contains("[sec]"));
        assert!(out.find("flag=true").unwrap() < out.find("[sec]").unwrap());
    }

    #[test]
    fn test_encode_rejects_non_object() {
        assert!(encode(&Value::Array(vec![])).is_err());
    }
}
