//! Java properties codec.
//!
//! Decoding uses full Java semantics (`=`, `:` and whitespace separators,
//! line continuations, escape sequences, `#`/`!` comments) and yields a
//! flat string map. Encoding emits sorted `key=value` lines, escaping
//! separators and whitespace in keys only.

use anyhow::{bail, Result};
use indexmap::IndexMap;

use crate::value::Value;

pub fn decode(input: &[u8]) -> Result<Value> {
    let props = java_properties::read(input)?;

    let mut keys: Vec<&String> = props.keys().collect();
    keys.sort_unstable();

    let mut map = IndexMap::with_capacity(props.len());
    for key in keys {
        map.insert(key.clone(), Value::String(props[key].clone()));
    }
    Ok(Value::Object(map))
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let Value::Object(obj) = value else {
        bail!(
            "properties output requires an object, got {}",
            value.type_name()
        );
    };

    let mut entries = Vec::with_capacity(obj.len());
    for (key, val) in obj {
        match val {
            Value::Array(_) | Value::Object(_) => bail!(
                "properties format only supports simple key-value pairs, cannot convert nested structures"
            ),
            scalar => entries.push((key, scalar.to_plain_string())),
        }
    }
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for (key, value) in entries {
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(&value, false));
        out.push('\n');
    }
    Ok(out.into_bytes())
}

/// Escape property text. Separators and spaces are only special in keys.
fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str(r"\\"),
            '\t' => out.push_str(r"\t"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '=' | ':' | ' ' if is_key => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}
