//! Protobuf schema codec (decode-only): extracts `package`, `message` and
//! `enum` declarations from a `.proto` file into
//! `{package: {message: {...}, enums: {...}}}`. Comments are stripped
//! before parsing. Output goes through the JSON encoder.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::Regex;

use crate::value::Value;

fn patterns() -> &'static ProtoPatterns {
    static PATTERNS: OnceLock<ProtoPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ProtoPatterns {
        package: Regex::new(r"package\s+([A-Za-z0-9_.]+)\s*;").unwrap(),
        message: Regex::new(r"message\s+([A-Za-z0-9_]+)\s*\{([^}]*)\}").unwrap(),
        field: Regex::new(r"([A-Za-z0-9_.]+)\s+([A-Za-z0-9_]+)\s*=\s*(\d+)\s*;").unwrap(),
        enum_block: Regex::new(r"enum\s+([A-Za-z0-9_]+)\s*\{([^}]*)\}").unwrap(),
        enum_value: Regex::new(r"([A-Za-z0-9_]+)\s*=\s*(-?\d+)\s*;").unwrap(),
        line_comment: Regex::new(r"//[^\n]*").unwrap(),
        block_comment: Regex::new(r"(?s)/\*.*?\*/").unwrap(),
    })
}

struct ProtoPatterns {
    package: Regex,
    message: Regex,
    field: Regex,
    enum_block: Regex,
    enum_value: Regex,
    line_comment: Regex,
    block_comment: Regex,
}

pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input).context("input is not valid UTF-8")?;
    let p = patterns();

    let stripped = p.line_comment.replace_all(text, "");
    let stripped = p.block_comment.replace_all(&stripped, "");

    let package = p
        .package
        .captures(&stripped)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let mut messages = IndexMap::new();
    for caps in p.message.captures_iter(&stripped) {
        let name = caps[1].to_string();
        let body = &caps[2];
        let mut fields = Vec::new();
        for field in p.field.captures_iter(body) {
            let number: i64 = field[3].parse()?;
            let mut entry = IndexMap::new();
            entry.insert("name".to_string(), Value::String(field[2].to_string()));
            entry.insert("type".to_string(), Value::String(field[1].to_string()));
            entry.insert("number".to_string(), Value::Int(number));
            fields.push(Value::Object(entry));
        }
        messages.insert(name, Value::Array(fields));
    }

    let mut enums = IndexMap::new();
    for caps in p.enum_block.captures_iter(&stripped) {
        let name = caps[1].to_string();
        let body = &caps[2];
        let mut values = IndexMap::new();
        for value in p.enum_value.captures_iter(body) {
            values.insert(value[1].to_string(), Value::Int(value[2].parse()?));
        }
        enums.insert(name, Value::Object(values));
    }

    let mut package_map = IndexMap::new();
    package_map.insert("message".to_string(), Value::Object(messages));
    package_map.insert("enums".to_string(), Value::Object(enums));

    let mut root = IndexMap::new();
    root.insert(package, Value::Object(package_map));
    Ok(Value::Object(root))
}
