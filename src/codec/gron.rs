//! GRON codec: one `dotted.path[i] = json_literal;` assignment per leaf,
//! the greppable flattening of a value tree.

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;

use crate::value::Value;

use super::json;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input).context("input is not valid UTF-8")?;
    let mut root = Value::Null;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (path, literal) = line
            .split_once(" = ")
            .with_context(|| format!("line {}: missing ' = ' separator", lineno + 1))?;
        let literal = literal.trim().trim_end_matches(';');
        let value: Value = serde_json::from_str(literal)
            .with_context(|| format!("line {}: invalid JSON literal", lineno + 1))?;
        let segments = parse_path(path.trim())
            .with_context(|| format!("line {}: invalid path", lineno + 1))?;
        set_path(&mut root, &segments, value)
            .with_context(|| format!("line {}: conflicting path", lineno + 1))?;
    }

    Ok(root)
}

fn parse_path(path: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let mut rest = part;
        // key portion before any [i] suffixes; empty for root indices
        if let Some(bracket) = rest.find('[') {
            if bracket > 0 {
                segments.push(Segment::Key(rest[..bracket].to_string()));
            }
            rest = &rest[bracket..];
            while let Some(stripped) = rest.strip_prefix('[') {
                let end = stripped.find(']').context("unclosed index")?;
                let idx: usize = stripped[..end].parse().context("bad index")?;
                segments.push(Segment::Index(idx));
                rest = &stripped[end + 1..];
            }
            if !rest.is_empty() {
                bail!("trailing characters after index");
            }
        } else {
            if rest.is_empty() {
                bail!("empty path segment");
            }
            segments.push(Segment::Key(rest.to_string()));
        }
    }
    if segments.is_empty() {
        bail!("empty path");
    }
    Ok(segments)
}

fn set_path(node: &mut Value, segments: &[Segment], value: Value) -> Result<()> {
    let (head, rest) = segments.split_first().expect("non-empty path");

    match head {
        Segment::Key(key) => {
            if matches!(node, Value::Null) {
                *node = Value::Object(IndexMap::new());
            }
            let Value::Object(obj) = node else {
                bail!("expected object at '{}'", key);
            };
            let slot = obj.entry(key.clone()).or_insert(Value::Null);
            if rest.is_empty() {
                *slot = value;
            } else {
                set_path(slot, rest, value)?;
            }
        }
        Segment::Index(idx) => {
            if matches!(node, Value::Null) {
                *node = Value::Array(Vec::new());
            }
            let Value::Array(arr) = node else {
                bail!("expected array at index {}", idx);
            };
            // gaps fill with null
            while arr.len() <= *idx {
                arr.push(Value::Null);
            }
            if rest.is_empty() {
                arr[*idx] = value;
            } else {
                set_path(&mut arr[*idx], rest, value)?;
            }
        }
    }
    Ok(())
}

/// Depth-first traversal emitting one assignment per leaf.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut out = String::new();
    traverse(value, "", &mut out)?;
    Ok(out.into_bytes())
}

fn traverse(value: &Value, prefix: &str, out: &mut String) -> Result<()> {
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                traverse(val, &path, out)?;
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter().enumerate() {
                traverse(val, &format!("{prefix}[{i}]"), out)?;
            }
        }
        leaf => {
            let literal = String::from_utf8(json::encode_compact(leaf)?)?;
            out.push_str(prefix);
            out.push_str(" = ");
            out.push_str(&literal);
            out.push_str(";\n");
        }
    }
    Ok(())
}
