//! JSON Lines (newline-delimited JSON) codec.

use anyhow::{Context, Result};

use crate::value::Value;

use super::json;

/// Decode JSONL: one JSON value per line, blank lines skipped. The result
/// is always an array of the parsed values.
pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input).context("input is not valid UTF-8")?;
    let mut values = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("error parsing JSON on line {}", idx + 1))?;
        values.push(value);
    }
    Ok(Value::Array(values))
}

/// Encode as JSONL: each top-level array element on its own line. A
/// non-array value is wrapped into a single-element array first.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let items: &[Value] = match value {
        Value::Array(arr) => arr,
        other => std::slice::from_ref(other),
    };
    let mut out = Vec::new();
    for item in items {
        out.extend_from_slice(&json::encode_compact(item)?);
        out.push(b'\n');
    }
    Ok(out)
}
