//! Line codec (`line`/`txt`): each input line becomes one scalar-inferred
//! array element. Output goes through the JSON encoder.

use anyhow::{Context, Result};

use crate::value::{infer_scalar, Value};

pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input).context("input is not valid UTF-8")?;
    let lines = text
        .trim_end_matches('\n')
        .split('\n')
        .map(infer_scalar)
        .collect();
    Ok(Value::Array(lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_infers_each_line() {
        let v = decode(b"42\nhello\ntrue\n3.5\n").unwrap();
        assert_eq!(
            v,
            Value::Array(vec![
                Value::Int(42),
                Value::String("hello".into()),
                Value::Bool(true),
                Value::Float(3.5),
            ])
        );
    }

    #[test]
    fn test_decode_no_trailing_newline() {
        let v = decode(b"a\nb").unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
    }
}
