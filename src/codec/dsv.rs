//! Delimiter-separated values codec backing both CSV and TSV.
//!
//! CSV sniffs its delimiter from the header line; TSV is fixed to tabs.
//! Each data row decodes to an object keyed by the header with
//! scalar-inferred cells. Encoding requires an array of objects and takes
//! the sorted keys of the first row as the header.

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;

use crate::value::{infer_scalar, Value};

/// Delimiter candidates, tried against the header line; the most frequent
/// one wins, defaulting to comma.
const DELIMITERS: &[u8] = b",;\t| ";

fn detect_delimiter(input: &[u8]) -> u8 {
    let header = input.split(|b| *b == b'\n').next().unwrap_or_default();
    let mut best = b',';
    let mut best_count = 0;
    for &cand in DELIMITERS {
        let count = header.iter().filter(|b| **b == cand).count();
        if count > best_count {
            best_count = count;
            best = cand;
        }
    }
    best
}

pub fn decode_csv(input: &[u8]) -> Result<Value> {
    decode(input, detect_delimiter(input))
}

pub fn decode_tsv(input: &[u8]) -> Result<Value> {
    decode(input, b'\t')
}

fn decode(input: &[u8], delimiter: u8) -> Result<Value> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .context("error reading headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("error reading record")?;
        let mut row = IndexMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let cell = record.get(i).unwrap_or("");
            row.insert(header.clone(), infer_scalar(cell));
        }
        rows.push(Value::Object(row));
    }
    Ok(Value::Array(rows))
}

pub fn encode_csv(value: &Value) -> Result<Vec<u8>> {
    encode(value, b',')
}

pub fn encode_tsv(value: &Value) -> Result<Vec<u8>> {
    encode(value, b'\t')
}

fn encode(value: &Value, delimiter: u8) -> Result<Vec<u8>> {
    let rows = match value {
        Value::Array(rows) => rows,
        other => bail!("input data must be an array, got {}", other.type_name()),
    };
    if rows.is_empty() {
        bail!("no data to write");
    }
    let first = match &rows[0] {
        Value::Object(obj) => obj,
        other => bail!("array elements must be objects, got {}", other.type_name()),
    };

    let mut headers: Vec<&String> = first.keys().collect();
    headers.sort_unstable();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(&headers)?;

    for row in rows {
        let Value::Object(obj) = row else {
            bail!("array elements must be objects, got {}", row.type_name());
        };
        let record: Vec<String> = headers
            .iter()
            .map(|h| obj.get(*h).map(Value::to_plain_string).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    Ok(writer.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_basic() {
        let v = decode_csv(b"a,b\n1,2\n3,4\n").unwrap();
        let rows = v.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].as_object().unwrap()["a"], Value::Int(1));
        assert_eq!(rows[1].as_object().unwrap()["b"], Value::Int(4));
    }

    #[test]
    fn test_delimiter_detection_semicolon() {
        let semi = decode_csv(b"a;b\n1;2\n").unwrap();
        let comma = decode_csv(b"a,b\n1,2\n").unwrap();
        assert_eq!(semi, comma);
    }

    #[test]
    fn test_delimiter_detection_pipe() {
        let v = decode_csv(b"name|city\nAlice|NYC\n").unwrap();
        assert_eq!(
            v.as_array().unwrap()[0].as_object().unwrap()["city"],
            Value::String("NYC".into())
        );
    }

    #[test]
    fn test_scalar_inference_in_cells() {
        let v = decode_csv(b"n,f,b,s\n42,3.14,true,hello\n").unwrap();
        let row = v.as_array().unwrap()[0].as_object().unwrap();
        assert_eq!(row["n"], Value::Int(42));
        assert_eq!(row["f"], Value::Float(3.14));
        assert_eq!(row["b"], Value::Bool(true));
        assert_eq!(row["s"], Value::String("hello".into()));
    }

    #[test]
    fn test_missing_trailing_fields_empty() {
        let v = decode_csv(b"a,b,c\n1,2\n").unwrap();
        let row = v.as_array().unwrap()[0].as_object().unwrap();
        assert_eq!(row["c"], Value::String("".into()));
    }

    #[test]
    fn test_tsv_fixed_tab() {
        let v = decode_tsv(b"a\tb\n1\tx,y\n").unwrap();
        let row = v.as_array().unwrap()[0].as_object().unwrap();
        assert_eq!(row["b"], Value::String("x,y".into()));
    }

    #[test]
    fn test_encode_sorted_headers() {
        let v = decode_csv(b"b,a\n2,1\n").unwrap();
        let out = String::from_utf8(encode_csv(&v).unwrap()).unwrap();
        assert_eq!(out, "a,b\n1,2\n");
    }

    #[test]
    fn test_encode_missing_values_empty() {
        let rows = crate::codec::json::decode(br#"[{"a":1,"b":2},{"a":3}]"#).unwrap();
        let out = String::from_utf8(encode_csv(&rows).unwrap()).unwrap();
        assert_eq!(out, "a,b\n1,2\n3,\n");
    }

    #[test]
    fn test_encode_rejects_non_array() {
        assert!(encode_csv(&Value::Int(1)).is_err());
        assert!(encode_csv(&Value::Array(vec![])).is_err());
    }
}
