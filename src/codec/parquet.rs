//! Parquet codec (binary).
//!
//! To stay format-independent every column is widened to a string on
//! decode, yielding a homogeneous array of string-valued objects. Encoding
//! accepts exactly that shape: a string-typed schema is built from the
//! first row's keys and written as a single Snappy-compressed row group.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use indexmap::IndexMap;

use ::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use ::parquet::arrow::ArrowWriter;
use ::parquet::basic::Compression;
use ::parquet::file::properties::WriterProperties;

use crate::value::Value;

pub fn decode(input: &[u8]) -> Result<Value> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(input))
        .context("error opening parquet file")?
        .build()
        .context("error reading parquet file")?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.context("error reading record batch")?;
        let schema = batch.schema();

        let columns: Vec<StringArray> = batch
            .columns()
            .iter()
            .map(|col| {
                let cast = compute::cast(col, &DataType::Utf8)
                    .context("error widening column to string")?;
                cast.as_any()
                    .downcast_ref::<StringArray>()
                    .cloned()
                    .context("cast did not produce a string column")
            })
            .collect::<Result<_>>()?;

        for i in 0..batch.num_rows() {
            let mut row = IndexMap::with_capacity(columns.len());
            for (j, field) in schema.fields().iter().enumerate() {
                let cell = if columns[j].is_null(i) {
                    Value::Null
                } else {
                    Value::String(columns[j].value(i).to_string())
                };
                row.insert(field.name().clone(), cell);
            }
            rows.push(Value::Object(row));
        }
    }
    Ok(Value::Array(rows))
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
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

    let fields: Vec<Field> = first
        .keys()
        .map(|key| Field::new(key, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let columns: Vec<ArrayRef> = first
        .keys()
        .map(|key| {
            let cells: Vec<Option<String>> = rows
                .iter()
                .map(|row| {
                    row.as_object()
                        .and_then(|obj| obj.get(key))
                        .filter(|v| !matches!(v, Value::Null))
                        .map(Value::to_plain_string)
                })
                .collect();
            Arc::new(StringArray::from(cells)) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), columns)
        .context("error building record batch")?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, Some(props))
        .context("error creating parquet writer")?;
    writer.write(&batch).context("error writing record batch")?;
    writer.close().context("error closing parquet writer")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_stringifies_cells() {
        let v = crate::codec::json::decode(
            br#"[{"id":1,"name":"Alice"},{"id":2,"name":"Bob"}]"#,
        )
        .unwrap();
        let bytes = encode(&v).unwrap();
        let back = decode(&bytes).unwrap();
        let rows = back.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        let first = rows[0].as_object().unwrap();
        // every column widened to string
        assert_eq!(first["id"], Value::String("1".into()));
        assert_eq!(first["name"], Value::String("Alice".into()));
    }

    #[test]
    fn test_missing_values_null() {
        let v = crate::codec::json::decode(br#"[{"a":"x","b":"y"},{"a":"z"}]"#).unwrap();
        let back = decode(&encode(&v).unwrap()).unwrap();
        let second = back.as_array().unwrap()[1].as_object().unwrap();
        assert_eq!(second["b"], Value::Null);
    }

    #[test]
    fn test_encode_rejects_non_array() {
        assert!(encode(&Value::Int(1)).is_err());
        assert!(encode(&Value::Array(vec![Value::Int(1)])).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"definitely not parquet").is_err());
    }
}
