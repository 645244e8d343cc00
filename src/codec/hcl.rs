//! HCL (and Terraform) codec.
//!
//! Decoding follows HCL's JSON projection: blocks become nested objects,
//! repeated blocks collect into arrays. Encoding walks the value tree and
//! emits blocks for objects, attributes for scalars and tuples for arrays;
//! a single-element array of one object is emitted as a block so block
//! lists survive a round-trip. A non-object root is wrapped under `data`.

use anyhow::Result;
use indexmap::IndexMap;

use ::hcl::{Block, Body, Expression, Identifier, ObjectKey};

use crate::value::{infer_scalar, Value};

pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input)?;
    let value: Value = ::hcl::from_str(text)?;
    Ok(normalize(value))
}

/// HCL heredocs and quoted literals all surface as strings; pass leaf text
/// through scalar inference so `port = "8080"` and `port = 8080` agree.
fn normalize(value: Value) -> Value {
    match value {
        Value::String(s) => infer_scalar(&s),
        Value::Array(arr) => Value::Array(arr.into_iter().map(normalize).collect()),
        Value::Object(obj) => {
            Value::Object(obj.into_iter().map(|(k, v)| (k, normalize(v))).collect())
        }
        other => other,
    }
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let body = match value {
        Value::Object(obj) => build_body(obj),
        other => {
            let mut wrapped = IndexMap::new();
            wrapped.insert("data".to_string(), other.clone());
            build_body(&wrapped)
        }
    };
    Ok(::hcl::to_string(&body)?.into_bytes())
}

fn build_body(obj: &IndexMap<String, Value>) -> Body {
    let mut builder = Body::builder();
    for (key, val) in obj {
        let ident = Identifier::sanitized(key);
        match val {
            Value::Object(inner) => {
                builder = builder.add_block(build_block(ident, inner));
            }
            Value::Array(items) => {
                // a lone object in an array is a block, not a tuple
                if let [Value::Object(inner)] = items.as_slice() {
                    builder = builder.add_block(build_block(ident, inner));
                    continue;
                }
                if items.is_empty() {
                    continue;
                }
                let tuple: Vec<Expression> = items.iter().map(to_expression).collect();
                builder = builder.add_attribute((ident, Expression::Array(tuple)));
            }
            scalar => {
                builder = builder.add_attribute((ident, to_expression(scalar)));
            }
        }
    }
    builder.build()
}

fn build_block(ident: Identifier, body: &IndexMap<String, Value>) -> Block {
    Block {
        identifier: ident,
        labels: Vec::new(),
        body: build_body(body),
    }
}

fn to_expression(value: &Value) -> Expression {
    match value {
        Value::Null => Expression::Null,
        Value::Bool(b) => Expression::Bool(*b),
        Value::Int(n) => Expression::Number((*n).into()),
        Value::Float(f) => ::hcl::Number::from_f64(*f)
            .map(Expression::Number)
            .unwrap_or(Expression::Null),
        Value::String(s) => Expression::String(s.clone()),
        Value::Array(items) => Expression::Array(items.iter().map(to_expression).collect()),
        Value::Object(obj) => Expression::Object(
            obj.iter()
                .map(|(k, v)| {
                    (
                        ObjectKey::Expression(Expression::String(k.clone())),
                        to_expression(v),
                    )
                })
                .collect(),
        ),
    }
}
