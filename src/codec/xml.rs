//! XML codec.
//!
//! Decoding produces a map of element name to content: attributes become
//! `@`-prefixed keys, repeated elements collect into arrays, and text
//! leaves pass through scalar inference. Encoding mirrors the projection:
//! a single-key object uses that key as the root element, a multi-key
//! object is wrapped under `doc`, arrays under `root`, scalars under
//! `value` — the wrapping keys the decoders on the other side expect.

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::value::{infer_scalar, Value};

pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input).context("input is not valid UTF-8")?;
    let mut reader = Reader::from_str(text);

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = element_name(&start);
                let start = start.into_owned();
                let content = parse_element(&mut reader, &start)?;
                let mut root = IndexMap::new();
                root.insert(name, content);
                return Ok(Value::Object(root));
            }
            Event::Empty(start) => {
                let mut root = IndexMap::new();
                root.insert(element_name(&start), attributes_only(&start)?);
                return Ok(Value::Object(root));
            }
            Event::Eof => bail!("no root element found"),
            _ => {}
        }
    }
}

fn element_name(start: &BytesStart) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn attributes_only(start: &BytesStart) -> Result<Value> {
    let mut map = IndexMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
        map.insert(key, infer_scalar(&attr.unescape_value()?));
    }
    if map.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(map))
    }
}

/// Parse the content of an open element until its end tag.
fn parse_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Value> {
    let mut map = IndexMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
        map.insert(key, infer_scalar(&attr.unescape_value()?));
    }

    let mut texts: Vec<String> = Vec::new();
    let mut children: IndexMap<String, Vec<Value>> = IndexMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(child) => {
                let name = element_name(&child);
                let child = child.into_owned();
                let value = parse_element(reader, &child)?;
                children.entry(name).or_default().push(value);
            }
            Event::Empty(child) => {
                children
                    .entry(element_name(&child))
                    .or_default()
                    .push(attributes_only(&child)?);
            }
            Event::Text(t) => {
                let s = t.unescape()?;
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    texts.push(trimmed.to_string());
                }
            }
            Event::CData(t) => {
                let s = String::from_utf8_lossy(&t.into_inner()).into_owned();
                if !s.trim().is_empty() {
                    texts.push(s);
                }
            }
            Event::End(_) => break,
            Event::Eof => bail!("unexpected end of input inside element"),
            _ => {}
        }
    }

    for (name, mut values) in children {
        if values.len() == 1 {
            map.insert(name, values.pop().unwrap());
        } else {
            map.insert(name, Value::Array(values));
        }
    }

    if !texts.is_empty() {
        let joined = texts.join(" ");
        if map.is_empty() {
            return Ok(infer_scalar(&joined));
        }
        map.insert("#text".to_string(), infer_scalar(&joined));
    }

    if map.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::Object(map))
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    match value {
        Value::Object(obj) if obj.len() == 1 => {
            let (name, inner) = obj.iter().next().unwrap();
            write_element(&mut writer, name, inner)?;
        }
        Value::Object(_) => write_element(&mut writer, "doc", value)?,
        Value::Array(_) => write_element(&mut writer, "root", value)?,
        scalar => write_element(&mut writer, "value", scalar)?,
    }
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(items) => {
            // repeated elements share the parent-supplied name
            for item in items {
                write_element(writer, name, item)?;
            }
        }
        Value::Object(obj) => {
            let mut start = BytesStart::new(name);
            let mut text: Option<String> = None;
            let mut comment: Option<String> = None;
            let mut children: Vec<(&String, &Value)> = Vec::new();
            for (key, val) in obj {
                if let Some(attr) = key.strip_prefix('@') {
                    start.push_attribute((attr, val.to_plain_string().as_str()));
                } else if key == "#text" {
                    text = Some(val.to_plain_string());
                } else if key == "#comment" {
                    comment = Some(val.to_plain_string());
                } else {
                    children.push((key, val));
                }
            }
            if text.is_none() && comment.is_none() && children.is_empty() {
                writer.write_event(Event::Empty(start))?;
                return Ok(());
            }
            writer.write_event(Event::Start(start))?;
            if let Some(text) = &text {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            if let Some(comment) = &comment {
                writer.write_event(Event::Comment(BytesText::new(comment)))?;
            }
            for (key, val) in children {
                write_element(writer, key, val)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        Value::Null => {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
        }
        scalar => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(&scalar.to_plain_string())))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nested_elements() {
        let v = decode(b"<config><name>qq</name><port>8080</port></config>").unwrap();
        let config = v.as_object().unwrap()["config"].as_object().unwrap();
        assert_eq!(config["name"], Value::String("qq".into()));
        assert_eq!(config["port"], Value::Int(8080));
    }

    #[test]
    fn test_decode_attributes_prefixed() {
        let v = decode(br#"<server host="localhost" port="80"/>"#).unwrap();
        let server = v.as_object().unwrap()["server"].as_object().unwrap();
        assert_eq!(server["@host"], Value::String("localhost".into()));
        assert_eq!(server["@port"], Value::Int(80));
    }

    #[test]
    fn test_decode_repeated_elements_collect() {
        let v = decode(b"<doc><item>1</item><item>2</item></doc>").unwrap();
        let items = &v.as_object().unwrap()["doc"].as_object().unwrap()["item"];
        assert_eq!(items, &Value::Array(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_decode_text_with_attrs() {
        let v = decode(br#"<doc><a id="1">hi</a></doc>"#).unwrap();
        let a = v.as_object().unwrap()["doc"].as_object().unwrap()["a"]
            .as_object()
            .unwrap();
        assert_eq!(a["@id"], Value::Int(1));
        assert_eq!(a["#text"], Value::String("hi".into()));
    }

    #[test]
    fn test_encode_wraps_scalar_under_value() {
        let out = String::from_utf8(encode(&Value::Int(3)).unwrap()).unwrap();
        assert_eq!(out, "<value>3</value>");
    }

    #[test]
    fn test_encode_wraps_array_under_root() {
        let out =
            String::from_utf8(encode(&Value::Array(vec![Value::Int(1), Value::Int(2)])).unwrap())
                .unwrap();
        assert!(out.contains("<root>1</root>"));
        assert!(out.contains("<root>2</root>"));
    }

    #[test]
    fn test_encode_multi_key_object_under_doc() {
        let v = decode(b"<config><a>1</a><b>2</b></config>").unwrap();
        // single-key root keeps its own name
        let out = String::from_utf8(encode(&v).unwrap()).unwrap();
        assert!(out.starts_with("<config>"));
        assert!(decode(out.as_bytes()).is_ok());
    }

    #[test]
    fn test_escaping() {
        let v = Value::String("a < b & c".into());
        let out = String::from_utf8(encode(&v).unwrap()).unwrap();
        assert_eq!(out, "<value>a &lt; b &amp; c</value>");
    }
}
