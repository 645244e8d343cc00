//! HTML codec (decode-only).
//!
//! The document's root `<html>` node becomes an object: elements map to
//! child entries, attributes get an `@` prefix, text nodes collapse to the
//! sole value of a leaf element or a `#text` key, comments to `#comment`.
//! Element trees with a single child collapse one level to reduce
//! indirection. Output reuses the XML encoder.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

use crate::value::Value;

pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input).context("input is not valid UTF-8")?;
    let doc = Html::parse_document(text);
    let root = doc.root_element();

    match element_to_value(root) {
        Some(value @ Value::Object(_)) => {
            let mut wrapped = IndexMap::new();
            wrapped.insert("html".to_string(), value);
            Ok(Value::Object(wrapped))
        }
        _ => Ok(Value::Null),
    }
}

/// Decode numeric `\uXXXX` escape sequences embedded in attribute values
/// and text content.
fn decode_unicode_escapes(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\\u([0-9a-fA-F]{4})").unwrap());
    re.replace_all(s, |caps: &regex::Captures| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

fn element_to_value(el: ElementRef) -> Option<Value> {
    let mut map = IndexMap::new();
    let attr_count = el.value().attrs().count();
    for (name, value) in el.value().attrs() {
        map.insert(
            format!("@{name}"),
            Value::String(decode_unicode_escapes(value)),
        );
    }

    let mut texts: Vec<String> = Vec::new();
    let mut comments: Vec<String> = Vec::new();
    let mut children: IndexMap<String, Vec<Value>> = IndexMap::new();

    for child in el.children() {
        match child.value() {
            Node::Text(t) => {
                let text = t.trim();
                if !text.is_empty() {
                    texts.push(decode_unicode_escapes(text));
                }
            }
            Node::Comment(c) => {
                let text = c.trim();
                if !text.is_empty() {
                    comments.push(text.to_string());
                }
            }
            Node::Element(_) => {
                let child_el = ElementRef::wrap(child).expect("element node");
                if let Some(value) = element_to_value(child_el) {
                    children
                        .entry(child_el.value().name().to_string())
                        .or_default()
                        .push(value);
                }
            }
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
        if texts.len() == 1 && map.is_empty() {
            return Some(Value::String(texts.pop().unwrap()));
        }
        map.insert("#text".to_string(), Value::String(texts.join(" ")));
    }

    if !comments.is_empty() {
        let value = if comments.len() == 1 {
            Value::String(comments.pop().unwrap())
        } else {
            Value::Array(comments.into_iter().map(Value::String).collect())
        };
        if map.is_empty() {
            let mut only = IndexMap::new();
            only.insert("#comment".to_string(), value);
            return Some(Value::Object(only));
        }
        map.insert("#comment".to_string(), value);
    }

    if map.is_empty() {
        return None;
    }

    // single-entry trees collapse one level of indirection
    if map.len() == 1 {
        if let Some(text) = map.get("#text") {
            return Some(text.clone());
        }
        if attr_count == 0 {
            let (key, value) = map.into_iter().next().unwrap();
            if matches!(&value, Value::Object(inner) if inner.len() == 1) {
                return Some(value);
            }
            let mut single = IndexMap::new();
            single.insert(key, value);
            return Some(Value::Object(single));
        }
    }

    Some(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_document() {
        let html = b"<html><head><title>Hi</title></head><body><p>text</p></body></html>";
        let v = decode(html).unwrap();
        let root = v.as_object().unwrap()["html"].as_object().unwrap();
        assert_eq!(
            root["head"].as_object().unwrap()["title"],
            Value::String("Hi".into())
        );
        assert_eq!(
            root["body"].as_object().unwrap()["p"],
            Value::String("text".into())
        );
    }

    #[test]
    fn test_attributes_prefixed() {
        let html = br#"<html><body><a href="https://example.com">link</a></body></html>"#;
        let v = decode(html).unwrap();
        // single-child chains collapse down to the leaf element
        let root = v.as_object().unwrap()["html"].as_object().unwrap();
        let a = root["a"].as_object().unwrap();
        assert_eq!(a["@href"], Value::String("https://example.com".into()));
        assert_eq!(a["#text"], Value::String("link".into()));
    }

    #[test]
    fn test_repeated_elements() {
        let html = b"<html><body><ul><li>a</li><li>b</li></ul></body></html>";
        let v = decode(html).unwrap();
        let root = v.as_object().unwrap()["html"].as_object().unwrap();
        assert_eq!(
            root["li"],
            Value::Array(vec![Value::String("a".into()), Value::String("b".into())])
        );
    }

    #[test]
    fn test_comment_nodes() {
        let html = b"<html><body><!-- note --><p>x</p></body></html>";
        let v = decode(html).unwrap();
        let root = v.as_object().unwrap()["html"].as_object().unwrap();
        let body = root["body"].as_object().unwrap();
        assert_eq!(body["#comment"], Value::String("note".into()));
    }

    #[test]
    fn test_unicode_escapes_decoded() {
        let attr = concat!("\\", "u0041");
        let html = format!(r#"<html><body><p data-x="{attr}">ok</p></body></html>"#);
        let v = decode(html.as_bytes()).unwrap();
        let root = v.as_object().unwrap()["html"].as_object().unwrap();
        let p = root["p"].as_object().unwrap();
        assert_eq!(p["@data-x"], Value::String("A".into()));
        assert_eq!(p["#text"], Value::String("ok".into()));
    }

    #[test]
    fn test_decode_unicode_escape_helper() {
        let input = concat!("\\", "u0041", "\\", "u0042", "c");
        assert_eq!(decode_unicode_escapes(input), "ABc");
        assert_eq!(decode_unicode_escapes("plain"), "plain");
    }
}
