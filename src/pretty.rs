//! Output pretty-printing: raw-output handling plus semantic ANSI
//! colorization keyed off the output format.
//!
//! Color assignment by token kind: strings green, numbers yellow, keys
//! cyan, keywords blue, booleans magenta, comments dimmed, punctuation
//! unstyled. Output that is not going to a terminal passes through
//! untouched.

use colored::Colorize;

use crate::codec::{self, Encoding};
use crate::error::{QqError, Result};
use crate::value::Value;

/// Format a serialized record for the terminal.
///
/// With `raw`, scalar strings print unquoted with escapes decoded and
/// other scalars print their canonical text; composites are untouched.
/// Colorization applies only when stdout is a terminal and `monochrome`
/// is unset.
pub fn format(s: &str, encoding: Encoding, raw: bool, monochrome: bool) -> Result<String> {
    if raw {
        let value = codec::decode(s.as_bytes(), encoding)
            .map_err(|e| QqError::Format(e.to_string()))?;
        match value {
            Value::Null => return Ok("null".to_string()),
            Value::Bool(b) => return Ok(b.to_string()),
            Value::Int(n) => return Ok(n.to_string()),
            Value::Float(f) => return Ok(f.to_string()),
            Value::String(text) => return Ok(text),
            Value::Array(_) | Value::Object(_) => {}
        }
    }

    if monochrome || !atty::is(atty::Stream::Stdout) {
        return Ok(s.to_string());
    }

    Ok(colorize(s, encoding))
}

/// Colorize `s` with the lexer for `encoding`. Binary formats never reach
/// here; their JSON-ified renderings use the JSON lexer.
pub fn colorize(s: &str, encoding: Encoding) -> String {
    match encoding {
        Encoding::Json
        | Encoding::Jsonc
        | Encoding::Jsonl
        | Encoding::Msgpack
        | Encoding::Parquet
        | Encoding::Csv
        | Encoding::Tsv
        | Encoding::Line
        | Encoding::Proto
        | Encoding::Markdown => lex_json(s),
        Encoding::Yaml => lex_yaml(s),
        Encoding::Toml
        | Encoding::Ini
        | Encoding::Properties
        | Encoding::Env
        | Encoding::Hcl
        | Encoding::Gron => lex_kv(s),
        Encoding::Xml | Encoding::Html => lex_xml(s),
        Encoding::Base64 => s.to_string(),
    }
}

fn paint_scalar(token: &str, out: &mut String) {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        out.push_str(token);
    } else if trimmed == "null" || trimmed == "~" {
        out.push_str(&token.blue().to_string());
    } else if trimmed == "true" || trimmed == "false" {
        out.push_str(&token.magenta().to_string());
    } else if trimmed.parse::<f64>().is_ok() {
        out.push_str(&token.yellow().to_string());
    } else {
        out.push_str(&token.green().to_string());
    }
}

/// JSON lexer. Strings followed by a colon are keys.
fn lex_json(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len() * 2);
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let start = i;
                i += 1;
                while i < bytes.len() {
                    match bytes[i] {
                        b'\\' => i += 2,
                        b'"' => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
                let token = &s[start..i.min(bytes.len())];
                // lookahead for ':' decides key vs string
                let mut j = i;
                while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
                    j += 1;
                }
                if bytes.get(j) == Some(&b':') {
                    out.push_str(&token.cyan().to_string());
                } else {
                    out.push_str(&token.green().to_string());
                }
            }
            b'-' | b'0'..=b'9' => {
                let start = i;
                while i < bytes.len()
                    && matches!(bytes[i], b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9')
                {
                    i += 1;
                }
                out.push_str(&s[start..i].yellow().to_string());
            }
            b'a'..=b'z' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                    i += 1;
                }
                match &s[start..i] {
                    "true" | "false" => out.push_str(&s[start..i].magenta().to_string()),
                    "null" => out.push_str(&s[start..i].blue().to_string()),
                    other => out.push_str(other),
                }
            }
            _ => {
                let ch_len = utf8_len(bytes[i]);
                out.push_str(&s[i..i + ch_len]);
                i += ch_len;
                continue;
            }
        }
        // string/number/word arms advance i themselves
    }
    out
}

fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    }
}

/// YAML lexer: document markers, comments, keys and scalar values.
fn lex_yaml(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for (n, line) in s.split('\n').enumerate() {
        if n > 0 {
            out.push('\n');
        }
        let trimmed = line.trim_start();
        if trimmed == "---" {
            out.push_str(&line.blue().to_string());
            continue;
        }
        if trimmed.starts_with('#') {
            out.push_str(&line.dimmed().to_string());
            continue;
        }

        let indent_len = line.len() - trimmed.len();
        out.push_str(&line[..indent_len]);

        let (marker, rest) = match trimmed.strip_prefix("- ") {
            Some(rest) => ("- ", rest),
            None => ("", trimmed),
        };
        out.push_str(marker);

        // `key: value` if the colon is outside quotes
        if let Some(colon) = find_unquoted(rest, ':') {
            let (key, tail) = rest.split_at(colon);
            out.push_str(&key.cyan().to_string());
            out.push(':');
            let value = &tail[1..];
            if value.is_empty() {
                continue;
            }
            paint_scalar(value, &mut out);
        } else {
            paint_scalar(rest, &mut out);
        }
    }
    out
}

/// Key-value lexer for TOML, INI, properties, env, HCL and GRON output:
/// `[sections]`, comments, and `key = value` / `key: value` lines.
fn lex_kv(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for (n, line) in s.split('\n').enumerate() {
        if n > 0 {
            out.push('\n');
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') || trimmed.starts_with(';') || trimmed.starts_with("//") {
            out.push_str(&line.dimmed().to_string());
            continue;
        }
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            out.push_str(&line.cyan().to_string());
            continue;
        }

        if let Some(eq) = find_unquoted(line, '=') {
            let (key, tail) = line.split_at(eq);
            out.push_str(&key.cyan().to_string());
            out.push('=');
            paint_scalar(tail[1..].trim_end_matches(';'), &mut out);
            if tail[1..].ends_with(';') {
                out.push(';');
            }
        } else {
            out.push_str(line);
        }
    }
    out
}

/// XML lexer: tags blue, attribute names cyan, attribute values green,
/// comments dimmed, text content unstyled.
fn lex_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    let mut rest = s;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let close = match tail.find('>') {
            Some(idx) => idx,
            None => {
                out.push_str(tail);
                return out;
            }
        };
        let tag = &tail[..=close];
        if tag.starts_with("<!--") {
            out.push_str(&tag.dimmed().to_string());
        } else {
            out.push_str(&paint_tag(tag));
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}

fn paint_tag(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len() * 2);
    // name runs to the first space; attributes alternate name="value"
    match tag.find(' ') {
        None => out.push_str(&tag.blue().to_string()),
        Some(space) => {
            out.push_str(&tag[..space].blue().to_string());
            let mut rest = &tag[space..];
            while let Some(eq) = rest.find('=') {
                out.push_str(&rest[..eq].cyan().to_string());
                out.push('=');
                rest = &rest[eq + 1..];
                if let Some(quote_end) = rest[1..].find('"') {
                    let value = &rest[..quote_end + 2];
                    out.push_str(&value.green().to_string());
                    rest = &rest[quote_end + 2..];
                } else {
                    break;
                }
            }
            out.push_str(&rest.blue().to_string());
        }
    }
    out
}

/// Index of `needle` in `s` outside single or double quotes.
fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_double = false;
    let mut in_single = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' if !in_single => in_double = !in_double,
            '\'' if !in_double => in_single = !in_single,
            c if c == needle && !in_double && !in_single => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_unquotes_scalar_string() {
        let out = format("\"hello\\nworld\"", Encoding::Json, true, true).unwrap();
        assert_eq!(out, "hello\nworld");
    }

    #[test]
    fn test_raw_keeps_composites() {
        let out = format("{\n  \"a\": 1\n}", Encoding::Json, true, true).unwrap();
        assert_eq!(out, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_raw_canonical_scalars() {
        assert_eq!(format("null", Encoding::Json, true, true).unwrap(), "null");
        assert_eq!(format("false", Encoding::Json, true, true).unwrap(), "false");
        assert_eq!(format("42", Encoding::Json, true, true).unwrap(), "42");
    }

    #[test]
    fn test_monochrome_passthrough() {
        let input = "{\"a\": 1}";
        assert_eq!(
            format(input, Encoding::Json, false, true).unwrap(),
            input
        );
    }

    #[test]
    fn test_json_lexer_key_vs_string() {
        colored::control::set_override(true);
        let out = lex_json("{\"k\": \"v\"}");
        colored::control::unset_override();
        // key and value painted differently
        assert!(out.contains("\u{1b}[36m\"k\"\u{1b}[0m"));
        assert!(out.contains("\u{1b}[32m\"v\"\u{1b}[0m"));
    }

    #[test]
    fn test_kv_lexer_sections() {
        colored::control::set_override(true);
        let out = lex_kv("[server]\nhost=localhost");
        colored::control::unset_override();
        assert!(out.contains("\u{1b}[36m[server]\u{1b}[0m"));
    }

    #[test]
    fn test_find_unquoted_skips_quotes() {
        assert_eq!(find_unquoted("\"a:b\": 1", ':'), Some(5));
        assert_eq!(find_unquoted("'x=y'", '='), None);
    }
}
