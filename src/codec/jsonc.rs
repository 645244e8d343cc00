//! JSONC (JSON with comments) codec: strip comments, then parse as JSON.
//! Output is plain JSON; comments are not preserved.

use anyhow::Result;

use crate::value::Value;

pub fn decode(input: &[u8]) -> Result<Value> {
    let stripped = strip_comments(input);
    Ok(serde_json::from_slice(&stripped)?)
}

/// Remove `// …` and `/* … */` comments while respecting string literals
/// and escape sequences. Newlines inside stripped regions are kept so parse
/// errors still point at the right line.
fn strip_comments(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    let mut in_string = false;
    let mut escaped = false;

    while i < input.len() {
        let b = input[i];

        if in_string {
            out.push(b);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' => {
                in_string = true;
                out.push(b);
                i += 1;
            }
            b'/' if input.get(i + 1) == Some(&b'/') => {
                i += 2;
                while i < input.len() && input[i] != b'\n' {
                    i += 1;
                }
                // the newline itself is emitted by the next iteration
            }
            b'/' if input.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < input.len() {
                    if input[i] == b'*' && input.get(i + 1) == Some(&b'/') {
                        i += 2;
                        break;
                    }
                    if input[i] == b'\n' {
                        out.push(b'\n');
                    }
                    i += 1;
                }
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comments() {
        let v = decode(b"{\n  // comment\n  \"a\": 1 // trailing\n}").unwrap();
        assert_eq!(v.as_object().unwrap()["a"], Value::Int(1));
    }

    #[test]
    fn test_block_comments() {
        let v = decode(b"{\"a\": /* inline */ 1, /* multi\nline */ \"b\": 2}").unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj["a"], Value::Int(1));
        assert_eq!(obj["b"], Value::Int(2));
    }

    #[test]
    fn test_comment_markers_inside_strings_survive() {
        let v = decode(br#"{"url": "http://example.com", "glob": "a/*b*/c"}"#).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj["url"], Value::String("http://example.com".into()));
        assert_eq!(obj["glob"], Value::String("a/*b*/c".into()));
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        let v = decode(br#"{"s": "say \"hi\" // not a comment"}"#).unwrap();
        assert_eq!(
            v.as_object().unwrap()["s"],
            Value::String("say \"hi\" // not a comment".into())
        );
    }

    #[test]
    fn test_newlines_preserved_for_line_numbers() {
        let stripped = strip_comments(b"{\n/* a\nb */\n\"x\": }");
        let text = String::from_utf8(stripped).unwrap();
        assert_eq!(text.matches('\n').count(), 3);
    }
}
