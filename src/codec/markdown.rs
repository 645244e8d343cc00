//! Markdown codec (decode-only).
//!
//! Documents decode into a hierarchy keyed by generated section IDs (the
//! slug of the heading text, deduplicated with a numeric suffix). Each
//! section records its `title`, ordered `content` items (paragraphs, code
//! blocks, lists, tables, blockquotes, horizontal rules) and nested child
//! `sections` by heading level. Output goes through the JSON encoder.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::Regex;

use crate::value::Value;

pub fn decode(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input).context("input is not valid UTF-8")?;
    let mut parser = Parser {
        lines: text.lines().collect(),
        pos: 0,
    };
    parser.parse()
}

fn ordered_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\s").unwrap())
}

/// One section under construction; children attach by heading level.
struct Section {
    id: String,
    title: String,
    content: Vec<Value>,
    sections: Vec<Section>,
}

impl Section {
    fn into_value(self) -> Value {
        let mut map = IndexMap::new();
        map.insert("id".to_string(), Value::String(self.id));
        map.insert("title".to_string(), Value::String(self.title));
        if !self.content.is_empty() {
            map.insert("content".to_string(), Value::Array(self.content));
        }
        if !self.sections.is_empty() {
            let children = self
                .sections
                .into_iter()
                .map(|s| (s.id.clone(), s.into_value()))
                .collect();
            map.insert("sections".to_string(), Value::Object(children));
        }
        Value::Object(map)
    }
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl Parser<'_> {
    fn parse(&mut self) -> Result<Value> {
        let mut roots: Vec<Section> = Vec::new();
        // (level, index-path into the section tree)
        let mut stack: Vec<(usize, Vec<usize>)> = Vec::new();
        let mut id_counter: HashMap<String, usize> = HashMap::new();

        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].trim();
            if line.is_empty() {
                self.pos += 1;
                continue;
            }

            if line.starts_with('#') {
                let (level, title) = parse_heading(line);
                let id = section_id(&title, &mut id_counter);
                let section = Section {
                    id: id.clone(),
                    title,
                    content: Vec::new(),
                    sections: Vec::new(),
                };

                while stack.last().is_some_and(|(l, _)| *l >= level) {
                    stack.pop();
                }

                let path = match stack.last() {
                    None => {
                        roots.push(section);
                        vec![roots.len() - 1]
                    }
                    Some((_, parent_path)) => {
                        let parent = section_at(&mut roots, parent_path);
                        parent.sections.push(section);
                        let mut path = parent_path.clone();
                        path.push(parent.sections.len() - 1);
                        path
                    }
                };
                stack.push((level, path));
                self.pos += 1;
            } else {
                let item = self.parse_content_item();
                match (item, stack.last()) {
                    (Some(item), Some((_, path))) => {
                        section_at(&mut roots, path).content.push(item);
                    }
                    // orphaned content before the first heading is dropped
                    (Some(_), None) => {}
                    (None, _) => self.pos += 1,
                }
            }
        }

        let result = roots
            .into_iter()
            .map(|s| (s.id.clone(), s.into_value()))
            .collect();
        Ok(Value::Object(result))
    }

    fn parse_content_item(&mut self) -> Option<Value> {
        let line = *self.lines.get(self.pos)?;
        let trimmed = line.trim();

        if let Some(info) = trimmed.strip_prefix("```") {
            return Some(self.parse_code_block(info.trim().to_string()));
        }
        if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
            return Some(self.parse_list(false));
        }
        if ordered_list_re().is_match(trimmed) {
            return Some(self.parse_list(true));
        }
        if trimmed.contains('|') {
            return Some(self.parse_table());
        }
        if trimmed.starts_with('>') {
            return Some(self.parse_blockquote());
        }
        if is_horizontal_rule(trimmed) {
            self.pos += 1;
            return Some(content_item("horizontal_rule", Value::Object(IndexMap::new())));
        }
        Some(self.parse_paragraph())
    }

    fn parse_code_block(&mut self, language: String) -> Value {
        self.pos += 1;
        let mut code_lines = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            if line.trim() == "```" {
                self.pos += 1;
                break;
            }
            code_lines.push(line);
            self.pos += 1;
        }

        let mut data = IndexMap::new();
        if !language.is_empty() {
            data.insert("language".to_string(), Value::String(language));
        }
        data.insert("code".to_string(), Value::String(code_lines.join("\n")));
        content_item("code_block", Value::Object(data))
    }

    fn parse_list(&mut self, ordered: bool) -> Value {
        let mut items = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].trim();
            if line.is_empty() {
                self.pos += 1;
                continue;
            }

            let text = if ordered {
                if !ordered_list_re().is_match(line) {
                    break;
                }
                match line.split_once(' ') {
                    Some((_, rest)) => rest.trim(),
                    None => "",
                }
            } else {
                if !line.starts_with("- ") && !line.starts_with("* ") {
                    break;
                }
                line[2..].trim()
            };

            // task checkbox tri-state: absent, unchecked, checked
            let (text, checkbox) = if let Some(rest) = text.strip_prefix("[ ]") {
                (rest.trim(), Some(false))
            } else if let Some(rest) = text.strip_prefix("[x]").or_else(|| text.strip_prefix("[X]"))
            {
                (rest.trim(), Some(true))
            } else {
                (text, None)
            };

            let mut item = IndexMap::new();
            item.insert("text".to_string(), Value::String(text.to_string()));
            if let Some(checked) = checkbox {
                item.insert("checkbox".to_string(), Value::Bool(checked));
            }
            items.push(Value::Object(item));
            self.pos += 1;
        }

        let mut data = IndexMap::new();
        data.insert("ordered".to_string(), Value::Bool(ordered));
        data.insert("items".to_string(), Value::Array(items));
        content_item("list", Value::Object(data))
    }

    fn parse_table(&mut self) -> Value {
        let headers = parse_table_row(self.lines[self.pos].trim());
        self.pos += 1;

        // separator row (|---|---|)
        if self
            .lines
            .get(self.pos)
            .is_some_and(|l| l.contains("---"))
        {
            self.pos += 1;
        }

        let mut rows = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].trim();
            if line.is_empty() || !line.contains('|') {
                break;
            }
            let cells = parse_table_row(line);
            let mut row = IndexMap::new();
            for (i, cell) in cells.into_iter().enumerate() {
                if let Some(header) = headers.get(i) {
                    row.insert(header.clone(), Value::String(cell));
                }
            }
            rows.push(Value::Object(row));
            self.pos += 1;
        }

        let mut data = IndexMap::new();
        data.insert(
            "headers".to_string(),
            Value::Array(headers.into_iter().map(Value::String).collect()),
        );
        data.insert("rows".to_string(), Value::Array(rows));
        content_item("table", Value::Object(data))
    }

    fn parse_blockquote(&mut self) -> Value {
        let mut lines = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].trim();
            let Some(rest) = line.strip_prefix('>') else {
                break;
            };
            lines.push(rest.trim().to_string());
            self.pos += 1;
        }

        let mut paragraph = IndexMap::new();
        paragraph.insert("text".to_string(), Value::String(lines.join(" ")));
        let mut data = IndexMap::new();
        data.insert(
            "content".to_string(),
            Value::Array(vec![content_item("paragraph", Value::Object(paragraph))]),
        );
        content_item("blockquote", Value::Object(data))
    }

    fn parse_paragraph(&mut self) -> Value {
        let mut lines = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].trim();
            if line.is_empty() || is_block_start(line) {
                break;
            }
            lines.push(line);
            self.pos += 1;
        }

        let mut data = IndexMap::new();
        data.insert("text".to_string(), Value::String(lines.join(" ")));
        content_item("paragraph", Value::Object(data))
    }
}

fn content_item(kind: &str, data: Value) -> Value {
    let mut item = IndexMap::new();
    item.insert("type".to_string(), Value::String(kind.to_string()));
    item.insert("data".to_string(), data);
    Value::Object(item)
}

fn parse_heading(line: &str) -> (usize, String) {
    let level = line.chars().take_while(|c| *c == '#').count();
    (level, line[level..].trim().to_string())
}

/// Slug of the heading text, deduplicated with a numeric suffix.
fn section_id(title: &str, counter: &mut HashMap<String, usize>) -> String {
    let mut id = String::with_capacity(title.len());
    for ch in title.to_lowercase().chars() {
        match ch {
            'a'..='z' | '0'..='9' | '-' => id.push(ch),
            c if c.is_whitespace() => id.push('-'),
            _ => {}
        }
    }
    // collapse runs of hyphens introduced by whitespace/punctuation
    let mut slug = String::with_capacity(id.len());
    let mut prev_dash = false;
    for ch in id.chars() {
        if ch == '-' {
            if !prev_dash && !slug.is_empty() {
                slug.push('-');
            }
            prev_dash = true;
        } else {
            slug.push(ch);
            prev_dash = false;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();

    let count = counter.entry(slug.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        slug
    } else {
        format!("{}-{}", slug, *count - 1)
    }
}

fn section_at<'a>(roots: &'a mut Vec<Section>, path: &[usize]) -> &'a mut Section {
    let (first, rest) = path.split_first().expect("non-empty section path");
    let mut section = &mut roots[*first];
    for idx in rest {
        section = &mut section.sections[*idx];
    }
    section
}

fn parse_table_row(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_horizontal_rule(line: &str) -> bool {
    let line: String = line.chars().filter(|c| *c != ' ').collect();
    line.len() >= 3
        && (line.chars().all(|c| c == '-')
            || line.chars().all(|c| c == '*')
            || line.chars().all(|c| c == '_'))
}

fn is_block_start(line: &str) -> bool {
    line.starts_with('#')
        || line.starts_with("```")
        || line.starts_with("- ")
        || line.starts_with("* ")
        || line.starts_with('>')
        || line.contains('|')
        || ordered_list_re().is_match(line)
        || is_horizontal_rule(line)
}
