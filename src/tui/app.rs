//! Viewer-model for the interactive REPL.
//!
//! Holds the expression buffer, the rendered output (and the last valid
//! one), scroll position and the path-completion state. Every input change
//! reparses the expression: a valid query re-runs against the decoded
//! value and refreshes the output, an invalid one surfaces the error while
//! keeping the last valid output on screen.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::query;
use crate::value::Value;

pub struct App {
    /// Decoded input the queries run against.
    data: Value,
    /// Current expression buffer (may span multiple lines).
    pub expression: String,
    /// Rendered output for the current expression.
    pub output: String,
    /// Output of the last successfully evaluated expression.
    pub last_valid: String,
    /// Scroll offset of the output pane.
    pub scroll: u16,
    /// Candidate path completions extracted from the decoded value.
    pub completions: Vec<String>,
    /// Cycling index into `completions`.
    pub completion_index: usize,
    /// Whether the completion preview is visible.
    pub showing_preview: bool,
    /// Set when the user exited with a valid query.
    pub graceful_exit: bool,
}

impl App {
    pub fn new(json_text: &str) -> Self {
        let data: Value = serde_json::from_str(json_text).unwrap_or(Value::Null);
        let completions = extract_paths(&data);
        let mut app = App {
            data,
            expression: ".".to_string(),
            output: String::new(),
            last_valid: String::new(),
            scroll: 0,
            completions,
            completion_index: 0,
            showing_preview: false,
            graceful_exit: false,
        };
        app.refresh();
        app
    }

    /// The completion currently previewed, if any.
    pub fn preview(&self) -> Option<&str> {
        if self.showing_preview {
            self.completions.get(self.completion_index).map(|s| s.as_str())
        } else {
            None
        }
    }

    /// Re-evaluate the current expression against the decoded value.
    pub fn refresh(&mut self) {
        let parsed = match query::parse(self.expression.trim()) {
            Ok(q) => q,
            Err(e) => {
                self.output = format!("{e}\n\nLast valid output:\n{}", self.last_valid);
                return;
            }
        };
        match parsed.run_collect(&self.data) {
            Ok(results) => {
                let rendered: Vec<String> = results
                    .iter()
                    .map(|v| serde_json::to_string_pretty(&v).unwrap_or_default())
                    .collect();
                self.output = rendered.join("\n");
                self.last_valid = self.output.clone();
            }
            Err(e) => {
                self.output = format!("{e}\n\nLast valid output:\n{}", self.last_valid);
            }
        }
    }

    pub fn is_valid_query(&self) -> bool {
        !self.expression.trim().is_empty() && query::parse(self.expression.trim()).is_ok()
    }

    /// Output printed to stdout after a graceful exit.
    pub fn final_output(&self) -> String {
        self.output.clone()
    }

    /// Handle one key event. Returns true when the session should end.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => return self.exit(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return self.exit()
            }
            KeyCode::Tab => {
                if self.completions.is_empty() {
                    return false;
                }
                if self.showing_preview {
                    self.completion_index = (self.completion_index + 1) % self.completions.len();
                } else {
                    self.showing_preview = true;
                    self.completion_index = 0;
                }
            }
            KeyCode::Enter => {
                if let Some(preview) = self.preview() {
                    self.expression = preview.to_string();
                    self.showing_preview = false;
                    self.refresh();
                } else {
                    self.expression.push('\n');
                }
            }
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::Backspace => {
                self.dismiss_preview();
                self.expression.pop();
                self.refresh();
            }
            KeyCode::Char(c) => {
                self.dismiss_preview();
                self.expression.push(c);
                self.refresh();
            }
            _ => {}
        }
        false
    }

    fn dismiss_preview(&mut self) {
        self.showing_preview = false;
    }

    fn exit(&mut self) -> bool {
        self.graceful_exit = self.is_valid_query();
        true
    }
}

/// Candidate completions: dotted paths for object keys, `[i]` for array
/// indices, sorted for a stable cycle order.
fn extract_paths(data: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    walk(data, "", &mut paths);
    paths.sort_unstable();
    paths.dedup();
    paths
}

fn walk(data: &Value, prefix: &str, paths: &mut Vec<String>) {
    match data {
        Value::Object(obj) => {
            for (key, value) in obj {
                let path = format!("{prefix}.{key}");
                paths.push(path.clone());
                walk(value, &path, paths);
            }
        }
        Value::Array(arr) => {
            for (i, value) in arr.iter().enumerate() {
                let path = format!("{prefix}[{i}]");
                paths.push(path.clone());
                walk(value, &path, paths);
            }
        }
        _ => {}
    }
}
