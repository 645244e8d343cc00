//! Streaming path-value decomposer.
//!
//! Walks input incrementally and emits events matching jq's `--stream`
//! output: `[path, value]` for every scalar leaf and a closing marker
//! `[path]` after the last child of every non-empty array or object, where
//! `path` is the path of that last child. Empty composites emit nothing.
//!
//! Events are produced on a background thread and drained through a
//! bounded channel, so the producer gets backpressure when the query side
//! is slow. Errors travel on a separate single-slot channel and are
//! terminal; after the event channel closes the consumer must drain a
//! pending error before concluding success.

use std::io::{BufRead, BufReader, Read};
use std::sync::mpsc::{Receiver, SyncSender};
use std::thread;

use crate::codec::{self, Encoding};
use crate::error::QqError;
use crate::value::{infer_scalar, Value};

/// Bounded event buffer between producer and consumer.
const EVENT_BUFFER: usize = 100;

/// Receiving side of a running decomposition.
pub struct StreamHandle {
    pub events: Receiver<Value>,
    pub errors: Receiver<QqError>,
}

/// Why the producer stopped early.
enum Stop {
    /// Consumer dropped the receiver; not an error.
    Disconnected,
    Failed(QqError),
}

type ProducerResult = Result<(), Stop>;

impl From<QqError> for Stop {
    fn from(e: QqError) -> Self {
        Stop::Failed(e)
    }
}

/// Start decomposing `reader` as `encoding` on a producer thread.
///
/// Formats without an incremental parser are decoded in full and then
/// decomposed.
pub fn stream<R: Read + Send + 'static>(reader: R, encoding: Encoding) -> StreamHandle {
    let (event_tx, event_rx) = std::sync::mpsc::sync_channel(EVENT_BUFFER);
    let (error_tx, error_rx) = std::sync::mpsc::sync_channel(1);

    thread::spawn(move || {
        let result = produce(reader, encoding, &event_tx);
        if let Err(Stop::Failed(e)) = result {
            let _ = error_tx.send(e);
        }
        // both channels close when the thread exits
    });

    StreamHandle {
        events: event_rx,
        errors: error_rx,
    }
}

/// Drain a full stream into memory. Used by tests and small inputs.
pub fn collect<R: Read + Send + 'static>(
    reader: R,
    encoding: Encoding,
) -> Result<Vec<Value>, QqError> {
    let handle = stream(reader, encoding);
    let events: Vec<Value> = handle.events.iter().collect();
    match handle.errors.try_recv() {
        Ok(err) => Err(err),
        Err(_) => Ok(events),
    }
}

fn produce<R: Read>(reader: R, encoding: Encoding, tx: &SyncSender<Value>) -> ProducerResult {
    let mut reader = BufReader::new(reader);
    match encoding {
        Encoding::Json => JsonTokenizer::new(reader).stream_value(&mut Vec::new(), tx),
        Encoding::Jsonl => stream_jsonl(reader, tx),
        Encoding::Yaml => stream_yaml(reader, tx),
        Encoding::Line => stream_lines(reader, tx),
        Encoding::Csv => stream_dsv(reader, b',', tx),
        Encoding::Tsv => stream_dsv(reader, b'\t', tx),
        other => {
            let mut input = Vec::new();
            reader
                .read_to_end(&mut input)
                .map_err(|e| Stop::Failed(e.into()))?;
            let value = codec::decode(&input, other)?;
            decompose(&value, &mut Vec::new(), tx)
        }
    }
}

fn send(tx: &SyncSender<Value>, event: Value) -> ProducerResult {
    tx.send(event).map_err(|_| Stop::Disconnected)
}

fn leaf_event(path: &[Value], value: Value) -> Value {
    Value::Array(vec![Value::Array(path.to_vec()), value])
}

fn close_event(path: &[Value]) -> Value {
    Value::Array(vec![Value::Array(path.to_vec())])
}

/// Emit the event stream for an already-materialized value.
fn decompose(value: &Value, path: &mut Vec<Value>, tx: &SyncSender<Value>) -> ProducerResult {
    match value {
        Value::Object(obj) if !obj.is_empty() => {
            let mut last_key = None;
            for (key, val) in obj {
                path.push(Value::String(key.clone()));
                decompose(val, path, tx)?;
                path.pop();
                last_key = Some(key);
            }
            path.push(Value::String(last_key.expect("non-empty object").clone()));
            send(tx, close_event(path))?;
            path.pop();
            Ok(())
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (i, val) in arr.iter().enumerate() {
                path.push(Value::Int(i as i64));
                decompose(val, path, tx)?;
                path.pop();
            }
            path.push(Value::Int(arr.len() as i64 - 1));
            send(tx, close_event(path))?;
            path.pop();
            Ok(())
        }
        // empty composites emit no events
        Value::Object(_) | Value::Array(_) => Ok(()),
        leaf => send(tx, leaf_event(path, leaf.clone())),
    }
}

fn stream_jsonl<R: BufRead>(reader: R, tx: &SyncSender<Value>) -> ProducerResult {
    let mut index: i64 = 0;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Stop::Failed(e.into()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| {
            Stop::Failed(QqError::Decode(format!(
                "error parsing JSON on line {}: {}",
                lineno + 1,
                e
            )))
        })?;
        let mut path = vec![Value::Int(index)];
        decompose(&value, &mut path, tx)?;
        index += 1;
    }
    Ok(())
}

fn stream_yaml<R: BufRead>(reader: R, tx: &SyncSender<Value>) -> ProducerResult {
    let mut doc = String::new();
    let mut doc_index: i64 = 0;

    let mut flush = |doc: &mut String, doc_index: &mut i64| -> ProducerResult {
        if doc.trim().is_empty() {
            doc.clear();
            return Ok(());
        }
        let value = codec::decode(doc.as_bytes(), Encoding::Yaml).map_err(|e| {
            Stop::Failed(QqError::Decode(format!(
                "error parsing YAML document {}: {}",
                doc_index, e
            )))
        })?;
        doc.clear();
        let mut path = vec![Value::Int(*doc_index)];
        *doc_index += 1;
        decompose(&value, &mut path, tx)
    };

    for line in reader.lines() {
        let line = line.map_err(|e| Stop::Failed(e.into()))?;
        if line.trim() == "---" {
            flush(&mut doc, &mut doc_index)?;
            continue;
        }
        doc.push_str(&line);
        doc.push('\n');
    }
    flush(&mut doc, &mut doc_index)
}

fn stream_lines<R: BufRead>(reader: R, tx: &SyncSender<Value>) -> ProducerResult {
    let mut count: i64 = 0;
    for line in reader.lines() {
        let line = line.map_err(|e| Stop::Failed(e.into()))?;
        send(
            tx,
            leaf_event(&[Value::Int(count)], Value::String(line)),
        )?;
        count += 1;
    }
    if count > 0 {
        send(tx, close_event(&[Value::Int(count - 1)]))?;
    }
    Ok(())
}

fn stream_dsv<R: Read>(reader: R, delimiter: u8, tx: &SyncSender<Value>) -> ProducerResult {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| Stop::Failed(QqError::Decode(format!("error reading headers: {e}"))))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut row_index: i64 = 0;
    for record in csv_reader.records() {
        let record = record
            .map_err(|e| Stop::Failed(QqError::Decode(format!("error reading record: {e}"))))?;
        let mut row = indexmap::IndexMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            row.insert(header.clone(), infer_scalar(record.get(i).unwrap_or("")));
        }
        let mut path = vec![Value::Int(row_index)];
        decompose(&Value::Object(row), &mut path, tx)?;
        row_index += 1;
    }
    Ok(())
}

/// Incremental JSON tokenizer: recursive descent over buffered bytes,
/// emitting events as containers are walked instead of materializing the
/// document.
struct JsonTokenizer<R: BufRead> {
    reader: R,
    peeked: Option<u8>,
}

impl<R: BufRead> JsonTokenizer<R> {
    fn new(reader: R) -> Self {
        JsonTokenizer {
            reader,
            peeked: None,
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>, Stop> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        match self.reader.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) => Err(Stop::Failed(e.into())),
        }
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, Stop> {
        if self.peeked.is_none() {
            self.peeked = self.next_byte()?;
        }
        Ok(self.peeked)
    }

    fn skip_whitespace(&mut self) -> Result<(), Stop> {
        while let Some(b) = self.peek_byte()? {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.peeked = None;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn fail(&self, msg: impl Into<String>) -> Stop {
        Stop::Failed(QqError::Decode(msg.into()))
    }

    fn expect(&mut self, expected: u8) -> Result<(), Stop> {
        self.skip_whitespace()?;
        match self.next_byte()? {
            Some(b) if b == expected => Ok(()),
            Some(b) => Err(self.fail(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            ))),
            None => Err(self.fail("unexpected end of input")),
        }
    }

    /// Parse one JSON value, emitting its event stream under `path`.
    fn stream_value(
        mut self,
        path: &mut Vec<Value>,
        tx: &SyncSender<Value>,
    ) -> ProducerResult {
        self.parse_value(path, tx)
    }

    fn parse_value(&mut self, path: &mut Vec<Value>, tx: &SyncSender<Value>) -> ProducerResult {
        self.skip_whitespace()?;
        match self.peek_byte()? {
            Some(b'{') => self.parse_object(path, tx),
            Some(b'[') => self.parse_array(path, tx),
            _ => {
                let scalar = self.parse_scalar()?;
                send(tx, leaf_event(path, scalar))
            }
        }
    }

    fn parse_object(&mut self, path: &mut Vec<Value>, tx: &SyncSender<Value>) -> ProducerResult {
        self.expect(b'{')?;
        self.skip_whitespace()?;
        if self.peek_byte()? == Some(b'}') {
            self.peeked = None;
            return Ok(());
        }

        let mut last_key;
        loop {
            self.skip_whitespace()?;
            let key = match self.parse_scalar()? {
                Value::String(s) => s,
                other => return Err(self.fail(format!("expected string key, got {}", other.type_name()))),
            };
            self.expect(b':')?;
            path.push(Value::String(key.clone()));
            self.parse_value(path, tx)?;
            path.pop();
            last_key = key;

            self.skip_whitespace()?;
            match self.next_byte()? {
                Some(b',') => continue,
                Some(b'}') => break,
                Some(b) => return Err(self.fail(format!("expected ',' or '}}', found '{}'", b as char))),
                None => return Err(self.fail("unexpected end of input in object")),
            }
        }

        path.push(Value::String(last_key));
        send(tx, close_event(path))?;
        path.pop();
        Ok(())
    }

    fn parse_array(&mut self, path: &mut Vec<Value>, tx: &SyncSender<Value>) -> ProducerResult {
        self.expect(b'[')?;
        self.skip_whitespace()?;
        if self.peek_byte()? == Some(b']') {
            self.peeked = None;
            return Ok(());
        }

        let mut index: i64 = 0;
        loop {
            path.push(Value::Int(index));
            self.parse_value(path, tx)?;
            path.pop();

            self.skip_whitespace()?;
            match self.next_byte()? {
                Some(b',') => index += 1,
                Some(b']') => break,
                Some(b) => return Err(self.fail(format!("expected ',' or ']', found '{}'", b as char))),
                None => return Err(self.fail("unexpected end of input in array")),
            }
        }

        path.push(Value::Int(index));
        send(tx, close_event(path))?;
        path.pop();
        Ok(())
    }

    fn parse_scalar(&mut self) -> Result<Value, Stop> {
        self.skip_whitespace()?;
        match self.peek_byte()? {
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b't') => self.parse_literal("true", Value::Bool(true)),
            Some(b'f') => self.parse_literal("false", Value::Bool(false)),
            Some(b'n') => self.parse_literal("null", Value::Null),
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            Some(b) => Err(self.fail(format!("unexpected character '{}'", b as char))),
            None => Err(self.fail("unexpected end of input")),
        }
    }

    fn parse_literal(&mut self, literal: &str, value: Value) -> Result<Value, Stop> {
        for expected in literal.bytes() {
            match self.next_byte()? {
                Some(b) if b == expected => {}
                _ => return Err(self.fail(format!("invalid literal, expected '{literal}'"))),
            }
        }
        Ok(value)
    }

    /// Numbers are tokenized in full, then converted: integral values to
    /// Int, everything else to Float.
    fn parse_number(&mut self) -> Result<Value, Stop> {
        let mut token = String::new();
        while let Some(b) = self.peek_byte()? {
            if matches!(b, b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9') {
                token.push(b as char);
                self.peeked = None;
            } else {
                break;
            }
        }
        if let Ok(n) = token.parse::<i64>() {
            return Ok(Value::Int(n));
        }
        token
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| self.fail(format!("invalid number '{token}'")))
    }

    fn parse_string(&mut self) -> Result<String, Stop> {
        self.expect(b'"')?;
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            match self.next_byte()? {
                None => return Err(self.fail("unterminated string")),
                Some(b'"') => break,
                Some(b'\\') => match self.next_byte()? {
                    Some(b'"') => bytes.push(b'"'),
                    Some(b'\\') => bytes.push(b'\\'),
                    Some(b'/') => bytes.push(b'/'),
                    Some(b'b') => bytes.push(0x08),
                    Some(b'f') => bytes.push(0x0c),
                    Some(b'n') => bytes.push(b'\n'),
                    Some(b'r') => bytes.push(b'\r'),
                    Some(b't') => bytes.push(b'\t'),
                    Some(b'u') => {
                        let ch = self.parse_unicode_escape()?;
                        let mut buf = [0u8; 4];
                        bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    }
                    _ => return Err(self.fail("invalid escape sequence")),
                },
                Some(b) => bytes.push(b),
            }
        }
        String::from_utf8(bytes).map_err(|_| self.fail("invalid UTF-8 in string"))
    }

    fn parse_unicode_escape(&mut self) -> Result<char, Stop> {
        let first = self.parse_hex4()?;
        // surrogate pairs
        if (0xd800..0xdc00).contains(&first) {
            if self.next_byte()? != Some(b'\\') || self.next_byte()? != Some(b'u') {
                return Err(self.fail("unpaired surrogate in string"));
            }
            let second = self.parse_hex4()?;
            if !(0xdc00..0xe000).contains(&second) {
                return Err(self.fail("invalid low surrogate in string"));
            }
            let code = 0x10000 + ((first - 0xd800) << 10) + (second - 0xdc00);
            return char::from_u32(code).ok_or_else(|| self.fail("invalid surrogate pair"));
        }
        char::from_u32(first).ok_or_else(|| self.fail("invalid unicode escape"))
    }

    fn parse_hex4(&mut self) -> Result<u32, Stop> {
        let mut code: u32 = 0;
        for _ in 0..4 {
            let b = self
                .next_byte()?
                .ok_or_else(|| self.fail("unexpected end of unicode escape"))?;
            let digit = (b as char)
                .to_digit(16)
                .ok_or_else(|| self.fail("invalid hex digit in unicode escape"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }
}
