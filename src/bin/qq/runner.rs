//! Driver: mode selection, input and format resolution, jq evaluation,
//! slurp, streaming, and the exit-status policy.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use qq::codec::{self, Encoding};
use qq::error::{QqError, Result};
use qq::value::Value;
use qq::{pretty, query, stream, tui};

use super::Cli;

/// Exit codes matching jq behavior.
mod exit_codes {
    pub const SUCCESS: i32 = 0;
    /// With -e, last output was false or null; also any evaluation error.
    pub const FAILURE: i32 = 1;
    /// Flag misuse.
    pub const USAGE: i32 = 2;
    /// With -e, no output was produced at all.
    pub const NO_OUTPUT: i32 = 4;
}

/// Formats listing appended to `--help`.
pub fn supported_formats_help() -> String {
    format!(
        "Supported formats: {}",
        codec::supported_extensions().join(", ")
    )
}

/// Execute the selected mode; returns the process exit code.
pub fn run(cli: Cli, input_flag_set: bool) -> i32 {
    if let Some(message) = flag_conflict(&cli) {
        eprintln!("Error: {message}");
        return exit_codes::USAGE;
    }

    match dispatch(cli, input_flag_set) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    }
}

fn flag_conflict(cli: &Cli) -> Option<&'static str> {
    if cli.stream && cli.interactive {
        return Some("--stream and --interactive flags cannot be used together");
    }
    if cli.slurp && cli.stream {
        return Some("--slurp and --stream flags cannot be used together");
    }
    if cli.slurp && cli.interactive {
        return Some("--slurp and --interactive flags cannot be used together");
    }
    None
}

fn dispatch(cli: Cli, input_flag_set: bool) -> Result<i32> {
    // one positional that names an existing file is the input, not the query
    let (expression, filename) = match (cli.expression.as_deref(), cli.file.as_deref()) {
        (None, _) => (".".to_string(), None),
        (Some(first), None) => {
            if Path::new(first).is_file() {
                (".".to_string(), Some(first.to_string()))
            } else {
                (first.to_string(), None)
            }
        }
        (Some(expr), Some(file)) => (expr.to_string(), Some(file.to_string_lossy().into_owned())),
    };

    let input_format = resolve_input_format(&cli.input, filename.as_deref(), input_flag_set)?;
    let output_format = Encoding::from_name(&cli.output)?;
    debug!(?input_format, ?output_format, expression, "resolved invocation");

    let emit = EmitConfig {
        output: output_format,
        raw: cli.raw_output,
        monochrome: cli.monochrome_output,
    };

    if cli.stream {
        return run_streaming(&expression, filename.as_deref(), input_format, &emit);
    }

    let input = read_input(filename.as_deref())?;

    let data = if cli.slurp {
        slurp(&input, input_format)?
    } else {
        codec::decode(&input, input_format)?
    };
    debug!(kind = data.type_name(), "decoded input");

    if cli.interactive {
        return run_interactive(&data);
    }

    let parsed = query::parse(&expression)?;
    let mut stats = EmitStats::default();
    parsed.run(&data, |value| emit.emit(&value, &mut stats))?;
    debug!(results = stats.count, "query finished");

    Ok(exit_status(cli.exit_status, &stats))
}

fn resolve_input_format(
    flag: &str,
    filename: Option<&str>,
    input_flag_set: bool,
) -> Result<Encoding> {
    // an explicit -i beats the file extension
    if input_flag_set {
        return Encoding::from_name(flag);
    }
    if let Some(name) = filename {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if let Some(encoding) = codec::extension_map().get(ext.as_str()) {
            return Ok(*encoding);
        }
    }
    Encoding::from_name(flag)
}

fn read_input(filename: Option<&str>) -> Result<Vec<u8>> {
    let mut input = Vec::new();
    match filename {
        Some(name) => {
            File::open(name)?.read_to_end(&mut input)?;
        }
        None => {
            std::io::stdin().read_to_end(&mut input)?;
        }
    }
    Ok(input)
}

/// Combine all inputs into a single array before querying.
///
/// JSON decodes as a sequence of whitespace-separated values; formats that
/// already produce arrays pass through; everything else wraps its single
/// value.
fn slurp(input: &[u8], encoding: Encoding) -> Result<Value> {
    match encoding {
        Encoding::Json => {
            let mut values = Vec::new();
            for item in serde_json::Deserializer::from_slice(input).into_iter::<Value>() {
                values.push(item.map_err(|e| QqError::Decode(e.to_string()))?);
            }
            Ok(Value::Array(values))
        }
        Encoding::Jsonl | Encoding::Yaml | Encoding::Line => {
            match codec::decode(input, encoding)? {
                Value::Array(values) => Ok(Value::Array(values)),
                single => Ok(Value::Array(vec![single])),
            }
        }
        other => Ok(Value::Array(vec![codec::decode(input, other)?])),
    }
}

struct EmitConfig {
    output: Encoding,
    raw: bool,
    monochrome: bool,
}

#[derive(Default)]
struct EmitStats {
    count: usize,
    last_falsy: bool,
}

impl EmitConfig {
    fn emit(&self, value: &Value, stats: &mut EmitStats) -> Result<()> {
        let bytes = codec::encode(value, self.output)?;
        if self.output.is_binary() {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        } else {
            let text = String::from_utf8_lossy(&bytes);
            let formatted = pretty::format(&text, self.output, self.raw, self.monochrome)?;
            // one trailing newline per record regardless of the encoder
            println!("{}", formatted.trim_end_matches('\n'));
        }
        stats.count += 1;
        stats.last_falsy = !value.is_truthy();
        Ok(())
    }
}

fn exit_status(enabled: bool, stats: &EmitStats) -> i32 {
    if !enabled {
        return exit_codes::SUCCESS;
    }
    if stats.count == 0 {
        return exit_codes::NO_OUTPUT;
    }
    if stats.last_falsy {
        return exit_codes::FAILURE;
    }
    exit_codes::SUCCESS
}

/// Feed each path-value event through the query, emitting results as they
/// arrive; the producer thread stalls on its bounded buffer when the query
/// side is slow.
fn run_streaming(
    expression: &str,
    filename: Option<&str>,
    input_format: Encoding,
    emit: &EmitConfig,
) -> Result<i32> {
    let parsed = query::parse(expression)?;
    let mut stats = EmitStats::default();

    let handle = match filename {
        Some(name) => stream::stream(File::open(name)?, input_format),
        None => stream::stream(std::io::stdin(), input_format),
    };

    for event in handle.events.iter() {
        parsed.run(&event, |value| emit.emit(&value, &mut stats))?;
    }
    // the event channel closed; a pending error is terminal
    if let Ok(err) = handle.errors.try_recv() {
        return Err(err);
    }
    debug!(results = stats.count, "stream finished");

    Ok(exit_codes::SUCCESS)
}

fn run_interactive(data: &Value) -> Result<i32> {
    let json = codec::encode(data, Encoding::Json)?;
    let text = String::from_utf8_lossy(&json);

    match tui::interact(&text)? {
        Some(output) => {
            let formatted = pretty::format(&output, Encoding::Json, false, false)
                .unwrap_or(output);
            println!("{formatted}");
        }
        None => println!("Exited without executing query"),
    }
    Ok(exit_codes::SUCCESS)
}
