//! qq CLI entry point: flag surface, mode selection, logging setup.

use clap::{CommandFactory, FromArgMatches, Parser};
use clap::parser::ValueSource;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod runner;

/// qq is an interoperable configuration format transcoder with jq querying.
/// It can be used as a drop-in jq replacement or as a REPL with
/// autocomplete and a live rendering preview for building queries.
#[derive(Debug, Parser)]
#[command(
    name = "qq",
    disable_version_flag = true,
    after_help = runner::supported_formats_help(),
    override_usage = "qq [expression] [file] [flags]\n  cat [file] | qq [expression] [flags]\n  qq -I file"
)]
struct Cli {
    /// jq expression to evaluate (defaults to '.')
    expression: Option<String>,

    /// Input file (reads from stdin if omitted)
    file: Option<PathBuf>,

    /// Input format; only needed when parsing stdin, otherwise inferred
    /// from the file extension
    #[arg(short, long, default_value = "json")]
    input: String,

    /// Output format
    #[arg(short, long, default_value = "json")]
    output: String,

    /// Output strings without escapes and quotes
    #[arg(short = 'r', long)]
    raw_output: bool,

    /// Disable colored output
    #[arg(short = 'M', long)]
    monochrome_output: bool,

    /// Interactive mode with autocomplete and live preview
    #[arg(short = 'I', long)]
    interactive: bool,

    /// Parse input incrementally, emitting path-value pairs
    /// (streaming parsers: json, jsonl, yaml, csv, tsv, line)
    #[arg(long)]
    stream: bool,

    /// Read all inputs into an array and use it as the single input value
    #[arg(short = 's', long)]
    slurp: bool,

    /// Set the exit status code based on the last output value
    #[arg(short = 'e', long)]
    exit_status: bool,

    /// Print version information and exit
    #[arg(short = 'v', long)]
    version: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("QQ_LOG").unwrap_or_else(|_| EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Cli::command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    if cli.version {
        println!("qq version v{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    let input_flag_set = matches.value_source("input") == Some(ValueSource::CommandLine);
    let output_flag_set = matches.value_source("output") == Some(ValueSource::CommandLine);

    // bare invocation on a terminal gets the help text, not a hang on stdin
    if cli.expression.is_none()
        && cli.file.is_none()
        && !input_flag_set
        && !output_flag_set
        && !cli.interactive
        && !cli.stream
        && atty::is(atty::Stream::Stdin)
    {
        Cli::command().print_help().ok();
        std::process::exit(0);
    }

    std::process::exit(runner::run(cli, input_flag_set));
}
