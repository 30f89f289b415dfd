//! trace2json CLI
//!
//! Converts instruction traces between the binary, NDJSON, text and
//! assembly representations.

use anyhow::Result;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use env_logger::Env;
use log::debug;
use std::path::PathBuf;

use trace2json::commands::{convert, validate_args, ConvertArgs};
use trace2json::format::TraceFormat;
use trace2json::utils::config::CASE_SENSITIVE_EXT_ENV;

/// trace2json - streaming converter for instruction traces
#[derive(Parser, Debug)]
#[command(name = "trace2json")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source trace (.cbp[.gz], .jsonl[.gz], .ndjson, .json, or sniffed)
    #[arg(long = "in", value_name = "INPUT")]
    input: PathBuf,

    /// Destination (.cbp[.gz], .jsonl[.gz], .txt, .asm); stdout if omitted
    #[arg(long = "out", value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Stop after this many records
    #[arg(long, value_name = "N")]
    limit: Option<u64>,

    /// Source format, overrides the input file extension
    #[arg(long, value_enum)]
    from: Option<TraceFormat>,

    /// Target format, overrides the output file extension
    #[arg(long, value_enum)]
    to: Option<TraceFormat>,

    /// Match file extensions case-sensitively
    #[arg(
        long,
        env = CASE_SENSITIVE_EXT_ENV,
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    case_sensitive_ext: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let args = ConvertArgs {
        input: cli.input,
        output: cli.output,
        limit: cli.limit,
        from: cli.from,
        to: cli.to,
        case_insensitive_ext: !cli.case_sensitive_ext,
    };

    // Validate args first
    validate_args(&args)?;

    let summary = convert(&args)?;
    debug!(
        "Wrote {} records to {}",
        summary.records, summary.target
    );

    Ok(())
}
