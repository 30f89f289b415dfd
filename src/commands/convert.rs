//! Convert command implementation.
//!
//! The convert command:
//! 1. Resolves the source and target representations
//! 2. Opens the source reader (sniffing content when needed)
//! 3. Opens the target encoder
//! 4. Streams records through, honouring the limit
//! 5. Finishes the encoder, also when the stream was aborted

use super::models::{ConvertArgs, ConvertSummary, Endpoint};
use crate::binary::BinaryReader;
use crate::encoder::{encoder_for, RecordEncoder};
use crate::format::{ensure_readable, parse_path, sniff_format, Compression, TraceFormat};
use crate::ndjson::NdjsonReader;
use crate::record::Record;
use crate::stream::{create_sink, open_source, SinkStream, SourceStream};
use crate::utils::error::{FormatError, TraceError};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Lazy record sequence produced by any source reader
type RecordStream = Box<dyn Iterator<Item = Result<Record, TraceError>>>;

/// Execute the convert command
///
/// **Public** - main entry point called from main.rs
///
/// Arguments are expected to have passed [`validate_args`] already.
///
/// # Arguments
/// * `args` - Convert command arguments
///
/// # Returns
/// The number of records written and the resolved endpoints
///
/// # Errors
/// * Format resolution failures (`FormatError`)
/// * Decode, encode and I/O failures (`TraceError`); output written before
///   the failure stays on disk
pub fn convert(args: &ConvertArgs) -> Result<ConvertSummary> {
    let start_time = Instant::now();

    // Check both paths before touching either file
    let source_hint = parse_path(&args.input, args.case_insensitive_ext)
        .with_context(|| format!("Cannot read from {}", args.input.display()))?;
    let target_hint = match &args.output {
        Some(path) => Some(
            parse_path(path, args.case_insensitive_ext)
                .with_context(|| format!("Cannot write to {}", path.display()))?,
        ),
        None => None,
    };

    if let Some(format) = args.from.or(source_hint.format) {
        ensure_readable(format)?;
    }

    let mut source_stream = open_source(&args.input)?;
    let source_format = match args.from.or(source_hint.format) {
        Some(format) => format,
        None => {
            let sniffed = sniff_format(source_stream.peek()?);
            debug!("No format in file name, content looks like {}", sniffed);
            sniffed
        }
    };

    let source = Endpoint {
        path: Some(args.input.clone()),
        format: source_format,
        compression: source_stream.compression(),
    };

    let target_format = args
        .to
        .or_else(|| target_hint.and_then(|hint| hint.format))
        .unwrap_or_else(|| source_format.default_target());
    let target = Endpoint {
        path: args.output.clone(),
        format: target_format,
        compression: target_hint.map_or(Compression::None, |hint| hint.compression),
    };

    info!("Converting {} -> {}", source, target);

    let records = record_stream(source_format, source_stream)?;
    let sink = match &target.path {
        Some(path) => create_sink(path, target.compression)
            .with_context(|| format!("Failed to open output {}", path.display()))?,
        None => SinkStream::stdout(),
    };
    let mut encoder = encoder_for(target.format, sink)?;

    let writing = encoder.format();
    let mut emitted = 0u64;
    let outcome = pump(records, encoder.as_mut(), args.limit, &mut emitted);
    let finished = finish(encoder);

    outcome.with_context(|| {
        format!("Conversion to {} aborted after {} records", writing, emitted)
    })?;
    finished.context("Failed to finalize output")?;

    info!(
        "records emitted={} ({} -> {}) in {:.2}s",
        emitted,
        source.format,
        target.format,
        start_time.elapsed().as_secs_f64()
    );

    Ok(ConvertSummary {
        records: emitted,
        source,
        target,
    })
}

/// Build the reader for a resolved source format
///
/// **Private** - internal helper for convert
fn record_stream(format: TraceFormat, source: SourceStream) -> Result<RecordStream, FormatError> {
    match format {
        TraceFormat::Binary => Ok(Box::new(BinaryReader::new(source))),
        TraceFormat::Ndjson => Ok(Box::new(NdjsonReader::new(source))),
        TraceFormat::Text | TraceFormat::Asm => Err(FormatError::OutputOnly(format)),
    }
}

/// Move records from the reader into the encoder
///
/// **Private** - stops at the first error or once `limit` records are written.
/// The reader is not polled again after the limit is reached.
fn pump(
    mut records: RecordStream,
    encoder: &mut dyn RecordEncoder<SinkStream>,
    limit: Option<u64>,
    emitted: &mut u64,
) -> Result<(), TraceError> {
    while limit.map_or(true, |max| *emitted < max) {
        let record = match records.next() {
            Some(record) => record?,
            None => break,
        };
        encoder.encode(&record)?;
        *emitted += 1;
    }
    Ok(())
}

/// Flush the encoder and close the sink (gzip trailer included)
///
/// **Private** - internal helper for convert
fn finish(encoder: Box<dyn RecordEncoder<SinkStream>>) -> Result<(), TraceError> {
    encoder
        .into_inner()?
        .finish()
        .map_err(|e| TraceError::io("finish output", e))
}

/// Validate convert arguments
///
/// **Public** - can be called before convert for early validation
///
/// # Arguments
/// * `args` - Arguments to validate
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &ConvertArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if let Some(output) = &args.output {
        if output.as_os_str().is_empty() {
            anyhow::bail!("Output path cannot be empty");
        }
        if same_file(&args.input, output) {
            anyhow::bail!(
                "Output {} would overwrite the input",
                output.display()
            );
        }
    }

    if let Some(from) = args.from {
        ensure_readable(from)?;
    }

    Ok(())
}

/// Whether two paths name the same file, when that can be decided
///
/// **Private** - internal helper for validate_args
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Convert one file into another, inferring everything from the paths
///
/// **Public** - simplified API for common use case; validates, then converts
pub fn convert_file(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Result<ConvertSummary> {
    let args = ConvertArgs {
        input: input.into(),
        output: Some(output.into()),
        ..Default::default()
    };

    validate_args(&args)?;
    convert(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_valid() {
        let args = ConvertArgs {
            input: PathBuf::from("trace.cbp.gz"),
            output: Some(PathBuf::from("trace.jsonl.gz")),
            ..Default::default()
        };

        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_empty_input() {
        let args = ConvertArgs::default();
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_empty_output() {
        let args = ConvertArgs {
            input: PathBuf::from("trace.cbp.gz"),
            output: Some(PathBuf::new()),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_output_overwrites_input() {
        let args = ConvertArgs {
            input: PathBuf::from("trace.jsonl"),
            output: Some(PathBuf::from("trace.jsonl")),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_output_only_source() {
        let args = ConvertArgs {
            input: PathBuf::from("trace.bin"),
            from: Some(TraceFormat::Text),
            ..Default::default()
        };

        let err = validate_args(&args).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FormatError>(),
            Some(&FormatError::OutputOnly(TraceFormat::Text))
        );
    }

    #[test]
    fn test_convert_file_refuses_to_overwrite_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.jsonl");
        let line = r#"{"pc":"0x40","type":"uncondDirBrOp","target":"0x80"}"#;
        std::fs::write(&path, line).unwrap();

        let err = convert_file(&path, &path).unwrap_err();
        assert!(err.to_string().contains("would overwrite the input"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), line);
    }

    #[test]
    fn test_limit_stops_before_polling_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let polled = std::rc::Rc::new(std::cell::Cell::new(0u32));
        let counter = polled.clone();
        let records: RecordStream = Box::new(std::iter::from_fn(move || {
            counter.set(counter.get() + 1);
            Some(Ok(Record::UncondDirBrOp { pc: 0, target: 4 }))
        }));

        let sink = create_sink(&path, Compression::None).unwrap();
        let mut encoder = encoder_for(TraceFormat::Text, sink).unwrap();
        let mut emitted = 0;
        pump(records, encoder.as_mut(), Some(3), &mut emitted).unwrap();
        finish(encoder).unwrap();

        assert_eq!(emitted, 3);
        assert_eq!(polled.get(), 3);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
    }
}
