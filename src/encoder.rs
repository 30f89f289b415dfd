//! Common interface of the record encoders.
//!
//! Every target representation (binary, NDJSON, text, assembly) implements
//! [`RecordEncoder`] so the conversion pipeline can drive any of them the
//! same way. Encoders own their output writer and hand it back from
//! [`RecordEncoder::into_inner`] once everything has been flushed.

use crate::asm::AsmEncoder;
use crate::binary::BinaryWriter;
use crate::format::TraceFormat;
use crate::ndjson::NdjsonWriter;
use crate::record::Record;
use crate::text::TextEncoder;
use crate::utils::error::TraceError;
use std::io::Write;

/// Common trait for encoders of trace records
pub trait RecordEncoder<W: Write> {
    /// Encode one record onto the output
    fn encode(&mut self, record: &Record) -> Result<(), TraceError>;

    /// Flush any buffered bytes and return the underlying writer
    fn into_inner(self: Box<Self>) -> Result<W, TraceError>;

    /// Representation produced by this encoder
    fn format(&self) -> TraceFormat;
}

/// Build the encoder for `format` on top of `output`
///
/// **Public** - used by the conversion pipeline
///
/// # Errors
/// * `TraceError::Io` - a header (assembly listing) could not be written
pub fn encoder_for<W: Write + 'static>(
    format: TraceFormat,
    output: W,
) -> Result<Box<dyn RecordEncoder<W>>, TraceError> {
    let encoder: Box<dyn RecordEncoder<W>> = match format {
        TraceFormat::Binary => Box::new(BinaryWriter::new(output)),
        TraceFormat::Ndjson => Box::new(NdjsonWriter::new(output)),
        TraceFormat::Text => Box::new(TextEncoder::new(output)),
        TraceFormat::Asm => Box::new(AsmEncoder::new(output)?),
    };
    Ok(encoder)
}

/// Wrap a write failure with the encoder's format name
pub(crate) fn write_error(format: TraceFormat, source: std::io::Error) -> TraceError {
    TraceError::io(format!("write {} output", format), source)
}
