//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::format::TraceFormat;
use std::fmt;
use std::io;
use thiserror::Error;

/// Where in the source a record-level failure was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Byte offset into the decompressed binary stream
    ByteOffset(u64),
    /// 1-based line number in an NDJSON stream
    Line(u64),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::ByteOffset(offset) => write!(f, "byte offset {}", offset),
            Position::Line(line) => write!(f, "line {}", line),
        }
    }
}

/// Errors raised while decoding or encoding trace records
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("IOError: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("DecompressionError: {0}")]
    Decompression(#[source] io::Error),

    #[error("CorruptTraceError at byte offset {offset}: {reason}")]
    CorruptTrace { offset: u64, reason: String },

    #[error("UnknownRecordTypeError at {position}: {kind}")]
    UnknownRecordType { position: Position, kind: String },

    #[error("SchemaError on line {line}: field `{field}` {reason}")]
    Schema {
        line: u64,
        field: String,
        reason: String,
    },
}

impl TraceError {
    /// Wrap an I/O error with a short description of what was being done
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        TraceError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn schema(line: u64, field: impl Into<String>, reason: impl Into<String>) -> Self {
        TraceError::Schema {
            line,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while resolving input/output formats
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormatError {
    #[error("Unsupported compression suffix: {0} (only .gz is supported)")]
    UnsupportedCompression(String),

    #[error("{0} is an output-only format and cannot be used as a source")]
    OutputOnly(TraceFormat),
}

/// Errors that can occur while preparing an output file
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] io::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
