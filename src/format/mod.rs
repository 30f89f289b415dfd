//! Format and compression resolution for source and target paths.
//!
//! The representation of each side is decided, in order of precedence, by:
//! 1. An explicit `--from` / `--to` selection
//! 2. The file extension (`name.<base>[.<compression>]`)
//! 3. Content sniffing (sources) or the default route (targets)

use crate::utils::config::{
    ASM_EXTENSIONS, BINARY_EXTENSIONS, GZIP_EXTENSIONS, NDJSON_EXTENSIONS, TEXT_EXTENSIONS,
    UNSUPPORTED_COMPRESSION_EXTENSIONS,
};
use crate::utils::error::FormatError;
use clap::ValueEnum;
use std::fmt;
use std::path::Path;

/// Record representation on one side of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum TraceFormat {
    /// Binary frame stream
    #[value(alias = "cbp")]
    Binary,
    /// One JSON object per line
    #[value(alias = "jsonl")]
    Ndjson,
    /// Human-readable dump (output only)
    #[value(alias = "txt")]
    Text,
    /// Assembly listing (output only)
    Asm,
}

impl TraceFormat {
    pub fn name(self) -> &'static str {
        match self {
            TraceFormat::Binary => "binary",
            TraceFormat::Ndjson => "ndjson",
            TraceFormat::Text => "text",
            TraceFormat::Asm => "asm",
        }
    }

    /// Whether records can be decoded from this representation
    pub fn is_readable(self) -> bool {
        match self {
            TraceFormat::Binary | TraceFormat::Ndjson => true,
            TraceFormat::Text | TraceFormat::Asm => false,
        }
    }

    /// Target used when the output path does not say otherwise
    pub fn default_target(self) -> TraceFormat {
        match self {
            TraceFormat::Ndjson => TraceFormat::Text,
            TraceFormat::Binary | TraceFormat::Text | TraceFormat::Asm => TraceFormat::Ndjson,
        }
    }
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compression layer wrapped around a representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    None,
    Gzip,
}

/// What a path's extensions say about its content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathHint {
    /// `None` when no known base extension is present
    pub format: Option<TraceFormat>,
    pub compression: Compression,
}

/// Parse a path into a (format, compression) hint
///
/// **Public** - used by the conversion pipeline
///
/// The compression suffix is stripped first, then the base extension.
///
/// # Errors
/// * `FormatError::UnsupportedCompression` - `.xz`, `.bz2` or `.zst` suffix
pub fn parse_path(path: &Path, case_insensitive: bool) -> Result<PathHint, FormatError> {
    let mut stem = path.to_string_lossy().into_owned();
    if case_insensitive {
        stem = stem.to_ascii_lowercase();
    }

    if let Some(ext) = strip_any(&mut stem, UNSUPPORTED_COMPRESSION_EXTENSIONS) {
        return Err(FormatError::UnsupportedCompression(ext.to_string()));
    }

    let compression = if strip_any(&mut stem, GZIP_EXTENSIONS).is_some() {
        Compression::Gzip
    } else {
        Compression::None
    };

    let format = if strip_any(&mut stem, BINARY_EXTENSIONS).is_some() {
        Some(TraceFormat::Binary)
    } else if strip_any(&mut stem, NDJSON_EXTENSIONS).is_some() {
        Some(TraceFormat::Ndjson)
    } else if strip_any(&mut stem, TEXT_EXTENSIONS).is_some() {
        Some(TraceFormat::Text)
    } else if strip_any(&mut stem, ASM_EXTENSIONS).is_some() {
        Some(TraceFormat::Asm)
    } else {
        None
    };

    Ok(PathHint {
        format,
        compression,
    })
}

/// Pop the first matching suffix from `stem`, returning it
///
/// **Private** - internal helper for parse_path
fn strip_any<'a>(stem: &mut String, suffixes: &[&'a str]) -> Option<&'a str> {
    let found = suffixes.iter().find(|suffix| stem.ends_with(**suffix))?;
    stem.truncate(stem.len() - found.len());
    Some(found)
}

/// Guess the representation of decompressed source bytes
///
/// NDJSON starts with `{` after optional whitespace. Everything else,
/// including an empty stream, is treated as binary.
pub fn sniff_format(head: &[u8]) -> TraceFormat {
    match head.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(&b'{') => TraceFormat::Ndjson,
        _ => TraceFormat::Binary,
    }
}

/// Check that a resolved source can be decoded
pub fn ensure_readable(format: TraceFormat) -> Result<(), FormatError> {
    if format.is_readable() {
        Ok(())
    } else {
        Err(FormatError::OutputOnly(format))
    }
}
