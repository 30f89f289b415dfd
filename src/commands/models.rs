use crate::format::{Compression, TraceFormat};
use std::fmt;
use std::path::PathBuf;

/// Arguments for the convert command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ConvertArgs {
    /// Source trace file
    pub input: PathBuf,

    /// Destination file (None = stdout, uncompressed)
    pub output: Option<PathBuf>,

    /// Stop after this many records (None = whole source)
    pub limit: Option<u64>,

    /// Explicit source representation, overrides extension and sniffing
    pub from: Option<TraceFormat>,

    /// Explicit target representation, overrides extension and default route
    pub to: Option<TraceFormat>,

    /// Match file extensions ignoring ASCII case
    pub case_insensitive_ext: bool,
}

impl Default for ConvertArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            limit: None,
            from: None,
            to: None,
            case_insensitive_ext: true,
        }
    }
}

/// One resolved side of a conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// None for stdout
    pub path: Option<PathBuf>,
    pub format: TraceFormat,
    pub compression: Compression,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({}", path.display(), self.format)?,
            None => write!(f, "<stdout> ({}", self.format)?,
        }
        match self.compression {
            Compression::Gzip => f.write_str(", gzip)"),
            Compression::None => f.write_str(")"),
        }
    }
}

/// Outcome of a successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Records written to the target
    pub records: u64,
    pub source: Endpoint,
    pub target: Endpoint,
}
