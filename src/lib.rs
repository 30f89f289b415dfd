//! trace2json
//!
//! Streaming converter for processor instruction traces.
//!
//! Reads a gzip-compressed binary frame stream or NDJSON and writes
//! binary, NDJSON, a human-readable text dump, or an assembly listing.
//! Records are decoded and encoded one at a time, so memory use does not
//! grow with the trace length.
//!
//! ## Getting Started
//!
//! ```bash
//! trace2json --in trace.cbp.gz --out trace.jsonl.gz
//! trace2json --in trace.jsonl.gz --out trace.txt --limit 1000
//! ```
//!
//! From Rust, build a [`commands::ConvertArgs`] and call
//! [`commands::convert`].

pub mod asm;
pub mod binary;
pub mod commands;
pub mod encoder;
pub mod format;
pub mod ndjson;
pub mod record;
pub mod stream;
pub mod text;
pub mod utils;

pub use record::{Operand, Record, RecordKind};
pub use utils::error::{FormatError, TraceError};
