//! NDJSON codec: one JSON object per line.
//!
//! Keys are written in a fixed order (`pc, type, ea, size, taken, target,
//! A, B, D`), absent keys are omitted, and every address or value is a
//! 16-digit hex string. On input the decoder is more lenient: see
//! [`reader`] for the accepted forms.

pub mod reader;
pub mod writer;

pub use reader::NdjsonReader;
pub use writer::NdjsonWriter;
