//! Byte-level plumbing below the record codecs.
//!
//! - [`source`]: buffered input with gzip detected from magic bytes
//! - [`sink`]: buffered output with gzip chosen by the caller

pub mod sink;
pub mod source;

pub use sink::{create_sink, SinkStream};
pub use source::{classify_read_error, open_source, SourceStream};
