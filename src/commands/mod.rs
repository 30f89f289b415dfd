//! CLI command implementations.
//!
//! Commands orchestrate the codec modules to perform user tasks.

pub mod convert;
pub mod models;

// Re-export main command functions
pub use convert::{convert, convert_file, validate_args};
pub use models::{ConvertArgs, ConvertSummary, Endpoint};
