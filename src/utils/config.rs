//! Configuration and constants for the converter.

/// Buffer size for input and output streams
pub const IO_BUFFER_SIZE: usize = 1 << 20;

/// Log a progress line every this many records
pub const PROGRESS_INTERVAL: u64 = 5_000_000;

/// Gzip magic bytes, used to detect compressed input regardless of extension
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Number of hex digits used for addresses and values in NDJSON output
pub const JSON_HEX_DIGITS: usize = 16;

// Assembly listing layout
pub const ASM_INDENT: usize = 4;
pub const ASM_COMMENT_COLUMN: usize = 24;
pub const ASM_HEADER: &str = ".section .text\n.global _start\n\n_start:\n";

// File extensions (compared case-insensitively unless disabled)
pub const GZIP_EXTENSIONS: &[&str] = &[".gz"];
pub const UNSUPPORTED_COMPRESSION_EXTENSIONS: &[&str] = &[".xz", ".bz2", ".zst"];
pub const BINARY_EXTENSIONS: &[&str] = &[".cbp"];
pub const NDJSON_EXTENSIONS: &[&str] = &[".jsonl", ".ndjson", ".json"];
pub const TEXT_EXTENSIONS: &[&str] = &[".txt"];
pub const ASM_EXTENSIONS: &[&str] = &[".asm"];

/// Environment variable mirroring `--case-sensitive-ext`
pub const CASE_SENSITIVE_EXT_ENV: &str = "TRACE2JSON_CASE_SENSITIVE_EXT";
