//! Output byte streams with optional gzip compression.
//!
//! A [`SinkStream`] must be finished explicitly so the gzip trailer is
//! written and buffered bytes reach the file before the process exits.

use crate::format::Compression;
use crate::utils::config::IO_BUFFER_SIZE;
use crate::utils::error::OutputError;
use flate2::write::GzEncoder;
use log::debug;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

enum SinkInner {
    Plain(Box<dyn Write>),
    Gzip(GzEncoder<Box<dyn Write>>),
}

/// A buffered, possibly compressing, output stream
pub struct SinkStream {
    inner: SinkInner,
}

impl SinkStream {
    /// Wrap any writer, compressing when asked
    pub fn from_writer<W: Write + 'static>(output: W, compression: Compression) -> Self {
        let boxed: Box<dyn Write> = Box::new(BufWriter::with_capacity(IO_BUFFER_SIZE, output));
        let inner = match compression {
            Compression::None => SinkInner::Plain(boxed),
            Compression::Gzip => {
                SinkInner::Gzip(GzEncoder::new(boxed, flate2::Compression::default()))
            }
        };
        Self { inner }
    }

    /// Uncompressed standard output
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout(), Compression::None)
    }

    /// Write the gzip trailer (if any) and flush everything
    pub fn finish(self) -> io::Result<()> {
        match self.inner {
            SinkInner::Plain(mut writer) => writer.flush(),
            SinkInner::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for SinkStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            SinkInner::Plain(writer) => writer.write(buf),
            SinkInner::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            SinkInner::Plain(writer) => writer.flush(),
            SinkInner::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Create (or truncate) an output file
///
/// **Public** - main entry point for file output
///
/// # Arguments
/// * `output_path` - Destination file; missing parent directories are created
/// * `compression` - Compression layer taken from the file name
///
/// # Errors
/// * `OutputError::InvalidPath` - Path is empty, a directory, or its parent cannot be created
/// * `OutputError::WriteFailed` - File cannot be created
pub fn create_sink(output_path: &Path, compression: Compression) -> Result<SinkStream, OutputError> {
    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path)?;
    debug!(
        "Writing {} ({:?} compression)",
        output_path.display(),
        compression
    );

    Ok(SinkStream::from_writer(file, compression))
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::MultiGzDecoder;
    use std::io::Read;

    #[test]
    fn test_plain_sink_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let mut sink = create_sink(&path, Compression::None).unwrap();
        sink.write_all(b"line\n").unwrap();
        sink.finish().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"line\n");
    }

    #[test]
    fn test_gzip_sink_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl.gz");

        let mut sink = create_sink(&path, Compression::Gzip).unwrap();
        sink.write_all(b"{\"pc\":\"0x10\"}\n").unwrap();
        sink.finish().unwrap();

        let mut decoded = String::new();
        MultiGzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "{\"pc\":\"0x10\"}\n");
    }

    #[test]
    fn test_empty_gzip_output_is_still_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.gz");

        create_sink(&path, Compression::Gzip).unwrap().finish().unwrap();

        let mut decoded = Vec::new();
        MultiGzDecoder::new(File::open(&path).unwrap())
            .read_to_end(&mut decoded)
            .unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_validate_output_path_empty() {
        assert!(validate_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_create_sink_makes_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("nested/dirs/out.txt");

        create_sink(&nested, Compression::None).unwrap().finish().unwrap();
        assert!(nested.exists());
    }
}
