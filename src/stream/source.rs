//! Input byte streams with transparent gzip decompression.
//!
//! Compression is detected from the gzip magic bytes, not from the file
//! name, so a renamed `.gz` file still decodes. Errors raised by the gzip
//! layer are tagged on the way out so callers can report them as
//! `DecompressionError` instead of a plain read failure.

use crate::format::Compression;
use crate::utils::config::{GZIP_MAGIC, IO_BUFFER_SIZE};
use crate::utils::error::TraceError;
use flate2::bufread::MultiGzDecoder;
use log::debug;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Marker wrapped around every error produced by the decompressor
#[derive(Debug)]
struct DecompressFailure(io::Error);

impl fmt::Display for DecompressFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DecompressFailure {}

/// Read adapter that tags decoder errors with [`DecompressFailure`]
struct Decompressing<R>(R);

impl<R: Read> Read for Decompressing<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0
            .read(buf)
            .map_err(|e| io::Error::new(e.kind(), DecompressFailure(e)))
    }
}

/// Classify an I/O error coming out of a [`SourceStream`]
///
/// **Public** - used by the record readers
pub fn classify_read_error(error: io::Error, context: &str) -> TraceError {
    let tagged = error
        .get_ref()
        .map_or(false, |inner| inner.is::<DecompressFailure>());

    if !tagged {
        return TraceError::io(context, error);
    }

    match error.into_inner().map(|inner| inner.downcast::<DecompressFailure>()) {
        Some(Ok(failure)) => TraceError::Decompression(failure.0),
        Some(Err(other)) => TraceError::io(context, io::Error::new(io::ErrorKind::Other, other)),
        None => TraceError::io(context, io::Error::from(io::ErrorKind::Other)),
    }
}

/// A buffered, possibly decompressing, input stream
pub struct SourceStream {
    reader: Box<dyn BufRead>,
    compression: Compression,
}

impl SourceStream {
    /// Wrap any reader, detecting gzip from its first two bytes
    pub fn from_reader<R: Read + 'static>(input: R) -> Result<Self, TraceError> {
        let mut buffered = BufReader::with_capacity(IO_BUFFER_SIZE, input);

        let is_gzip = buffered
            .fill_buf()
            .map_err(|e| TraceError::io("read input", e))?
            .starts_with(&GZIP_MAGIC);

        if is_gzip {
            let decoder = Decompressing(MultiGzDecoder::new(buffered));
            Ok(Self {
                reader: Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, decoder)),
                compression: Compression::Gzip,
            })
        } else {
            Ok(Self {
                reader: Box::new(buffered),
                compression: Compression::None,
            })
        }
    }

    /// Which compression layer was detected
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Look at the next decompressed bytes without consuming them
    ///
    /// An empty slice means the stream is empty.
    pub fn peek(&mut self) -> Result<&[u8], TraceError> {
        self.reader
            .fill_buf()
            .map_err(|e| classify_read_error(e, "read input"))
    }
}

impl Read for SourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl BufRead for SourceStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt)
    }
}

/// Open a file for reading
///
/// **Public** - main entry point for file input
///
/// # Errors
/// * `TraceError::Io` - the file is missing or unreadable
pub fn open_source(path: &Path) -> Result<SourceStream, TraceError> {
    let file = File::open(path)
        .map_err(|e| TraceError::io(format!("cannot open {}", path.display()), e))?;

    let stream = SourceStream::from_reader(file)?;
    debug!(
        "Opened {} ({:?} compression)",
        path.display(),
        stream.compression()
    );

    Ok(stream)
}
