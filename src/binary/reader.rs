//! Binary trace reader.
//!
//! Turns a (decompressed) byte stream into a lazy sequence of records.
//! The iterator is fused: after the first error it only yields `None`.

use super::{body_len, MAX_BODY_LEN};
use crate::record::{Operand, Record, RecordKind};
use crate::stream::classify_read_error;
use crate::utils::config::PROGRESS_INTERVAL;
use crate::utils::error::{Position, TraceError};
use log::debug;
use std::io::{self, Read};
use std::iter::FusedIterator;

/// Streaming decoder for binary frames
pub struct BinaryReader<R> {
    input: R,
    offset: u64,
    records: u64,
    body: [u8; MAX_BODY_LEN],
    fused: bool,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            offset: 0,
            records: 0,
            body: [0; MAX_BODY_LEN],
            fused: false,
        }
    }

    /// Decompressed bytes consumed so far (always a frame boundary)
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next tag byte, `None` on a clean end of stream
    fn read_tag(&mut self) -> Result<Option<u8>, TraceError> {
        let mut tag = [0u8; 1];
        loop {
            match self.input.read(&mut tag) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(tag[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(classify_read_error(e, "read binary trace")),
            }
        }
    }

    fn inner_next(&mut self) -> Result<Option<Record>, TraceError> {
        let start = self.offset;

        let tag = match self.read_tag()? {
            Some(tag) => tag,
            None => return Ok(None),
        };

        let kind = RecordKind::from_tag(tag).ok_or_else(|| TraceError::UnknownRecordType {
            position: Position::ByteOffset(start),
            kind: format!("tag {}", tag),
        })?;

        let len = body_len(kind);
        let body = &mut self.body[..len];
        self.input
            .read_exact(body)
            .map_err(|e| match classify_read_error(e, "read binary trace") {
                TraceError::Io { source, .. } if source.kind() == io::ErrorKind::UnexpectedEof => {
                    TraceError::CorruptTrace {
                        offset: start,
                        reason: format!("truncated {} frame", kind),
                    }
                }
                other => other,
            })?;

        let record = decode_body(kind, &self.body[..len], start)?;
        self.offset += 1 + len as u64;
        self.records += 1;

        if self.records % PROGRESS_INTERVAL == 0 {
            debug!(
                "Decoded {} binary records ({} bytes)",
                self.records, self.offset
            );
        }

        Ok(Some(record))
    }
}

impl<R: Read> Iterator for BinaryReader<R> {
    type Item = Result<Record, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }

        let item = self.inner_next().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.fused = true;
        }
        item
    }
}

impl<R: Read> FusedIterator for BinaryReader<R> {}

/// Little-endian cursor over one frame body
///
/// **Private** - the body slice always has the exact length for its kind
struct Body<'a> {
    bytes: &'a [u8],
}

impl<'a> Body<'a> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[..N]);
        self.bytes = &self.bytes[N..];
        out
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take::<8>())
    }

    fn operand(&mut self) -> Operand {
        let bank = self.u8();
        let idx = self.u8();
        let val = self.u64();
        Operand::new(bank, idx, val)
    }
}

/// Decode a frame body and validate its constrained fields
///
/// **Private** - internal helper for BinaryReader
fn decode_body(kind: RecordKind, bytes: &[u8], offset: u64) -> Result<Record, TraceError> {
    let corrupt = |reason: String| TraceError::CorruptTrace { offset, reason };

    let mut body = Body { bytes };
    let pc = body.u64();

    let record = match kind {
        RecordKind::AluOp => Record::AluOp {
            pc,
            a: body.operand(),
            d: body.operand(),
        },
        RecordKind::FpOp => Record::FpOp {
            pc,
            a: body.operand(),
            d: body.operand(),
        },
        RecordKind::SlowAluOp => Record::SlowAluOp {
            pc,
            a: body.operand(),
            d: body.operand(),
        },
        RecordKind::CondBrOp => {
            let taken = match body.u8() {
                0 => false,
                1 => true,
                other => return Err(corrupt(format!("taken byte must be 0 or 1, got {}", other))),
            };
            Record::CondBrOp {
                pc,
                taken,
                target: body.u64(),
            }
        }
        RecordKind::LoadOp | RecordKind::StoreOp => {
            let ea = body.u64();
            let size = body.u8();
            if size == 0 {
                return Err(corrupt(format!("{} with size 0", kind)));
            }
            let a = body.operand();
            let second = body.operand();
            if kind == RecordKind::LoadOp {
                Record::LoadOp {
                    pc,
                    ea,
                    size,
                    a,
                    d: second,
                }
            } else {
                Record::StoreOp {
                    pc,
                    ea,
                    size,
                    a,
                    b: second,
                }
            }
        }
        RecordKind::UncondDirBrOp => Record::UncondDirBrOp {
            pc,
            target: body.u64(),
        },
        RecordKind::UncondIndBrOp => Record::UncondIndBrOp {
            pc,
            target: body.u64(),
            a: body.operand(),
        },
    };

    Ok(record)
}
