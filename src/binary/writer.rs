//! Binary trace writer.

use super::MAX_BODY_LEN;
use crate::encoder::{write_error, RecordEncoder};
use crate::format::TraceFormat;
use crate::record::{Operand, Record};
use crate::utils::error::TraceError;
use std::io::Write;

/// Encodes records into binary frames
///
/// Each frame is assembled in a reusable scratch buffer and written with a
/// single call, so the output never holds a partial frame on success.
pub struct BinaryWriter<W> {
    output: W,
    scratch: Vec<u8>,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            scratch: Vec::with_capacity(1 + MAX_BODY_LEN),
        }
    }

    fn put_u8(&mut self, value: u8) {
        self.scratch.push(value);
    }

    fn put_u64(&mut self, value: u64) {
        self.scratch.extend_from_slice(&value.to_le_bytes());
    }

    fn put_operand(&mut self, operand: &Operand) {
        self.put_u8(operand.bank);
        self.put_u8(operand.idx);
        self.put_u64(operand.val);
    }

    /// Serialize one record into the scratch buffer
    fn build_frame(&mut self, record: &Record) {
        self.scratch.clear();
        self.put_u8(record.kind().tag());
        self.put_u64(record.pc());

        match record {
            Record::AluOp { a, d, .. }
            | Record::FpOp { a, d, .. }
            | Record::SlowAluOp { a, d, .. } => {
                self.put_operand(a);
                self.put_operand(d);
            }
            Record::CondBrOp { taken, target, .. } => {
                self.put_u8(u8::from(*taken));
                self.put_u64(*target);
            }
            Record::LoadOp { ea, size, a, d, .. } => {
                self.put_u64(*ea);
                self.put_u8(*size);
                self.put_operand(a);
                self.put_operand(d);
            }
            Record::StoreOp { ea, size, a, b, .. } => {
                self.put_u64(*ea);
                self.put_u8(*size);
                self.put_operand(a);
                self.put_operand(b);
            }
            Record::UncondDirBrOp { target, .. } => {
                self.put_u64(*target);
            }
            Record::UncondIndBrOp { target, a, .. } => {
                self.put_u64(*target);
                self.put_operand(a);
            }
        }
    }
}

impl<W: Write> RecordEncoder<W> for BinaryWriter<W> {
    fn encode(&mut self, record: &Record) -> Result<(), TraceError> {
        self.build_frame(record);
        self.output
            .write_all(&self.scratch)
            .map_err(|e| write_error(TraceFormat::Binary, e))
    }

    fn into_inner(self: Box<Self>) -> Result<W, TraceError> {
        let mut this = *self;
        this.output
            .flush()
            .map_err(|e| write_error(TraceFormat::Binary, e))?;
        Ok(this.output)
    }

    fn format(&self) -> TraceFormat {
        TraceFormat::Binary
    }
}
