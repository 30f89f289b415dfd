//! Human-readable text dump, one line per record.
//!
//! ```text
//! [PC: 0x30 type: loadOp ea: 0x1000 size: 8 1st input:  (int: 1, idx: 31 val: 2000)   output:  (int: 1, idx: 5 val: dead)   ]
//! ```
//!
//! Fields appear in a fixed order: PC, type, memory access, branch outcome,
//! first input, second input, output. Spacing and the bare hex operand
//! values match the established CBP text dump so outputs diff cleanly.
//! `int` is 1 for the integer register bank and 0 for any other bank.
//! There is no parser for this format.

use crate::encoder::{write_error, RecordEncoder};
use crate::format::TraceFormat;
use crate::record::{Operand, Record};
use crate::utils::error::TraceError;
use std::fmt;
use std::io::Write;

/// Register file id of the integer bank
const INT_BANK: u8 = 1;

/// Display adapter rendering one record as a text line (without newline)
pub struct TextLine<'a>(pub &'a Record);

impl fmt::Display for TextLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;
        write!(f, "[PC: {:#x} type: {}", record.pc(), record.kind())?;

        if let Some(mem) = record.memory() {
            write!(f, " ea: {:#x} size: {}", mem.ea, mem.size)?;
        }
        if let Some(br) = record.branch() {
            write!(f, " ( tkn:{} tar: {:#x})  ", u8::from(br.taken), br.target)?;
        }

        let (first, second) = record.inputs();
        write_operand(f, "1st input", first)?;
        write_operand(f, "2nd input", second)?;
        write_operand(f, "output", record.output())?;

        f.write_str(" ]")
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, label: &str, operand: Option<Operand>) -> fmt::Result {
    match operand {
        Some(op) => write!(
            f,
            " {}:  (int: {}, idx: {} val: {:x})  ",
            label,
            u8::from(op.bank == INT_BANK),
            op.idx,
            op.val
        ),
        None => Ok(()),
    }
}

/// Writes one [`TextLine`] per record
pub struct TextEncoder<W> {
    output: W,
}

impl<W: Write> TextEncoder<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }
}

impl<W: Write> RecordEncoder<W> for TextEncoder<W> {
    fn encode(&mut self, record: &Record) -> Result<(), TraceError> {
        writeln!(self.output, "{}", TextLine(record)).map_err(|e| write_error(TraceFormat::Text, e))
    }

    fn into_inner(self: Box<Self>) -> Result<W, TraceError> {
        let mut this = *self;
        this.output
            .flush()
            .map_err(|e| write_error(TraceFormat::Text, e))?;
        Ok(this.output)
    }

    fn format(&self) -> TraceFormat {
        TraceFormat::Text
    }
}
