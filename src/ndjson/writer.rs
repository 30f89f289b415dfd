//! NDJSON encoder.

use crate::encoder::{write_error, RecordEncoder};
use crate::format::TraceFormat;
use crate::record::hex::to_padded_hex;
use crate::record::{Operand, Record};
use crate::utils::error::TraceError;
use serde::Serialize;
use std::io::{self, Write};

/// Serialized form of an [`Operand`]
#[derive(Debug, Serialize)]
struct WireOperand {
    bank: u8,
    idx: u8,
    val: String,
}

impl From<Operand> for WireOperand {
    fn from(operand: Operand) -> Self {
        Self {
            bank: operand.bank,
            idx: operand.idx,
            val: to_padded_hex(operand.val),
        }
    }
}

/// Serialized form of a [`Record`]; field order is the key order on disk
#[derive(Debug, Serialize)]
struct WireRecord {
    pc: String,

    #[serde(rename = "type")]
    kind: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    ea: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    taken: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,

    #[serde(rename = "A", skip_serializing_if = "Option::is_none")]
    a: Option<WireOperand>,

    #[serde(rename = "B", skip_serializing_if = "Option::is_none")]
    b: Option<WireOperand>,

    #[serde(rename = "D", skip_serializing_if = "Option::is_none")]
    d: Option<WireOperand>,
}

impl From<&Record> for WireRecord {
    fn from(record: &Record) -> Self {
        let memory = record.memory();
        let branch = record.branch();
        let (a, b) = record.inputs();

        Self {
            pc: to_padded_hex(record.pc()),
            kind: record.kind().name(),
            ea: memory.map(|m| to_padded_hex(m.ea)),
            size: memory.map(|m| m.size),
            taken: branch.map(|br| br.taken),
            target: branch.map(|br| to_padded_hex(br.target)),
            a: a.map(WireOperand::from),
            b: b.map(WireOperand::from),
            d: record.output().map(WireOperand::from),
        }
    }
}

/// Writes one JSON object per record, newline-terminated
pub struct NdjsonWriter<W> {
    output: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }
}

impl<W: Write> RecordEncoder<W> for NdjsonWriter<W> {
    fn encode(&mut self, record: &Record) -> Result<(), TraceError> {
        let wire = WireRecord::from(record);
        serde_json::to_writer(&mut self.output, &wire)
            .map_err(|e| write_error(TraceFormat::Ndjson, io::Error::from(e)))?;
        self.output
            .write_all(b"\n")
            .map_err(|e| write_error(TraceFormat::Ndjson, e))
    }

    fn into_inner(self: Box<Self>) -> Result<W, TraceError> {
        let mut this = *self;
        this.output
            .flush()
            .map_err(|e| write_error(TraceFormat::Ndjson, e))?;
        Ok(this.output)
    }

    fn format(&self) -> TraceFormat {
        TraceFormat::Ndjson
    }
}
