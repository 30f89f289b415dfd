//! NDJSON decoder.
//!
//! Reads one line at a time from any `BufRead`. Accepted input:
//! - CRLF or LF line endings, blank lines skipped (still counted)
//! - numeric fields as `0x`-prefixed hex strings, decimal strings, or
//!   non-negative JSON integers
//! - keys outside the record vocabulary, which are ignored
//!
//! A record field the declared kind has no slot for (`B` on an `aluOp`,
//! `A` on a `condBrOp`) is a schema error rather than being dropped.

use crate::record::hex::parse_u64;
use crate::record::{Operand, Record, RecordKind};
use crate::stream::classify_read_error;
use crate::utils::config::PROGRESS_INTERVAL;
use crate::utils::error::{Position, TraceError};
use log::debug;
use serde_json::{Map, Value};
use std::io::{self, BufRead};
use std::iter::FusedIterator;

/// Owning line iterator that decodes each line into a [`Record`]
pub struct NdjsonReader<R> {
    input: R,
    buf: String,
    line_no: u64,
    records: u64,
    fused: bool,
}

impl<R: BufRead> NdjsonReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            buf: String::with_capacity(512),
            line_no: 0,
            records: 0,
            fused: false,
        }
    }

    fn inner_next(&mut self) -> Result<Option<Record>, TraceError> {
        loop {
            self.buf.clear();
            let read = self.input.read_line(&mut self.buf).map_err(|e| {
                let line = self.line_no + 1;
                match classify_read_error(e, "read NDJSON input") {
                    TraceError::Io { source, .. } if source.kind() == io::ErrorKind::InvalidData => {
                        TraceError::schema(line, "record", "is not valid UTF-8")
                    }
                    other => other,
                }
            })?;

            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }

            let record = parse_line(line, self.line_no)?;
            self.records += 1;
            if self.records % PROGRESS_INTERVAL == 0 {
                debug!(
                    "Decoded {} NDJSON records (line {})",
                    self.records, self.line_no
                );
            }
            return Ok(Some(record));
        }
    }
}

impl<R: BufRead> Iterator for NdjsonReader<R> {
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

impl<R: BufRead> FusedIterator for NdjsonReader<R> {}

/// Decode one non-blank line
///
/// **Public** - also useful for checking a single line in isolation
///
/// # Arguments
/// * `line` - JSON text without its line terminator
/// * `line_no` - 1-based line number used in error reports
///
/// # Errors
/// * `TraceError::Schema` - malformed JSON, missing or invalid field
/// * `TraceError::UnknownRecordType` - `"type"` names no known kind
pub fn parse_line(line: &str, line_no: u64) -> Result<Record, TraceError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| TraceError::schema(line_no, "record", format!("is not valid JSON: {}", e)))?;

    let obj = value
        .as_object()
        .ok_or_else(|| TraceError::schema(line_no, "record", "is not a JSON object"))?;

    let fields = Fields { obj, line: line_no };

    let type_name = fields.str("type")?;
    let kind = RecordKind::from_name(type_name).ok_or_else(|| TraceError::UnknownRecordType {
        position: Position::Line(line_no),
        kind: type_name.to_string(),
    })?;

    let pc = fields.u64("pc")?;
    fields.reject_foreign(kind)?;

    let record = match kind {
        RecordKind::AluOp => Record::AluOp {
            pc,
            a: fields.operand("A")?,
            d: fields.operand("D")?,
        },
        RecordKind::FpOp => Record::FpOp {
            pc,
            a: fields.operand("A")?,
            d: fields.operand("D")?,
        },
        RecordKind::SlowAluOp => Record::SlowAluOp {
            pc,
            a: fields.operand("A")?,
            d: fields.operand("D")?,
        },
        RecordKind::CondBrOp => Record::CondBrOp {
            pc,
            taken: fields.bool("taken")?,
            target: fields.u64("target")?,
        },
        RecordKind::LoadOp => Record::LoadOp {
            pc,
            ea: fields.u64("ea")?,
            size: fields.size("size")?,
            a: fields.operand("A")?,
            d: fields.operand("D")?,
        },
        RecordKind::StoreOp => Record::StoreOp {
            pc,
            ea: fields.u64("ea")?,
            size: fields.size("size")?,
            a: fields.operand("A")?,
            b: fields.operand("B")?,
        },
        RecordKind::UncondDirBrOp => {
            fields.always_taken()?;
            Record::UncondDirBrOp {
                pc,
                target: fields.u64("target")?,
            }
        }
        RecordKind::UncondIndBrOp => {
            fields.always_taken()?;
            Record::UncondIndBrOp {
                pc,
                target: fields.u64("target")?,
                a: fields.operand("A")?,
            }
        }
    };

    Ok(record)
}

/// Required-field accessors over one JSON object
///
/// **Private** - every error carries the line number and field name
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    line: u64,
}

impl<'a> Fields<'a> {
    fn error(&self, field: &str, reason: impl Into<String>) -> TraceError {
        TraceError::schema(self.line, field, reason)
    }

    fn get(&self, field: &str) -> Result<&'a Value, TraceError> {
        self.obj
            .get(field)
            .ok_or_else(|| self.error(field, "is missing"))
    }

    fn str(&self, field: &str) -> Result<&'a str, TraceError> {
        self.get(field)?
            .as_str()
            .ok_or_else(|| self.error(field, "must be a string"))
    }

    fn u64(&self, field: &str) -> Result<u64, TraceError> {
        parse_json_u64(self.get(field)?).map_err(|reason| self.error(field, reason))
    }

    fn bool(&self, field: &str) -> Result<bool, TraceError> {
        self.get(field)?
            .as_bool()
            .ok_or_else(|| self.error(field, "must be a boolean"))
    }

    fn size(&self, field: &str) -> Result<u8, TraceError> {
        let size = self.u64(field)?;
        match u8::try_from(size) {
            Ok(size) if size > 0 => Ok(size),
            _ => Err(self.error(field, format!("must be in 1..=255, got {}", size))),
        }
    }

    /// Fail on the first record field `kind` cannot represent
    fn reject_foreign(&self, kind: RecordKind) -> Result<(), TraceError> {
        let allowed = kind.fields();
        match RecordKind::RECORD_FIELDS
            .iter()
            .find(|field| self.obj.contains_key(**field) && !allowed.contains(*field))
        {
            Some(field) => Err(self.error(field, format!("is not carried by {}", kind))),
            None => Ok(()),
        }
    }

    /// Unconditional branches may carry `taken`, but only as `true`
    fn always_taken(&self) -> Result<(), TraceError> {
        if self.obj.contains_key("taken") && !self.bool("taken")? {
            return Err(self.error("taken", "must be true for an unconditional branch"));
        }
        Ok(())
    }

    /// Operand object; errors name the nested field as `A.idx` etc.
    fn operand(&self, field: &str) -> Result<Operand, TraceError> {
        let obj = self
            .get(field)?
            .as_object()
            .ok_or_else(|| self.error(field, "must be an object"))?;

        let component = |name: &str| -> Result<u64, TraceError> {
            let qualified = format!("{}.{}", field, name);
            let value = obj
                .get(name)
                .ok_or_else(|| self.error(&qualified, "is missing"))?;
            parse_json_u64(value).map_err(|reason| self.error(&qualified, reason))
        };
        let register = |name: &str| -> Result<u8, TraceError> {
            let value = component(name)?;
            u8::try_from(value).map_err(|_| {
                self.error(
                    &format!("{}.{}", field, name),
                    format!("must fit in 8 bits, got {}", value),
                )
            })
        };

        Ok(Operand {
            bank: register("bank")?,
            idx: register("idx")?,
            val: component("val")?,
        })
    }
}

/// Parse a u64 from a JSON number or a hex/decimal string
///
/// **Private** - internal helper
fn parse_json_u64(value: &Value) -> Result<u64, String> {
    if let Some(n) = value.as_u64() {
        Ok(n)
    } else if let Some(s) = value.as_str() {
        parse_u64(s)
    } else {
        Err(format!(
            "must be a non-negative integer or hex string, found {}",
            value
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const SCENARIO_A: &str = concat!(
        r#"{"pc":"0x10","type":"aluOp","A":{"bank":1,"idx":1,"val":"0x1"},"D":{"bank":1,"idx":2,"val":"0x2"}}"#,
        "\n",
        r#"{"pc":"0x20","type":"condBrOp","taken":true,"target":"0xa0"}"#,
        "\n",
        r#"{"pc":"0x30","type":"loadOp","ea":"0x1000","size":8,"A":{"bank":1,"idx":3,"val":"0x1000"},"D":{"bank":1,"idx":4,"val":"0xbeef"}}"#,
        "\n",
    );

    fn read_all(text: &str) -> Vec<Result<Record, TraceError>> {
        NdjsonReader::new(Cursor::new(text.as_bytes().to_vec())).collect()
    }

    fn schema_field(result: &Result<Record, TraceError>) -> (u64, String) {
        match result {
            Err(TraceError::Schema { line, field, .. }) => (*line, field.clone()),
            other => panic!("expected SchemaError, got {:?}", other),
        }
    }

    #[test]
    fn test_scenario_a_lines() {
        let records: Vec<Record> = read_all(SCENARIO_A).into_iter().map(Result::unwrap).collect();

        assert_eq!(
            records,
            vec![
                Record::AluOp {
                    pc: 0x10,
                    a: Operand::new(1, 1, 1),
                    d: Operand::new(1, 2, 2),
                },
                Record::CondBrOp {
                    pc: 0x20,
                    taken: true,
                    target: 0xa0,
                },
                Record::LoadOp {
                    pc: 0x30,
                    ea: 0x1000,
                    size: 8,
                    a: Operand::new(1, 3, 0x1000),
                    d: Operand::new(1, 4, 0xbeef),
                },
            ]
        );
    }

    #[test]
    fn test_missing_pc_names_field_and_line() {
        let text = concat!(
            r#"{"pc":"0x20","type":"condBrOp","taken":false,"target":"0x24"}"#,
            "\n",
            r#"{"type":"aluOp","A":{"bank":1,"idx":1,"val":"0x1"},"D":{"bank":1,"idx":2,"val":"0x2"}}"#,
            "\n",
        );
        let results = read_all(text);

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(schema_field(&results[1]), (2, "pc".to_string()));
    }

    #[test]
    fn test_unknown_type_reports_line() {
        let results = read_all("{\"pc\":\"0x1\",\"type\":\"vecOp\"}\n");
        match &results[0] {
            Err(TraceError::UnknownRecordType { position, kind }) => {
                assert_eq!(*position, Position::Line(1));
                assert_eq!(kind, "vecOp");
            }
            other => panic!("expected UnknownRecordType, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let text = "\r\n{\"pc\":\"0x20\",\"type\":\"condBrOp\",\"taken\":true,\"target\":\"0xa0\"}\r\n\n   \n{\"type\":\"condBrOp\"}\n";
        let results = read_all(text);

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(schema_field(&results[1]), (5, "pc".to_string()));
    }

    #[test]
    fn test_numeric_forms() {
        let text = r#"{"pc":16,"type":"condBrOp","taken":false,"target":"160"}"#;
        let record = parse_line(text, 1).unwrap();
        assert_eq!(
            record,
            Record::CondBrOp {
                pc: 16,
                taken: false,
                target: 160,
            }
        );
    }

    #[test]
    fn test_signed_or_overlong_hex_rejected() {
        let signed = r#"{"pc":"0x+10","type":"uncondDirBrOp","target":"0x40"}"#;
        let err = parse_line(signed, 1).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (1, "pc".to_string()));

        let overlong = r#"{"pc":"0x10","type":"uncondDirBrOp","target":"0x00000000000000000000000040"}"#;
        let err = parse_line(overlong, 2).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (2, "target".to_string()));

        let padded = r#"{"pc":" 0x10","type":"uncondDirBrOp","target":"0x40"}"#;
        let err = parse_line(padded, 3).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (3, "pc".to_string()));
    }

    #[test]
    fn test_register_overflow() {
        let text = r#"{"pc":"0x10","type":"aluOp","A":{"bank":1,"idx":300,"val":"0x1"},"D":{"bank":1,"idx":2,"val":"0x2"}}"#;
        let err = parse_line(text, 7).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (7, "A.idx".to_string()));
    }

    #[test]
    fn test_bad_operand_value() {
        let text = r#"{"pc":"0x10","type":"aluOp","A":{"bank":1,"idx":1,"val":"0xnope"},"D":{"bank":1,"idx":2,"val":"0x2"}}"#;
        let err = parse_line(text, 1).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (1, "A.val".to_string()));
    }

    #[test]
    fn test_zero_size_rejected() {
        let text = r#"{"pc":"0x30","type":"loadOp","ea":"0x1000","size":0,"A":{"bank":1,"idx":3,"val":"0x0"},"D":{"bank":1,"idx":4,"val":"0x0"}}"#;
        let err = parse_line(text, 1).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (1, "size".to_string()));
    }

    #[test]
    fn test_unconditional_branch_cannot_be_not_taken() {
        let ok = r#"{"pc":"0x40","type":"uncondDirBrOp","target":"0x80"}"#;
        assert!(parse_line(ok, 1).is_ok());

        let bad = r#"{"pc":"0x40","type":"uncondDirBrOp","taken":false,"target":"0x80"}"#;
        let err = parse_line(bad, 1).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (1, "taken".to_string()));
    }

    #[test]
    fn test_not_an_object() {
        let err = parse_line("[1,2,3]", 4).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (4, "record".to_string()));

        let err = parse_line("{\"pc\":", 5).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (5, "record".to_string()));
    }

    #[test]
    fn test_reader_is_fused_after_error() {
        let text = "{\"type\":\"aluOp\"}\n{\"pc\":\"0x20\",\"type\":\"condBrOp\",\"taken\":true,\"target\":\"0xa0\"}\n";
        let mut reader = NdjsonReader::new(Cursor::new(text.as_bytes().to_vec()));
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_extra_keys_ignored() {
        let text = r#"{"pc":"0x20","type":"condBrOp","taken":true,"target":"0xa0","cycle":12}"#;
        assert!(parse_line(text, 1).is_ok());
    }

    #[test]
    fn test_fp_and_slow_alu_kinds() {
        let fp = r#"{"pc":"0x50","type":"fpOp","A":{"bank":2,"idx":3,"val":"0x1"},"D":{"bank":2,"idx":4,"val":"0x2"}}"#;
        assert_eq!(
            parse_line(fp, 1).unwrap(),
            Record::FpOp {
                pc: 0x50,
                a: Operand::new(2, 3, 1),
                d: Operand::new(2, 4, 2),
            }
        );

        let slow = r#"{"pc":"0x54","type":"slowAluOp","A":{"bank":1,"idx":10,"val":"0x7"},"D":{"bank":1,"idx":11,"val":"0x31"}}"#;
        assert_eq!(
            parse_line(slow, 1).unwrap(),
            Record::SlowAluOp {
                pc: 0x54,
                a: Operand::new(1, 10, 7),
                d: Operand::new(1, 11, 0x31),
            }
        );
    }

    #[test]
    fn test_operand_without_slot_is_rejected() {
        let alu_with_b = r#"{"pc":"0x10","type":"aluOp","A":{"bank":1,"idx":1,"val":"0x1"},"B":{"bank":1,"idx":3,"val":"0x3"},"D":{"bank":1,"idx":2,"val":"0x2"}}"#;
        let err = parse_line(alu_with_b, 3).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (3, "B".to_string()));

        let branch_with_a = r#"{"pc":"0x20","type":"condBrOp","taken":true,"target":"0xa0","A":{"bank":1,"idx":1,"val":"0x1"}}"#;
        let err = parse_line(branch_with_a, 4).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (4, "A".to_string()));

        let alu_with_ea = r#"{"pc":"0x10","type":"aluOp","ea":"0x1000","A":{"bank":1,"idx":1,"val":"0x1"},"D":{"bank":1,"idx":2,"val":"0x2"}}"#;
        let err = parse_line(alu_with_ea, 5).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (5, "ea".to_string()));
    }

    #[test]
    fn test_alu_without_destination_is_rejected() {
        let text = r#"{"pc":"0x10","type":"aluOp","A":{"bank":1,"idx":1,"val":"0x1"}}"#;
        let err = parse_line(text, 1).unwrap_err();
        assert_eq!(schema_field(&Err(err)), (1, "D".to_string()));
    }

    #[test]
    fn test_call_and_return_fold_into_unconditional_branches() {
        let ret = r#"{"pc":"0x60","type":"retBrOp","taken":true,"target":"0x1000","A":{"bank":1,"idx":1,"val":"0x1000"}}"#;
        let record = parse_line(ret, 1).unwrap();
        assert_eq!(record.kind(), RecordKind::UncondIndBrOp);

        let call = r#"{"pc":"0x64","type":"callDirBrOp","taken":true,"target":"0x2000"}"#;
        assert_eq!(
            parse_line(call, 2).unwrap(),
            Record::UncondDirBrOp {
                pc: 0x64,
                target: 0x2000,
            }
        );
    }
}
