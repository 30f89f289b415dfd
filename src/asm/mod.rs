//! Assembly listing output.
//!
//! Each record becomes one RISC-V flavoured pseudo instruction followed by a
//! `//` comment carrying the trace metadata:
//!
//! ```text
//!     add x2,x1           //PC:10  RD:2 V:2  R1:1 V:1
//!     BEQ x0,x0,0x80      //PC:20  TAR:A0 OFF:80 TKN:1
//! ```
//!
//! Register indices are capped at 31. Branch offsets that do not fit the
//! instruction's immediate are replaced by `0x0` and flagged `TOO_LRG_OFF`.

use crate::encoder::{write_error, RecordEncoder};
use crate::format::TraceFormat;
use crate::record::{Operand, Record};
use crate::utils::config::{ASM_COMMENT_COLUMN, ASM_HEADER, ASM_INDENT};
use crate::utils::error::TraceError;
use std::io::{self, Write};

/// Immediate width of conditional branches and `jalr`
const BRANCH_IMM_BITS: u32 = 12;

/// Immediate width of `jal`
const JUMP_IMM_BITS: u32 = 20;

/// One listing line before alignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmLine {
    pub instruction: String,
    pub comment: String,
}

/// Source register name
fn rx_name(idx: u8) -> String {
    format!("x{}", idx.min(31))
}

/// Destination register name; `x0` would turn the instruction into a nop
fn rd_name(idx: u8) -> String {
    match idx {
        0 => "x1".to_string(),
        other => rx_name(other),
    }
}

/// Floating-point register name
fn fx_name(idx: u8) -> String {
    format!("f{}", idx.min(31))
}

/// `  TAG:<raw idx> V:<lowercase hex>`
fn reg_meta(tag: &str, operand: &Operand) -> String {
    format!("  {}:{} V:{:x}", tag, operand.idx, operand.val)
}

fn signed_delta(pc: u64, target: u64) -> i64 {
    (target as i64).wrapping_sub(pc as i64)
}

fn fits_signed(value: i64, bits: u32) -> bool {
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    (min..=max).contains(&value)
}

/// Branch rendering shared by `BEQ`/`BNE` and `jal`
///
/// Returns `(instruction offset, comment offset, overflowed)`.
fn branch_offset(pc: u64, target: u64, bits: u32) -> (String, String, bool) {
    let delta = signed_delta(pc, target);
    if fits_signed(delta, bits) {
        (format!("{:#X}", delta as u64), format!("{:X}", delta as u64), false)
    } else {
        ("0x0".to_string(), "0".to_string(), true)
    }
}

/// Render one record into its instruction and comment halves
///
/// **Public** - the encoder only adds indentation and alignment
pub fn render(record: &Record) -> AsmLine {
    match *record {
        Record::AluOp { pc, a, d } => AsmLine {
            instruction: format!("add {},{}", rd_name(d.idx), rx_name(a.idx)),
            comment: format!("//PC:{:X}{}{}", pc, reg_meta("RD", &d), reg_meta("R1", &a)),
        },

        Record::SlowAluOp { pc, a, d } => AsmLine {
            instruction: format!("divu {},{},x0", rd_name(d.idx), rx_name(a.idx)),
            comment: format!("//PC:{:X}{}{}", pc, reg_meta("RD", &d), reg_meta("R1", &a)),
        },

        Record::FpOp { pc, a, d } => AsmLine {
            instruction: format!("fmv.d {},{}", fx_name(d.idx), fx_name(a.idx)),
            comment: format!("//PC:{:X}{}{}", pc, reg_meta("FD", &d), reg_meta("F1", &a)),
        },

        Record::CondBrOp { pc, taken, target } => {
            let (mnemonic, (off, comment_off, overflow)) = if taken {
                ("BEQ", branch_offset(pc, target, BRANCH_IMM_BITS))
            } else {
                ("BNE", ("0".to_string(), "0".to_string(), false))
            };

            let mut comment = format!(
                "//PC:{:X}  TAR:{:X} OFF:{} TKN:{}",
                pc,
                target,
                comment_off,
                u8::from(taken)
            );
            if overflow {
                comment.push_str(" TOO_LRG_OFF");
            }
            AsmLine {
                instruction: format!("{} x0,x0,{}", mnemonic, off),
                comment,
            }
        }

        Record::LoadOp {
            pc,
            ea,
            size,
            a,
            d,
        } => {
            let mnemonic = match size {
                1 => "lbu",
                2 => "lhu",
                4 => "lwu",
                _ => "ld",
            };
            AsmLine {
                instruction: format!("{} {}, 0(x0)", mnemonic, rd_name(d.idx)),
                comment: format!(
                    "//PC:{:X}  EA:{:X} SZ:{}{}{}",
                    pc,
                    ea,
                    size,
                    reg_meta("RD", &d),
                    reg_meta("R1", &a)
                ),
            }
        }

        Record::StoreOp {
            pc,
            ea,
            size,
            a,
            b,
        } => {
            let mnemonic = match size {
                1 => "stb",
                2 => "sth",
                4 => "stw",
                _ => "std",
            };
            AsmLine {
                instruction: format!("{} {},0({})", mnemonic, rx_name(b.idx), rx_name(a.idx)),
                comment: format!(
                    "//PC:{:X}  EA:{:X} SIZE:{}{}{}",
                    pc,
                    ea,
                    size,
                    reg_meta("R1", &a),
                    reg_meta("R2", &b)
                ),
            }
        }

        Record::UncondDirBrOp { pc, target } => {
            let (off, comment_off, overflow) = branch_offset(pc, target, JUMP_IMM_BITS);
            let mut comment = format!("//PC:{:X}  TAR:{:X} OFF:{} TKN:1", pc, target, comment_off);
            if overflow {
                comment.push_str(" TOO_LRG_OFF");
            }
            AsmLine {
                instruction: format!("jal x0,{}", off),
                comment,
            }
        }

        Record::UncondIndBrOp { pc, target, a } => {
            let masked = (signed_delta(pc, target) as u64) & ((1 << BRANCH_IMM_BITS) - 1);
            AsmLine {
                instruction: format!("jalr x0,{},{:#X}", rx_name(a.idx), masked),
                comment: format!("//PC:{:X}  TAR:{:X} OFF:{:X} TKN:1", pc, target, masked),
            }
        }
    }
}

/// Write an indented line with the comment starting at the comment column
fn write_aligned<W: Write>(output: &mut W, line: &AsmLine) -> io::Result<()> {
    let instruction = line.instruction.trim_end();
    let used = ASM_INDENT + instruction.len();
    let pad = ASM_COMMENT_COLUMN.saturating_sub(used).max(1);

    writeln!(
        output,
        "{:indent$}{}{:pad$}{}",
        "",
        instruction,
        "",
        line.comment,
        indent = ASM_INDENT,
        pad = pad
    )
}

/// Writes the listing header once, then one aligned line per record
pub struct AsmEncoder<W> {
    output: W,
}

impl<W: Write> AsmEncoder<W> {
    /// Create the encoder and emit the section header
    pub fn new(mut output: W) -> Result<Self, TraceError> {
        output
            .write_all(ASM_HEADER.as_bytes())
            .map_err(|e| write_error(TraceFormat::Asm, e))?;
        Ok(Self { output })
    }
}

impl<W: Write> RecordEncoder<W> for AsmEncoder<W> {
    fn encode(&mut self, record: &Record) -> Result<(), TraceError> {
        write_aligned(&mut self.output, &render(record)).map_err(|e| write_error(TraceFormat::Asm, e))
    }

    fn into_inner(self: Box<Self>) -> Result<W, TraceError> {
        let mut this = *self;
        this.output
            .flush()
            .map_err(|e| write_error(TraceFormat::Asm, e))?;
        Ok(this.output)
    }

    fn format(&self) -> TraceFormat {
        TraceFormat::Asm
    }
}
