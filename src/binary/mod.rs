//! Binary frame codec.
//!
//! A binary trace is a headerless sequence of frames, all integers
//! little-endian:
//!
//! ```text
//! u8   tag             see RecordKind::tag
//! u64  pc
//! ...  payload
//!   aluOp          operand A, operand D
//!   condBrOp       u8 taken (0|1), u64 target
//!   loadOp         u64 ea, u8 size, operand A, operand D
//!   stOp           u64 ea, u8 size, operand A, operand B
//!   uncondDirBrOp  u64 target
//!   uncondIndBrOp  u64 target, operand A
//!   fpOp           operand A, operand D
//!   slowAluOp      operand A, operand D
//! operand = u8 bank, u8 idx, u64 val
//! ```
//!
//! The stream is usually gzip-compressed; compression is handled one layer
//! down in [`crate::stream`].

pub mod reader;
pub mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

use crate::record::RecordKind;

const PC_LEN: usize = 8;
const OPERAND_LEN: usize = 1 + 1 + 8;
const MEMORY_LEN: usize = 8 + 1;

/// Largest frame body (everything after the tag)
pub const MAX_BODY_LEN: usize = PC_LEN + MEMORY_LEN + 2 * OPERAND_LEN;

/// Bytes following the tag for a frame of `kind`
pub fn body_len(kind: RecordKind) -> usize {
    PC_LEN
        + match kind {
            RecordKind::AluOp | RecordKind::FpOp | RecordKind::SlowAluOp => 2 * OPERAND_LEN,
            RecordKind::CondBrOp => 1 + 8,
            RecordKind::LoadOp | RecordKind::StoreOp => MEMORY_LEN + 2 * OPERAND_LEN,
            RecordKind::UncondDirBrOp => 8,
            RecordKind::UncondIndBrOp => 8 + OPERAND_LEN,
        }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_lengths() {
        assert_eq!(body_len(RecordKind::AluOp), 28);
        assert_eq!(body_len(RecordKind::FpOp), 28);
        assert_eq!(body_len(RecordKind::SlowAluOp), 28);
        assert_eq!(body_len(RecordKind::CondBrOp), 17);
        assert_eq!(body_len(RecordKind::LoadOp), 37);
        assert_eq!(body_len(RecordKind::UncondDirBrOp), 16);
        assert_eq!(body_len(RecordKind::UncondIndBrOp), 26);
        assert!(RecordKind::ALL.iter().all(|k| body_len(*k) <= MAX_BODY_LEN));
    }
}
