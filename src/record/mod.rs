//! In-memory representation of one trace event.
//!
//! This module defines:
//! - [`Record`], a closed enum with one case per instruction kind
//! - [`Operand`], a register reference plus its observed value
//! - [`RecordKind`], the discriminator vocabulary shared by all codecs
//!
//! Records are plain values. Readers hand them out one at a time and
//! encoders drop them after writing, so nothing is retained across the stream.

pub mod hex;
pub mod kind;

pub use kind::RecordKind;

/// A register reference and the value it held at the time of the instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operand {
    /// Register file id (1 = integer, 2 = floating point / vector)
    pub bank: u8,

    /// Register index within the bank
    pub idx: u8,

    /// Observed 64-bit value
    pub val: u64,
}

impl Operand {
    pub fn new(bank: u8, idx: u8, val: u64) -> Self {
        Self { bank, idx, val }
    }
}

/// One decoded trace event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Record {
    /// Arithmetic/logic instruction: source `a`, destination `d`
    AluOp { pc: u64, a: Operand, d: Operand },

    /// Floating-point instruction, same operand shape as `AluOp`
    FpOp { pc: u64, a: Operand, d: Operand },

    /// Long-latency integer instruction (multiply, divide)
    SlowAluOp { pc: u64, a: Operand, d: Operand },

    /// Conditional branch outcome and target
    CondBrOp { pc: u64, taken: bool, target: u64 },

    /// Memory load from `ea`; `a` computes the address, `d` receives the value
    LoadOp {
        pc: u64,
        ea: u64,
        size: u8,
        a: Operand,
        d: Operand,
    },

    /// Memory store to `ea`; `a` computes the address, `b` holds the data
    StoreOp {
        pc: u64,
        ea: u64,
        size: u8,
        a: Operand,
        b: Operand,
    },

    /// Unconditional direct branch (always taken)
    UncondDirBrOp { pc: u64, target: u64 },

    /// Unconditional indirect branch through register `a` (always taken)
    UncondIndBrOp { pc: u64, target: u64, a: Operand },
}

/// Memory access attached to a load or store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAccess {
    pub ea: u64,
    pub size: u8,
}

/// Branch outcome attached to any branch kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchOutcome {
    pub taken: bool,
    pub target: u64,
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::AluOp { .. } => RecordKind::AluOp,
            Record::FpOp { .. } => RecordKind::FpOp,
            Record::SlowAluOp { .. } => RecordKind::SlowAluOp,
            Record::CondBrOp { .. } => RecordKind::CondBrOp,
            Record::LoadOp { .. } => RecordKind::LoadOp,
            Record::StoreOp { .. } => RecordKind::StoreOp,
            Record::UncondDirBrOp { .. } => RecordKind::UncondDirBrOp,
            Record::UncondIndBrOp { .. } => RecordKind::UncondIndBrOp,
        }
    }

    pub fn pc(&self) -> u64 {
        match *self {
            Record::AluOp { pc, .. }
            | Record::FpOp { pc, .. }
            | Record::SlowAluOp { pc, .. }
            | Record::CondBrOp { pc, .. }
            | Record::LoadOp { pc, .. }
            | Record::StoreOp { pc, .. }
            | Record::UncondDirBrOp { pc, .. }
            | Record::UncondIndBrOp { pc, .. } => pc,
        }
    }

    /// Effective address and width for loads and stores
    pub fn memory(&self) -> Option<MemoryAccess> {
        match *self {
            Record::LoadOp { ea, size, .. } | Record::StoreOp { ea, size, .. } => {
                Some(MemoryAccess { ea, size })
            }
            Record::AluOp { .. }
            | Record::FpOp { .. }
            | Record::SlowAluOp { .. }
            | Record::CondBrOp { .. }
            | Record::UncondDirBrOp { .. }
            | Record::UncondIndBrOp { .. } => None,
        }
    }

    /// Taken flag and target for every branch kind
    pub fn branch(&self) -> Option<BranchOutcome> {
        match *self {
            Record::CondBrOp { taken, target, .. } => Some(BranchOutcome { taken, target }),
            Record::UncondDirBrOp { target, .. } | Record::UncondIndBrOp { target, .. } => {
                Some(BranchOutcome {
                    taken: true,
                    target,
                })
            }
            Record::AluOp { .. }
            | Record::FpOp { .. }
            | Record::SlowAluOp { .. }
            | Record::LoadOp { .. }
            | Record::StoreOp { .. } => None,
        }
    }

    /// Source operands in order (`A`, then `B`)
    pub fn inputs(&self) -> (Option<Operand>, Option<Operand>) {
        match *self {
            Record::AluOp { a, .. }
            | Record::FpOp { a, .. }
            | Record::SlowAluOp { a, .. }
            | Record::LoadOp { a, .. }
            | Record::UncondIndBrOp { a, .. } => (Some(a), None),
            Record::StoreOp { a, b, .. } => (Some(a), Some(b)),
            Record::CondBrOp { .. } | Record::UncondDirBrOp { .. } => (None, None),
        }
    }

    /// Destination operand (`D`)
    pub fn output(&self) -> Option<Operand> {
        match *self {
            Record::AluOp { d, .. }
            | Record::FpOp { d, .. }
            | Record::SlowAluOp { d, .. }
            | Record::LoadOp { d, .. } => Some(d),
            Record::CondBrOp { .. }
            | Record::StoreOp { .. }
            | Record::UncondDirBrOp { .. }
            | Record::UncondIndBrOp { .. } => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_follow_kind() {
        for record in fixtures::one_of_each() {
            let kind = record.kind();
            assert_eq!(
                record.memory().is_some(),
                matches!(kind, RecordKind::LoadOp | RecordKind::StoreOp)
            );
            assert_eq!(
                record.branch().is_some(),
                matches!(
                    kind,
                    RecordKind::CondBrOp | RecordKind::UncondDirBrOp | RecordKind::UncondIndBrOp
                )
            );
        }
    }

    #[test]
    fn test_unconditional_branches_are_taken() {
        let record = Record::UncondDirBrOp { pc: 0, target: 8 };
        assert_eq!(
            record.branch(),
            Some(BranchOutcome {
                taken: true,
                target: 8
            })
        );
    }

    #[test]
    fn test_fp_and_slow_alu_share_alu_operands() {
        let a = Operand::new(2, 1, 0x10);
        let d = Operand::new(2, 2, 0x20);
        for record in [Record::FpOp { pc: 4, a, d }, Record::SlowAluOp { pc: 4, a, d }] {
            assert_eq!(record.inputs(), (Some(a), None));
            assert_eq!(record.output(), Some(d));
            assert!(record.memory().is_none());
            assert!(record.branch().is_none());
        }
    }

    #[test]
    fn test_store_has_two_inputs_and_no_output() {
        let record = Record::StoreOp {
            pc: 0,
            ea: 0,
            size: 8,
            a: Operand::new(1, 1, 0),
            b: Operand::new(1, 2, 0),
        };
        let (first, second) = record.inputs();
        assert_eq!(first.map(|o| o.idx), Some(1));
        assert_eq!(second.map(|o| o.idx), Some(2));
        assert!(record.output().is_none());
    }
}
