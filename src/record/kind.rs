//! Record kind vocabulary shared by every codec.
//!
//! The same names are used for the NDJSON `"type"` field and the
//! `type: <kind>` token of the text dump. The binary discriminator is a
//! separate one-byte tag.

use std::fmt;

/// Discriminator for the [`Record`](super::Record) variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    AluOp,
    FpOp,
    SlowAluOp,
    CondBrOp,
    LoadOp,
    StoreOp,
    UncondDirBrOp,
    UncondIndBrOp,
}

impl RecordKind {
    /// All kinds, in binary tag order
    pub const ALL: [RecordKind; 8] = [
        RecordKind::AluOp,
        RecordKind::CondBrOp,
        RecordKind::LoadOp,
        RecordKind::StoreOp,
        RecordKind::UncondDirBrOp,
        RecordKind::UncondIndBrOp,
        RecordKind::FpOp,
        RecordKind::SlowAluOp,
    ];

    /// Every per-record field name a producer may emit besides `pc` and `type`
    pub const RECORD_FIELDS: [&'static str; 8] =
        ["ea", "size", "taken", "target", "A", "B", "C", "D"];

    /// Canonical name used in NDJSON and text output
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::AluOp => "aluOp",
            RecordKind::FpOp => "fpOp",
            RecordKind::SlowAluOp => "slowAluOp",
            RecordKind::CondBrOp => "condBrOp",
            RecordKind::LoadOp => "loadOp",
            RecordKind::StoreOp => "stOp",
            RecordKind::UncondDirBrOp => "uncondDirBrOp",
            RecordKind::UncondIndBrOp => "uncondIndBrOp",
        }
    }

    /// Map a `"type"` string to a kind
    ///
    /// Besides the canonical names this accepts `storeOp` for stores and the
    /// call/return spellings some producers emit for unconditional branches.
    /// Call and return kinds fold into the unconditional branch kinds, so
    /// they come back out under the canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "aluOp" => Some(RecordKind::AluOp),
            "fpOp" => Some(RecordKind::FpOp),
            "slowAluOp" => Some(RecordKind::SlowAluOp),
            "condBrOp" => Some(RecordKind::CondBrOp),
            "loadOp" => Some(RecordKind::LoadOp),
            "stOp" | "storeOp" => Some(RecordKind::StoreOp),
            "uncondDirBrOp" | "callDirBrOp" => Some(RecordKind::UncondDirBrOp),
            "uncondIndBrOp" | "callIndBrOp" | "retBrOp" => Some(RecordKind::UncondIndBrOp),
            _ => None,
        }
    }

    /// Fields from [`Self::RECORD_FIELDS`] that this kind can represent
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::AluOp | RecordKind::FpOp | RecordKind::SlowAluOp => &["A", "D"],
            RecordKind::CondBrOp | RecordKind::UncondDirBrOp => &["taken", "target"],
            RecordKind::LoadOp => &["ea", "size", "A", "D"],
            RecordKind::StoreOp => &["ea", "size", "A", "B"],
            RecordKind::UncondIndBrOp => &["taken", "target", "A"],
        }
    }

    /// One-byte discriminator written at the start of each binary frame
    pub fn tag(self) -> u8 {
        match self {
            RecordKind::AluOp => 0,
            RecordKind::CondBrOp => 1,
            RecordKind::LoadOp => 2,
            RecordKind::StoreOp => 3,
            RecordKind::UncondDirBrOp => 4,
            RecordKind::UncondIndBrOp => 5,
            RecordKind::FpOp => 6,
            RecordKind::SlowAluOp => 7,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(RecordKind::AluOp),
            1 => Some(RecordKind::CondBrOp),
            2 => Some(RecordKind::LoadOp),
            3 => Some(RecordKind::StoreOp),
            4 => Some(RecordKind::UncondDirBrOp),
            5 => Some(RecordKind::UncondIndBrOp),
            6 => Some(RecordKind::FpOp),
            7 => Some(RecordKind::SlowAluOp),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
