use types::encoding;
use types::probe::RegIndex;
use types::{OpEncoding, ZbaOp};

/// An operation outside the assembler's vocabulary: a selector plus one destination and
/// two source registers.
///
/// The rest of the probe only ever builds `CustomOp`s; how they turn into a machine word
/// is decided by the [`OpEncoding`] passed to [`CustomOp::encode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CustomOp {
    pub op: ZbaOp,
    pub rd: RegIndex,
    pub rs1: RegIndex,
    pub rs2: RegIndex,
}

impl CustomOp {
    pub const fn new(op: ZbaOp, rd: RegIndex, rs1: RegIndex, rs2: RegIndex) -> Self {
        Self { op, rd, rs1, rs2 }
    }

    pub const fn encode(&self, encoding: OpEncoding) -> u32 {
        encoding::zba(encoding, self.op, self.rd, self.rs1, self.rs2)
    }
}
