//! The operation family under test: three shift-and-add ops and a zero-extending add.
//!
//! All arithmetic is done at the native register width (64 bits) with wrapping
//! addition, the same way a hart computes it.

/// One of the four address-generation instructions exercised by the probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZbaOp {
    /// rd = rs1 + (rs2 << 1)
    Sh1add,
    /// rd = rs1 + (rs2 << 2)
    Sh2add,
    /// rd = rs1 + (rs2 << 3)
    Sh3add,
    /// rd = zext32(rs1) + rs2
    AddUw,
}

impl ZbaOp {
    pub const ALL: [ZbaOp; 4] = [ZbaOp::Sh1add, ZbaOp::Sh2add, ZbaOp::Sh3add, ZbaOp::AddUw];

    /// Left shift applied to `rs2` before the add.
    pub const fn shift(self) -> u32 {
        match self {
            ZbaOp::Sh1add => 1,
            ZbaOp::Sh2add => 2,
            ZbaOp::Sh3add => 3,
            ZbaOp::AddUw => 0,
        }
    }

    /// Position of the op in [`ZbaOp::ALL`].
    pub const fn index(self) -> usize {
        match self {
            ZbaOp::Sh1add => 0,
            ZbaOp::Sh2add => 1,
            ZbaOp::Sh3add => 2,
            ZbaOp::AddUw => 3,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            ZbaOp::Sh1add => "sh1add",
            ZbaOp::Sh2add => "sh2add",
            ZbaOp::Sh3add => "sh3add",
            ZbaOp::AddUw => "add.uw",
        }
    }

    /// Reference semantics.
    ///
    /// The shift-and-add ops scale `rs2` (the index) and add it to `rs1` (the base), so
    /// A = 5, B = 3 gives 11, 17 and 29. `add.uw` discards bits 63:32 of `rs1` before
    /// adding, even when the inputs the probe uses never set them.
    pub const fn apply(self, rs1: u64, rs2: u64) -> u64 {
        match self {
            ZbaOp::AddUw => (rs1 & 0xffff_ffff).wrapping_add(rs2),
            _ => rs1.wrapping_add(rs2 << self.shift()),
        }
    }
}

/// Arithmetic unit that realizes the operation family.
///
/// The hart model and the hosted verifier both compute through this trait, so an
/// implementation with deliberately wrong semantics can be swapped in.
pub trait ZbaUnit {
    fn compute(&self, op: ZbaOp, rs1: u64, rs2: u64) -> u64;
}

/// The correct implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReferenceUnit;

impl ZbaUnit for ReferenceUnit {
    fn compute(&self, op: ZbaOp, rs1: u64, rs2: u64) -> u64 {
        op.apply(rs1, rs2)
    }
}

/// Selector-bit scheme used to express the family as R-type words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum OpEncoding {
    /// Custom selectors used by the probe: OP (0x33), funct7 0x04, funct3 picks the op.
    #[default]
    Probe,
    /// Ratified Zba encodings: OP funct7 0x10 for shNadd, OP-32 funct7 0x04 for add.uw.
    Ratified,
}

/// Major opcode of register-register ops.
pub const OPCODE_OP: u8 = 0x33;
/// Major opcode of 32-bit register-register ops on RV64.
pub const OPCODE_OP_32: u8 = 0x3b;

pub const PROBE_FUNCT7: u8 = 0x04;
pub const SHNADD_FUNCT7: u8 = 0x10;
pub const ADD_UW_FUNCT7: u8 = 0x04;

/// The (opcode, funct3, funct7) triple an encoding assigns to an op.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RFields {
    pub opcode: u8,
    pub funct3: u8,
    pub funct7: u8,
}

impl OpEncoding {
    pub const fn fields(self, op: ZbaOp) -> RFields {
        let funct3 = match op {
            ZbaOp::Sh1add => 0x2,
            ZbaOp::Sh2add => 0x4,
            ZbaOp::Sh3add => 0x6,
            ZbaOp::AddUw => 0x0,
        };
        match (self, op) {
            (OpEncoding::Probe, _) => RFields { opcode: OPCODE_OP, funct3, funct7: PROBE_FUNCT7 },
            (OpEncoding::Ratified, ZbaOp::AddUw) => {
                RFields { opcode: OPCODE_OP_32, funct3, funct7: ADD_UW_FUNCT7 }
            }
            (OpEncoding::Ratified, _) => RFields { opcode: OPCODE_OP, funct3, funct7: SHNADD_FUNCT7 },
        }
    }

    /// Inverse of [`OpEncoding::fields`] across both schemes.
    pub const fn decode(opcode: u8, funct3: u8, funct7: u8) -> Option<(ZbaOp, OpEncoding)> {
        match (opcode, funct7, funct3) {
            (OPCODE_OP, PROBE_FUNCT7, 0x0) => Some((ZbaOp::AddUw, OpEncoding::Probe)),
            (OPCODE_OP, PROBE_FUNCT7, 0x2) => Some((ZbaOp::Sh1add, OpEncoding::Probe)),
            (OPCODE_OP, PROBE_FUNCT7, 0x4) => Some((ZbaOp::Sh2add, OpEncoding::Probe)),
            (OPCODE_OP, PROBE_FUNCT7, 0x6) => Some((ZbaOp::Sh3add, OpEncoding::Probe)),
            (OPCODE_OP, SHNADD_FUNCT7, 0x2) => Some((ZbaOp::Sh1add, OpEncoding::Ratified)),
            (OPCODE_OP, SHNADD_FUNCT7, 0x4) => Some((ZbaOp::Sh2add, OpEncoding::Ratified)),
            (OPCODE_OP, SHNADD_FUNCT7, 0x6) => Some((ZbaOp::Sh3add, OpEncoding::Ratified)),
            (OPCODE_OP_32, ADD_UW_FUNCT7, 0x0) => Some((ZbaOp::AddUw, OpEncoding::Ratified)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_inputs_give_expected_results() {
        assert_eq!(ZbaOp::Sh1add.apply(5, 3), 11);
        assert_eq!(ZbaOp::Sh2add.apply(5, 3), 17);
        assert_eq!(ZbaOp::Sh3add.apply(5, 3), 29);
        assert_eq!(ZbaOp::AddUw.apply(5, 3), 8);
    }

    #[test]
    fn add_uw_discards_high_half_of_first_operand() {
        assert_eq!(ZbaOp::AddUw.apply(0xdead_beef_0000_0005, 3), 8);
        assert_eq!(ZbaOp::AddUw.apply(0xffff_ffff_ffff_ffff, 1), 0x1_0000_0000);
        // the second operand is used at full width
        assert_eq!(ZbaOp::AddUw.apply(1, 0xffff_0000_0000_0000), 0xffff_0000_0000_0001);
    }

    #[test]
    fn shifts_wrap_at_register_width() {
        assert_eq!(ZbaOp::Sh3add.apply(0, 0xe000_0000_0000_0001), 8);
        assert_eq!(ZbaOp::Sh1add.apply(7, 0x8000_0000_0000_0000), 7);
        assert_eq!(ZbaOp::Sh2add.apply(u64::MAX, 1), 3);
    }

    #[test]
    fn only_the_second_operand_is_shifted() {
        assert_eq!(ZbaOp::Sh1add.apply(1, 0), 1);
        assert_eq!(ZbaOp::Sh1add.apply(0, 1), 2);
        assert_eq!(ZbaOp::Sh2add.apply(0, 1), 4);
        assert_eq!(ZbaOp::Sh3add.apply(0, 1), 8);
        // swapping A and B gives a different answer
        assert_eq!(ZbaOp::Sh3add.apply(3, 5), 43);
    }

    #[test]
    fn index_matches_position_in_all() {
        for (i, op) in ZbaOp::ALL.into_iter().enumerate() {
            assert_eq!(op.index(), i);
        }
    }

    #[test]
    fn encodings_decode_back_to_their_op() {
        for encoding in [OpEncoding::Probe, OpEncoding::Ratified] {
            for op in ZbaOp::ALL {
                let f = encoding.fields(op);
                assert_eq!(OpEncoding::decode(f.opcode, f.funct3, f.funct7), Some((op, encoding)));
            }
        }
    }

    #[test]
    fn probe_selectors_match_the_guest_program() {
        assert_eq!(
            OpEncoding::Probe.fields(ZbaOp::Sh3add),
            RFields { opcode: 0x33, funct3: 0x6, funct7: 0x04 }
        );
        assert_eq!(
            OpEncoding::Probe.fields(ZbaOp::AddUw),
            RFields { opcode: 0x33, funct3: 0x0, funct7: 0x04 }
        );
        assert_eq!(OpEncoding::decode(0x33, 0x0, 0x00), None);
    }
}
