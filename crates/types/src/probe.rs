//! Fixed inputs, expected outputs and the register binding of the verifier routine.
//!
//! An external observer reads the final architectural state through these bindings,
//! so they are part of the probe's contract and must match the guest program.

use crate::zba::ZbaOp;

pub const INPUT_A: u64 = 5;
pub const INPUT_B: u64 = 3;

/// Address of the scratch cell that R3 is stored to and reloaded from.
pub const SCRATCH_ADDR: u64 = 0;
/// Width of the scratch cell; stores and loads are full 64-bit accesses.
pub const SCRATCH_BYTES: usize = 8;

/// Written to the status register when the reload does not match.
pub const SENTINEL: u64 = 0;

/// Register index that receives a value.
pub type RegIndex = u8;

pub const REG_A: RegIndex = 1;
pub const REG_B: RegIndex = 2;
pub const REG_R1: RegIndex = 3;
pub const REG_R2: RegIndex = 4;
pub const REG_R3: RegIndex = 5;
pub const REG_R4: RegIndex = 6;
/// Holds the reloaded scratch value and doubles as the status register.
pub const REG_STATUS: RegIndex = 7;

/// The op computed into each result register, in program order.
pub const RESULTS: [(ZbaOp, RegIndex); 4] = [
    (ZbaOp::Sh1add, REG_R1),
    (ZbaOp::Sh2add, REG_R2),
    (ZbaOp::Sh3add, REG_R3),
    (ZbaOp::AddUw, REG_R4),
];

/// The op whose result goes through the store/reload round trip.
pub const STORED_OP: ZbaOp = ZbaOp::Sh3add;

/// Expected value of `op` for the probe inputs.
pub const fn expected(op: ZbaOp) -> u64 {
    op.apply(INPUT_A, INPUT_B)
}

pub const EXPECTED_R1: u64 = expected(ZbaOp::Sh1add);
pub const EXPECTED_R2: u64 = expected(ZbaOp::Sh2add);
pub const EXPECTED_R3: u64 = expected(ZbaOp::Sh3add);
pub const EXPECTED_R4: u64 = expected(ZbaOp::AddUw);

/// Name an observer would use for a bound register.
pub const fn binding_name(reg: RegIndex) -> Option<&'static str> {
    match reg {
        REG_A => Some("A"),
        REG_B => Some("B"),
        REG_R1 => Some("R1"),
        REG_R2 => Some("R2"),
        REG_R3 => Some("R3"),
        REG_R4 => Some("R4"),
        REG_STATUS => Some("status"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_vector() {
        assert_eq!([EXPECTED_R1, EXPECTED_R2, EXPECTED_R3, EXPECTED_R4], [11, 17, 29, 8]);
    }

    #[test]
    fn sentinel_is_never_a_correct_result() {
        for (op, _) in RESULTS {
            assert_ne!(expected(op), SENTINEL, "{} collides with the sentinel", op.mnemonic());
        }
    }

    #[test]
    fn bindings_are_distinct_and_avoid_x0() {
        let regs = [REG_A, REG_B, REG_R1, REG_R2, REG_R3, REG_R4, REG_STATUS];
        for (i, r) in regs.iter().enumerate() {
            assert_ne!(*r, 0);
            assert!(binding_name(*r).is_some());
            assert!(!regs[i + 1..].contains(r));
        }
        assert_eq!(binding_name(0), None);
    }

    #[test]
    fn scratch_cell_is_word_aligned() {
        assert_eq!(SCRATCH_ADDR % SCRATCH_BYTES as u64, 0);
    }
}
