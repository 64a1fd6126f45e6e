//! The verifier routine as machine words.
//!
//! ```text
//!  0  addi x1, x0, 5          INIT
//!  1  addi x2, x0, 3
//!  2  sh1add x3, x1, x2       COMPUTE
//!  3  sh2add x4, x1, x2
//!  4  sh3add x5, x1, x2
//!  5  add.uw x6, x1, x2
//!  6  sd   x5, 0(x0)          STORE
//!  7  ld   x7, 0(x0)          LOAD
//!  8  beq  x7, x5, +8         COMPARE
//!  9  addi x7, x0, 0          FAIL
//! 10  jal  x0, 0              IDLE
//! ```

use types::encoding::{self, IDLE_LOOP};
use types::probe::{
    INPUT_A, INPUT_B, REG_A, REG_B, REG_R3, REG_STATUS, RESULTS, SCRATCH_ADDR, SENTINEL,
};
use types::{OpEncoding, ProbeState};

use crate::custom_op::CustomOp;

pub const WORD_COUNT: usize = 11;
pub const INSTRUCTION_BYTES: u64 = 4;

/// Word offsets at which each phase of the routine begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramLayout {
    pub compute: usize,
    pub store: usize,
    pub load: usize,
    pub compare: usize,
    pub fail: usize,
    pub idle: usize,
}

impl ProgramLayout {
    pub const PROBE: ProgramLayout =
        ProgramLayout { compute: 2, store: 6, load: 7, compare: 8, fail: 9, idle: 10 };

    /// Phase of the instruction at word offset `index`. Offsets past the idle loop are
    /// outside the routine and map to `None`.
    pub const fn state_at(&self, index: usize) -> Option<ProbeState> {
        if index < self.compute {
            Some(ProbeState::Init)
        } else if index < self.store {
            Some(ProbeState::Compute)
        } else if index < self.load {
            Some(ProbeState::Store)
        } else if index < self.compare {
            Some(ProbeState::Load)
        } else if index < self.fail {
            Some(ProbeState::Compare)
        } else if index < self.idle {
            Some(ProbeState::Fail)
        } else if index == self.idle {
            Some(ProbeState::Idle)
        } else {
            None
        }
    }

    /// Phase of the instruction at `pc` for an image placed at `base`.
    pub fn state_at_pc(&self, base: u64, pc: u64) -> Option<ProbeState> {
        let offset = pc.checked_sub(base)?;
        if offset % INSTRUCTION_BYTES != 0 {
            return None;
        }
        self.state_at((offset / INSTRUCTION_BYTES) as usize)
    }

    pub const fn idle_offset(&self) -> u64 {
        self.idle as u64 * INSTRUCTION_BYTES
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeImage {
    pub words: [u32; WORD_COUNT],
    pub layout: ProgramLayout,
    pub encoding: OpEncoding,
}

impl ProbeImage {
    pub fn to_bytes(&self) -> [u8; WORD_COUNT * 4] {
        let mut out = [0u8; WORD_COUNT * 4];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}

/// The four ops under test, bound to their result registers.
pub const fn custom_ops() -> [CustomOp; 4] {
    let mut ops = [CustomOp::new(RESULTS[0].0, RESULTS[0].1, REG_A, REG_B); 4];
    let mut i = 1;
    while i < RESULTS.len() {
        ops[i] = CustomOp::new(RESULTS[i].0, RESULTS[i].1, REG_A, REG_B);
        i += 1;
    }
    ops
}

/// Builds the routine with the custom ops expressed in `encoding`.
pub const fn assemble(encoding: OpEncoding) -> ProbeImage {
    let layout = ProgramLayout::PROBE;
    let ops = custom_ops();
    let scratch = SCRATCH_ADDR as i32;
    // beq jumps over the FAIL instruction straight to the idle loop
    let skip_fail = ((layout.idle - layout.compare) as u64 * INSTRUCTION_BYTES) as i32;

    let words = [
        encoding::li(REG_A, INPUT_A as i32),
        encoding::li(REG_B, INPUT_B as i32),
        ops[0].encode(encoding),
        ops[1].encode(encoding),
        ops[2].encode(encoding),
        ops[3].encode(encoding),
        encoding::sd(REG_R3, 0, scratch),
        encoding::ld(REG_STATUS, 0, scratch),
        encoding::beq(REG_STATUS, REG_R3, skip_fail),
        encoding::li(REG_STATUS, SENTINEL as i32),
        IDLE_LOOP,
    ];
    ProbeImage { words, layout, encoding }
}
