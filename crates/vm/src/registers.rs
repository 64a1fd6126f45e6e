pub const REG_COUNT: usize = 32;

/// ABI mnemonics for x0..x31.
pub const ABI_NAMES: [&str; REG_COUNT] = [
    "zero", "ra",  "sp",  "gp",  "tp",  "t0",  "t1",  "t2",
    "s0",   "s1",  "a0",  "a1",  "a2",  "a3",  "a4",  "a5",
    "a6",   "a7",  "s2",  "s3",  "s4",  "s5",  "s6",  "s7",
    "s8",   "s9",  "s10", "s11", "t3",  "t4",  "t5",  "t6",
];

/// Register file of one hart. x0 reads as zero and ignores writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    regs: [u64; REG_COUNT],
}

impl Default for Registers {
    fn default() -> Self {
        Self { regs: [0; REG_COUNT] }
    }
}

impl Registers {
    pub fn read(&self, reg: usize) -> u64 {
        self.regs[reg & 0x1f]
    }

    /// Returns whether the write took effect.
    pub fn write(&mut self, reg: usize, value: u64) -> bool {
        let reg = reg & 0x1f;
        if reg == 0 {
            return false;
        }
        self.regs[reg] = value;
        true
    }

    pub fn as_array(&self) -> &[u64; REG_COUNT] {
        &self.regs
    }
}
