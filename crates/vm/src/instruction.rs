use types::{OpEncoding, ZbaOp};

/// Decoded form of every instruction the hart executes.
///
/// This covers what the verifier routine and its bare-metal build are made of, not
/// RV64 as a whole. Compressed words decode into the same variants as their 32-bit
/// expansions, so execution never needs to know which form it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Add immediate: rd = rs1 + imm (also `li`, `nop`, `c.li`, `c.addi`, `c.nop`)
    Addi { rd: usize, rs1: usize, imm: i32 },

    /// Load doubleword: rd = *(rs1 + offset) as u64
    Ld { rd: usize, rs1: usize, offset: i32 },
    /// Store doubleword: *(rs1 + offset) = rs2
    Sd { rs1: usize, rs2: usize, offset: i32 },

    /// Branch if equal: if (rs1 == rs2) pc += offset
    Beq { rs1: usize, rs2: usize, offset: i32 },
    /// Branch if not equal
    Bne { rs1: usize, rs2: usize, offset: i32 },

    /// Jump and link: rd = pc + size; pc += offset (also `j`, `c.j`)
    Jal { rd: usize, offset: i32 },
    /// Jump and link register: pc = (rs1 + offset) & !1; rd = return address
    Jalr { rd: usize, rs1: usize, offset: i32 },

    /// Load upper immediate: rd = sign_extend(imm), where imm already holds bits 31:12
    Lui { rd: usize, imm: i32 },

    /// Breakpoint (also `c.ebreak`)
    Ebreak,

    /// One of the address-generation ops, tagged with the encoding it was decoded from.
    Zba { op: ZbaOp, encoding: OpEncoding, rd: usize, rs1: usize, rs2: usize },
}

impl Instruction {
    /// The self-loop the routine idles in: a jump with no link and no displacement.
    pub fn is_idle_loop(&self) -> bool {
        matches!(self, Instruction::Jal { rd: 0, offset: 0 })
    }

    pub fn pretty_print(&self) -> String {
        fn reg(r: usize) -> String {
            format!("x{}", r)
        }

        match self {
            Instruction::Addi { rd: 0, rs1: 0, imm: 0 } => "nop".to_string(),
            Instruction::Addi { rd, rs1: 0, imm } => format!("li   {}, {}", reg(*rd), imm),
            Instruction::Addi { rd, rs1, imm } =>
                format!("addi {}, {}, {}", reg(*rd), reg(*rs1), imm),

            Instruction::Ld { rd, rs1, offset } =>
                format!("ld   {}, {}({})", reg(*rd), offset, reg(*rs1)),
            Instruction::Sd { rs1, rs2, offset } =>
                format!("sd   {}, {}({})", reg(*rs2), offset, reg(*rs1)),

            Instruction::Beq { rs1, rs2, offset } =>
                format!("beq  {}, {}, pc{:+}", reg(*rs1), reg(*rs2), offset),
            Instruction::Bne { rs1, rs2, offset } =>
                format!("bne  {}, {}, pc{:+}", reg(*rs1), reg(*rs2), offset),

            Instruction::Jal { rd: 0, offset: 0 } => "j    .".to_string(),
            Instruction::Jal { rd, offset } => format!("jal  {}, pc{:+}", reg(*rd), offset),
            Instruction::Jalr { rd, rs1, offset } =>
                format!("jalr {}, {}({})", reg(*rd), offset, reg(*rs1)),

            Instruction::Lui { rd, imm } =>
                format!("lui  {}, 0x{:x}", reg(*rd), (*imm as u32) >> 12),

            Instruction::Ebreak => "ebreak".to_string(),

            Instruction::Zba { op, encoding, rd, rs1, rs2 } => {
                let suffix = match encoding {
                    OpEncoding::Probe => " [custom]",
                    OpEncoding::Ratified => "",
                };
                format!("{:<6} {}, {}, {}{}", op.mnemonic(), reg(*rd), reg(*rs1), reg(*rs2), suffix)
            }
        }
    }
}
