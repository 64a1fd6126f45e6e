/// Major opcodes (bits 6:0) of the 32-bit instructions the hart understands.
///
/// The set is deliberately small: integer immediates, 64-bit loads and stores, the
/// two equality branches, jumps, `lui`, `ebreak`, and the two register-register
/// opcode spaces the address-generation ops live in.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// LOAD (0x03): only `ld` is accepted.
    Load = 0x03,
    /// OP-IMM (0x13): only `addi` is accepted.
    OpImm = 0x13,
    /// STORE (0x23): only `sd` is accepted.
    Store = 0x23,
    /// OP (0x33): `sh1add`, `sh2add`, `sh3add` and the probe's custom selectors.
    Op = 0x33,
    /// LUI (0x37)
    Lui = 0x37,
    /// OP-32 (0x3b): ratified `add.uw`.
    Op32 = 0x3b,
    /// BRANCH (0x63): `beq` and `bne`.
    Branch = 0x63,
    /// JALR (0x67)
    Jalr = 0x67,
    /// JAL (0x6f)
    Jal = 0x6f,
    /// SYSTEM (0x73): only `ebreak` is accepted.
    System = 0x73,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        use Opcode::*;
        Some(match value {
            0x03 => Load,
            0x13 => OpImm,
            0x23 => Store,
            0x33 => Op,
            0x37 => Lui,
            0x3b => Op32,
            0x63 => Branch,
            0x67 => Jalr,
            0x6f => Jal,
            0x73 => System,
            _ => return None,
        })
    }
}

/// Compressed instruction classes, keyed on funct3 (bits 15:13) and the quadrant
/// (bits 1:0). Only the classes a probe build can emit are listed.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressedOpcode {
    /// C.ADDI / C.NOP (funct3 = 0b000, quadrant 1)
    Addi,
    /// C.LI (funct3 = 0b010, quadrant 1)
    Li,
    /// C.J (funct3 = 0b101, quadrant 1)
    J,
    /// C.MV, C.ADD, C.JR, C.JALR, C.EBREAK (funct3 = 0b100, quadrant 2).
    /// Only C.EBREAK is accepted.
    RegOrJump,
}

impl CompressedOpcode {
    pub fn from_bits(funct3: u16, quadrant: u16) -> Option<Self> {
        match (funct3, quadrant) {
            (0b000, 0b01) => Some(Self::Addi),
            (0b010, 0b01) => Some(Self::Li),
            (0b101, 0b01) => Some(Self::J),
            (0b100, 0b10) => Some(Self::RegOrJump),
            _ => None,
        }
    }
}
