use types::encoding::EBREAK;
use types::OpEncoding;

use crate::instruction::Instruction;
use crate::isa::{CompressedOpcode, Opcode};

/// Unified decoder for either a 16-bit compressed or a 32-bit instruction.
///
/// Compressed words have their bottom 2 bits != 0b11, so the first halfword is
/// enough to tell how many bytes the instruction takes.
///
/// Returns `Some((instruction, size))` with `size` being 2 or 4, or `None` if the
/// bytes are too short or do not encode an instruction the hart executes.
pub fn decode(bytes: &[u8]) -> Option<(Instruction, u8)> {
    if bytes.len() < 2 {
        return None;
    }

    let hword = u16::from_le_bytes([bytes[0], bytes[1]]);
    if is_compressed(hword) {
        decode_compressed(hword).map(|inst| (inst, 2))
    } else if bytes.len() >= 4 {
        let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        decode_full(word).map(|inst| (inst, 4))
    } else {
        None
    }
}

pub fn is_compressed(hword: u16) -> bool {
    (hword & 0b11) != 0b11
}

/// Decodes a 32-bit instruction word.
///
/// ```text
/// 31:25  funct7
/// 24:20  rs2
/// 19:15  rs1
/// 14:12  funct3
/// 11:7   rd
/// 6:0    opcode
/// ```
///
/// OP and OP-32 words are resolved through [`OpEncoding::decode`], which accepts both
/// the probe's custom selectors and the ratified ones. Every other register-register
/// op is rejected.
pub fn decode_full(word: u32) -> Option<Instruction> {
    let opcode = Opcode::from_u8((word & 0x7f) as u8)?;

    let rd = ((word >> 7) & 0x1f) as usize;
    let funct3 = ((word >> 12) & 0x07) as u8;
    let rs1 = ((word >> 15) & 0x1f) as usize;
    let rs2 = ((word >> 20) & 0x1f) as usize;
    let funct7 = ((word >> 25) & 0x7f) as u8;

    match opcode {
        Opcode::Op | Opcode::Op32 => {
            let (op, encoding) = OpEncoding::decode(opcode as u8, funct3, funct7)?;
            Some(Instruction::Zba { op, encoding, rd, rs1, rs2 })
        }

        Opcode::OpImm => match funct3 {
            0x0 => Some(Instruction::Addi { rd, rs1, imm: (word as i32) >> 20 }),
            _ => None,
        },

        Opcode::Load => match funct3 {
            0x3 => Some(Instruction::Ld { rd, rs1, offset: (word as i32) >> 20 }),
            _ => None,
        },

        Opcode::Store => {
            let imm11_5 = ((word >> 25) & 0x7f) << 5;
            let imm4_0 = (word >> 7) & 0x1f;
            let offset = ((imm11_5 | imm4_0) as i32) << 20 >> 20;
            match funct3 {
                0x3 => Some(Instruction::Sd { rs1, rs2, offset }),
                _ => None,
            }
        }

        Opcode::Branch => {
            let offset = extract_branch_offset(word);
            match funct3 {
                0x0 => Some(Instruction::Beq { rs1, rs2, offset }),
                0x1 => Some(Instruction::Bne { rs1, rs2, offset }),
                _ => None,
            }
        }

        Opcode::Jal => Some(Instruction::Jal { rd, offset: extract_jal_offset(word) }),

        Opcode::Jalr => match funct3 {
            0x0 => Some(Instruction::Jalr { rd, rs1, offset: (word as i32) >> 20 }),
            _ => None,
        },

        Opcode::Lui => Some(Instruction::Lui { rd, imm: (word & 0xffff_f000) as i32 }),

        Opcode::System => (word == EBREAK).then_some(Instruction::Ebreak),
    }
}

/// Decodes a 16-bit compressed instruction into its 32-bit equivalent.
pub fn decode_compressed(hword: u16) -> Option<Instruction> {
    let funct3 = (hword >> 13) & 0b111;
    let quadrant = hword & 0b11;
    let rd = ((hword >> 7) & 0x1f) as usize;
    let rs2 = ((hword >> 2) & 0x1f) as usize;

    match CompressedOpcode::from_bits(funct3, quadrant)? {
        // c.nop is c.addi with rd = x0 and imm = 0
        CompressedOpcode::Addi => Some(Instruction::Addi { rd, rs1: rd, imm: decode_ci_imm(hword) }),

        CompressedOpcode::Li => {
            if rd == 0 {
                return None;
            }
            Some(Instruction::Addi { rd, rs1: 0, imm: decode_ci_imm(hword) })
        }

        CompressedOpcode::J => Some(Instruction::Jal { rd: 0, offset: decode_cj_imm(hword) }),

        CompressedOpcode::RegOrJump => {
            let bit12 = (hword >> 12) & 0x1;
            match (bit12, rd, rs2) {
                (1, 0, 0) => Some(Instruction::Ebreak),
                _ => None,
            }
        }
    }
}

/// 6-bit signed immediate of the CI format: imm[5] at bit 12, imm[4:0] at bits 6:2.
fn decode_ci_imm(hword: u16) -> i32 {
    let imm = (((hword >> 2) & 0b11111) | (((hword >> 12) & 0x1) << 5)) as i32;
    (imm << 26) >> 26
}

fn decode_cj_imm(hword: u16) -> i32 {
    let imm = (
        ((hword >> 12) & 0b1) << 11 |
        ((hword >> 11) & 0b1) << 4  |
        ((hword >> 9)  & 0b11) << 8 |
        ((hword >> 8)  & 0b1) << 10 |
        ((hword >> 7)  & 0b1) << 6  |
        ((hword >> 6)  & 0b1) << 7  |
        ((hword >> 3)  & 0b111) << 1 |
        ((hword >> 2)  & 0b1) << 5
    ) as i32;
    (imm << 20) >> 20
}

fn extract_branch_offset(word: u32) -> i32 {
    let imm12 = ((word >> 31) & 0x1) << 12;
    let imm10_5 = ((word >> 25) & 0x3f) << 5;
    let imm4_1 = ((word >> 8) & 0xf) << 1;
    let imm11 = ((word >> 7) & 0x1) << 11;
    let imm = (imm12 | imm11 | imm10_5 | imm4_1) as i32;
    (imm << 19) >> 19
}

fn extract_jal_offset(word: u32) -> i32 {
    let imm20 = ((word >> 31) & 0x1) << 20;
    let imm10_1 = ((word >> 21) & 0x3ff) << 1;
    let imm11 = ((word >> 20) & 0x1) << 11;
    let imm19_12 = ((word >> 12) & 0xff) << 12;
    let imm = (imm20 | imm19_12 | imm11 | imm10_1) as i32;
    (imm << 11) >> 11
}
