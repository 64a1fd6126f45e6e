//! Word encoders for the handful of RV64 formats the probe is written in.
//!
//! Register numbers are masked to 5 bits and immediates to their field width; callers
//! are expected to pass values that fit.

use crate::zba::{OpEncoding, ZbaOp};

pub const OPCODE_LOAD: u32 = 0x03;
pub const OPCODE_OP_IMM: u32 = 0x13;
pub const OPCODE_STORE: u32 = 0x23;
pub const OPCODE_LUI: u32 = 0x37;
pub const OPCODE_BRANCH: u32 = 0x63;
pub const OPCODE_JALR: u32 = 0x67;
pub const OPCODE_JAL: u32 = 0x6f;
pub const OPCODE_SYSTEM: u32 = 0x73;

pub const FUNCT3_ADDI: u32 = 0x0;
pub const FUNCT3_DOUBLEWORD: u32 = 0x3;
pub const FUNCT3_BEQ: u32 = 0x0;
pub const FUNCT3_BNE: u32 = 0x1;

/// `ebreak`
pub const EBREAK: u32 = 0x0010_0073;

const fn reg(r: u8) -> u32 {
    (r & 0x1f) as u32
}

/// The `.insn r opcode, funct3, funct7, rd, rs1, rs2` mapping.
pub const fn r_type(opcode: u8, funct3: u8, funct7: u8, rd: u8, rs1: u8, rs2: u8) -> u32 {
    ((funct7 as u32 & 0x7f) << 25)
        | (reg(rs2) << 20)
        | (reg(rs1) << 15)
        | ((funct3 as u32 & 0x7) << 12)
        | (reg(rd) << 7)
        | (opcode as u32 & 0x7f)
}

pub const fn i_type(opcode: u32, funct3: u32, rd: u8, rs1: u8, imm: i32) -> u32 {
    (((imm as u32) & 0xfff) << 20) | (reg(rs1) << 15) | (funct3 << 12) | (reg(rd) << 7) | opcode
}

pub const fn s_type(opcode: u32, funct3: u32, rs1: u8, rs2: u8, imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7f) << 25)
        | (reg(rs2) << 20)
        | (reg(rs1) << 15)
        | (funct3 << 12)
        | ((imm & 0x1f) << 7)
        | opcode
}

/// Branch offsets are byte offsets from the branch itself and must be even.
pub const fn b_type(funct3: u32, rs1: u8, rs2: u8, offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 12) & 0x1) << 31)
        | (((imm >> 5) & 0x3f) << 25)
        | (reg(rs2) << 20)
        | (reg(rs1) << 15)
        | (funct3 << 12)
        | (((imm >> 1) & 0xf) << 8)
        | (((imm >> 11) & 0x1) << 7)
        | OPCODE_BRANCH
}

pub const fn j_type(rd: u8, offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 20) & 0x1) << 31)
        | (((imm >> 1) & 0x3ff) << 21)
        | (((imm >> 11) & 0x1) << 20)
        | (((imm >> 12) & 0xff) << 12)
        | (reg(rd) << 7)
        | OPCODE_JAL
}

pub const fn addi(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(OPCODE_OP_IMM, FUNCT3_ADDI, rd, rs1, imm)
}

/// `li rd, imm` for immediates that fit in 12 bits.
pub const fn li(rd: u8, imm: i32) -> u32 {
    addi(rd, 0, imm)
}

pub const fn ld(rd: u8, rs1: u8, offset: i32) -> u32 {
    i_type(OPCODE_LOAD, FUNCT3_DOUBLEWORD, rd, rs1, offset)
}

pub const fn sd(rs2: u8, rs1: u8, offset: i32) -> u32 {
    s_type(OPCODE_STORE, FUNCT3_DOUBLEWORD, rs1, rs2, offset)
}

pub const fn beq(rs1: u8, rs2: u8, offset: i32) -> u32 {
    b_type(FUNCT3_BEQ, rs1, rs2, offset)
}

pub const fn bne(rs1: u8, rs2: u8, offset: i32) -> u32 {
    b_type(FUNCT3_BNE, rs1, rs2, offset)
}

pub const fn jal(rd: u8, offset: i32) -> u32 {
    j_type(rd, offset)
}

/// `j .`, the idle self-loop.
pub const IDLE_LOOP: u32 = jal(0, 0);

pub const fn zba(encoding: OpEncoding, op: ZbaOp, rd: u8, rs1: u8, rs2: u8) -> u32 {
    let f = encoding.fields(op);
    r_type(f.opcode, f.funct3, f.funct7, rd, rs1, rs2)
}
