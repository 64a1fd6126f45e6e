//! Bare-metal probe image.
//!
//! `_start` is the whole program: no stack, no runtime initialization, no return. The
//! custom ops are emitted as raw `.insn r` words so the assembler does not need to know
//! them. Build with `--features binaries` for a `riscv64*-unknown-none-elf` target.

#![no_std]
#![no_main]

use core::arch::global_asm;

use types::probe::{
    INPUT_A, INPUT_B, REG_A, REG_B, REG_R1, REG_R2, REG_R3, REG_R4, REG_STATUS, SCRATCH_ADDR,
    SENTINEL,
};
use types::{OpEncoding, ZbaOp};

const SH1ADD: types::zba::RFields = OpEncoding::Probe.fields(ZbaOp::Sh1add);
const SH2ADD: types::zba::RFields = OpEncoding::Probe.fields(ZbaOp::Sh2add);
const SH3ADD: types::zba::RFields = OpEncoding::Probe.fields(ZbaOp::Sh3add);
const ADD_UW: types::zba::RFields = OpEncoding::Probe.fields(ZbaOp::AddUw);

global_asm!(
    ".pushsection .text.init, \"ax\"",
    ".globl _start",
    "_start:",
    ".option push",
    ".option norvc",
    "li x{a}, {input_a}",
    "li x{b}, {input_b}",
    ".insn r {op1}, {f3_1}, {f7_1}, x{r1}, x{a}, x{b}",
    ".insn r {op2}, {f3_2}, {f7_2}, x{r2}, x{a}, x{b}",
    ".insn r {op3}, {f3_3}, {f7_3}, x{r3}, x{a}, x{b}",
    ".insn r {op4}, {f3_4}, {f7_4}, x{r4}, x{a}, x{b}",
    "sd x{r3}, {scratch}(x0)",
    "ld x{status}, {scratch}(x0)",
    "beq x{status}, x{r3}, .Lidle",
    "li x{status}, {sentinel}",
    ".Lidle:",
    "j .Lidle",
    ".option pop",
    ".popsection",
    a = const REG_A,
    b = const REG_B,
    r1 = const REG_R1,
    r2 = const REG_R2,
    r3 = const REG_R3,
    r4 = const REG_R4,
    status = const REG_STATUS,
    input_a = const INPUT_A,
    input_b = const INPUT_B,
    scratch = const SCRATCH_ADDR,
    sentinel = const SENTINEL,
    op1 = const SH1ADD.opcode,
    f3_1 = const SH1ADD.funct3,
    f7_1 = const SH1ADD.funct7,
    op2 = const SH2ADD.opcode,
    f3_2 = const SH2ADD.funct3,
    f7_2 = const SH2ADD.funct7,
    op3 = const SH3ADD.opcode,
    f3_3 = const SH3ADD.funct3,
    f7_3 = const SH3ADD.funct7,
    op4 = const ADD_UW.opcode,
    f3_4 = const ADD_UW.funct3,
    f7_4 = const ADD_UW.funct7,
);

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}
