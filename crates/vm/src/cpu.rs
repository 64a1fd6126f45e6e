use std::fmt;

use tracing::{debug, warn};
use types::{ReferenceUnit, ZbaUnit};

use crate::decoder::{decode_compressed, decode_full, is_compressed};
use crate::instruction::Instruction;
use crate::memory::Memory;
use crate::metering::{MemoryAccessKind, MeterResult, Metering};
use crate::registers::Registers;
use crate::trap::Trap;

/// What a single step left the hart doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The instruction retired and the pc moved on.
    Continue,
    /// The pc sits on a `j .` self-loop. Nothing was changed and nothing ever will be.
    Idle,
    /// Execution stopped on `ebreak` or because a meter asked for it.
    Halted,
}

/// A single RV64 hart.
///
/// The address-generation ops are computed by a pluggable [`ZbaUnit`]; everything
/// else is hard-wired. Memory and metering are passed into each step so the hart owns
/// nothing but its architectural state.
pub struct CPU {
    /// Address of the next instruction to fetch.
    pub pc: u64,
    pub regs: Registers,
    unit: Box<dyn ZbaUnit>,
}

impl fmt::Debug for CPU {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CPU")
            .field("pc", &format_args!("0x{:x}", self.pc))
            .field("regs", &self.regs)
            .finish_non_exhaustive()
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new(Box::new(ReferenceUnit))
    }
}

impl CPU {
    pub fn new(unit: Box<dyn ZbaUnit>) -> Self {
        Self { pc: 0, regs: Registers::default(), unit }
    }

    pub fn set_unit(&mut self, unit: Box<dyn ZbaUnit>) {
        self.unit = unit;
    }

    /// Fetches and decodes the instruction at `pc`.
    ///
    /// Only the first halfword is fetched for compressed instructions, so a 2-byte
    /// instruction at the very end of a region still decodes.
    pub fn next_instruction(&self, memory: &dyn Memory) -> Result<(Instruction, u8), Trap> {
        let pc = self.pc;
        let hword = memory.fetch_u16(pc)?;
        if is_compressed(hword) {
            return decode_compressed(hword)
                .map(|inst| (inst, 2))
                .ok_or(Trap::IllegalInstruction { pc, word: hword as u32 });
        }
        let word = memory.fetch_u32(pc)?;
        decode_full(word)
            .map(|inst| (inst, 4))
            .ok_or(Trap::IllegalInstruction { pc, word })
    }

    /// Executes a single instruction cycle (fetch, decode, execute).
    ///
    /// A `j .` self-loop is recognized before it executes and reported as
    /// [`StepOutcome::Idle`] with the pc left where it is. On a trap the pc still points
    /// at the faulting instruction.
    pub fn step(
        &mut self,
        memory: &mut dyn Memory,
        meter: &mut dyn Metering,
    ) -> Result<StepOutcome, Trap> {
        let (instr, size) = self.next_instruction(memory).inspect_err(|trap| {
            warn!(pc = format_args!("0x{:08x}", self.pc), %trap, "fetch failed");
        })?;

        debug!(pc = format_args!("0x{:08x}", self.pc), "{}", instr.pretty_print());

        if meter.on_instruction(self.pc, &instr, size) == MeterResult::Halt {
            return Ok(StepOutcome::Halted);
        }
        if instr.is_idle_loop() {
            return Ok(StepOutcome::Idle);
        }

        self.execute(instr, size, memory, meter).inspect_err(|trap| {
            warn!(pc = format_args!("0x{:08x}", self.pc), %trap, "trap");
        })
    }

    fn write_reg(&mut self, rd: usize, value: u64, meter: &mut dyn Metering) -> MeterResult {
        if rd == 0 {
            return MeterResult::Continue;
        }
        if meter.on_register_write(rd, value) == MeterResult::Halt {
            return MeterResult::Halt;
        }
        self.regs.write(rd, value);
        MeterResult::Continue
    }

    /// Executes a decoded instruction and advances the pc.
    pub fn execute(
        &mut self,
        instr: Instruction,
        size: u8,
        memory: &mut dyn Memory,
        meter: &mut dyn Metering,
    ) -> Result<StepOutcome, Trap> {
        let pc = self.pc;
        let mut next_pc = pc.wrapping_add(size as u64);

        let result = match instr {
            Instruction::Addi { rd, rs1, imm } => {
                let value = self.regs.read(rs1).wrapping_add(imm as i64 as u64);
                self.write_reg(rd, value, meter)
            }

            Instruction::Ld { rd, rs1, offset } => {
                let addr = self.regs.read(rs1).wrapping_add(offset as i64 as u64);
                if meter.on_memory_access(MemoryAccessKind::Load, addr, 8) == MeterResult::Halt {
                    return Ok(StepOutcome::Halted);
                }
                let value = memory.load_u64(addr)?;
                self.write_reg(rd, value, meter)
            }
            Instruction::Sd { rs1, rs2, offset } => {
                let addr = self.regs.read(rs1).wrapping_add(offset as i64 as u64);
                if meter.on_memory_access(MemoryAccessKind::Store, addr, 8) == MeterResult::Halt {
                    return Ok(StepOutcome::Halted);
                }
                memory.store_u64(addr, self.regs.read(rs2))?;
                MeterResult::Continue
            }

            Instruction::Beq { rs1, rs2, offset } => {
                if self.regs.read(rs1) == self.regs.read(rs2) {
                    next_pc = pc.wrapping_add(offset as i64 as u64);
                }
                MeterResult::Continue
            }
            Instruction::Bne { rs1, rs2, offset } => {
                if self.regs.read(rs1) != self.regs.read(rs2) {
                    next_pc = pc.wrapping_add(offset as i64 as u64);
                }
                MeterResult::Continue
            }

            Instruction::Jal { rd, offset } => {
                next_pc = pc.wrapping_add(offset as i64 as u64);
                self.write_reg(rd, pc.wrapping_add(size as u64), meter)
            }
            Instruction::Jalr { rd, rs1, offset } => {
                // target is computed before rd is written, rd may alias rs1
                let target = self.regs.read(rs1).wrapping_add(offset as i64 as u64) & !1;
                next_pc = target;
                self.write_reg(rd, pc.wrapping_add(size as u64), meter)
            }

            Instruction::Lui { rd, imm } => self.write_reg(rd, imm as i64 as u64, meter),

            Instruction::Ebreak => return Ok(StepOutcome::Halted),

            Instruction::Zba { op, rd, rs1, rs2, .. } => {
                let value = self.unit.compute(op, self.regs.read(rs1), self.regs.read(rs2));
                self.write_reg(rd, value, meter)
            }
        };

        if result == MeterResult::Halt {
            return Ok(StepOutcome::Halted);
        }
        self.pc = next_pc;
        Ok(StepOutcome::Continue)
    }
}
