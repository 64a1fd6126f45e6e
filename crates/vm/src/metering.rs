use std::cell::RefCell;
use std::rc::Rc;

use crate::instruction::Instruction;

/// Outcome returned by metering hooks to indicate whether execution should continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterResult {
    Continue,
    Halt,
}

/// Identifies the type of memory access being observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryAccessKind {
    Load,
    Store,
}

/// Pluggable observation interface. Implementors can count, record or cut off
/// execution without changing the hart itself. All methods default to continue.
///
/// Hooks run before the effect they describe; returning `Halt` suppresses it.
pub trait Metering: std::fmt::Debug {
    /// Called once per fetched and decoded instruction.
    fn on_instruction(&mut self, _pc: u64, _instr: &Instruction, _size: u8) -> MeterResult {
        MeterResult::Continue
    }

    /// Called for each guest load or store with its width.
    fn on_memory_access(
        &mut self,
        _kind: MemoryAccessKind,
        _addr: u64,
        _bytes: usize,
    ) -> MeterResult {
        MeterResult::Continue
    }

    /// Called when a general-purpose register other than x0 is written.
    fn on_register_write(&mut self, _reg: usize, _value: u64) -> MeterResult {
        MeterResult::Continue
    }
}

/// Default metering that performs no accounting.
#[derive(Debug, Default)]
pub struct NoopMeter;

impl Metering for NoopMeter {}

/// A single memory access as seen by the meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAccess {
    pub seq: usize,
    pub kind: MemoryAccessKind,
    pub addr: u64,
    pub bytes: usize,
}

/// Records every memory access and register write in program order.
///
/// The log lives behind a shared handle so the caller can keep reading it after the
/// meter has been handed to the VM.
#[derive(Debug, Default, Clone)]
pub struct AccessLog {
    accesses: Rc<RefCell<Vec<MemoryAccess>>>,
    writes: Rc<RefCell<Vec<(usize, u64)>>>,
    seq: usize,
}

impl AccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accesses(&self) -> Rc<RefCell<Vec<MemoryAccess>>> {
        Rc::clone(&self.accesses)
    }

    pub fn register_writes(&self) -> Rc<RefCell<Vec<(usize, u64)>>> {
        Rc::clone(&self.writes)
    }
}

impl Metering for AccessLog {
    fn on_memory_access(&mut self, kind: MemoryAccessKind, addr: u64, bytes: usize) -> MeterResult {
        self.accesses.borrow_mut().push(MemoryAccess { seq: self.seq, kind, addr, bytes });
        self.seq += 1;
        MeterResult::Continue
    }

    fn on_register_write(&mut self, reg: usize, value: u64) -> MeterResult {
        self.writes.borrow_mut().push((reg, value));
        self.seq += 1;
        MeterResult::Continue
    }
}

/// Halts the hart once a fixed number of instructions has been executed.
#[derive(Debug)]
pub struct StepBudget {
    remaining: u64,
}

impl StepBudget {
    pub fn new(limit: u64) -> Self {
        Self { remaining: limit }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Metering for StepBudget {
    fn on_instruction(&mut self, _pc: u64, _instr: &Instruction, _size: u8) -> MeterResult {
        if self.remaining == 0 {
            return MeterResult::Halt;
        }
        self.remaining -= 1;
        MeterResult::Continue
    }
}
