use std::fmt::Write;

use probe::ProgramLayout;
use tracing::info;
use types::probe::{SCRATCH_ADDR, SCRATCH_BYTES};
use types::{FinalState, ProbeState, ZbaUnit};

use crate::cpu::{StepOutcome, CPU};
use crate::memory::{Access, Memory, MemoryMap, Perms, Region};
use crate::metering::{Metering, NoopMeter};
use crate::registers::ABI_NAMES;
use crate::trap::Trap;

/// Where the bare-metal probe is linked, and where built-in images are placed.
pub const DEFAULT_CODE_BASE: u64 = 0x8000_0000;

/// The memory a probe run needs: the scratch cell and a read-only, executable code
/// region. Returns `None` if the two would overlap.
pub fn probe_memory(code_base: u64, code_len: usize) -> Option<MemoryMap> {
    MemoryMap::new()
        .with_region(Region::new("scratch", SCRATCH_ADDR, SCRATCH_BYTES, Perms::rw()))?
        .with_region(Region::new("code", code_base, code_len, Perms::rx()))
}

/// How a [`VM::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Instructions fetched, including the one the hart idled on.
    pub steps: u64,
    /// `Continue` means the step limit ran out first.
    pub outcome: StepOutcome,
    pub trap: Option<Trap>,
    pub state: FinalState,
}

/// One hart plus the memory and meter it runs against.
pub struct VM {
    pub cpu: CPU,
    memory: Box<dyn Memory>,
    meter: Box<dyn Metering>,
    routine_base: u64,
    settled: bool,
    last_state: ProbeState,
}

impl VM {
    pub fn new(memory: Box<dyn Memory>, unit: Box<dyn ZbaUnit>) -> Self {
        Self {
            cpu: CPU::new(unit),
            memory,
            meter: Box::new(NoopMeter),
            routine_base: 0,
            settled: false,
            last_state: ProbeState::Init,
        }
    }

    pub fn with_meter(mut self, meter: Box<dyn Metering>) -> Self {
        self.meter = meter;
        self
    }

    /// Copies `code` to `base` and points the pc at `entry`, which is also taken as
    /// the first instruction of the routine.
    pub fn load_image(&mut self, base: u64, code: &[u8], entry: u64) -> Result<(), Trap> {
        self.memory.write(base, code, Access::Host)?;
        self.cpu.pc = entry;
        self.routine_base = entry;
        self.settled = false;
        self.last_state = ProbeState::Init;
        Ok(())
    }

    pub fn memory(&self) -> &dyn Memory {
        self.memory.as_ref()
    }

    pub fn step(&mut self) -> Result<StepOutcome, Trap> {
        if let Some(state) = self.probe_state() {
            self.last_state = state;
        }
        let outcome = self.cpu.step(self.memory.as_mut(), self.meter.as_mut())?;
        if outcome == StepOutcome::Idle {
            self.settled = true;
        }
        Ok(outcome)
    }

    /// Steps until the hart idles, halts, traps, or `max_steps` instructions have been
    /// fetched.
    pub fn run(&mut self, max_steps: u64) -> RunSummary {
        let mut steps = 0;
        let mut outcome = StepOutcome::Continue;
        let mut trap = None;

        while steps < max_steps {
            steps += 1;
            match self.step() {
                Ok(StepOutcome::Continue) => {}
                Ok(done) => {
                    outcome = done;
                    break;
                }
                Err(err) => {
                    trap = Some(err);
                    break;
                }
            }
        }

        if outcome == StepOutcome::Idle {
            info!(steps, pc = format_args!("0x{:08x}", self.cpu.pc), "hart idle");
        }

        RunSummary { steps, outcome, trap, state: self.final_state() }
    }

    /// Phase of the routine the pc is in, or `None` once it has left the routine.
    pub fn probe_state(&self) -> Option<ProbeState> {
        ProgramLayout::PROBE.state_at_pc(self.routine_base, self.cpu.pc)
    }

    /// Architectural state as an external observer would read it.
    pub fn final_state(&self) -> FinalState {
        let state = if self.settled {
            ProbeState::Idle
        } else {
            self.probe_state().unwrap_or(self.last_state)
        };
        // an unmapped scratch cell reads as zero
        let scratch = self.memory.peek_u64(SCRATCH_ADDR).unwrap_or(0);
        FinalState::from_registers(self.cpu.regs.as_array(), scratch, state)
    }

    pub fn dump_registers(&self) -> String {
        let mut out = String::new();
        for (i, name) in ABI_NAMES.iter().enumerate() {
            let val = self.cpu.regs.read(i);
            let _ = writeln!(out, "x{:02} ({:<4}) = 0x{:016x} ({})", i, name, val, val);
        }
        let _ = writeln!(out, "pc          = 0x{:016x}", self.cpu.pc);
        out
    }

    pub fn dump_memory(&self, start: u64, end: u64) -> Result<String, Trap> {
        let mut out = String::new();
        let mut addr = start;
        while addr < end {
            let len = (end - addr).min(16) as usize;
            let mut line = vec![0u8; len];
            self.memory.read(addr, &mut line, Access::Host)?;

            let hex: Vec<String> = line.iter().map(|b| format!("{:02x}", b)).collect();
            let ascii: String = line
                .iter()
                .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
                .collect();
            let _ = writeln!(out, "{:08x}  {:<47}  |{}|", addr, hex.join(" "), ascii);
            addr += len as u64;
        }
        Ok(out)
    }
}
