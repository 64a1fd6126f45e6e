//! A single RV64 hart that runs the address-generation probe.

pub mod cpu;
pub mod decoder;
pub mod fault;
pub mod instruction;
pub mod isa;
pub mod memory;
pub mod metering;
pub mod registers;
pub mod trap;
pub mod vm;

pub use cpu::{StepOutcome, CPU};
pub use trap::Trap;
pub use vm::{probe_memory, RunSummary, DEFAULT_CODE_BASE, VM};
