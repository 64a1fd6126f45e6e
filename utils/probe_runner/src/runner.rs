use anyhow::{Context, Result};
use loader::LoadedImage;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use types::probe::SCRATCH_BYTES;
use types::{OpEncoding, ReferenceUnit, ZbaOp, ZbaUnit};
use vm::fault::{CorruptingMemory, ShiftDroppedUnit};
use vm::memory::Memory;
use vm::{probe_memory, DEFAULT_CODE_BASE, VM};

use crate::report::Report;

pub use types::probe::SCRATCH_ADDR;
pub const SCRATCH_END: u64 = SCRATCH_ADDR + SCRATCH_BYTES as u64;

/// Bits flipped in the doubleword read back from the scratch cell.
pub const CORRUPTION_MASK: u64 = 0x1;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingArg {
    /// Custom selectors (opcode 0x33, funct7 0x04)
    Probe,
    /// Ratified Zba encodings
    Ratified,
}

impl From<EncodingArg> for OpEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Probe => OpEncoding::Probe,
            EncodingArg::Ratified => OpEncoding::Ratified,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultArg {
    None,
    /// sh3add computes rs1 + rs2
    Sh3addNoShift,
    /// Loads from the scratch cell come back with bit 0 flipped
    MemoryCorrupt,
}

impl FaultArg {
    pub fn name(self) -> &'static str {
        match self {
            FaultArg::None => "none",
            FaultArg::Sh3addNoShift => "sh3add-no-shift",
            FaultArg::MemoryCorrupt => "memory-corrupt",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub elf: Option<PathBuf>,
    pub encoding: OpEncoding,
    pub fault: FaultArg,
    pub max_steps: u64,
}

/// An image ready to be placed on the hart, with a label saying where it came from.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub source: String,
    pub image: LoadedImage,
}

pub struct Execution {
    pub report: Report,
    pub vm: VM,
}

pub fn encoding_name(encoding: OpEncoding) -> &'static str {
    match encoding {
        OpEncoding::Probe => "probe",
        OpEncoding::Ratified => "ratified",
    }
}

/// Reads the ELF named in `config`, or assembles the built-in image.
pub fn prepare(config: &RunConfig) -> Result<Prepared> {
    match &config.elf {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let image = loader::load_image(&bytes)
                .with_context(|| format!("failed to load {}", path.display()))?;
            Ok(Prepared { source: path.display().to_string(), image })
        }
        None => {
            let probe = probe::image::assemble(config.encoding);
            Ok(Prepared {
                source: format!("built-in ({} encoding)", encoding_name(config.encoding)),
                image: LoadedImage {
                    base: DEFAULT_CODE_BASE,
                    code: probe.to_bytes().to_vec(),
                    entry: DEFAULT_CODE_BASE,
                },
            })
        }
    }
}

/// Places the image on a fresh hart with the requested fault and runs it.
pub fn execute(config: &RunConfig, prepared: Prepared) -> Result<Execution> {
    let Prepared { source, image } = prepared;

    let map = probe_memory(image.base, image.code.len()).with_context(|| {
        format!(
            "code at 0x{:x}..0x{:x} cannot be mapped next to the scratch cell",
            image.base,
            image.end()
        )
    })?;

    let unit: Box<dyn ZbaUnit> = match config.fault {
        FaultArg::Sh3addNoShift => Box::new(ShiftDroppedUnit::new(ZbaOp::Sh3add)),
        _ => Box::new(ReferenceUnit),
    };
    let memory: Box<dyn Memory> = match config.fault {
        FaultArg::MemoryCorrupt => {
            Box::new(CorruptingMemory::new(map, SCRATCH_ADDR, CORRUPTION_MASK))
        }
        _ => Box::new(map),
    };

    let mut vm = VM::new(memory, unit);
    vm.load_image(image.base, &image.code, image.entry)
        .context("failed to place the image")?;

    info!(
        source = %source,
        fault = config.fault.name(),
        entry = format_args!("0x{:08x}", image.entry),
        "running probe"
    );
    let summary = vm.run(config.max_steps);

    let report = Report::new(source, config.fault.name(), &image, &summary);
    Ok(Execution { report, vm })
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{ProbeState, Verdict};

    fn config(fault: FaultArg) -> RunConfig {
        RunConfig { elf: None, encoding: OpEncoding::Probe, fault, max_steps: 64 }
    }

    fn run(config: &RunConfig) -> Execution {
        let prepared = prepare(config).unwrap();
        execute(config, prepared).unwrap()
    }

    #[test]
    fn test_builtin_image_passes() {
        let exec = run(&config(FaultArg::None));
        let report = &exec.report;
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.steps, 10);
        assert_eq!(report.state.status, 29);
        assert_eq!(report.state.scratch, 29);
        assert!(report.mismatches.is_empty());
        assert!(report.trap.is_none());
    }

    #[test]
    fn test_ratified_image_passes() {
        let cfg = RunConfig { encoding: OpEncoding::Ratified, ..config(FaultArg::None) };
        let exec = run(&cfg);
        assert_eq!(exec.report.verdict, Verdict::Pass);
        assert_eq!(exec.report.source, "built-in (ratified encoding)");
    }

    #[test]
    fn test_dropped_shift_passes_routine_but_is_reported() {
        let exec = run(&config(FaultArg::Sh3addNoShift));
        let report = &exec.report;
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.state.r3, 8);
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].op, "sh3add");
        assert_eq!(report.mismatches[0].expected, 29);
        assert_eq!(report.mismatches[0].actual, 8);
    }

    #[test]
    fn test_memory_corruption_fails() {
        let exec = run(&config(FaultArg::MemoryCorrupt));
        let report = &exec.report;
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.steps, 11);
        assert_eq!(report.state.status, 0);
        assert_eq!(report.state.scratch, 29);
        assert_eq!(report.state.phase, ProbeState::Idle);
    }

    #[test]
    fn test_step_limit_is_not_idle() {
        let cfg = RunConfig { max_steps: 3, ..config(FaultArg::None) };
        let exec = run(&cfg);
        assert_eq!(exec.report.verdict, Verdict::NotIdle);
        assert_eq!(exec.report.outcome, "step-limit");
        assert_eq!(exec.report.state.phase, ProbeState::Compute);
    }

    #[test]
    fn test_missing_elf_is_an_error() {
        let cfg = RunConfig {
            elf: Some(PathBuf::from("/nonexistent/zba_probe.elf")),
            ..config(FaultArg::None)
        };
        let err = prepare(&cfg).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read"));
    }

    #[test]
    fn test_dumps_after_run() {
        let exec = run(&config(FaultArg::None));
        let regs = exec.vm.dump_registers();
        assert!(regs.contains("x05 (t0  ) = 0x000000000000001d (29)"));
        let scratch = exec.vm.dump_memory(SCRATCH_ADDR, SCRATCH_END).unwrap();
        assert!(scratch.starts_with("00000000  1d 00 00 00 00 00 00 00"));
    }
}
