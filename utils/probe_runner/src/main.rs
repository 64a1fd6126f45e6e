use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::Level;

mod report;
mod runner;

use runner::{EncodingArg, FaultArg, RunConfig};
use types::Verdict;

/// Runs the address-generation probe on a model hart and reports what an external
/// observer would see once it settles.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run a cross-compiled probe ELF instead of the built-in image
    #[arg(short, long)]
    elf: Option<PathBuf>,

    /// Encoding of the custom ops in the built-in image
    #[arg(long, value_enum, default_value_t = EncodingArg::Probe)]
    encoding: EncodingArg,

    /// Fault to inject into the hart
    #[arg(long, value_enum, default_value_t = FaultArg::None)]
    fault: FaultArg,

    /// Give up after this many instructions
    #[arg(long, default_value_t = 64)]
    max_steps: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Print the disassembled image before running it
    #[arg(short, long)]
    disassemble: bool,

    /// Print register and scratch dumps after the run
    #[arg(long)]
    dump: bool,

    /// Raise the log level (-v info, -vv per-instruction trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(verdict) => std::process::exit(exit_code(verdict)),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<Verdict> {
    if args.max_steps == 0 {
        anyhow::bail!("--max-steps must be at least 1");
    }
    if args.elf.is_some() && args.encoding != EncodingArg::Probe {
        tracing::warn!("--encoding only applies to the built-in image, ignoring it");
    }

    let config = RunConfig {
        elf: args.elf.clone(),
        encoding: args.encoding.into(),
        fault: args.fault,
        max_steps: args.max_steps,
    };

    let image = runner::prepare(&config)?;
    if args.disassemble && args.format == Format::Text {
        print!("{}", report::disassemble(&image));
    }

    let execution = runner::execute(&config, image)?;
    let report = &execution.report;

    match args.format {
        Format::Text => print!("{}", report.render_text()),
        Format::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }

    if args.dump && args.format == Format::Text {
        println!();
        println!("{}", "Registers".bold());
        print!("{}", execution.vm.dump_registers());
        println!("{}", "Scratch".bold());
        print!("{}", execution.vm.dump_memory(runner::SCRATCH_ADDR, runner::SCRATCH_END)?);
    }

    Ok(report.verdict)
}

fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Fail => 1,
        Verdict::NotIdle => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Verdict::Pass), 0);
        assert_eq!(exit_code(Verdict::Fail), 1);
        assert_eq!(exit_code(Verdict::NotIdle), 2);
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["probe_runner"]);
        assert_eq!(args.encoding, EncodingArg::Probe);
        assert_eq!(args.fault, FaultArg::None);
        assert_eq!(args.max_steps, 64);
        assert_eq!(args.format, Format::Text);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_args_parse_kebab_case_values() {
        let args = Args::parse_from([
            "probe_runner",
            "--fault",
            "sh3add-no-shift",
            "--encoding",
            "ratified",
            "--format",
            "json",
            "-vv",
        ]);
        assert_eq!(args.fault, FaultArg::Sh3addNoShift);
        assert_eq!(args.encoding, EncodingArg::Ratified);
        assert_eq!(args.format, Format::Json);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_zero_step_budget_is_rejected() {
        let args = Args::parse_from(["probe_runner", "--max-steps", "0"]);
        assert!(run(&args).is_err());
    }
}
