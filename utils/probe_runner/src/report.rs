use colored::*;
use loader::LoadedImage;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Write};
use types::{FinalState, ProbeState, Verdict, ZbaOp};
use vm::{RunSummary, StepOutcome};

use crate::runner::Prepared;

fn as_display<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Bound registers and scratch cell as the observer read them.
#[derive(Debug, Clone, Serialize)]
pub struct StateReport {
    pub a: u64,
    pub b: u64,
    pub r1: u64,
    pub r2: u64,
    pub r3: u64,
    pub r4: u64,
    pub status: u64,
    pub scratch: u64,
    #[serde(serialize_with = "as_display")]
    pub phase: ProbeState,
}

impl From<&FinalState> for StateReport {
    fn from(state: &FinalState) -> Self {
        Self {
            a: state.a,
            b: state.b,
            r1: state.r1,
            r2: state.r2,
            r3: state.r3,
            r4: state.r4,
            status: state.status,
            scratch: state.scratch,
            phase: state.state,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MismatchReport {
    pub op: &'static str,
    pub expected: u64,
    pub actual: u64,
}

/// Everything one run produced, in a form that renders as text or JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub source: String,
    pub fault: &'static str,
    pub base: u64,
    pub entry: u64,
    /// Little-endian image bytes, hex encoded.
    pub image: String,
    pub steps: u64,
    pub outcome: &'static str,
    pub trap: Option<String>,
    pub state: StateReport,
    #[serde(serialize_with = "as_display")]
    pub verdict: Verdict,
    /// Results that disagree with their expected constants, whatever the routine said.
    pub mismatches: Vec<MismatchReport>,
}

fn outcome_name(summary: &RunSummary) -> &'static str {
    match (summary.outcome, summary.trap) {
        (_, Some(_)) => "trap",
        (StepOutcome::Idle, None) => "idle",
        (StepOutcome::Halted, None) => "halted",
        (StepOutcome::Continue, None) => "step-limit",
    }
}

impl Report {
    pub fn new(
        source: String,
        fault: &'static str,
        image: &LoadedImage,
        summary: &RunSummary,
    ) -> Self {
        let mismatches = summary
            .state
            .mismatches()
            .map(|m| MismatchReport { op: m.op.mnemonic(), expected: m.expected, actual: m.actual })
            .collect();

        Self {
            source,
            fault,
            base: image.base,
            entry: image.entry,
            image: hex::encode(&image.code),
            steps: summary.steps,
            outcome: outcome_name(summary),
            trap: summary.trap.map(|t| t.to_string()),
            state: StateReport::from(&summary.state),
            verdict: summary.state.verdict(),
            mismatches,
        }
    }

    fn result_line(&self, out: &mut String, label: &str, op: ZbaOp, actual: u64) {
        let status = match self.mismatches.iter().find(|m| m.op == op.mnemonic()) {
            Some(m) => format!("expected {}", m.expected).red().to_string(),
            None => "ok".green().to_string(),
        };
        let _ = writeln!(out, "  {:<2} = {:<6} {:<7} {}", label, actual, op.mnemonic(), status);
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {}", "Zba probe:".bold().blue(), self.source);
        let _ = writeln!(
            out,
            "  entry 0x{:08x}, fault {}, {} steps, {}",
            self.entry, self.fault, self.steps, self.outcome
        );
        if let Some(trap) = &self.trap {
            let _ = writeln!(out, "  {} {}", "trap:".red().bold(), trap);
        }

        let s = &self.state;
        let _ = writeln!(out, "  A  = {:<6} B = {}", s.a, s.b);
        self.result_line(&mut out, "R1", ZbaOp::Sh1add, s.r1);
        self.result_line(&mut out, "R2", ZbaOp::Sh2add, s.r2);
        self.result_line(&mut out, "R3", ZbaOp::Sh3add, s.r3);
        self.result_line(&mut out, "R4", ZbaOp::AddUw, s.r4);
        let _ = writeln!(out, "  status  = {}", s.status);
        let _ = writeln!(out, "  scratch = {}", s.scratch);
        let _ = writeln!(out, "  phase   = {}", s.phase);

        let verdict = match self.verdict {
            Verdict::Pass => self.verdict.to_string().green().bold(),
            Verdict::Fail => self.verdict.to_string().red().bold(),
            Verdict::NotIdle => self.verdict.to_string().yellow().bold(),
        };
        let _ = writeln!(out, "{} {}", "Verdict:".bold(), verdict);

        if self.verdict == Verdict::Pass && !self.mismatches.is_empty() {
            let _ = writeln!(
                out,
                "{}",
                "warning: the routine passed with wrong results".yellow()
            );
        }
        out
    }
}

/// Disassembly listing of an image, one instruction per line.
pub fn disassemble(prepared: &Prepared) -> String {
    let image = &prepared.image;
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Disassembly".bold());

    let mut offset = 0usize;
    while offset < image.code.len() {
        let addr = image.base + offset as u64;
        let marker = if addr == image.entry { ">" } else { " " };
        match vm::decoder::decode(&image.code[offset..]) {
            Some((instr, size)) => {
                let raw = &image.code[offset..offset + size as usize];
                let _ = writeln!(
                    out,
                    "{}{:08x}:  {:<8}  {}",
                    marker,
                    addr,
                    hex::encode(raw),
                    instr.pretty_print()
                );
                offset += size as usize;
            }
            None => {
                let end = (offset + 2).min(image.code.len());
                let _ = writeln!(
                    out,
                    "{}{:08x}:  {:<8}  {}",
                    marker,
                    addr,
                    hex::encode(&image.code[offset..end]),
                    "<unknown>".red()
                );
                offset = end;
            }
        }
    }
    out
}
