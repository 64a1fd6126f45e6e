use core::fmt;

use crate::probe::{
    self, REG_A, REG_B, REG_R1, REG_R2, REG_R3, REG_R4, REG_STATUS, SENTINEL,
};
use crate::zba::ZbaOp;

/// Phases of the verifier routine.
///
/// `Idle` is terminal: its only successor is itself, and nothing leads back to `Init`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProbeState {
    Init,
    Compute,
    Store,
    Load,
    Compare,
    Fail,
    Idle,
}

impl ProbeState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, ProbeState::Idle)
    }

    /// States reachable in one transition.
    pub const fn successors(self) -> &'static [ProbeState] {
        match self {
            ProbeState::Init => &[ProbeState::Compute],
            ProbeState::Compute => &[ProbeState::Store],
            ProbeState::Store => &[ProbeState::Load],
            ProbeState::Load => &[ProbeState::Compare],
            ProbeState::Compare => &[ProbeState::Idle, ProbeState::Fail],
            ProbeState::Fail => &[ProbeState::Idle],
            ProbeState::Idle => &[ProbeState::Idle],
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ProbeState::Init => "INIT",
            ProbeState::Compute => "COMPUTE",
            ProbeState::Store => "STORE",
            ProbeState::Load => "LOAD",
            ProbeState::Compare => "COMPARE",
            ProbeState::Fail => "FAIL",
            ProbeState::Idle => "IDLE",
        }
    }
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the routine itself signals through its final state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Idle with the status register holding the instruction-derived value.
    Pass,
    /// Idle with the status register forced to the sentinel.
    Fail,
    /// The routine never reached its terminal state.
    NotIdle,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::NotIdle => "NOT IDLE",
        })
    }
}

/// Snapshot of everything an external observer inspects after the probe settles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinalState {
    pub a: u64,
    pub b: u64,
    pub r1: u64,
    pub r2: u64,
    pub r3: u64,
    pub r4: u64,
    pub status: u64,
    pub scratch: u64,
    pub state: ProbeState,
}

/// A result register that disagrees with the independently computed constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub op: ZbaOp,
    pub expected: u64,
    pub actual: u64,
}

impl FinalState {
    /// Reads the bound registers out of a full register file.
    pub fn from_registers(regs: &[u64; 32], scratch: u64, state: ProbeState) -> Self {
        let r = |i: u8| regs[i as usize];
        Self {
            a: r(REG_A),
            b: r(REG_B),
            r1: r(REG_R1),
            r2: r(REG_R2),
            r3: r(REG_R3),
            r4: r(REG_R4),
            status: r(REG_STATUS),
            scratch,
            state,
        }
    }

    /// The state a correct implementation settles in.
    pub const fn nominal() -> Self {
        Self {
            a: probe::INPUT_A,
            b: probe::INPUT_B,
            r1: probe::EXPECTED_R1,
            r2: probe::EXPECTED_R2,
            r3: probe::EXPECTED_R3,
            r4: probe::EXPECTED_R4,
            status: probe::EXPECTED_R3,
            scratch: probe::EXPECTED_R3,
            state: ProbeState::Idle,
        }
    }

    pub const fn result(&self, op: ZbaOp) -> u64 {
        match op {
            ZbaOp::Sh1add => self.r1,
            ZbaOp::Sh2add => self.r2,
            ZbaOp::Sh3add => self.r3,
            ZbaOp::AddUw => self.r4,
        }
    }

    /// Pass/fail exactly as the routine reports it.
    ///
    /// Only the status register and the terminal state are consulted. A result that
    /// is wrong but survives the round trip still reads as `Pass`.
    pub fn verdict(&self) -> Verdict {
        if !self.state.is_terminal() {
            Verdict::NotIdle
        } else if self.status == SENTINEL {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }

    /// Harness-side comparison of each result against its expected constant.
    ///
    /// This is what an observer can add on top of the routine; it does not feed back
    /// into [`FinalState::verdict`].
    pub fn mismatches(&self) -> impl Iterator<Item = Mismatch> + '_ {
        ZbaOp::ALL.into_iter().filter_map(move |op| {
            let expected = probe::expected(op);
            let actual = self.result(op);
            (expected != actual).then_some(Mismatch { op, expected, actual })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_the_only_terminal_state() {
        assert!(ProbeState::Idle.is_terminal());
        assert_eq!(ProbeState::Idle.successors(), &[ProbeState::Idle]);
        let all = [
            ProbeState::Init,
            ProbeState::Compute,
            ProbeState::Store,
            ProbeState::Load,
            ProbeState::Compare,
            ProbeState::Fail,
        ];
        for state in all {
            assert!(!state.is_terminal());
            assert!(!state.successors().contains(&ProbeState::Init));
        }
    }

    #[test]
    fn nominal_state_passes_with_no_mismatches() {
        let state = FinalState::nominal();
        assert_eq!(state.verdict(), Verdict::Pass);
        assert_eq!(state.mismatches().count(), 0);
    }

    #[test]
    fn sentinel_status_fails() {
        let state = FinalState { status: SENTINEL, ..FinalState::nominal() };
        assert_eq!(state.verdict(), Verdict::Fail);
    }

    #[test]
    fn unsettled_probe_is_not_idle_even_with_good_status() {
        let state = FinalState { state: ProbeState::Compare, ..FinalState::nominal() };
        assert_eq!(state.verdict(), Verdict::NotIdle);
    }

    #[test]
    fn self_consistent_wrong_result_still_passes_but_is_reported() {
        let state = FinalState { r3: 8, status: 8, scratch: 8, ..FinalState::nominal() };
        assert_eq!(state.verdict(), Verdict::Pass);
        let found: [Option<Mismatch>; 2] = {
            let mut it = state.mismatches();
            [it.next(), it.next()]
        };
        assert_eq!(found[0], Some(Mismatch { op: ZbaOp::Sh3add, expected: 29, actual: 8 }));
        assert_eq!(found[1], None);
    }

    #[test]
    fn reads_bound_registers() {
        let mut regs = [0u64; 32];
        for (i, reg) in regs.iter_mut().enumerate() {
            *reg = 100 + i as u64;
        }
        let state = FinalState::from_registers(&regs, 42, ProbeState::Idle);
        assert_eq!((state.a, state.b), (101, 102));
        assert_eq!((state.r1, state.r2, state.r3, state.r4), (103, 104, 105, 106));
        assert_eq!(state.status, 107);
        assert_eq!(state.scratch, 42);
    }
}
