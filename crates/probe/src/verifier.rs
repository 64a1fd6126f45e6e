//! Hosted rendition of the verifier routine.
//!
//! Each call to [`Verifier::step`] performs the work of one phase and moves to the next,
//! following the same transitions as the machine-word image. Arithmetic goes through a
//! [`ZbaUnit`] and the scratch cell through a [`ScratchCell`], so either can be replaced
//! by a faulty implementation.

use types::probe::{INPUT_A, INPUT_B, SENTINEL, STORED_OP};
use types::{FinalState, ProbeState, ZbaOp, ZbaUnit};

/// The single memory location the routine writes and reads back.
pub trait ScratchCell {
    fn store(&mut self, value: u64);
    fn load(&mut self) -> u64;
    /// What the cell holds, read without side effects.
    fn peek(&self) -> u64;
}

/// A cell that returns exactly what was stored.
impl ScratchCell for u64 {
    fn store(&mut self, value: u64) {
        *self = value;
    }

    fn load(&mut self) -> u64 {
        *self
    }

    fn peek(&self) -> u64 {
        *self
    }
}

pub struct Verifier<'a, U: ZbaUnit + ?Sized, C: ScratchCell + ?Sized> {
    unit: &'a U,
    cell: &'a mut C,
    state: ProbeState,
    a: u64,
    b: u64,
    /// Indexed by [`ZbaOp::index`].
    results: [u64; 4],
    status: u64,
}

impl<'a, U: ZbaUnit + ?Sized, C: ScratchCell + ?Sized> Verifier<'a, U, C> {
    pub fn new(unit: &'a U, cell: &'a mut C) -> Self {
        Self {
            unit,
            cell,
            state: ProbeState::Init,
            a: 0,
            b: 0,
            results: [0; 4],
            status: 0,
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Runs the current phase and returns the phase that follows it.
    pub fn step(&mut self) -> ProbeState {
        self.state = match self.state {
            ProbeState::Init => {
                self.a = INPUT_A;
                self.b = INPUT_B;
                ProbeState::Compute
            }
            ProbeState::Compute => {
                for op in ZbaOp::ALL {
                    self.results[op.index()] = self.unit.compute(op, self.a, self.b);
                }
                ProbeState::Store
            }
            ProbeState::Store => {
                let value = self.result(STORED_OP);
                self.cell.store(value);
                ProbeState::Load
            }
            ProbeState::Load => {
                self.status = self.cell.load();
                ProbeState::Compare
            }
            ProbeState::Compare => {
                if self.status == self.result(STORED_OP) {
                    ProbeState::Idle
                } else {
                    ProbeState::Fail
                }
            }
            ProbeState::Fail => {
                self.status = SENTINEL;
                ProbeState::Idle
            }
            ProbeState::Idle => ProbeState::Idle,
        };
        self.state
    }

    /// Steps until the routine settles in IDLE.
    pub fn run(&mut self) -> FinalState {
        while !self.state.is_terminal() {
            self.step();
        }
        self.final_state()
    }

    /// Snapshot with the scratch value read back from the cell itself.
    pub fn final_state(&self) -> FinalState {
        FinalState {
            a: self.a,
            b: self.b,
            r1: self.result(ZbaOp::Sh1add),
            r2: self.result(ZbaOp::Sh2add),
            r3: self.result(ZbaOp::Sh3add),
            r4: self.result(ZbaOp::AddUw),
            status: self.status,
            scratch: self.cell.peek(),
            state: self.state,
        }
    }

    fn result(&self, op: ZbaOp) -> u64 {
        self.results[op.index()]
    }
}
