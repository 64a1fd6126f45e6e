#![cfg_attr(not(test), no_std)]

//! Vocabulary shared by the guest probe, the hart model and the runner.

pub mod zba;
pub use zba::{OpEncoding, ReferenceUnit, ZbaOp, ZbaUnit};

pub mod encoding;

pub mod probe;

pub mod state;
pub use state::{FinalState, Mismatch, ProbeState, Verdict};
