#![cfg_attr(not(test), no_std)]

//! The verifier routine in its three forms: typed custom ops and their encoder, the
//! assembled machine-code image, and a hosted state machine with the same contract.

pub mod custom_op;
pub use custom_op::CustomOp;

pub mod image;
pub use image::{ProbeImage, ProgramLayout};

pub mod verifier;
pub use verifier::{ScratchCell, Verifier};
