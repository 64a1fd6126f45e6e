use thiserror::Error;

/// Synchronous exceptions the hart can raise.
///
/// None of these are handled inside the guest: the probe installs no trap vector, so a
/// trap ends the run and is reported to the host as-is.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    #[error("illegal instruction 0x{word:08x} at pc 0x{pc:016x}")]
    IllegalInstruction { pc: u64, word: u32 },

    #[error("instruction access fault at 0x{addr:016x}")]
    FetchFault { addr: u64 },

    #[error("load access fault at 0x{addr:016x}")]
    LoadFault { addr: u64 },

    #[error("store access fault at 0x{addr:016x}")]
    StoreFault { addr: u64 },

    #[error("misaligned {width}-byte access at 0x{addr:016x}")]
    Misaligned { addr: u64, width: u8 },
}
