//! Deliberately broken components for exercising the probe's failure modes.

use std::fmt;

use types::{ZbaOp, ZbaUnit};

use crate::memory::{Access, Memory};
use crate::trap::Trap;

/// An arithmetic unit that forgets the shift for one op: `shNadd` computes
/// `rs1 + rs2`. All other ops keep their reference semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftDroppedUnit {
    pub op: ZbaOp,
}

impl ShiftDroppedUnit {
    pub fn new(op: ZbaOp) -> Self {
        Self { op }
    }
}

impl ZbaUnit for ShiftDroppedUnit {
    fn compute(&self, op: ZbaOp, rs1: u64, rs2: u64) -> u64 {
        if op == self.op {
            rs1.wrapping_add(rs2)
        } else {
            op.apply(rs1, rs2)
        }
    }
}

/// Wraps a memory so that guest doubleword loads of one address come back with some
/// bits flipped. Stores, fetches and host reads are unaffected, so the stored value
/// stays visible to an observer.
pub struct CorruptingMemory<M> {
    inner: M,
    addr: u64,
    mask: u64,
}

impl<M: Memory> CorruptingMemory<M> {
    pub fn new(inner: M, addr: u64, mask: u64) -> Self {
        Self { inner, addr, mask }
    }
}

impl<M: Memory> fmt::Debug for CorruptingMemory<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorruptingMemory")
            .field("inner", &self.inner)
            .field("addr", &format_args!("0x{:x}", self.addr))
            .field("mask", &format_args!("0x{:x}", self.mask))
            .finish()
    }
}

impl<M: Memory> Memory for CorruptingMemory<M> {
    fn read(&self, addr: u64, buf: &mut [u8], access: Access) -> Result<(), Trap> {
        self.inner.read(addr, buf, access)?;
        if access == Access::Load && addr == self.addr && buf.len() == 8 {
            for (byte, flip) in buf.iter_mut().zip(self.mask.to_le_bytes()) {
                *byte ^= flip;
            }
        }
        Ok(())
    }

    fn write(&mut self, addr: u64, data: &[u8], access: Access) -> Result<(), Trap> {
        self.inner.write(addr, data, access)
    }
}
