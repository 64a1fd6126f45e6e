use std::fmt;

use crate::trap::Trap;

/// Who is touching memory. Guest accesses are permission-checked; host accesses
/// (image loading, inspection after the run) are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Fetch,
    Load,
    Store,
    Host,
}

impl Access {
    fn fault(self, addr: u64, write: bool) -> Trap {
        match self {
            Access::Fetch => Trap::FetchFault { addr },
            Access::Store => Trap::StoreFault { addr },
            Access::Host if write => Trap::StoreFault { addr },
            Access::Load | Access::Host => Trap::LoadFault { addr },
        }
    }
}

/// Physical memory as seen by the hart.
///
/// Implementors only provide byte-range reads and writes; the sized accessors the
/// CPU uses are derived from them. Wrappers can intercept either primitive to model
/// a misbehaving memory subsystem.
pub trait Memory: fmt::Debug {
    fn read(&self, addr: u64, buf: &mut [u8], access: Access) -> Result<(), Trap>;

    fn write(&mut self, addr: u64, data: &[u8], access: Access) -> Result<(), Trap>;

    /// Full-width guest load. The address must be 8-byte aligned.
    fn load_u64(&self, addr: u64) -> Result<u64, Trap> {
        check_alignment(addr, 8)?;
        let mut buf = [0u8; 8];
        self.read(addr, &mut buf, Access::Load)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Full-width guest store. The address must be 8-byte aligned.
    fn store_u64(&mut self, addr: u64, value: u64) -> Result<(), Trap> {
        check_alignment(addr, 8)?;
        self.write(addr, &value.to_le_bytes(), Access::Store)
    }

    fn fetch_u16(&self, pc: u64) -> Result<u16, Trap> {
        check_alignment(pc, 2)?;
        let mut buf = [0u8; 2];
        self.read(pc, &mut buf, Access::Fetch)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn fetch_u32(&self, pc: u64) -> Result<u32, Trap> {
        check_alignment(pc, 2)?;
        let mut buf = [0u8; 4];
        self.read(pc, &mut buf, Access::Fetch)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Reads a doubleword the way an external debugger would.
    fn peek_u64(&self, addr: u64) -> Result<u64, Trap> {
        let mut buf = [0u8; 8];
        self.read(addr, &mut buf, Access::Host)?;
        Ok(u64::from_le_bytes(buf))
    }
}

fn check_alignment(addr: u64, width: u8) -> Result<(), Trap> {
    if addr % width as u64 != 0 {
        return Err(Trap::Misaligned { addr, width });
    }
    Ok(())
}

/// Simple permission bits for a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Perms {
    pub read: bool,
    pub write: bool,
    pub exec: bool,
}

impl Perms {
    pub const fn new(read: bool, write: bool, exec: bool) -> Self {
        Self { read, write, exec }
    }

    pub const fn rx() -> Self {
        Self::new(true, false, true)
    }

    pub const fn rw() -> Self {
        Self::new(true, true, false)
    }

    fn allows(&self, access: Access) -> bool {
        match access {
            Access::Fetch => self.exec,
            Access::Load => self.read,
            Access::Store => self.write,
            Access::Host => true,
        }
    }
}

#[derive(Clone)]
pub struct Region {
    pub name: &'static str,
    pub base: u64,
    pub perms: Perms,
    pub bytes: Vec<u8>,
}

impl Region {
    pub fn new(name: &'static str, base: u64, size: usize, perms: Perms) -> Self {
        Self { name, base, perms, bytes: vec![0u8; size] }
    }

    /// One past the last byte, saturating at the top of the address space.
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.bytes.len() as u64)
    }

    /// Byte range of `[addr, addr + len)` inside this region, if it fits entirely.
    fn span(&self, addr: u64, len: usize) -> Option<std::ops::Range<usize>> {
        let start = addr.checked_sub(self.base)?;
        let end = start.checked_add(len as u64)?;
        if end > self.bytes.len() as u64 {
            return None;
        }
        Some(start as usize..end as usize)
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.name)
            .field("base", &format_args!("0x{:x}", self.base))
            .field("size", &self.bytes.len())
            .field("perms", &self.perms)
            .finish()
    }
}

/// A set of non-overlapping regions. Accesses must fall entirely inside one region;
/// anything else, including holes between regions, faults.
#[derive(Debug, Clone, Default)]
pub struct MemoryMap {
    regions: Vec<Region>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a zero-filled region. Returns `None` if it would overlap an existing one or
    /// run past the top of the address space.
    pub fn with_region(mut self, region: Region) -> Option<Self> {
        region.base.checked_add(region.bytes.len() as u64)?;
        let overlaps = self
            .regions
            .iter()
            .any(|r| region.base < r.end() && r.base < region.end());
        if overlaps {
            return None;
        }
        self.regions.push(region);
        self.regions.sort_by_key(|r| r.base);
        Some(self)
    }

    fn locate(&self, addr: u64, len: usize) -> Option<(usize, std::ops::Range<usize>)> {
        self.regions
            .iter()
            .enumerate()
            .find_map(|(i, r)| r.span(addr, len).map(|span| (i, span)))
    }
}

impl Memory for MemoryMap {
    fn read(&self, addr: u64, buf: &mut [u8], access: Access) -> Result<(), Trap> {
        let (index, span) = self.locate(addr, buf.len()).ok_or(access.fault(addr, false))?;
        let region = &self.regions[index];
        if !region.perms.allows(access) {
            return Err(access.fault(addr, false));
        }
        buf.copy_from_slice(&region.bytes[span]);
        Ok(())
    }

    fn write(&mut self, addr: u64, data: &[u8], access: Access) -> Result<(), Trap> {
        let (index, span) = self.locate(addr, data.len()).ok_or(access.fault(addr, true))?;
        let region = &mut self.regions[index];
        if !region.perms.allows(access) {
            return Err(access.fault(addr, true));
        }
        region.bytes[span].copy_from_slice(data);
        Ok(())
    }
}
