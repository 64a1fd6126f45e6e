use goblin::elf::header::EM_RISCV;
use goblin::elf::section_header::SHT_NOBITS;
use goblin::elf::Elf;
use thiserror::Error;
use tracing::debug;

/// Symbol the routine is entered through.
pub const ENTRY_SYMBOL: &str = "_start";

/// Largest flattened image accepted, gaps between `.text*` sections included.
pub const MAX_IMAGE_BYTES: u64 = 1 << 20;

pub struct ElfInfo<'a> {
    pub code: &'a [u8],
    pub sections: Vec<ElfSection<'a>>,
    pub symbols: Vec<(String, u64)>,
    pub entry: u64,
    pub machine: u16,
    pub is_64: bool,
}

pub struct ElfSection<'a> {
    pub name: String,
    pub addr: u64,
    pub size: u64,
    pub data: &'a [u8],
}

impl<'a> ElfInfo<'a> {
    /// Returns a flat buffer with all `.text*` sections merged, and the base address.
    /// Gaps between sections are zero-filled.
    pub fn get_flat_code(&self) -> Result<(Vec<u8>, u64), LoadError> {
        let text_sections: Vec<&ElfSection> = self
            .sections
            .iter()
            .filter(|s| s.name.starts_with(".text") && s.size > 0)
            .collect();

        let mut bounds: Option<(u64, u64)> = None;
        for section in &text_sections {
            let end = section.addr.checked_add(section.size).ok_or_else(|| {
                LoadError::SectionOutOfRange {
                    name: section.name.clone(),
                    addr: section.addr,
                    size: section.size,
                }
            })?;
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(section.addr), hi.max(end)),
                None => (section.addr, end),
            });
        }
        let (min_addr, max_addr) = bounds.ok_or(LoadError::NoCode)?;

        let total_size = max_addr - min_addr;
        if total_size > MAX_IMAGE_BYTES {
            return Err(LoadError::ImageTooLarge { size: total_size, limit: MAX_IMAGE_BYTES });
        }
        let mut flat_code = vec![0u8; total_size as usize];

        for section in text_sections {
            let offset = (section.addr - min_addr) as usize;
            let len = section.data.len().min(section.size as usize);
            flat_code[offset..offset + len].copy_from_slice(&section.data[..len]);
        }

        Ok((flat_code, min_addr))
    }

    /// Returns a reference to a section by its name, if it exists.
    pub fn get_section_by_name(&self, name: &str) -> Option<&ElfSection<'a>> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn symbol_address(&self, name: &str) -> Option<u64> {
        self.symbols.iter().find(|(sym, _)| sym == name).map(|(_, addr)| *addr)
    }
}

pub fn parse_elf_from_bytes<'a>(bytes: &'a [u8]) -> Result<ElfInfo<'a>, goblin::error::Error> {
    let elf = Elf::parse(bytes)?;

    let mut sections = Vec::new();
    for section in elf.section_headers.iter() {
        if let Some(name) = elf.shdr_strtab.get_at(section.sh_name) {
            let offset = section.sh_offset as usize;
            let size = section.sh_size as usize;

            let data = if section.sh_type == SHT_NOBITS {
                &bytes[0..0]
            } else {
                match offset.checked_add(size) {
                    Some(end) if end <= bytes.len() => &bytes[offset..end],
                    // section data lies outside the file
                    _ => continue,
                }
            };
            sections.push(ElfSection {
                name: name.to_string(),
                addr: section.sh_addr,
                size: section.sh_size,
                data,
            });
        }
    }

    let symbols = elf
        .syms
        .iter()
        .filter_map(|sym| {
            let name = elf.strtab.get_at(sym.st_name)?;
            (!name.is_empty()).then(|| (name.to_string(), sym.st_value))
        })
        .collect();

    Ok(ElfInfo {
        code: bytes,
        sections,
        symbols,
        entry: elf.entry,
        machine: elf.header.e_machine,
        is_64: elf.is_64,
    })
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed ELF: {0}")]
    Parse(#[from] goblin::error::Error),

    #[error("not an RV64 image (machine {machine}, 64-bit: {is_64})")]
    WrongMachine { machine: u16, is_64: bool },

    #[error("ELF has no .text sections")]
    NoCode,

    #[error("section {name} at 0x{addr:x} with size 0x{size:x} runs past the address space")]
    SectionOutOfRange { name: String, addr: u64, size: u64 },

    #[error("flattened code spans 0x{size:x} bytes, more than the 0x{limit:x} allowed")]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("entry point 0x{entry:x} lies outside the code at 0x{base:x}..0x{end:x}")]
    EntryOutsideCode { entry: u64, base: u64, end: u64 },
}

/// The flattened code of a probe ELF and where to start executing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub base: u64,
    pub code: Vec<u8>,
    /// Address of `_start`, or the ELF entry point if the symbol is absent.
    pub entry: u64,
}

impl LoadedImage {
    /// One past the last code byte, saturating at the top of the address space.
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.code.len() as u64)
    }
}

pub fn load_image(bytes: &[u8]) -> Result<LoadedImage, LoadError> {
    let info = parse_elf_from_bytes(bytes)?;
    if info.machine != EM_RISCV || !info.is_64 {
        return Err(LoadError::WrongMachine { machine: info.machine, is_64: info.is_64 });
    }

    let (code, base) = info.get_flat_code()?;
    let entry = info.symbol_address(ENTRY_SYMBOL).unwrap_or(info.entry);
    let image = LoadedImage { base, code, entry };

    if entry < image.base || entry >= image.end() {
        return Err(LoadError::EntryOutsideCode { entry, base: image.base, end: image.end() });
    }

    debug!(
        base = format_args!("0x{:x}", image.base),
        entry = format_args!("0x{:x}", image.entry),
        len = image.code.len(),
        "loaded ELF image"
    );
    Ok(image)
}
