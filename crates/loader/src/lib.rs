//! Pulls the executable image out of a cross-compiled probe ELF.

pub mod elf;

pub use elf::{load_image, parse_elf_from_bytes, ElfInfo, ElfSection, LoadError, LoadedImage};
