#![allow(dead_code)]

use probe::image::assemble;
use types::{OpEncoding, ZbaUnit};
use vm::memory::{Access, Memory, MemoryMap};
use vm::{probe_memory, DEFAULT_CODE_BASE, VM};

pub const BASE: u64 = DEFAULT_CODE_BASE;

pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Scratch cell plus a code region at `BASE` holding `code`.
pub fn memory_with_code(code: &[u8]) -> MemoryMap {
    let mut memory = probe_memory(BASE, code.len()).expect("code region overlaps scratch");
    memory.write(BASE, code, Access::Host).expect("code fits its region");
    memory
}

pub fn boot(memory: Box<dyn Memory>, unit: Box<dyn ZbaUnit>, code: &[u8]) -> VM {
    let mut vm = VM::new(memory, unit);
    vm.load_image(BASE, code, BASE).expect("code fits its region");
    vm
}

pub fn probe_code(encoding: OpEncoding) -> Vec<u8> {
    assemble(encoding).to_bytes().to_vec()
}

pub fn probe_vm(encoding: OpEncoding, unit: Box<dyn ZbaUnit>) -> VM {
    let code = probe_code(encoding);
    let memory = probe_memory(BASE, code.len()).expect("code region overlaps scratch");
    boot(Box::new(memory), unit, &code)
}
