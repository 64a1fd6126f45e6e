mod common;

use common::{memory_with_code, words_to_bytes, BASE};
use types::encoding::{self, EBREAK, IDLE_LOOP};
use types::{OpEncoding, ZbaOp};
use vm::cpu::{StepOutcome, CPU};
use vm::fault::ShiftDroppedUnit;
use vm::metering::{NoopMeter, StepBudget};
use vm::Trap;

fn cpu_at_base() -> CPU {
    let mut cpu = CPU::default();
    cpu.pc = BASE;
    cpu
}

#[test]
fn test_addi_program() {
    // addi x1, x0, 5   --> 0x00500093
    // addi x2, x1, 10  --> 0x00a08113
    let mut memory = memory_with_code(&words_to_bytes(&[0x0050_0093, 0x00a0_8113]));
    let mut cpu = cpu_at_base();

    assert_eq!(cpu.step(&mut memory, &mut NoopMeter), Ok(StepOutcome::Continue));
    assert_eq!(cpu.regs.read(1), 5);

    assert_eq!(cpu.step(&mut memory, &mut NoopMeter), Ok(StepOutcome::Continue));
    assert_eq!(cpu.regs.read(2), 15);
    assert_eq!(cpu.pc, BASE + 8);
}

#[test]
fn test_immediates_sign_extend_to_64_bits() {
    let mut memory = memory_with_code(&words_to_bytes(&[encoding::li(1, -1), 0x8000_00b7]));
    let mut cpu = cpu_at_base();
    cpu.step(&mut memory, &mut NoopMeter).unwrap();
    cpu.step(&mut memory, &mut NoopMeter).unwrap();
    assert_eq!(cpu.regs.read(1), 0xffff_ffff_8000_0000);
}

#[test]
fn test_writes_to_x0_are_ignored() {
    let mut memory = memory_with_code(&words_to_bytes(&[encoding::li(0, 7)]));
    let mut cpu = cpu_at_base();
    cpu.step(&mut memory, &mut NoopMeter).unwrap();
    assert_eq!(cpu.regs.read(0), 0);
}

#[test]
fn test_store_then_load_is_full_width() {
    let code = words_to_bytes(&[
        encoding::li(1, -2),
        encoding::sd(1, 0, 0),
        encoding::ld(2, 0, 0),
    ]);
    let mut memory = memory_with_code(&code);
    let mut cpu = cpu_at_base();
    for _ in 0..3 {
        assert_eq!(cpu.step(&mut memory, &mut NoopMeter), Ok(StepOutcome::Continue));
    }
    assert_eq!(cpu.regs.read(2), u64::MAX - 1);
}

#[test]
fn test_misaligned_load_traps_without_side_effects() {
    let mut memory = memory_with_code(&words_to_bytes(&[encoding::ld(7, 0, 4)]));
    let mut cpu = cpu_at_base();
    assert_eq!(
        cpu.step(&mut memory, &mut NoopMeter),
        Err(Trap::Misaligned { addr: 4, width: 8 })
    );
    assert_eq!(cpu.pc, BASE);
    assert_eq!(cpu.regs.read(7), 0);
}

#[test]
fn test_code_region_is_not_writable() {
    // jal x1, 4 leaves the address of the next instruction in x1
    let code = words_to_bytes(&[encoding::jal(1, 4), encoding::sd(0, 1, 4), IDLE_LOOP, IDLE_LOOP]);
    let mut memory = memory_with_code(&code);
    let mut cpu = cpu_at_base();
    cpu.step(&mut memory, &mut NoopMeter).unwrap();
    assert_eq!(cpu.regs.read(1), BASE + 4);
    assert_eq!(
        cpu.step(&mut memory, &mut NoopMeter),
        Err(Trap::StoreFault { addr: BASE + 8 })
    );
}

#[test]
fn test_scratch_region_is_not_executable() {
    let mut memory = memory_with_code(&words_to_bytes(&[IDLE_LOOP]));
    let mut cpu = CPU::default();
    assert_eq!(cpu.step(&mut memory, &mut NoopMeter), Err(Trap::FetchFault { addr: 0 }));
}

#[test]
fn test_loads_outside_the_scratch_cell_fault() {
    let mut memory = memory_with_code(&words_to_bytes(&[encoding::ld(7, 0, 8)]));
    let mut cpu = cpu_at_base();
    assert_eq!(cpu.step(&mut memory, &mut NoopMeter), Err(Trap::LoadFault { addr: 8 }));
}

#[test]
fn test_illegal_instruction_traps() {
    // add x3, x1, x2
    let mut memory = memory_with_code(&words_to_bytes(&[0x0020_81b3]));
    let mut cpu = cpu_at_base();
    assert_eq!(
        cpu.step(&mut memory, &mut NoopMeter),
        Err(Trap::IllegalInstruction { pc: BASE, word: 0x0020_81b3 })
    );
}

#[test]
fn test_idle_loop_changes_nothing() {
    for code in [words_to_bytes(&[IDLE_LOOP]), vec![0x01, 0xa0]] {
        let mut memory = memory_with_code(&code);
        let mut cpu = cpu_at_base();
        let before = cpu.regs;
        for _ in 0..4 {
            assert_eq!(cpu.step(&mut memory, &mut NoopMeter), Ok(StepOutcome::Idle));
            assert_eq!(cpu.pc, BASE);
            assert_eq!(cpu.regs, before);
        }
    }
}

#[test]
fn test_branches() {
    let code = words_to_bytes(&[
        encoding::li(1, 1),
        encoding::beq(1, 0, 8), // not taken
        encoding::bne(1, 0, 8), // taken, skips the next word
        encoding::li(2, 9),
        encoding::li(3, 9),
    ]);
    let mut memory = memory_with_code(&code);
    let mut cpu = cpu_at_base();
    for _ in 0..4 {
        cpu.step(&mut memory, &mut NoopMeter).unwrap();
    }
    assert_eq!(cpu.regs.read(2), 0);
    assert_eq!(cpu.regs.read(3), 9);
    assert_eq!(cpu.pc, BASE + 20);
}

#[test]
fn test_jalr_clears_low_bit_and_links() {
    // jalr x1, 9(x1) with x1 = BASE + 4 lands on BASE + 12
    let code = words_to_bytes(&[encoding::jal(1, 4), 0x0090_80e7, EBREAK, IDLE_LOOP]);
    let mut memory = memory_with_code(&code);
    let mut cpu = cpu_at_base();
    cpu.step(&mut memory, &mut NoopMeter).unwrap();
    cpu.step(&mut memory, &mut NoopMeter).unwrap();
    assert_eq!(cpu.pc, BASE + 12);
    assert_eq!(cpu.regs.read(1), BASE + 8);
}

#[test]
fn test_ebreak_halts_in_place() {
    let mut memory = memory_with_code(&words_to_bytes(&[EBREAK]));
    let mut cpu = cpu_at_base();
    assert_eq!(cpu.step(&mut memory, &mut NoopMeter), Ok(StepOutcome::Halted));
    assert_eq!(cpu.pc, BASE);

    let mut memory = memory_with_code(&[0x02, 0x90]);
    assert_eq!(cpu.step(&mut memory, &mut NoopMeter), Ok(StepOutcome::Halted));
}

#[test]
fn test_add_uw_discards_upper_half() {
    let code = words_to_bytes(&[
        encoding::li(1, -1),
        encoding::li(2, 1),
        encoding::zba(OpEncoding::Ratified, ZbaOp::AddUw, 3, 1, 2),
        encoding::zba(OpEncoding::Probe, ZbaOp::AddUw, 4, 1, 2),
    ]);
    let mut memory = memory_with_code(&code);
    let mut cpu = cpu_at_base();
    for _ in 0..4 {
        cpu.step(&mut memory, &mut NoopMeter).unwrap();
    }
    assert_eq!(cpu.regs.read(3), 0x1_0000_0000);
    assert_eq!(cpu.regs.read(4), 0x1_0000_0000);
}

#[test]
fn test_unit_is_pluggable() {
    let code = words_to_bytes(&[
        encoding::li(1, 5),
        encoding::li(2, 3),
        encoding::zba(OpEncoding::Probe, ZbaOp::Sh3add, 5, 1, 2),
        encoding::zba(OpEncoding::Probe, ZbaOp::Sh1add, 3, 1, 2),
    ]);
    let mut memory = memory_with_code(&code);
    let mut cpu = cpu_at_base();
    cpu.set_unit(Box::new(ShiftDroppedUnit::new(ZbaOp::Sh3add)));
    for _ in 0..4 {
        cpu.step(&mut memory, &mut NoopMeter).unwrap();
    }
    assert_eq!(cpu.regs.read(5), 8);
    assert_eq!(cpu.regs.read(3), 11);
}

#[test]
fn test_step_budget_halts_before_executing() {
    let code = words_to_bytes(&[encoding::li(1, 1), encoding::li(2, 2)]);
    let mut memory = memory_with_code(&code);
    let mut cpu = cpu_at_base();
    let mut budget = StepBudget::new(1);
    assert_eq!(cpu.step(&mut memory, &mut budget), Ok(StepOutcome::Continue));
    assert_eq!(cpu.step(&mut memory, &mut budget), Ok(StepOutcome::Halted));
    assert_eq!(cpu.regs.read(2), 0);
    assert_eq!(cpu.pc, BASE + 4);
    assert_eq!(budget.remaining(), 0);
}

#[test]
fn test_mixed_width_program() {
    // c.li x1, 5; c.li x2, 3; sh3add x5, x1, x2; c.j 0
    let mut code = vec![0x95, 0x40, 0x0d, 0x41];
    code.extend_from_slice(&encoding::zba(OpEncoding::Probe, ZbaOp::Sh3add, 5, 1, 2).to_le_bytes());
    code.extend_from_slice(&[0x01, 0xa0]);

    let mut memory = memory_with_code(&code);
    let mut cpu = cpu_at_base();
    let mut outcomes = Vec::new();
    for _ in 0..4 {
        outcomes.push(cpu.step(&mut memory, &mut NoopMeter).unwrap());
    }
    assert_eq!(outcomes.last(), Some(&StepOutcome::Idle));
    assert_eq!(cpu.regs.read(5), 29);
    assert_eq!(cpu.pc, BASE + 8);
}
