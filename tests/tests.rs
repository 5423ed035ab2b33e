// Integration suite grounded on the teacher's `tests/tests.rs` shape
// (`Emulator::new(test_configuration())`; `em.run(path, false)`), adapted to
// load a hand-assembled core-rope fixture through the real loader and drive
// it with `Agc::clock_cycle` instead of the 68k `Emulator::run`.

use agc_core::loader::load_core_rope;
use agc_core::word::Word;
use agc_core::Agc;

/// Assembles a tiny fixed-bank-0 program as big-endian 15-bit words (top bit
/// unused) using the basic-mode encoding from spec.md §4.7: opcode at bits
/// 14..12, address at bits 11..0.
fn basic_word(opcode: u16, address: u16) -> u16 {
    ((opcode & 0o7) << 12) | (address & 0o7777)
}

fn rope(words: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * 2);
    for w in words {
        bytes.extend_from_slice(&w.to_be_bytes());
    }
    bytes
}

#[test]
fn fetch_execute_runs_ad_ts_ca_su_from_a_loaded_rope() {
    // AD 020, TS 021, CA 021, SU 020 (basic opcodes 7,6,4,5 per opcode.rs).
    let program = rope(&[basic_word(7, 0o20), basic_word(6, 0o21), basic_word(4, 0o21), basic_word(5, 0o20)]);

    let mut agc = Agc::new();
    load_core_rope(&program, 0, &mut agc.memory).unwrap();
    agc.memory.write_erasable(0, 0o20, Word::new(5));
    agc.memory.write_erasable(0, 0o21, Word::new(10));
    agc.a = Word::new(5);

    for _ in 0..4 {
        agc.clock_cycle().unwrap();
    }

    assert_eq!(agc.a, Word::new(5));
    assert_eq!(agc.memory.read_erasable(0, 0o21), Word::new(15));
    assert_eq!(agc.z, Word::new(4));
}

#[test]
fn tc_to_self_traps_and_freezes_z() {
    let program = rope(&[basic_word(0, 0)]); // TC 0, Z starts at 0: self-jump.
    let mut agc = Agc::new();
    load_core_rope(&program, 0, &mut agc.memory).unwrap();

    agc.clock_cycle().unwrap();
    assert!(agc.tc_trap);
    assert_eq!(agc.z, Word::ZERO);
}

#[test]
fn two_successive_extend_words_keep_extended_mode_latched_through_fetch_execute() {
    // EXTEND is basic opcode 0 subcode 1. The extended-mode word that follows
    // must itself decode back to EXTEND (opcode.rs reserves extended-code
    // slot 31 for it) so that a second EXTEND, fetched while extended_mode is
    // already latched, keeps the mode set instead of falling through to
    // whatever mnemonic used to occupy that table slot.
    let extend_basic = basic_word(0, 0b01 << 10); // subcode 1 -> EXTEND
    let extend_extended = 31u16 << 10; // opcode field 31, the reserved extended-mode EXTEND slot
    let program = rope(&[extend_basic, extend_extended]);
    let mut agc = Agc::new();
    load_core_rope(&program, 0, &mut agc.memory).unwrap();

    agc.clock_cycle().unwrap();
    assert!(agc.extended_mode);

    agc.clock_cycle().unwrap();
    assert!(agc.extended_mode);
}

#[test]
fn timer_overflow_vectors_through_process_interrupts() {
    let mut agc = Agc::new();
    agc.timers.set_time3(agc_core::word::NEGATIVE_ZERO);
    agc.tick_timers(1);
    let vector = agc.interrupts.process(agc.z).unwrap();
    assert_eq!(vector, Word::new(0x4004));
}

#[test]
fn six_t3rupts_without_servicing_latch_rupt_lock() {
    let mut agc = Agc::new();
    for _ in 0..6 {
        agc.interrupts.trigger(agc_core::interrupts::InterruptKind::T3Rupt);
    }
    assert!(agc.interrupts.rupt_lock);
}

#[test]
fn dsky_output_formats_decimal_and_octal() {
    let mut agc = Agc::new();
    agc.dsky.input(16, 25);
    let display = agc.dsky.output().unwrap();
    assert_eq!(display[0], "00016");
    assert_eq!(display[1], "00025");

    agc.dsky.set_mode("OCT");
    agc.dsky.input(16, 25);
    let display = agc.dsky.output().unwrap();
    assert_eq!(display[0], "00020");
    assert_eq!(display[1], "00031");
}

#[test]
fn oversized_rope_image_is_rejected_by_the_loader() {
    let bytes = vec![0u8; (agc_core::memory::FIXED_BANK_WORDS + 1) * 2];
    let mut agc = Agc::new();
    let err = load_core_rope(&bytes, 0, &mut agc.memory).unwrap_err();
    assert_eq!(err, agc_core::AgcError::ImageTooLarge(agc_core::memory::FIXED_BANK_WORDS + 1));
}
