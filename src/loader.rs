// Binary core-rope loader. Grounded on the teacher's `Emulator::load` in
// lib.rs (`fs::read` then sequential writes into the bus), adapted from
// byte-granular writes into a byte-addressed bus to 16-bit-word writes into
// fixed memory, and upgraded from `expect`-on-failure to a typed error so a
// caller can recover from a malformed image.

use crate::error::AgcError;
use crate::memory::{Memory, FIXED_BANK_WORDS};
use crate::word::Word;
use log::info;

/// Interprets `bytes` as sequential big-endian 16-bit quantities, masks each
/// to 15 bits, and writes them into `fixed_bank` of `memory` starting at
/// offset 0. An odd trailing byte is ignored (the last full word is the
/// final word written).
pub fn load_core_rope(bytes: &[u8], fixed_bank: u8, memory: &mut Memory) -> Result<(), AgcError> {
    let word_count = bytes.len() / 2;
    if word_count > FIXED_BANK_WORDS {
        return Err(AgcError::ImageTooLarge(word_count));
    }
    for (offset, chunk) in bytes.chunks_exact(2).enumerate() {
        let raw = u16::from_be_bytes([chunk[0], chunk[1]]);
        memory.write_fixed(fixed_bank, offset, Word::new(raw));
    }
    info!("loaded {} words into fixed bank {}", word_count, fixed_bank);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_sequential_big_endian_words() {
        let mut memory = Memory::new();
        let bytes = [0x00u8, 0x05, 0x00, 0x0a];
        load_core_rope(&bytes, 0, &mut memory).unwrap();
        assert_eq!(memory.read_fixed(0, 0), Word::new(5));
        assert_eq!(memory.read_fixed(0, 1), Word::new(10));
    }

    #[test]
    fn masks_each_word_to_15_bits() {
        let mut memory = Memory::new();
        let bytes = [0xffu8, 0xff];
        load_core_rope(&bytes, 0, &mut memory).unwrap();
        assert_eq!(memory.read_fixed(0, 0), Word::ZERO); // 0x7FFF normalizes to 0
    }

    #[test]
    fn oversized_image_is_rejected() {
        let mut memory = Memory::new();
        let bytes = vec![0u8; (FIXED_BANK_WORDS + 1) * 2];
        assert_eq!(load_core_rope(&bytes, 0, &mut memory), Err(AgcError::ImageTooLarge(FIXED_BANK_WORDS + 1)));
    }
}
