//! Property-based tests for the SVE decoder.
//!
//! These tests verify that the decoder handles arbitrary words without
//! panicking and classifies every word consistently.

use proptest::prelude::*;
use svemu_disasm::{DecodeError, Disassembler, SveDecoder};

/// Top bytes of the SVE major opcode groups.
const SVE_TOP_BYTES: [u32; 13] = [
    0x04, 0x05, 0x24, 0x25, 0x65, 0x84, 0x85, 0xa4, 0xa5, 0xc4, 0xc5, 0xe4, 0xe5,
];

fn sve_word() -> impl Strategy<Value = u32> {
    (prop::sample::select(SVE_TOP_BYTES.to_vec()), 0u32..(1 << 24))
        .prop_map(|(top, low)| (top << 24) | low)
}

// =============================================================================
// Decoder Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10000))]

    /// Decoding any 32-bit word must not panic.
    #[test]
    fn decode_never_panics(word in any::<u32>()) {
        let _ = SveDecoder::new().decode(word, 0x1000);
    }

    /// Decoding the same word twice gives the same result.
    #[test]
    fn decode_is_deterministic(word in any::<u32>()) {
        let decoder = SveDecoder::new();
        let first = decoder.decode(word, 0x4000);
        let second = decoder.decode(word, 0x4000);
        prop_assert_eq!(first, second);
    }

    /// Words outside the SVE groups are reported as unsupported.
    #[test]
    fn non_sve_words_are_unsupported(word in any::<u32>()) {
        prop_assume!(!SveDecoder::is_sve_instruction(word));
        let result = SveDecoder::new().decode(word, 0);
        let is_unsupported = matches!(result, Err(DecodeError::Unsupported { .. }));
        prop_assert!(is_unsupported);
    }

    /// Words inside the SVE groups decode or are unallocated, never unsupported.
    #[test]
    fn sve_words_decode_or_are_unallocated(word in sve_word()) {
        match SveDecoder::new().decode(word, 0x2000) {
            Ok(insn) => {
                prop_assert_eq!(insn.word, word);
                prop_assert_eq!(insn.address, 0x2000);
                prop_assert!(!insn.mnemonic.is_empty());
            }
            Err(e) => prop_assert!(e.is_unallocated()),
        }
    }

    /// Successfully decoded instructions render with their mnemonic first.
    #[test]
    fn display_starts_with_mnemonic(word in sve_word()) {
        if let Ok(insn) = SveDecoder::new().decode(word, 0) {
            prop_assert!(insn.to_string().starts_with(&insn.mnemonic));
        }
    }
}

// =============================================================================
// Disassembler Trait Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Every decoded instruction consumes exactly four bytes.
    #[test]
    fn decoded_size_is_four(word in sve_word()) {
        let bytes = word.to_le_bytes();
        if let Ok(decoded) = SveDecoder::new().decode_instruction(&bytes, 0x1000) {
            prop_assert_eq!(decoded.size, 4);
            prop_assert_eq!(decoded.instruction.bytes(), bytes);
        }
    }

    /// Short buffers are reported as truncated.
    #[test]
    fn short_buffers_are_truncated(bytes in prop::collection::vec(any::<u8>(), 0..4)) {
        let result = SveDecoder::new().decode_instruction(&bytes, 0);
        let is_truncated = matches!(result, Err(DecodeError::Truncated { .. }));
        prop_assert!(is_truncated);
    }

    /// A block yields one entry per aligned word.
    #[test]
    fn block_yields_one_entry_per_word(words in prop::collection::vec(any::<u32>(), 0..64)) {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let results = SveDecoder::new().disassemble_block(&bytes, 0x8000);
        prop_assert_eq!(results.len(), words.len());
        for (i, result) in results.iter().enumerate() {
            let expected = 0x8000 + 4 * i as u64;
            match result {
                Ok(insn) => prop_assert_eq!(insn.address, expected),
                Err(e) => prop_assert_eq!(e.address(), expected),
            }
        }
    }
}
