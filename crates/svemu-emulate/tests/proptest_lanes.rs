//! Property-based tests for lane arithmetic, PredTest and the translator.
//!
//! These tests check the lane helpers against Rust's own integer
//! semantics, PredTest against a bit-by-bit reference, and that
//! translation and execution never panic on decodable words.

use proptest::prelude::*;
use svemu_core::{ElementSize, VectorLength};
use svemu_disasm::SveDecoder;
use svemu_emulate::flags::{pred_test_word, pred_test_words};
use svemu_emulate::{execute, lanes, translate, Backend, Flags, RegisterFile, SparseMemory};

const SVE_TOP_BYTES: [u32; 13] = [
    0x04, 0x05, 0x24, 0x25, 0x65, 0x84, 0x85, 0xa4, 0xa5, 0xc4, 0xc5, 0xe4, 0xe5,
];

fn sve_word() -> impl Strategy<Value = u32> {
    (prop::sample::select(SVE_TOP_BYTES.to_vec()), 0u32..(1 << 24))
        .prop_map(|(top, low)| (top << 24) | low)
}

fn vector_length() -> impl Strategy<Value = VectorLength> {
    prop::sample::select(vec![16usize, 32, 48, 64, 128, 256])
        .prop_map(|bytes| VectorLength::from_bytes(bytes).unwrap())
}

fn element_size() -> impl Strategy<Value = ElementSize> {
    prop::sample::select(ElementSize::ALL.to_vec())
}

/// PredTest computed one predicate bit at a time.
fn reference_pred_test(d: &[u64], g: &[u64]) -> Flags {
    let bit = |words: &[u64], i: usize| words[i / 64] >> (i % 64) & 1 != 0;
    let active: Vec<usize> = (0..g.len() * 64).filter(|&i| bit(g, i)).collect();
    match (active.first(), active.last()) {
        (Some(&first), Some(&last)) => Flags {
            n: bit(d, first),
            z: !active.iter().any(|&i| bit(d, i)),
            c: !bit(d, last),
            v: false,
        },
        _ => Flags {
            n: false,
            z: true,
            c: true,
            v: false,
        },
    }
}

// =============================================================================
// PredTest Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(5000))]

    /// The single-word fast path agrees with the general path.
    #[test]
    fn pred_test_fast_path_matches_general(d in any::<u64>(), g in any::<u64>()) {
        prop_assert_eq!(pred_test_word(d, g), pred_test_words(&[d], &[g]));
    }

    /// Multi-word PredTest matches the bitwise definition.
    #[test]
    fn pred_test_matches_reference(
        words in prop::collection::vec((any::<u64>(), any::<u64>()), 1..=4)
    ) {
        let (d, g): (Vec<u64>, Vec<u64>) = words.into_iter().unzip();
        prop_assert_eq!(pred_test_words(&d, &g), reference_pred_test(&d, &g));
    }

    /// Sparse governing predicates exercise the empty-word paths.
    #[test]
    fn pred_test_sparse_governing(
        d in prop::collection::vec(any::<u64>(), 4),
        lane in 0usize..256,
    ) {
        let mut g = vec![0u64; 4];
        g[lane / 64] = 1 << (lane % 64);
        let flags = pred_test_words(&d, &g);
        let set = d[lane / 64] >> (lane % 64) & 1 != 0;
        prop_assert_eq!(flags.n, set);
        prop_assert_eq!(flags.z, !set);
        prop_assert_eq!(flags.c, !set);
    }
}

// =============================================================================
// Lane Arithmetic Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(5000))]

    #[test]
    fn sqadd_matches_i8(a in any::<i8>(), b in any::<i8>()) {
        let got = lanes::sqadd(a as u8 as u64, b as u8 as u64, ElementSize::B);
        prop_assert_eq!(got, a.saturating_add(b) as u8 as u64);
    }

    #[test]
    fn sqsub_matches_i16(a in any::<i16>(), b in any::<i16>()) {
        let got = lanes::sqsub(a as u16 as u64, b as u16 as u64, ElementSize::H);
        prop_assert_eq!(got, a.saturating_sub(b) as u16 as u64);
    }

    #[test]
    fn uqadd_uqsub_match_u32(a in any::<u32>(), b in any::<u32>()) {
        prop_assert_eq!(
            lanes::uqadd(a as u64, b as u64, ElementSize::S),
            a.saturating_add(b) as u64
        );
        prop_assert_eq!(
            lanes::uqsub(a as u64, b as u64, ElementSize::S),
            a.saturating_sub(b) as u64
        );
    }

    #[test]
    fn saturating_d_matches_i64(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(
            lanes::sqadd(a as u64, b as u64, ElementSize::D),
            a.saturating_add(b) as u64
        );
        prop_assert_eq!(
            lanes::uqsub(a as u64, b as u64, ElementSize::D),
            (a as u64).saturating_sub(b as u64)
        );
    }

    /// Division by zero yields zero; otherwise signed division truncates
    /// and wraps at the minimum value.
    #[test]
    fn sdiv_matches_i32(a in any::<i32>(), b in any::<i32>()) {
        let expected = if b == 0 { 0 } else { a.wrapping_div(b) };
        prop_assert_eq!(
            lanes::sdiv(a as u32 as u64, b as u32 as u64, ElementSize::S),
            expected as u32 as u64
        );
    }

    #[test]
    fn udiv_matches_u16(a in any::<u16>(), b in any::<u16>()) {
        let expected = a.checked_div(b).unwrap_or(0);
        prop_assert_eq!(lanes::udiv(a as u64, b as u64, ElementSize::H), expected as u64);
    }

    /// Values carry garbage above the lane; results never do.
    #[test]
    fn results_fit_the_lane(
        a in any::<u64>(),
        b in any::<u64>(),
        esz in element_size(),
    ) {
        let mask = esz.value_mask();
        for value in [
            lanes::sqadd(a, b, esz),
            lanes::uqsub(a, b, esz),
            lanes::smulh(a, b, esz),
            lanes::umulh(a, b, esz),
            lanes::sdiv(a, b, esz),
            lanes::abs(a, esz),
            lanes::neg(a, esz),
            lanes::cls(a, esz),
            lanes::clz(a, esz),
            lanes::rbit(a, esz),
            lanes::asr(a, b, esz),
            lanes::lsl(a, b, esz),
        ] {
            prop_assert_eq!(value & !mask, 0);
        }
    }

    #[test]
    fn sext_then_mask_is_identity(value in any::<u64>(), esz in element_size()) {
        let masked = lanes::mask(value, esz);
        prop_assert_eq!(lanes::mask(lanes::sext(value, esz) as u64, esz), masked);
        prop_assert!(lanes::sext(value, esz) >= lanes::smin_value(esz));
        prop_assert!(lanes::sext(value, esz) <= lanes::smax_value(esz));
    }

    /// Shifts by the lane width or more saturate instead of wrapping the
    /// shift amount.
    #[test]
    fn wide_shifts_saturate(value in any::<u64>(), extra in 0u64..1000, esz in element_size()) {
        let shift = esz.bits() as u64 + extra;
        prop_assert_eq!(lanes::lsl(value, shift, esz), 0);
        prop_assert_eq!(lanes::lsr(value, shift, esz), 0);
        let fill = if lanes::sext(value, esz) < 0 { esz.value_mask() } else { 0 };
        prop_assert_eq!(lanes::asr(value, shift, esz), fill);
    }
}

// =============================================================================
// Translator Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(5000))]

    /// Translating any decodable word at any vector length must not panic,
    /// and every rejection is an unallocated encoding.
    #[test]
    fn translate_never_panics(word in sve_word(), vl in vector_length()) {
        if let Ok(insn) = SveDecoder::new().decode(word, 0x1000) {
            match translate(&insn, vl) {
                Ok(seq) => prop_assert_eq!(seq.vector_length(), vl),
                Err(e) => prop_assert!(e.is_unallocated()),
            }
        }
    }

    /// Translation is pure: the same instruction at the same vector length
    /// lowers to the same operations.
    #[test]
    fn translate_is_deterministic(word in sve_word(), vl in vector_length()) {
        if let Ok(insn) = SveDecoder::new().decode(word, 0x1000) {
            let first = translate(&insn, vl);
            let second = translate(&insn, vl);
            prop_assert_eq!(first.ok(), second.ok());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Executing any translated word against a zeroed register file and a
    /// small mapped region may fault but must not panic.
    #[test]
    fn execute_never_panics(word in sve_word(), vl in vector_length()) {
        let Ok(insn) = SveDecoder::new().decode(word, 0x1000) else {
            return Ok(());
        };
        let Ok(seq) = translate(&insn, vl) else {
            return Ok(());
        };
        let mut regs = RegisterFile::new(vl);
        let mut mem = SparseMemory::new();
        mem.map_region(0, 0x4000);
        let _ = execute(&seq, &mut regs, &mut mem);
        prop_assert_eq!(regs.vector_length(), vl);
    }
}
