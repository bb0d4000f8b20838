//! Condition flags and the PredTest unit.
//!
//! Flag-setting predicate instructions derive NZCV from a result predicate
//! `d` and a governing predicate `g`:
//! - N: the result bit of the first active lane of `g`
//! - Z: no active lane of `g` is set in `d`
//! - C: the result bit of the last active lane of `g` is clear
//! - V: always clear
//!
//! Predicates are handled as slices of little-endian 64-bit words. When the
//! whole predicate fits one word (vector lengths up to 512 bits) a single
//! word fast path is used; longer predicates go through the general
//! word-by-word path. Both must agree bit for bit.

use serde::{Deserialize, Serialize};

/// NZCV condition flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flags {
    /// Negative.
    pub n: bool,
    /// Zero.
    pub z: bool,
    /// Carry.
    pub c: bool,
    /// Overflow.
    pub v: bool,
}

impl Flags {
    /// Create flags with all bits clear.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags as the 4-bit NZCV value (N in bit 3).
    pub fn nzcv(&self) -> u8 {
        (self.n as u8) << 3 | (self.z as u8) << 2 | (self.c as u8) << 1 | self.v as u8
    }

    /// Creates flags from a 4-bit NZCV value.
    pub fn from_nzcv(nzcv: u8) -> Self {
        Self {
            n: nzcv & 8 != 0,
            z: nzcv & 4 != 0,
            c: nzcv & 2 != 0,
            v: nzcv & 1 != 0,
        }
    }

    /// The flags PredTest produces when no governing lane is active.
    pub fn empty_pred() -> Self {
        Self {
            n: false,
            z: true,
            c: true,
            v: false,
        }
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bit = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}{}",
            bit(self.n, 'N'),
            bit(self.z, 'Z'),
            bit(self.c, 'C'),
            bit(self.v, 'V')
        )
    }
}

// Intermediate state, packed the way the iteration accumulates it:
// bit 31 = N, bit 2 = first active lane seen, bit 1 = some lane set,
// bit 0 = C.
const INIT: u32 = 1;
const SEEN_FIRST: u32 = 4;
const ANY_SET: u32 = 2;

/// Folds one predicate word (ascending word order) into the state.
#[inline]
fn predtest_word(d: u64, g: u64, mut flags: u32) -> u32 {
    if g != 0 {
        if flags & SEEN_FIRST == 0 {
            // Lowest active lane of the whole predicate.
            let first = g & g.wrapping_neg();
            flags |= ((d & first != 0) as u32) << 31;
            flags |= SEEN_FIRST;
        }
        flags |= ((d & g != 0) as u32) << 1;
        // Highest active lane seen so far.
        let last = 1u64 << (63 - g.leading_zeros());
        flags = (flags & !1) | (d & last == 0) as u32;
    }
    flags
}

fn unpack(flags: u32) -> Flags {
    Flags {
        n: flags & (1 << 31) != 0,
        z: flags & ANY_SET == 0,
        c: flags & 1 != 0,
        v: false,
    }
}

/// PredTest over a predicate that fits one 64-bit word.
pub fn pred_test_word(d: u64, g: u64) -> Flags {
    unpack(predtest_word(d, g, INIT))
}

/// PredTest over multi-word predicates, iterating words in ascending order.
///
/// `d` and `g` must have the same length.
pub fn pred_test_words(d: &[u64], g: &[u64]) -> Flags {
    let flags = d
        .iter()
        .zip(g)
        .fold(INIT, |flags, (&d, &g)| predtest_word(d, g, flags));
    unpack(flags)
}

/// PredTest, selecting the single-word fast path when it applies.
pub fn pred_test(d: &[u64], g: &[u64]) -> Flags {
    match (d, g) {
        ([d], [g]) => pred_test_word(*d, *g),
        _ => pred_test_words(d, g),
    }
}

/// Flags set by CTERMEQ/CTERMNE.
///
/// N reports whether the termination condition holds; when it does not, V
/// is set to the inverse of C. Z and C are unchanged.
pub fn cterm(flags: Flags, terminate: bool) -> Flags {
    Flags {
        n: terminate,
        v: !terminate && !flags.c,
        ..flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_active() {
        // ptrue p0.b at VL 256 bits: 32 predicate bits
        let p = 0xffff_ffffu64;
        let f = pred_test_word(p, p);
        assert_eq!(
            f,
            Flags {
                n: true,
                z: false,
                c: false,
                v: false
            }
        );
    }

    #[test]
    fn test_no_active() {
        assert_eq!(pred_test_word(0xff, 0), Flags::empty_pred());
        assert_eq!(pred_test_words(&[0xff, 0xff], &[0, 0]), Flags::empty_pred());
    }

    #[test]
    fn test_first_and_last_lane() {
        // Only the last governing lane is set: N clear, C clear.
        let f = pred_test_word(0x8, 0xf);
        assert!(!f.n && !f.z && !f.c);
        // Only the first governing lane is set: N set, C set.
        let f = pred_test_word(0x1, 0xf);
        assert!(f.n && !f.z && f.c);
    }

    #[test]
    fn test_multi_word_spans() {
        // First active lane in word 1, last active lane in word 2.
        let g = [0, 0x100, 0x1];
        let d = [u64::MAX, 0x100, 0];
        let f = pred_test_words(&d, &g);
        assert!(f.n);
        assert!(!f.z);
        assert!(f.c);
    }

    #[test]
    fn test_fast_path_matches_general() {
        let samples = [0u64, 1, 0x8000_0000_0000_0000, 0x5555, 0xf0f0_0000_1234, u64::MAX];
        for &d in &samples {
            for &g in &samples {
                assert_eq!(pred_test(&[d], &[g]), pred_test_words(&[d], &[g]));
                // Padding with an inactive word does not change the result.
                assert_eq!(pred_test(&[d], &[g]), pred_test_words(&[d, u64::MAX], &[g, 0]));
            }
        }
    }

    #[test]
    fn test_cterm() {
        let f = cterm(Flags::from_nzcv(0b0110), false);
        assert_eq!(f.nzcv(), 0b0110);
        let f = cterm(Flags::from_nzcv(0b0100), false);
        assert_eq!(f.nzcv(), 0b0101);
        let f = cterm(Flags::from_nzcv(0b0000), true);
        assert_eq!(f.nzcv(), 0b1000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Flags::from_nzcv(0b1010).to_string(), "N-C-");
    }
}
