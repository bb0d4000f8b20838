//! Bit-field extraction helpers.

/// Extracts `len` bits of `word` starting at bit `start`.
#[inline]
pub fn extract(word: u32, start: u32, len: u32) -> u32 {
    debug_assert!(len > 0 && start + len <= 32);
    (word >> start) & (u32::MAX >> (32 - len))
}

/// Extracts `len` bits of `word` starting at bit `start`, sign-extended.
#[inline]
pub fn sextract(word: u32, start: u32, len: u32) -> i32 {
    debug_assert!(len > 0 && start + len <= 32);
    ((word << (32 - len - start)) as i32) >> (32 - len)
}

/// Returns bit `pos` of `word`.
#[inline]
pub fn bit(word: u32, pos: u32) -> bool {
    (word >> pos) & 1 != 0
}

/// Register field `Zd`/`Rd`/`Pd` (bits 4:0, or 3:0 for predicates).
#[inline]
pub fn rd(word: u32) -> u8 {
    extract(word, 0, 5) as u8
}

/// Register field at bits 9:5.
#[inline]
pub fn rn(word: u32) -> u8 {
    extract(word, 5, 5) as u8
}

/// Register field at bits 20:16.
#[inline]
pub fn rm(word: u32) -> u8 {
    extract(word, 16, 5) as u8
}

/// Predicate destination at bits 3:0.
#[inline]
pub fn pd(word: u32) -> u8 {
    extract(word, 0, 4) as u8
}

/// Three-bit governing predicate at bits 12:10.
#[inline]
pub fn pg3(word: u32) -> u8 {
    extract(word, 10, 3) as u8
}

/// Four-bit governing predicate at bits 13:10.
#[inline]
pub fn pg4(word: u32) -> u8 {
    extract(word, 10, 4) as u8
}

/// Element size field at bits 23:22.
#[inline]
pub fn size(word: u32) -> u32 {
    extract(word, 22, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract() {
        assert_eq!(extract(0xdead_beef, 0, 4), 0xf);
        assert_eq!(extract(0xdead_beef, 28, 4), 0xd);
        assert_eq!(extract(0xffff_ffff, 0, 32), 0xffff_ffff);
    }

    #[test]
    fn test_sextract() {
        assert_eq!(sextract(0x0000_000f, 0, 4), -1);
        assert_eq!(sextract(0x0000_0007, 0, 4), 7);
        assert_eq!(sextract(0x0020_0000, 16, 6), -32);
        assert_eq!(sextract(0x8000_0000, 0, 32), i32::MIN);
    }

    #[test]
    fn test_register_fields() {
        let word = 0x2401_a000 | (3 << 5) | 0x1f;
        assert_eq!(rd(word), 31);
        assert_eq!(pd(word), 15);
        assert_eq!(rn(word), 3);
        assert_eq!(rm(word), 1);
        assert_eq!(size(0x04c0_0000), 3);
    }
}
