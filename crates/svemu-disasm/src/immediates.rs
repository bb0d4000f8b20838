//! Immediate expanders.
//!
//! Pure functions turning compact encoded immediates into their semantic
//! values. Every expander that can meet an invalid encoding returns an
//! `Option` and the caller turns `None` into an unallocated-encoding error.

use svemu_core::ElementSize;

// ==== Shift immediates (tsz:imm3) ====

/// Element size selected by a `tsz:imm3` field: the position of the highest
/// set bit of `tsz`. Returns `None` when `tsz` is zero.
pub fn tszimm_esz(x: u32) -> Option<ElementSize> {
    let tsz = x >> 3;
    if tsz == 0 {
        return None;
    }
    ElementSize::from_log2(31 - tsz.leading_zeros() as i32)
}

/// Right-shift amount encoded by `tsz:imm3`: `(16 << esz) - x`.
pub fn tszimm_shr(x: u32, esz: ElementSize) -> u32 {
    (16 << esz.log2()) - x
}

/// Left-shift amount encoded by `tsz:imm3`: `x - (8 << esz)`.
pub fn tszimm_shl(x: u32, esz: ElementSize) -> u32 {
    x - (8 << esz.log2())
}

// ==== Shifted 8-bit immediates ====

/// Signed 8-bit immediate, shifted left by 8 when bit 8 (`sh`) is set.
pub fn expand_imm_sh8s(x: u32) -> i64 {
    let value = (x & 0xff) as u8 as i8 as i64;
    if x & 0x100 != 0 {
        value << 8
    } else {
        value
    }
}

/// Unsigned 8-bit immediate, shifted left by 8 when bit 8 (`sh`) is set.
pub fn expand_imm_sh8u(x: u32) -> i64 {
    let value = (x & 0xff) as i64;
    if x & 0x100 != 0 {
        value << 8
    } else {
        value
    }
}

// ==== Logical bitmask immediates ====

fn bitmask64(length: u32) -> u64 {
    if length >= 64 {
        u64::MAX
    } else {
        (1u64 << length) - 1
    }
}

fn replicate(mut mask: u64, mut e: u32) -> u64 {
    while e < 64 {
        mask |= mask << e;
        e *= 2;
    }
    mask
}

/// Decodes a 13-bit `N:immr:imms` logical immediate into its 64-bit
/// replicated bit pattern.
///
/// Returns `None` for encodings that do not describe a repeating pattern
/// (reserved element size, or an all-ones element).
pub fn decode_bit_masks(dbm: u32) -> Option<u64> {
    let n = (dbm >> 12) & 1;
    let immr = (dbm >> 6) & 0x3f;
    let imms = dbm & 0x3f;

    let combined = (n << 6) | (!imms & 0x3f);
    if combined == 0 {
        return None;
    }
    let len = 31 - combined.leading_zeros();
    if len < 1 {
        return None;
    }

    let e = 1u32 << len;
    let levels = e - 1;
    let s = imms & levels;
    let r = immr & levels;
    if s == levels {
        return None;
    }

    let mut mask = bitmask64(s + 1);
    if r != 0 {
        mask = (mask >> r) | (mask << (e - r));
        mask &= bitmask64(e);
    }
    Some(replicate(mask, e))
}

// ==== Floating-point 8-bit immediates ====

/// Expands an 8-bit floating-point immediate to the bit pattern of a value
/// of the given element size. Byte elements have no floating-point form.
pub fn vfp_expand_imm(esz: ElementSize, imm8: u32) -> Option<u64> {
    let sign = (imm8 >> 7) & 1 != 0;
    let b6 = (imm8 >> 6) & 1 != 0;
    let low = (imm8 & 0x3f) as u64;
    let sign_bit = if sign { 0x8000u64 } else { 0 };
    match esz {
        ElementSize::B => None,
        ElementSize::H => Some(sign_bit | if b6 { 0x3000 } else { 0x4000 } | (low << 6)),
        ElementSize::S => {
            Some((sign_bit | if b6 { 0x3e00 } else { 0x4000 } | (low << 3)) << 16)
        }
        ElementSize::D => Some((sign_bit | if b6 { 0x3fc0 } else { 0x4000 } | low) << 48),
    }
}

/// Converts an expanded floating-point bit pattern to `f64` for display.
pub fn fp_bits_to_f64(esz: ElementSize, bits: u64) -> f64 {
    match esz {
        ElementSize::D => f64::from_bits(bits),
        ElementSize::S => f32::from_bits(bits as u32) as f64,
        _ => {
            let h = bits as u16;
            let sign = if h & 0x8000 != 0 { -1.0 } else { 1.0 };
            let exp = ((h >> 10) & 0x1f) as i32;
            let frac = (h & 0x3ff) as f64;
            match exp {
                0 => sign * frac * 2f64.powi(-24),
                0x1f if frac == 0.0 => sign * f64::INFINITY,
                0x1f => f64::NAN,
                _ => sign * (1.0 + frac / 1024.0) * 2f64.powi(exp - 15),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tszimm() {
        assert_eq!(tszimm_esz(0), None);
        assert_eq!(tszimm_esz(0b0000_1000), Some(ElementSize::B));
        assert_eq!(tszimm_esz(0b0001_0101), Some(ElementSize::H));
        assert_eq!(tszimm_esz(0b0010_0000), Some(ElementSize::S));
        assert_eq!(tszimm_esz(0b0111_1111), Some(ElementSize::D));

        // asr z0.b, z0.b, #8 encodes x = 8
        assert_eq!(tszimm_shr(8, ElementSize::B), 8);
        assert_eq!(tszimm_shr(15, ElementSize::B), 1);
        assert_eq!(tszimm_shl(8, ElementSize::B), 0);
        assert_eq!(tszimm_shl(127, ElementSize::D), 63);
    }

    #[test]
    fn test_shifted_imm8() {
        assert_eq!(expand_imm_sh8s(0x0ff), -1);
        assert_eq!(expand_imm_sh8s(0x1ff), -256);
        assert_eq!(expand_imm_sh8u(0x1ff), 0xff00);
        assert_eq!(expand_imm_sh8u(0x07f), 0x7f);
    }

    #[test]
    fn test_bit_masks() {
        // N=1, immr=0, imms=0: a single set bit in 64-bit elements.
        assert_eq!(decode_bit_masks(0x1000), Some(1));
        // N=0, imms=0b111100: 2-bit elements with one set bit.
        assert_eq!(decode_bit_masks(0x003c), Some(0x5555_5555_5555_5555));
        // 8-bit elements, 4 ones, rotated right by 4.
        assert_eq!(decode_bit_masks((4 << 6) | 0x33), Some(0xf0f0_f0f0_f0f0_f0f0));
        // All-ones element is reserved.
        assert_eq!(decode_bit_masks(0x103f), None);
        // N=0 with imms=0b111111 has no valid element size.
        assert_eq!(decode_bit_masks(0x003f), None);
    }

    #[test]
    fn test_fp_imm() {
        assert_eq!(vfp_expand_imm(ElementSize::B, 0x70), None);
        assert_eq!(vfp_expand_imm(ElementSize::H, 0x70), Some(0x3c00));
        assert_eq!(vfp_expand_imm(ElementSize::S, 0x70), Some(0x3f80_0000));
        assert_eq!(vfp_expand_imm(ElementSize::D, 0x70), Some(0x3ff0_0000_0000_0000));
        assert_eq!(vfp_expand_imm(ElementSize::S, 0x00), Some(0x4000_0000));
        assert_eq!(vfp_expand_imm(ElementSize::S, 0xf0), Some(0xbf80_0000));
        assert_eq!(fp_bits_to_f64(ElementSize::H, 0x3c00), 1.0);
        assert_eq!(fp_bits_to_f64(ElementSize::H, 0xc000), -2.0);
    }
}
