//! Floating-point lane arithmetic for half, single and double precision.
//!
//! Values travel as raw bits in a `u64`. Half and single precision are
//! computed in `f64` and rounded once to the target format; for addition,
//! subtraction, multiplication and division the wider intermediate makes
//! that single rounding exact. NaN propagation follows the AArch64 rules
//! with default-NaN mode off: the first signalling NaN operand is quieted
//! and returned, otherwise the first quiet NaN; a NaN produced from
//! non-NaN operands becomes the default NaN. Exception flags are not
//! accumulated.

use crate::ops::{BinaryOp, TernaryOp};
use svemu_core::ElementSize;

/// Sign bit of a floating-point lane.
pub fn sign_bit(esz: ElementSize) -> u64 {
    1 << (esz.bits() - 1)
}

fn exp_mask(esz: ElementSize) -> u64 {
    match esz {
        ElementSize::H => 0x7c00,
        ElementSize::S => 0x7f80_0000,
        _ => 0x7ff0_0000_0000_0000,
    }
}

fn quiet_bit(esz: ElementSize) -> u64 {
    match esz {
        ElementSize::H => 1 << 9,
        ElementSize::S => 1 << 22,
        _ => 1 << 51,
    }
}

/// The default NaN for a precision.
pub fn default_nan(esz: ElementSize) -> u64 {
    exp_mask(esz) | quiet_bit(esz)
}

/// Returns true if the lane holds a NaN.
pub fn is_nan(bits: u64, esz: ElementSize) -> bool {
    let frac = esz.value_mask() >> 1 & !exp_mask(esz);
    bits & exp_mask(esz) == exp_mask(esz) && bits & frac != 0
}

fn is_snan(bits: u64, esz: ElementSize) -> bool {
    is_nan(bits, esz) && bits & quiet_bit(esz) == 0
}

fn is_qnan(bits: u64, esz: ElementSize) -> bool {
    is_nan(bits, esz) && bits & quiet_bit(esz) != 0
}

fn is_inf(bits: u64, esz: ElementSize) -> bool {
    bits & (esz.value_mask() >> 1) == exp_mask(esz)
}

fn is_zero(bits: u64, esz: ElementSize) -> bool {
    bits & (esz.value_mask() >> 1) == 0
}

/// Picks the NaN result for a list of operands, if any is a NaN.
fn process_nans(ops: &[u64], esz: ElementSize) -> Option<u64> {
    if let Some(&s) = ops.iter().find(|&&x| is_snan(x, esz)) {
        return Some(s | quiet_bit(esz));
    }
    ops.iter().copied().find(|&x| is_qnan(x, esz))
}

// ==================== Half precision ====================

/// Converts IEEE half-precision bits to `f64` (exact).
pub fn f16_to_f64(h: u16) -> f64 {
    let sign = (h as u64 & 0x8000) << 48;
    let exp = (h >> 10) & 0x1f;
    let frac = (h & 0x3ff) as u64;
    match exp {
        0 => {
            let magnitude = frac as f64 * (2.0f64).powi(-24);
            if sign != 0 {
                -magnitude
            } else {
                magnitude
            }
        }
        0x1f => f64::from_bits(sign | 0x7ff0_0000_0000_0000 | frac << 42),
        _ => f64::from_bits(sign | ((exp as u64 + 1008) << 52) | frac << 42),
    }
}

/// Converts `f64` to IEEE half-precision bits, rounding to nearest even.
pub fn f64_to_f16(v: f64) -> u16 {
    let bits = v.to_bits();
    let sign = ((bits >> 48) & 0x8000) as u16;
    let exp = ((bits >> 52) & 0x7ff) as i32;
    let frac = bits & 0x000f_ffff_ffff_ffff;

    if exp == 0x7ff {
        if frac == 0 {
            return sign | 0x7c00;
        }
        return sign | 0x7c00 | 0x200 | ((frac >> 42) as u16 & 0x3ff);
    }

    let e = exp - 1008;
    if e >= 0x1f {
        return sign | 0x7c00;
    }
    if e <= 0 {
        // Subnormal half (or zero): shift the full significand into place.
        let shift = (43 - e) as u32;
        if shift >= 64 || exp == 0 {
            return sign;
        }
        let m = frac | 1 << 52;
        return sign | round_shift(m, shift) as u16;
    }

    // Normal: a carry out of the mantissa bumps the exponent, and out of
    // the largest exponent yields infinity.
    let combined = ((e as u64) << 52 | frac) >> 42;
    let rest = frac & ((1 << 42) - 1);
    let half = 1u64 << 41;
    let rounded = if rest > half || (rest == half && combined & 1 != 0) {
        combined + 1
    } else {
        combined
    };
    sign | rounded.min(0x7c00) as u16
}

fn round_shift(m: u64, shift: u32) -> u64 {
    let q = m >> shift;
    let rest = m & ((1 << shift) - 1);
    let half = 1u64 << (shift - 1);
    if rest > half || (rest == half && q & 1 != 0) {
        q + 1
    } else {
        q
    }
}

// ==================== Packing ====================

/// Widens a lane to `f64` (exact for every precision).
pub fn unpack(bits: u64, esz: ElementSize) -> f64 {
    match esz {
        ElementSize::H => f16_to_f64(bits as u16),
        ElementSize::S => f32::from_bits(bits as u32) as f64,
        _ => f64::from_bits(bits),
    }
}

/// Rounds an `f64` to the lane precision.
pub fn pack(v: f64, esz: ElementSize) -> u64 {
    match esz {
        ElementSize::H => f64_to_f16(v) as u64,
        ElementSize::S => (v as f32).to_bits() as u64,
        _ => v.to_bits(),
    }
}

fn finish(v: f64, esz: ElementSize) -> u64 {
    if v.is_nan() {
        default_nan(esz)
    } else {
        pack(v, esz)
    }
}

// ==================== Operations ====================

fn max_min(a: u64, b: u64, esz: ElementSize, max: bool) -> u64 {
    let (x, y) = (unpack(a, esz), unpack(b, esz));
    if x == y {
        // +0 and -0 compare equal: max prefers +0, min prefers -0.
        let sign = sign_bit(esz);
        return if max { a & b & sign | a & !sign } else { (a | b) & sign | a & !sign };
    }
    if (x > y) == max {
        a
    } else {
        b
    }
}

/// Applies a floating-point binary operation to two lanes.
pub fn binary(op: BinaryOp, esz: ElementSize, a: u64, b: u64) -> u64 {
    let (mut a, mut b) = (a & esz.value_mask(), b & esz.value_mask());
    match op {
        BinaryOp::FMaxnm | BinaryOp::FMinnm => {
            // A single quiet NaN loses to a number.
            let inf = exp_mask(esz);
            let replacement = if op == BinaryOp::FMaxnm {
                inf | sign_bit(esz)
            } else {
                inf
            };
            if is_qnan(a, esz) && !is_qnan(b, esz) {
                a = replacement;
            } else if is_qnan(b, esz) && !is_qnan(a, esz) {
                b = replacement;
            }
        }
        _ => {}
    }
    if let Some(nan) = process_nans(&[a, b], esz) {
        return nan;
    }
    let (x, y) = (unpack(a, esz), unpack(b, esz));
    match op {
        BinaryOp::FAdd => finish(x + y, esz),
        BinaryOp::FSub => finish(x - y, esz),
        BinaryOp::FMul => finish(x * y, esz),
        BinaryOp::FDiv => finish(x / y, esz),
        BinaryOp::FAbd => finish((x - y).abs(), esz),
        BinaryOp::FMax | BinaryOp::FMaxnm => max_min(a, b, esz, true),
        BinaryOp::FMin | BinaryOp::FMinnm => max_min(a, b, esz, false),
        _ => default_nan(esz),
    }
}

/// Fused multiply-add `acc + a * b` after the negations `op` calls for.
pub fn fma(op: TernaryOp, esz: ElementSize, acc: u64, a: u64, b: u64) -> u64 {
    let sign = sign_bit(esz);
    let (neg_acc, neg_a) = match op {
        TernaryOp::FMls => (false, true),
        TernaryOp::FNmla => (true, true),
        TernaryOp::FNmls => (true, false),
        _ => (false, false),
    };
    let acc = (acc & esz.value_mask()) ^ if neg_acc { sign } else { 0 };
    let a = (a & esz.value_mask()) ^ if neg_a { sign } else { 0 };
    let b = b & esz.value_mask();

    let inf_times_zero =
        (is_inf(a, esz) && is_zero(b, esz)) || (is_zero(a, esz) && is_inf(b, esz));
    if inf_times_zero && is_qnan(acc, esz) {
        return default_nan(esz);
    }
    if let Some(nan) = process_nans(&[acc, a, b], esz) {
        return nan;
    }
    match esz {
        ElementSize::S => {
            let r = f32::from_bits(a as u32).mul_add(f32::from_bits(b as u32), f32::from_bits(acc as u32));
            if r.is_nan() {
                default_nan(esz)
            } else {
                r.to_bits() as u64
            }
        }
        _ => finish(unpack(a, esz).mul_add(unpack(b, esz), unpack(acc, esz)), esz),
    }
}

/// Converts a `src_esz` integer lane to floating point of size `esz`.
pub fn from_int(value: u64, src_esz: ElementSize, esz: ElementSize, unsigned: bool) -> u64 {
    let v = value & src_esz.value_mask();
    let signed = crate::lanes::sext(v, src_esz);
    match esz {
        ElementSize::S => {
            let f = if unsigned { v as f32 } else { signed as f32 };
            f.to_bits() as u64
        }
        ElementSize::D => {
            let f = if unsigned { v as f64 } else { signed as f64 };
            f.to_bits()
        }
        _ => {
            let f = if unsigned { v as f64 } else { signed as f64 };
            f64_to_f16(f) as u64
        }
    }
}

// Fraction bits of 2^(i/32) for half precision and 2^(i/64) otherwise.
const FEXPA_COEFF_H: [u16; 32] = [
    0x0000, 0x0016, 0x002d, 0x0045, 0x005d, 0x0075, 0x008e, 0x00a8,
    0x00c2, 0x00dc, 0x00f8, 0x0114, 0x0130, 0x014d, 0x016b, 0x0189,
    0x01a8, 0x01c8, 0x01e8, 0x0209, 0x022b, 0x024e, 0x0271, 0x0295,
    0x02ba, 0x02e0, 0x0306, 0x032e, 0x0356, 0x037f, 0x03a9, 0x03d4,
];

const FEXPA_COEFF_S: [u32; 64] = [
    0x000000, 0x0164d2, 0x02cd87, 0x043a29, 0x05aac3, 0x071f62, 0x08980f, 0x0a14d5,
    0x0b95c2, 0x0d1adf, 0x0ea43a, 0x1031dc, 0x11c3d3, 0x135a2b, 0x14f4f0, 0x16942d,
    0x1837f0, 0x19e046, 0x1b8d3a, 0x1d3eda, 0x1ef532, 0x20b051, 0x227043, 0x243516,
    0x25fed7, 0x27cd94, 0x29a15b, 0x2b7a3a, 0x2d583f, 0x2f3b79, 0x3123f6, 0x3311c4,
    0x3504f3, 0x36fd92, 0x38fbaf, 0x3aff5b, 0x3d08a4, 0x3f179a, 0x412c4d, 0x4346cd,
    0x45672a, 0x478d75, 0x49b9be, 0x4bec15, 0x4e248c, 0x506334, 0x52a81e, 0x54f35b,
    0x5744fd, 0x599d16, 0x5bfbb8, 0x5e60f5, 0x60ccdf, 0x633f89, 0x65b907, 0x68396a,
    0x6ac0c7, 0x6d4f30, 0x6fe4ba, 0x728177, 0x75257d, 0x77d0df, 0x7a83b3, 0x7d3e0c,
];

const FEXPA_COEFF_D: [u64; 64] = [
    0x0000000000000, 0x02c9a3e778061, 0x059b0d3158574, 0x0874518759bc8,
    0x0b5586cf9890f, 0x0e3ec32d3d1a2, 0x11301d0125b51, 0x1429aaea92de0,
    0x172b83c7d517b, 0x1a35beb6fcb75, 0x1d4873168b9aa, 0x2063b88628cd6,
    0x2387a6e756238, 0x26b4565e27cdd, 0x29e9df51fdee1, 0x2d285a6e4030b,
    0x306fe0a31b715, 0x33c08b26416ff, 0x371a7373aa9cb, 0x3a7db34e59ff7,
    0x3dea64c123422, 0x4160a21f72e2a, 0x44e086061892d, 0x486a2b5c13cd0,
    0x4bfdad5362a27, 0x4f9b2769d2ca7, 0x5342b569d4f82, 0x56f4736b527da,
    0x5ab07dd485429, 0x5e76f15ad2148, 0x6247eb03a5585, 0x6623882552225,
    0x6a09e667f3bcd, 0x6dfb23c651a2f, 0x71f75e8ec5f74, 0x75feb564267c9,
    0x7a11473eb0187, 0x7e2f336cf4e62, 0x82589994cce13, 0x868d99b4492ed,
    0x8ace5422aa0db, 0x8f1ae99157736, 0x93737b0cdc5e5, 0x97d829fde4e50,
    0x9c49182a3f090, 0xa0c667b5de565, 0xa5503b23e255d, 0xa9e6b5579fdbf,
    0xae89f995ad3ad, 0xb33a2b84f15fb, 0xb7f76f2fb5e47, 0xbcc1e904bc1d2,
    0xc199bdd85529c, 0xc67f12e57d14b, 0xcb720dcef9069, 0xd072d4a07897c,
    0xd5818dcfba487, 0xda9e603db3285, 0xdfc97337b9b5f, 0xe502ee78b3ff6,
    0xea4afa2a490da, 0xefa1bee615a27, 0xf50765b6e4540, 0xfa7c1819e90d8,
];

/// FEXPA: the low bits of the lane index the fraction table, the bits
/// above them supply the biased exponent.
pub fn fexpa(op: u64, esz: ElementSize) -> u64 {
    match esz {
        ElementSize::H => {
            let exp = (op >> 5) & 0x1f;
            (exp << 10) | FEXPA_COEFF_H[(op & 0x1f) as usize] as u64
        }
        ElementSize::S => {
            let exp = (op >> 6) & 0xff;
            (exp << 23) | FEXPA_COEFF_S[(op & 0x3f) as usize] as u64
        }
        _ => {
            let exp = (op >> 6) & 0x7ff;
            (exp << 52) | FEXPA_COEFF_D[(op & 0x3f) as usize]
        }
    }
}

fn one(esz: ElementSize) -> u64 {
    match esz {
        ElementSize::H => 0x3c00,
        ElementSize::S => 0x3f80_0000,
        _ => 0x3ff0_0000_0000_0000,
    }
}

/// FTSSEL: bit 0 of `sel` replaces the lane with 1.0, bit 1 flips its sign.
pub fn ftssel(a: u64, sel: u64, esz: ElementSize) -> u64 {
    let mut r = if sel & 1 != 0 { one(esz) } else { a & esz.value_mask() };
    if sel & 2 != 0 {
        r ^= sign_bit(esz);
    }
    r
}
