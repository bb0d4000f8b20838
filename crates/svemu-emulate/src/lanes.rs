//! Per-lane integer arithmetic.
//!
//! Every function works on lane values held in a `u64`, with the element
//! size passed alongside. Inputs may carry garbage above the lane width;
//! results are always truncated to the lane width.

use svemu_core::ElementSize;

/// Truncates a value to the lane width.
#[inline]
pub fn mask(value: u64, esz: ElementSize) -> u64 {
    value & esz.value_mask()
}

/// Sign-extends a lane value to 64 bits.
#[inline]
pub fn sext(value: u64, esz: ElementSize) -> i64 {
    let shift = 64 - esz.bits();
    ((value << shift) as i64) >> shift
}

/// Largest signed value of a lane.
#[inline]
pub fn smax_value(esz: ElementSize) -> i64 {
    (esz.value_mask() >> 1) as i64
}

/// Smallest signed value of a lane.
#[inline]
pub fn smin_value(esz: ElementSize) -> i64 {
    -smax_value(esz) - 1
}

// ==================== Shifts ====================

/// Logical shift left; amounts of the lane width or more give zero.
pub fn lsl(value: u64, shift: u64, esz: ElementSize) -> u64 {
    if shift >= esz.bits() as u64 {
        0
    } else {
        mask(value << shift, esz)
    }
}

/// Logical shift right; amounts of the lane width or more give zero.
pub fn lsr(value: u64, shift: u64, esz: ElementSize) -> u64 {
    if shift >= esz.bits() as u64 {
        0
    } else {
        mask(value, esz) >> shift
    }
}

/// Arithmetic shift right; amounts of the lane width or more fill the lane
/// with the sign bit.
pub fn asr(value: u64, shift: u64, esz: ElementSize) -> u64 {
    let shift = shift.min(esz.bits() as u64 - 1);
    mask((sext(value, esz) >> shift) as u64, esz)
}

/// Arithmetic shift right for divide: rounds toward zero.
pub fn asrd(value: u64, shift: u64, esz: ElementSize) -> u64 {
    if shift >= esz.bits() as u64 {
        return 0;
    }
    let v = sext(value, esz);
    let mut r = v >> shift;
    if v < 0 && shift > 0 && v & ((1i64 << shift) - 1) != 0 {
        r += 1;
    }
    mask(r as u64, esz)
}

// ==================== Multiply and divide ====================

/// High half of the signed product.
pub fn smulh(a: u64, b: u64, esz: ElementSize) -> u64 {
    let p = sext(a, esz) as i128 * sext(b, esz) as i128;
    mask((p >> esz.bits()) as u64, esz)
}

/// High half of the unsigned product.
pub fn umulh(a: u64, b: u64, esz: ElementSize) -> u64 {
    let p = mask(a, esz) as u128 * mask(b, esz) as u128;
    mask((p >> esz.bits()) as u64, esz)
}

/// Signed divide; division by zero gives zero and the most negative value
/// divided by -1 wraps.
pub fn sdiv(a: u64, b: u64, esz: ElementSize) -> u64 {
    let d = sext(b, esz);
    if d == 0 {
        return 0;
    }
    mask(sext(a, esz).wrapping_div(d) as u64, esz)
}

/// Unsigned divide; division by zero gives zero.
pub fn udiv(a: u64, b: u64, esz: ElementSize) -> u64 {
    let d = mask(b, esz);
    if d == 0 {
        return 0;
    }
    mask(a, esz) / d
}

// ==================== Saturating ====================

fn clamp_signed(v: i128, esz: ElementSize) -> u64 {
    let v = v.clamp(smin_value(esz) as i128, smax_value(esz) as i128);
    mask(v as u64, esz)
}

fn clamp_unsigned(v: i128, esz: ElementSize) -> u64 {
    v.clamp(0, esz.value_mask() as i128) as u64
}

/// Signed saturating add.
pub fn sqadd(a: u64, b: u64, esz: ElementSize) -> u64 {
    clamp_signed(sext(a, esz) as i128 + sext(b, esz) as i128, esz)
}

/// Unsigned saturating add.
pub fn uqadd(a: u64, b: u64, esz: ElementSize) -> u64 {
    clamp_unsigned(mask(a, esz) as i128 + mask(b, esz) as i128, esz)
}

/// Signed saturating subtract.
pub fn sqsub(a: u64, b: u64, esz: ElementSize) -> u64 {
    clamp_signed(sext(a, esz) as i128 - sext(b, esz) as i128, esz)
}

/// Unsigned saturating subtract.
pub fn uqsub(a: u64, b: u64, esz: ElementSize) -> u64 {
    clamp_unsigned(mask(a, esz) as i128 - mask(b, esz) as i128, esz)
}

/// Signed saturating add of a 64-bit signed amount (element-count forms).
pub fn sqadd_wide(a: u64, amount: i64, esz: ElementSize) -> u64 {
    clamp_signed(sext(a, esz) as i128 + amount as i128, esz)
}

/// Unsigned saturating add of a 64-bit signed amount (element-count forms).
pub fn uqadd_wide(a: u64, amount: i64, esz: ElementSize) -> u64 {
    clamp_unsigned(mask(a, esz) as i128 + amount as i128, esz)
}

// ==================== Bit counting ====================

/// Count leading sign bits (excluding the sign bit itself).
pub fn cls(value: u64, esz: ElementSize) -> u64 {
    let v = sext(value, esz);
    let x = if v < 0 { !v } else { v } as u64;
    (x.leading_zeros() - (64 - esz.bits())) as u64 - 1
}

/// Count leading zero bits.
pub fn clz(value: u64, esz: ElementSize) -> u64 {
    (mask(value, esz).leading_zeros() - (64 - esz.bits())) as u64
}

/// Population count.
pub fn cnt(value: u64, esz: ElementSize) -> u64 {
    mask(value, esz).count_ones() as u64
}

// ==================== Reversal ====================

/// Reverses the order of `unit`-sized chunks within a lane.
pub fn rev_units(value: u64, esz: ElementSize, unit: ElementSize) -> u64 {
    let n = esz.bytes() / unit.bytes();
    let ubits = unit.bits();
    let mut out = 0u64;
    for i in 0..n {
        let chunk = (value >> (i as u32 * ubits)) & unit.value_mask();
        out |= chunk << ((n - 1 - i) as u32 * ubits);
    }
    out
}

/// Reverses the bit order within a lane.
pub fn rbit(value: u64, esz: ElementSize) -> u64 {
    value.reverse_bits() >> (64 - esz.bits())
}

// ==================== Misc ====================

/// Absolute value (the most negative value maps to itself).
pub fn abs(value: u64, esz: ElementSize) -> u64 {
    mask(sext(value, esz).wrapping_abs() as u64, esz)
}

/// Two's complement negation.
pub fn neg(value: u64, esz: ElementSize) -> u64 {
    mask(value.wrapping_neg(), esz)
}

/// Absolute difference, signed or unsigned.
pub fn abd(a: u64, b: u64, esz: ElementSize, signed: bool) -> u64 {
    if signed {
        let (x, y) = (sext(a, esz), sext(b, esz));
        mask((x as i128 - y as i128).unsigned_abs() as u64, esz)
    } else {
        let (x, y) = (mask(a, esz), mask(b, esz));
        x.abs_diff(y)
    }
}

/// Sign- or zero-extends the low `from` part of a lane.
pub fn extend(value: u64, from: ElementSize, signed: bool, esz: ElementSize) -> u64 {
    if signed {
        mask(sext(value, from) as u64, esz)
    } else {
        mask(value, from)
    }
}

// ==================== Scalar saturating increment ====================

/// Adds or subtracts `amount` from a general register.
///
/// With `sf` clear the operation is performed on the low 32 bits: the
/// signed forms sign-extend the saturated result to 64 bits and the
/// unsigned forms zero-extend it.
pub fn saturate_scalar(value: u64, amount: u64, decrement: bool, unsigned: bool, sf: bool) -> u64 {
    let delta = if decrement {
        -(amount as i128)
    } else {
        amount as i128
    };
    match (sf, unsigned) {
        (false, true) => {
            let r = (value as u32 as i128 + delta).clamp(0, u32::MAX as i128);
            r as u64
        }
        (false, false) => {
            let r = (value as i32 as i128 + delta).clamp(i32::MIN as i128, i32::MAX as i128);
            r as i64 as u64
        }
        (true, true) => (value as i128 + delta).clamp(0, u64::MAX as i128) as u64,
        (true, false) => {
            let r = (value as i64 as i128 + delta).clamp(i64::MIN as i128, i64::MAX as i128);
            r as i64 as u64
        }
    }
}
