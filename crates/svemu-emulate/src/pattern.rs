//! Predicate constraint patterns.
//!
//! The 5-bit pattern operand of PTRUE, CNT, INC/DEC and their saturating
//! forms selects how many leading elements are counted.

use svemu_core::{ElementSize, VectorLength};

/// `POW2`: the largest power of two not above the element count.
pub const POW2: u8 = 0x00;
/// `MUL4`: the element count rounded down to a multiple of 4.
pub const MUL4: u8 = 0x1d;
/// `MUL3`: the element count rounded down to a multiple of 3.
pub const MUL3: u8 = 0x1e;
/// `ALL`: every element.
pub const ALL: u8 = 0x1f;

/// Number of elements a pattern selects at vector length `vl` and element
/// size `esz`.
///
/// Fixed-count patterns (`VL1`-`VL8`, `VL16`-`VL256`) yield their count
/// only when the vector holds at least that many elements, and zero
/// otherwise. Unallocated pattern codes yield zero.
pub fn decode_pattern(vl: VectorLength, pattern: u8, esz: ElementSize) -> usize {
    let elements = vl.elements(esz);
    let bound = match pattern {
        POW2 => return pow2_floor(elements),
        0x01..=0x08 => pattern as usize,
        0x09..=0x0d => 16 << (pattern - 0x09),
        MUL4 => return elements - elements % 4,
        MUL3 => return elements - elements % 3,
        ALL => return elements,
        _ => return 0,
    };
    if bound <= elements {
        bound
    } else {
        0
    }
}

/// Largest power of two not above `n` (zero for zero).
pub fn pow2_floor(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}
