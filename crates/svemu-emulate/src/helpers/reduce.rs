//! Horizontal reductions.

use super::fp;
use crate::lanes::{mask, sext, smax_value, smin_value};
use crate::ops::{BinaryOp, ReduceOp};
use crate::regfile::{Offset, RegisterFile};
use svemu_core::ElementSize;

/// Folds the active lanes of `src`; the sums are widened to 64 bits.
fn fold(op: ReduceOp, esz: ElementSize, lanes: impl Iterator<Item = u64>) -> u64 {
    let init = match op {
        ReduceOp::Andv | ReduceOp::Uminv => esz.value_mask(),
        ReduceOp::Smaxv => mask(smin_value(esz) as u64, esz),
        ReduceOp::Sminv => smax_value(esz) as u64,
        _ => 0,
    };
    lanes.fold(init, |acc, v| match op {
        ReduceOp::Orv => acc | v,
        ReduceOp::Eorv => acc ^ v,
        ReduceOp::Andv => acc & v,
        ReduceOp::Saddv => acc.wrapping_add(sext(v, esz) as u64),
        ReduceOp::Uaddv => acc.wrapping_add(v),
        ReduceOp::Smaxv => {
            if sext(v, esz) > sext(acc, esz) {
                v
            } else {
                acc
            }
        }
        ReduceOp::Umaxv => acc.max(v),
        ReduceOp::Sminv => {
            if sext(v, esz) < sext(acc, esz) {
                v
            } else {
                acc
            }
        }
        ReduceOp::Uminv => acc.min(v),
    })
}

/// Writes a SIMD&FP scalar: the low element, with the rest of the vector
/// register zeroed.
fn write_scalar(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, value: u64) {
    let vl = regs.vector_length().bytes();
    regs.bytes_mut(dst, vl).fill(0);
    regs.set_elem(dst, esz, 0, value);
}

pub(super) fn reduce(regs: &mut RegisterFile, op: ReduceOp, esz: ElementSize, dst: Offset, src: Offset, pg: Offset) {
    let active: Vec<u64> = regs
        .elems(src, esz)
        .into_iter()
        .enumerate()
        .filter(|&(i, _)| regs.lane_active(pg, esz, i))
        .map(|(_, v)| v)
        .collect();
    let value = fold(op, esz, active.into_iter());
    let out_esz = match op {
        ReduceOp::Saddv | ReduceOp::Uaddv => ElementSize::D,
        _ => esz,
    };
    write_scalar(regs, out_esz, dst, value);
}

/// FADDA: strictly ordered accumulation, lowest lane first, into the
/// scalar held in the low element of `dst`.
pub(super) fn fadda(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, src: Offset, pg: Offset) {
    let mut acc = regs.elem(dst, esz, 0);
    for (i, v) in regs.elems(src, esz).into_iter().enumerate() {
        if regs.lane_active(pg, esz, i) {
            acc = fp::binary(BinaryOp::FAdd, esz, acc, v);
        }
    }
    write_scalar(regs, esz, dst, acc);
}

#[cfg(test)]
mod tests {
    use super::*;
    use svemu_core::VectorLength;
    use ElementSize::{B, D, S};

    fn setup() -> (RegisterFile, Offset, Offset, Offset) {
        let r = RegisterFile::new(VectorLength::from_bytes(16).unwrap());
        let (z0, z1, p0) = (r.zreg_offset(0), r.zreg_offset(1), r.preg_offset(0));
        (r, z0, z1, p0)
    }

    #[test]
    fn test_integer_reductions() {
        let (mut r, z0, z1, p0) = setup();
        r.set_elems(z1, B, &[0xff, 1, 0x80, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x7f]);
        r.set_pred_words(p0, &[0x800f]); // lanes 0-3 and 15

        reduce(&mut r, ReduceOp::Saddv, B, z0, z1, p0);
        assert_eq!(r.elem(z0, D, 0), (-1i64 + 1 - 128 + 3 + 127) as u64);
        assert_eq!(r.elem(z0, D, 1), 0);
        reduce(&mut r, ReduceOp::Uaddv, B, z0, z1, p0);
        assert_eq!(r.elem(z0, D, 0), 0xff + 1 + 0x80 + 3 + 0x7f);
        reduce(&mut r, ReduceOp::Smaxv, B, z0, z1, p0);
        assert_eq!(r.elems(z0, B)[..2], [0x7f, 0]);
        reduce(&mut r, ReduceOp::Sminv, B, z0, z1, p0);
        assert_eq!(r.elem(z0, B, 0), 0x80);
        reduce(&mut r, ReduceOp::Uminv, B, z0, z1, p0);
        assert_eq!(r.elem(z0, B, 0), 1);
        reduce(&mut r, ReduceOp::Eorv, B, z0, z1, p0);
        assert_eq!(r.elem(z0, B, 0), 0xff ^ 1 ^ 0x80 ^ 3 ^ 0x7f);
    }

    #[test]
    fn test_empty_reductions_give_identity() {
        let (mut r, z0, z1, p0) = setup();
        r.set_pred_words(p0, &[0]);
        reduce(&mut r, ReduceOp::Andv, S, z0, z1, p0);
        assert_eq!(r.elem(z0, S, 0), 0xffff_ffff);
        reduce(&mut r, ReduceOp::Smaxv, S, z0, z1, p0);
        assert_eq!(r.elem(z0, S, 0), 0x8000_0000);
        reduce(&mut r, ReduceOp::Uminv, D, z0, z1, p0);
        assert_eq!(r.elem(z0, D, 0), u64::MAX);
    }

    #[test]
    fn test_fadda_is_ordered() {
        let (mut r, z0, z1, p0) = setup();
        r.set_pred_words(p0, &r.ones(S));
        let big = 1.0e8f32;
        r.set_elems(z1, S, &[big.to_bits() as u64, 1.0f32.to_bits() as u64, (-big).to_bits() as u64, 1.0f32.to_bits() as u64]);
        r.set_elems(z0, S, &[0, 9, 9, 9]);
        fadda(&mut r, S, z0, z1, p0);
        // 1e8 + 1 rounds back to 1e8, so only the final 1.0 survives.
        assert_eq!(r.elems(z0, S), vec![1.0f32.to_bits() as u64, 0, 0, 0]);
    }
}
