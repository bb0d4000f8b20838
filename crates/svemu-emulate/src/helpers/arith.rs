//! Integer and floating-point lane arithmetic, and scalar counts.

use super::{fp, scalar, write_lanes};
use crate::lanes::{self, mask, sext};
use crate::ops::{Amount, BinaryOp, Extend, Operand2, Predication, Saturation, ScalarSrc, TernaryOp, UnaryOp};
use crate::regfile::{Gpr, Offset, RegisterFile};
use svemu_core::ElementSize;

pub(super) fn dup(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, value: ScalarSrc, pred: Predication) {
    let v = scalar(regs, value, esz);
    let n = regs.vector_length().elements(esz);
    write_lanes(regs, esz, dst, pred, &vec![v; n]);
}

fn unary_lane(op: UnaryOp, esz: ElementSize, v: u64) -> u64 {
    match op {
        UnaryOp::Mov => v,
        UnaryOp::Cls => lanes::cls(v, esz),
        UnaryOp::Clz => lanes::clz(v, esz),
        UnaryOp::Cnt => lanes::cnt(v, esz),
        UnaryOp::Cnot => (mask(v, esz) == 0) as u64,
        UnaryOp::Not => mask(!v, esz),
        UnaryOp::Abs => lanes::abs(v, esz),
        UnaryOp::Neg => lanes::neg(v, esz),
        UnaryOp::Sext(from) => lanes::extend(v, from, true, esz),
        UnaryOp::Zext(from) => lanes::extend(v, from, false, esz),
        UnaryOp::Rev(unit) => lanes::rev_units(v, esz, unit),
        UnaryOp::Rbit => lanes::rbit(v, esz),
        UnaryOp::FAbs => v & !fp::sign_bit(esz),
        UnaryOp::FNeg => v ^ fp::sign_bit(esz),
        UnaryOp::FExpa => fp::fexpa(v, esz),
    }
}

pub(super) fn unary(
    regs: &mut RegisterFile,
    op: UnaryOp,
    esz: ElementSize,
    dst: Offset,
    src: Offset,
    pred: Predication,
) {
    let out: Vec<u64> = regs
        .elems(src, esz)
        .into_iter()
        .map(|v| unary_lane(op, esz, v))
        .collect();
    write_lanes(regs, esz, dst, pred, &out);
}

/// Second-operand lanes: the 64-bit element overlapping each lane for the
/// wide forms, the unmasked immediate for immediates.
pub(super) fn operand2(regs: &RegisterFile, esz: ElementSize, b: Operand2) -> Vec<u64> {
    let n = regs.vector_length().elements(esz);
    match b {
        Operand2::Vec(off) => regs.elems(off, esz),
        Operand2::Wide(off) => (0..n)
            .map(|i| regs.elem(off, ElementSize::D, i * esz.bytes() / 8))
            .collect(),
        Operand2::Imm(v) => vec![v; n],
    }
}

/// One lane of a binary operation.
pub fn binary_lane(op: BinaryOp, esz: ElementSize, a: u64, b: u64) -> u64 {
    let a = mask(a, esz);
    match op {
        BinaryOp::Add => mask(a.wrapping_add(b), esz),
        BinaryOp::Sub => mask(a.wrapping_sub(b), esz),
        BinaryOp::Subr => mask(b.wrapping_sub(a), esz),
        BinaryOp::Smax => {
            if sext(a, esz) >= sext(b, esz) {
                a
            } else {
                mask(b, esz)
            }
        }
        BinaryOp::Umax => a.max(mask(b, esz)),
        BinaryOp::Smin => {
            if sext(a, esz) <= sext(b, esz) {
                a
            } else {
                mask(b, esz)
            }
        }
        BinaryOp::Umin => a.min(mask(b, esz)),
        BinaryOp::Sabd => lanes::abd(a, b, esz, true),
        BinaryOp::Uabd => lanes::abd(a, b, esz, false),
        BinaryOp::Mul => mask(a.wrapping_mul(b), esz),
        BinaryOp::Smulh => lanes::smulh(a, b, esz),
        BinaryOp::Umulh => lanes::umulh(a, b, esz),
        BinaryOp::Sdiv => lanes::sdiv(a, b, esz),
        BinaryOp::Udiv => lanes::udiv(a, b, esz),
        BinaryOp::Orr => mask(a | b, esz),
        BinaryOp::Eor => mask(a ^ b, esz),
        BinaryOp::And => a & b,
        BinaryOp::Bic => a & !b,
        BinaryOp::Asr => lanes::asr(a, b, esz),
        BinaryOp::Lsr => lanes::lsr(a, b, esz),
        BinaryOp::Lsl => lanes::lsl(a, b, esz),
        BinaryOp::Asrd => lanes::asrd(a, b, esz),
        BinaryOp::Sqadd => lanes::sqadd(a, b, esz),
        BinaryOp::Uqadd => lanes::uqadd(a, b, esz),
        BinaryOp::Sqsub => lanes::sqsub(a, b, esz),
        BinaryOp::Uqsub => lanes::uqsub(a, b, esz),
        BinaryOp::FAdd
        | BinaryOp::FSub
        | BinaryOp::FMul
        | BinaryOp::FDiv
        | BinaryOp::FMax
        | BinaryOp::FMin
        | BinaryOp::FMaxnm
        | BinaryOp::FMinnm
        | BinaryOp::FAbd => fp::binary(op, esz, a, b),
        BinaryOp::FTssel => fp::ftssel(a, b, esz),
    }
}

pub(super) fn binary(
    regs: &mut RegisterFile,
    op: BinaryOp,
    esz: ElementSize,
    dst: Offset,
    a: Offset,
    b: Operand2,
    pred: Predication,
) {
    let lhs = regs.elems(a, esz);
    let out: Vec<u64> = match (op, b) {
        (BinaryOp::Sqadd | BinaryOp::Uqadd | BinaryOp::Sqsub | BinaryOp::Uqsub, Operand2::Imm(imm)) => {
            lhs.iter().map(|&x| saturate_imm(op, esz, x, imm)).collect()
        }
        _ => {
            let rhs = operand2(regs, esz, b);
            lhs.iter()
                .zip(&rhs)
                .map(|(&x, &y)| binary_lane(op, esz, x, y))
                .collect()
        }
    };
    write_lanes(regs, esz, dst, pred, &out);
}

/// Saturating arithmetic against an immediate. The immediate is unsigned
/// and is not reinterpreted at the lane size.
fn saturate_imm(op: BinaryOp, esz: ElementSize, a: u64, imm: u64) -> u64 {
    let imm = imm as i64;
    match op {
        BinaryOp::Sqadd => lanes::sqadd_wide(a, imm, esz),
        BinaryOp::Sqsub => lanes::sqadd_wide(a, -imm, esz),
        BinaryOp::Uqadd => lanes::uqadd_wide(a, imm, esz),
        _ => lanes::uqadd_wide(a, -imm, esz),
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn ternary(
    regs: &mut RegisterFile,
    op: TernaryOp,
    esz: ElementSize,
    dst: Offset,
    acc: Offset,
    a: Offset,
    b: Offset,
    pg: Offset,
) {
    let acc = regs.elems(acc, esz);
    let a = regs.elems(a, esz);
    let b = regs.elems(b, esz);
    let out: Vec<u64> = (0..acc.len())
        .map(|i| match op {
            TernaryOp::Mla => mask(acc[i].wrapping_add(a[i].wrapping_mul(b[i])), esz),
            TernaryOp::Mls => mask(acc[i].wrapping_sub(a[i].wrapping_mul(b[i])), esz),
            _ => fp::fma(op, esz, acc[i], a[i], b[i]),
        })
        .collect();
    write_lanes(regs, esz, dst, Predication::Merge(pg), &out);
}

/// Integer to floating-point conversion. Lanes are the wider of the two
/// sizes; a narrower result is zero-extended into its lane.
pub(super) fn convert(
    regs: &mut RegisterFile,
    unsigned: bool,
    esz: ElementSize,
    src_esz: ElementSize,
    dst: Offset,
    src: Offset,
    pg: Offset,
) {
    let lane = if esz.bytes() >= src_esz.bytes() { esz } else { src_esz };
    let out: Vec<u64> = regs
        .elems(src, lane)
        .into_iter()
        .map(|v| fp::from_int(v, src_esz, esz, unsigned))
        .collect();
    write_lanes(regs, lane, dst, Predication::Merge(pg), &out);
}

pub(super) fn index(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, start: ScalarSrc, step: ScalarSrc) {
    let start = scalar(regs, start, esz);
    let step = scalar(regs, step, esz);
    let n = regs.vector_length().elements(esz);
    let out: Vec<u64> = (0..n as u64)
        .map(|i| mask(start.wrapping_add(i.wrapping_mul(step)), esz))
        .collect();
    regs.set_elems(dst, esz, &out);
}

pub(super) fn adr(
    regs: &mut RegisterFile,
    esz: ElementSize,
    dst: Offset,
    base: Offset,
    offset: Offset,
    extend: Extend,
    shift: u32,
) {
    let bases = regs.elems(base, esz);
    let offsets = regs.elems(offset, esz);
    let out: Vec<u64> = bases
        .iter()
        .zip(&offsets)
        .map(|(&b, &o)| mask(b.wrapping_add(extend.apply(o) << shift), esz))
        .collect();
    regs.set_elems(dst, esz, &out);
}

// ==================== Element counts ====================

fn resolve(regs: &RegisterFile, amount: Amount) -> u64 {
    match amount {
        Amount::Imm(v) => v,
        Amount::Active { esz, pred } => {
            let ones = regs.ones(esz);
            regs.pred_words(pred)
                .iter()
                .zip(&ones)
                .map(|(p, m)| (p & m).count_ones() as u64)
                .sum()
        }
    }
}

pub(super) fn scalar_incdec(
    regs: &mut RegisterFile,
    dst: Gpr,
    amount: Amount,
    decrement: bool,
    sat: Saturation,
    sf: bool,
) {
    let amount = resolve(regs, amount);
    let value = regs.gpr(dst);
    let result = match sat {
        Saturation::Wrap if decrement => value.wrapping_sub(amount),
        Saturation::Wrap => value.wrapping_add(amount),
        Saturation::Signed => lanes::saturate_scalar(value, amount, decrement, false, sf),
        Saturation::Unsigned => lanes::saturate_scalar(value, amount, decrement, true, sf),
    };
    regs.set_gpr(dst, result);
}

pub(super) fn vec_incdec(
    regs: &mut RegisterFile,
    esz: ElementSize,
    dst: Offset,
    amount: Amount,
    decrement: bool,
    sat: Saturation,
) {
    let amount = resolve(regs, amount);
    let delta = if decrement {
        -(amount as i64)
    } else {
        amount as i64
    };
    let out: Vec<u64> = regs
        .elems(dst, esz)
        .into_iter()
        .map(|v| match sat {
            Saturation::Wrap => mask(v.wrapping_add(delta as u64), esz),
            Saturation::Signed => lanes::sqadd_wide(v, delta, esz),
            Saturation::Unsigned => lanes::uqadd_wide(v, delta, esz),
        })
        .collect();
    regs.set_elems(dst, esz, &out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use svemu_core::VectorLength;
    use ElementSize::{B, D, H, S};

    fn regs() -> RegisterFile {
        RegisterFile::new(VectorLength::from_bytes(16).unwrap())
    }

    #[test]
    fn test_binary_lane_edges() {
        assert_eq!(binary_lane(BinaryOp::Sdiv, S, 7, 0), 0);
        assert_eq!(binary_lane(BinaryOp::Udiv, D, u64::MAX, 0), 0);
        assert_eq!(binary_lane(BinaryOp::Smax, B, 0x80, 0x7f), 0x7f);
        assert_eq!(binary_lane(BinaryOp::Umax, B, 0x80, 0x7f), 0x80);
        assert_eq!(binary_lane(BinaryOp::Subr, H, 1, 3), 2);
        assert_eq!(binary_lane(BinaryOp::Lsl, B, 1, 8), 0);
        assert_eq!(binary_lane(BinaryOp::Lsr, S, 0x8000_0000, 32), 0);
        assert_eq!(binary_lane(BinaryOp::Asr, B, 0x80, 200), 0xff);
        // Wide shift amounts are full 64-bit values.
        assert_eq!(binary_lane(BinaryOp::Lsl, H, 1, 1 << 40), 0);
    }

    #[test]
    fn test_saturating_immediates_are_unsigned() {
        let mut r = regs();
        let z0 = r.zreg_offset(0);
        r.set_elems(z0, H, &[0x7000, 0x0100, 0x8000, 0xffff, 0, 0, 0, 0]);
        // sqadd z0.h, z0.h, #0xff00 adds +65280, never -256
        binary(&mut r, BinaryOp::Sqadd, H, z0, z0, Operand2::Imm(0xff00), Predication::All);
        assert_eq!(r.elems(z0, H)[..4], [0x7fff, 0x7fff, 0x7f00, 0x7fff]);

        r.set_elems(z0, B, &[0x10; 16]);
        binary(&mut r, BinaryOp::Uqsub, B, z0, z0, Operand2::Imm(0x20), Predication::All);
        assert_eq!(r.elem(z0, B, 0), 0);
        binary(&mut r, BinaryOp::Sqsub, B, z0, z0, Operand2::Imm(0xff), Predication::All);
        assert_eq!(r.elem(z0, B, 0), 0x80);
    }

    #[test]
    fn test_merge_and_zero_predication() {
        let mut r = regs();
        let (z0, z1, p0) = (r.zreg_offset(0), r.zreg_offset(1), r.preg_offset(0));
        r.set_elems(z0, S, &[1, 2, 3, 4]);
        r.set_elems(z1, S, &[10, 20, 30, 40]);
        r.set_pred_words(p0, &[0x0101]); // lanes 0 and 2 at .s

        binary(&mut r, BinaryOp::Add, S, z0, z0, Operand2::Vec(z1), Predication::Merge(p0));
        assert_eq!(r.elems(z0, S), vec![11, 2, 33, 4]);

        unary(&mut r, UnaryOp::Neg, S, z1, z1, Predication::Zero(p0));
        assert_eq!(r.elems(z1, S), vec![(-10i32) as u32 as u64, 0, (-30i32) as u32 as u64, 0]);
    }

    #[test]
    fn test_wide_operand() {
        let mut r = regs();
        let (z0, z1) = (r.zreg_offset(0), r.zreg_offset(1));
        r.set_elems(z1, D, &[1, 2]);
        assert_eq!(operand2(&r, H, Operand2::Wide(z1)), vec![1, 1, 1, 1, 2, 2, 2, 2]);
        r.set_elems(z0, H, &[1; 8]);
        binary(&mut r, BinaryOp::Lsl, H, z0, z0, Operand2::Wide(z1), Predication::All);
        assert_eq!(r.elems(z0, H), vec![2, 2, 2, 2, 4, 4, 4, 4]);
    }

    #[test]
    fn test_mla_and_convert() {
        let mut r = regs();
        let (z0, z1, z2, p0) = (r.zreg_offset(0), r.zreg_offset(1), r.zreg_offset(2), r.preg_offset(0));
        r.set_pred_words(p0, &r.ones(D));
        r.set_elems(z0, D, &[5, 6]);
        r.set_elems(z1, D, &[2, 3]);
        r.set_elems(z2, D, &[10, 10]);
        ternary(&mut r, TernaryOp::Mls, D, z0, z0, z1, z2, p0);
        assert_eq!(r.elems(z0, D), vec![(-15i64) as u64, (-24i64) as u64]);

        // scvtf z0.s, p0/m, z0.d: results sit zero-extended in 64-bit lanes
        convert(&mut r, false, S, D, z0, z0, p0);
        assert_eq!(r.elems(z0, D), vec![(-15.0f32).to_bits() as u64, (-24.0f32).to_bits() as u64]);
    }

    #[test]
    fn test_index_and_counts() {
        let mut r = regs();
        let z0 = r.zreg_offset(0);
        index(&mut r, B, z0, ScalarSrc::Imm(250), ScalarSrc::Imm(2));
        assert_eq!(r.elem(z0, B, 3), 0);
        assert_eq!(r.elem(z0, B, 15), (250 + 30) & 0xff);

        let p0 = r.preg_offset(0);
        r.set_pred_words(p0, &[0xffff]);
        r.set_x(0, 10);
        scalar_incdec(&mut r, Gpr::X(0), Amount::Active { esz: H, pred: p0 }, true, Saturation::Wrap, true);
        assert_eq!(r.x(0), 2);
        scalar_incdec(&mut r, Gpr::X(0), Amount::Imm(5), true, Saturation::Unsigned, true);
        assert_eq!(r.x(0), 0);

        r.set_elems(z0, S, &[0x7fff_fffe, 0, 5, 1]);
        vec_incdec(&mut r, S, z0, Amount::Imm(4), false, Saturation::Signed);
        assert_eq!(r.elems(z0, S), vec![0x7fff_ffff, 4, 9, 5]);
    }
}
