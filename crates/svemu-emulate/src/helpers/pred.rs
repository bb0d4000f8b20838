//! Predicate operations.
//!
//! Predicates are handled as 64-bit words. A predicate element of size
//! `esz` is `esz.bytes()` bits wide and only its lowest bit is significant;
//! because every element width divides 64, an element never straddles two
//! words.

use super::perm::permute_lanes;
use crate::flags;
use crate::lanes::{mask, sext};
use crate::ops::{Cond, Operand2, PermuteKind, PredLogicOp};
use crate::regfile::{Gpr, Offset, RegisterFile};
use svemu_core::ElementSize;

fn get_bits(words: &[u64], bit: usize, width: usize) -> u64 {
    let field = if width == 64 { u64::MAX } else { (1 << width) - 1 };
    (words[bit / 64] >> (bit % 64)) & field
}

fn set_bits(words: &mut [u64], bit: usize, width: usize, value: u64) {
    let field = if width == 64 { u64::MAX } else { (1 << width) - 1 };
    let shift = bit % 64;
    words[bit / 64] = (words[bit / 64] & !(field << shift)) | ((value & field) << shift);
}

fn bit(words: &[u64], index: usize) -> bool {
    get_bits(words, index, 1) != 0
}

fn set_bit(words: &mut [u64], index: usize, value: bool) {
    set_bits(words, index, 1, value as u64);
}

/// Predicate elements of `esz` as `esz.bytes()`-bit values.
fn pred_elems(regs: &RegisterFile, off: Offset, esz: ElementSize) -> Vec<u64> {
    let words = regs.pred_words(off);
    let n = regs.vector_length().elements(esz);
    (0..n)
        .map(|i| get_bits(&words, i * esz.bytes(), esz.bytes()))
        .collect()
}

fn set_pred_elems(regs: &mut RegisterFile, off: Offset, esz: ElementSize, elems: &[u64]) {
    let mut words = vec![0u64; regs.vector_length().pred_words()];
    for (i, &e) in elems.iter().enumerate() {
        set_bits(&mut words, i * esz.bytes(), esz.bytes(), e);
    }
    regs.set_pred_words(off, &words);
}

/// Number of predicate bits in use.
fn pred_bits(regs: &RegisterFile) -> usize {
    regs.vector_length().pred_bytes() * 8
}

pub(super) fn permute(
    regs: &mut RegisterFile,
    kind: PermuteKind,
    esz: ElementSize,
    dst: Offset,
    a: Offset,
    b: Offset,
    high: bool,
) {
    let out = permute_lanes(kind, &pred_elems(regs, a, esz), &pred_elems(regs, b, esz), high);
    set_pred_elems(regs, dst, esz, &out);
}

pub(super) fn rev(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, src: Offset) {
    let mut out = pred_elems(regs, src, esz);
    out.reverse();
    set_pred_elems(regs, dst, esz, &out);
}

/// PUNPKLO/PUNPKHI: each byte-element bit of one half becomes a halfword
/// element.
pub(super) fn punpk(regs: &mut RegisterFile, dst: Offset, src: Offset, high: bool) {
    let src = regs.pred_words(src);
    let n = regs.vector_length().elements(ElementSize::H);
    let base = if high { n } else { 0 };
    let out: Vec<u64> = (0..n).map(|i| bit(&src, base + i) as u64).collect();
    set_pred_elems(regs, dst, ElementSize::H, &out);
}

pub(super) fn logic(regs: &mut RegisterFile, op: PredLogicOp, dst: Offset, n: Offset, m: Offset, pg: Offset) {
    let (n, m, g) = (regs.pred_words(n), regs.pred_words(m), regs.pred_words(pg));
    let out: Vec<u64> = (0..g.len())
        .map(|w| {
            let (n, m, g) = (n[w], m[w], g[w]);
            match op {
                PredLogicOp::And => n & m & g,
                PredLogicOp::Bic => n & !m & g,
                PredLogicOp::Eor => (n ^ m) & g,
                PredLogicOp::Sel => (n & g) | (m & !g),
                PredLogicOp::Orr => (n | m) & g,
                PredLogicOp::Orn => (n | !m) & g,
                PredLogicOp::Nor => !(n | m) & g,
                PredLogicOp::Nand => !(n & m) & g,
            }
        })
        .collect();
    regs.set_pred_words(dst, &out);
}

/// Sets NZCV from a result predicate and its governing predicate.
pub(super) fn ptest(regs: &mut RegisterFile, d: Offset, g: Option<Offset>, esz: ElementSize) {
    let d = regs.pred_words(d);
    let g = match g {
        Some(off) => regs
            .pred_words(off)
            .into_iter()
            .map(|w| w & esz.pred_mask())
            .collect(),
        None => regs.ones(esz),
    };
    regs.flags = flags::pred_test(&d, &g);
}

pub(super) fn init(regs: &mut RegisterFile, dst: Offset, esz: ElementSize, count: usize) {
    let n = regs.vector_length().elements(esz);
    let out: Vec<u64> = (0..n).map(|i| (i < count) as u64).collect();
    set_pred_elems(regs, dst, esz, &out);
}

/// PFIRST: sets the first active lane of `pg` in `dst`.
pub(super) fn pfirst(regs: &mut RegisterFile, dst: Offset, pg: Offset) {
    let mut words = regs.pred_words(dst);
    let g = regs.pred_words(pg);
    if let Some(w) = g.iter().position(|&x| x != 0) {
        words[w] |= g[w] & g[w].wrapping_neg();
    }
    regs.set_pred_words(dst, &words);
}

/// PNEXT: the first active lane of `pg` after the last lane that is both
/// active and set in `dst`; everything else is cleared.
pub(super) fn pnext(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, pg: Offset) {
    let n = regs.vector_length().elements(esz);
    let cur = pred_elems(regs, dst, esz);
    let g = pred_elems(regs, pg, esz);
    let start = (0..n)
        .rev()
        .find(|&i| g[i] & cur[i] & 1 != 0)
        .map_or(0, |i| i + 1);
    let mut out = vec![0u64; n];
    if let Some(next) = (start..n).find(|&i| g[i] & 1 != 0) {
        out[next] = 1;
    }
    set_pred_elems(regs, dst, esz, &out);
}

/// BRKA/BRKB: active lanes up to (BRKA: including) the first active true
/// lane of `n`. Inactive lanes are zeroed or, with `merge`, kept.
pub(super) fn brk(regs: &mut RegisterFile, dst: Offset, n: Offset, pg: Offset, after: bool, merge: bool) {
    let (src, g, old) = (regs.pred_words(n), regs.pred_words(pg), regs.pred_words(dst));
    let mut out = vec![0u64; g.len()];
    let mut broken = false;
    for i in 0..pred_bits(regs) {
        if !bit(&g, i) {
            set_bit(&mut out, i, merge && bit(&old, i));
            continue;
        }
        let hit = bit(&src, i);
        if !after {
            broken |= hit;
        }
        set_bit(&mut out, i, !broken);
        if after {
            broken |= hit;
        }
    }
    regs.set_pred_words(dst, &out);
}

/// Value of `n` at the last active lane of `pg` (false when none is).
fn last_active_bit(n: &[u64], g: &[u64]) -> bool {
    g.iter()
        .zip(n)
        .rev()
        .find(|(&g, _)| g != 0)
        .is_some_and(|(&g, &n)| n & (1u64 << (63 - g.leading_zeros())) != 0)
}

/// BRKPA/BRKPB: the break is evaluated on `m`, and only if the last active
/// lane of `n` is true.
pub(super) fn brkp(regs: &mut RegisterFile, dst: Offset, n: Offset, m: Offset, pg: Offset, after: bool) {
    let (nw, mw, g) = (regs.pred_words(n), regs.pred_words(m), regs.pred_words(pg));
    let mut live = last_active_bit(&nw, &g);
    let mut out = vec![0u64; g.len()];
    for i in 0..pred_bits(regs) {
        if !bit(&g, i) {
            continue;
        }
        if after {
            set_bit(&mut out, i, live);
            live &= !bit(&mw, i);
        } else {
            live &= !bit(&mw, i);
            set_bit(&mut out, i, live);
        }
    }
    regs.set_pred_words(dst, &out);
}

/// BRKN: keeps `dst` if the last active lane of `n` is true, else clears it.
pub(super) fn brkn(regs: &mut RegisterFile, dst: Offset, n: Offset, pg: Offset) {
    let keep = last_active_bit(&regs.pred_words(n), &regs.pred_words(pg));
    if !keep {
        let zero = vec![0u64; regs.vector_length().pred_words()];
        regs.set_pred_words(dst, &zero);
    }
}

fn compare_lane(cond: Cond, a: i128, b: i128) -> bool {
    match cond {
        Cond::Eq => a == b,
        Cond::Ne => a != b,
        Cond::Ge | Cond::Hs => a >= b,
        Cond::Gt | Cond::Hi => a > b,
        Cond::Lt | Cond::Lo => a < b,
        Cond::Le | Cond::Ls => a <= b,
    }
}

/// Integer compare to predicate; inactive lanes are cleared.
///
/// A vector operand is compared at the element size. Wide and immediate
/// operands are 64-bit values compared against the sign-extended lane, or
/// the zero-extended lane for the unsigned conditions.
pub(super) fn compare(
    regs: &mut RegisterFile,
    cond: Cond,
    esz: ElementSize,
    dst: Offset,
    a: Offset,
    b: Operand2,
    pg: Offset,
) {
    let lhs = regs.elems(a, esz);
    let rhs = super::arith::operand2(regs, esz, b);
    let lane_sized = matches!(b, Operand2::Vec(_));
    let out: Vec<u64> = lhs
        .iter()
        .zip(&rhs)
        .enumerate()
        .map(|(i, (&x, &y))| {
            if !regs.lane_active(pg, esz, i) {
                return 0;
            }
            let (x, y) = if cond.is_unsigned() {
                let y = if lane_sized { mask(y, esz) } else { y };
                (mask(x, esz) as i128, y as i128)
            } else {
                let y = if lane_sized { sext(y, esz) } else { y as i64 };
                (sext(x, esz) as i128, y as i128)
            };
            compare_lane(cond, x, y) as u64
        })
        .collect();
    set_pred_elems(regs, dst, esz, &out);
}

/// Active elements of `pn & pg` at `esz`.
pub(super) fn count_active(regs: &RegisterFile, esz: ElementSize, pn: Offset, pg: Offset) -> usize {
    let ones = regs.ones(esz);
    regs.pred_words(pn)
        .iter()
        .zip(regs.pred_words(pg))
        .zip(&ones)
        .map(|((&n, g), &m)| (n & g & m).count_ones() as usize)
        .sum()
}

#[allow(clippy::too_many_arguments)]
pub(super) fn whilep(
    regs: &mut RegisterFile,
    esz: ElementSize,
    dst: Offset,
    a: Gpr,
    b: Gpr,
    sf: bool,
    unsigned: bool,
    eq: bool,
) {
    let (mut op0, mut op1) = (regs.gpr(a), regs.gpr(b));
    if !sf {
        if unsigned {
            op0 = op0 as u32 as u64;
            op1 = op1 as u32 as u64;
        } else {
            op0 = op0 as i32 as i64 as u64;
            op1 = op1 as i32 as i64 as u64;
        }
    }
    let holds = match (unsigned, eq) {
        (false, false) => (op0 as i64) < (op1 as i64),
        (false, true) => (op0 as i64) <= (op1 as i64),
        (true, false) => op0 < op1,
        (true, true) => op0 <= op1,
    };
    let elements = regs.vector_length().elements(esz);
    let count = if holds {
        let diff = op1.wrapping_sub(op0).saturating_add(eq as u64);
        usize::try_from(diff).map_or(elements, |d| d.min(elements))
    } else {
        0
    };
    init(regs, dst, esz, count);
}

pub(super) fn cterm(regs: &mut RegisterFile, a: Gpr, b: Gpr, sf: bool, ne: bool) {
    let (mut x, mut y) = (regs.gpr(a), regs.gpr(b));
    if !sf {
        x &= u32::MAX as u64;
        y &= u32::MAX as u64;
    }
    let terminate = if ne { x != y } else { x == y };
    regs.flags = flags::cterm(regs.flags, terminate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use svemu_core::VectorLength;
    use ElementSize::{B, D, H, S};

    fn regs(bytes: usize) -> RegisterFile {
        RegisterFile::new(VectorLength::from_bytes(bytes).unwrap())
    }

    fn flags_of(regs: &mut RegisterFile, dst: Offset, esz: ElementSize) -> Flags {
        ptest(regs, dst, None, esz);
        regs.flags
    }

    #[test]
    fn test_logic() {
        let mut r = regs(16);
        let (p0, p1, p2, p3) = (r.preg_offset(0), r.preg_offset(1), r.preg_offset(2), r.preg_offset(3));
        r.set_pred_words(p0, &[0xff00]);
        r.set_pred_words(p1, &[0x0ff0]);
        r.set_pred_words(p2, &[0x3c3c]);
        logic(&mut r, PredLogicOp::And, p3, p0, p1, p2);
        assert_eq!(r.pred_words(p3), vec![0x0c00]);
        logic(&mut r, PredLogicOp::Sel, p3, p0, p1, p2);
        assert_eq!(r.pred_words(p3), vec![0x3c00 | 0x03c0]);
        logic(&mut r, PredLogicOp::Nor, p3, p0, p1, p2);
        assert_eq!(r.pred_words(p3), vec![0x000c]);
    }

    #[test]
    fn test_init_and_test() {
        let mut r = regs(32);
        let p0 = r.preg_offset(0);
        init(&mut r, p0, S, 3);
        assert_eq!(r.pred_words(p0), vec![0x0111]);
        let f = flags_of(&mut r, p0, S);
        assert!(f.n && !f.z && f.c && !f.v);
        init(&mut r, p0, D, 0);
        assert_eq!(flags_of(&mut r, p0, D), Flags::empty_pred());
    }

    #[test]
    fn test_pnext_walks_active_lanes() {
        let mut r = regs(16);
        let (p0, p1) = (r.preg_offset(0), r.preg_offset(1));
        r.set_pred_words(p0, &[0x1010]); // S lanes 1 and 3
        r.set_pred_words(p1, &[0]);
        pnext(&mut r, S, p1, p0);
        assert_eq!(r.pred_words(p1), vec![0x0010]);
        pnext(&mut r, S, p1, p0);
        assert_eq!(r.pred_words(p1), vec![0x1000]);
        pnext(&mut r, S, p1, p0);
        assert_eq!(r.pred_words(p1), vec![0]);
    }

    #[test]
    fn test_pfirst() {
        let mut r = regs(16);
        let (p0, p1) = (r.preg_offset(0), r.preg_offset(1));
        r.set_pred_words(p0, &[0x0f00]);
        r.set_pred_words(p1, &[0x8000]);
        pfirst(&mut r, p1, p0);
        assert_eq!(r.pred_words(p1), vec![0x8100]);
    }

    #[test]
    fn test_brk_family() {
        let mut r = regs(16);
        let (p0, p1, p2, p3) = (r.preg_offset(0), r.preg_offset(1), r.preg_offset(2), r.preg_offset(3));
        r.set_pred_words(p0, &[0x00ff]);
        r.set_pred_words(p1, &[0x0010]);
        r.set_pred_words(p2, &[0xff00]);

        brk(&mut r, p2, p1, p0, true, false);
        assert_eq!(r.pred_words(p2), vec![0x001f]);
        brk(&mut r, p2, p1, p0, false, false);
        assert_eq!(r.pred_words(p2), vec![0x000f]);
        r.set_pred_words(p2, &[0xff00]);
        brk(&mut r, p2, p1, p0, false, true);
        assert_eq!(r.pred_words(p2), vec![0xff0f]);

        // Last active lane of p1 under p0 (bit 7) is clear: no lanes.
        brkp(&mut r, p3, p1, p1, p0, true);
        assert_eq!(r.pred_words(p3), vec![0]);
        r.set_pred_words(p1, &[0x0090]);
        brkp(&mut r, p3, p1, p1, p0, true);
        assert_eq!(r.pred_words(p3), vec![0x001f]);
        brkp(&mut r, p3, p1, p1, p0, false);
        assert_eq!(r.pred_words(p3), vec![0x000f]);

        r.set_pred_words(p3, &[0xaaaa]);
        brkn(&mut r, p3, p1, p0);
        assert_eq!(r.pred_words(p3), vec![0xaaaa]);
        r.set_pred_words(p1, &[0x0010]);
        brkn(&mut r, p3, p1, p0);
        assert_eq!(r.pred_words(p3), vec![0]);
    }

    #[test]
    fn test_compare_forms() {
        let mut r = regs(16);
        let (z0, z1, p0, p1) = (r.zreg_offset(0), r.zreg_offset(1), r.preg_offset(0), r.preg_offset(1));
        r.set_pred_words(p0, &r.ones(S));
        r.set_elems(z0, S, &[0xffff_ffff, 0, 5, 0x8000_0000]);
        r.set_elems(z1, S, &[1, 0, 5, 0x7fff_ffff]);

        compare(&mut r, Cond::Gt, S, p1, z0, Operand2::Vec(z1), p0);
        assert_eq!(r.pred_words(p1), vec![0]);
        compare(&mut r, Cond::Hi, S, p1, z0, Operand2::Vec(z1), p0);
        assert_eq!(r.pred_words(p1), vec![0x1001]);
        compare(&mut r, Cond::Eq, S, p1, z0, Operand2::Vec(z1), p0);
        assert_eq!(r.pred_words(p1), vec![0x0110]);
        compare(&mut r, Cond::Lt, S, p1, z0, Operand2::Imm(0), p0);
        assert_eq!(r.pred_words(p1), vec![0x1001]);
        compare(&mut r, Cond::Ge, S, p1, z0, Operand2::Imm(-1i64 as u64), p0);
        assert_eq!(r.pred_words(p1), vec![0x0111]);
    }

    #[test]
    fn test_while_counts() {
        let mut r = regs(16);
        let p0 = r.preg_offset(0);
        r.set_x(0, 2);
        r.set_x(1, 5);
        whilep(&mut r, B, p0, Gpr::X(0), Gpr::X(1), true, false, false);
        assert_eq!(r.pred_words(p0), vec![0x7]);
        whilep(&mut r, B, p0, Gpr::X(0), Gpr::X(1), true, false, true);
        assert_eq!(r.pred_words(p0), vec![0xf]);
        // Clamped to the element count.
        r.set_x(1, i64::MAX as u64);
        whilep(&mut r, H, p0, Gpr::X(0), Gpr::X(1), true, false, true);
        assert_eq!(r.pred_words(p0), vec![0x5555]);
        // 32-bit forms: -1 as a W register is signed-less-than 0.
        r.set_x(0, 0xffff_ffff);
        r.set_x(1, 0);
        whilep(&mut r, D, p0, Gpr::X(0), Gpr::X(1), false, false, false);
        assert_eq!(r.pred_words(p0), vec![0x0001]);
        whilep(&mut r, D, p0, Gpr::X(0), Gpr::X(1), false, true, false);
        assert_eq!(r.pred_words(p0), vec![0]);
    }

    #[test]
    fn test_permute_and_unpack() {
        let mut r = regs(16);
        let (p0, p1, p2) = (r.preg_offset(0), r.preg_offset(1), r.preg_offset(2));
        r.set_pred_words(p0, &[0x00ff]);
        r.set_pred_words(p1, &[0xff00]);
        punpk(&mut r, p2, p0, false);
        assert_eq!(r.pred_words(p2), vec![0x5555]);
        punpk(&mut r, p2, p0, true);
        assert_eq!(r.pred_words(p2), vec![0]);

        permute(&mut r, PermuteKind::Zip, B, p2, p0, p1, false);
        assert_eq!(r.pred_words(p2), vec![0x5555]);
        rev(&mut r, B, p2, p0);
        assert_eq!(r.pred_words(p2), vec![0xff00]);
    }

    #[test]
    fn test_cterm() {
        let mut r = regs(16);
        r.flags = Flags::from_nzcv(0b0010);
        r.set_x(0, 0x1_0000_0003);
        r.set_x(1, 3);
        cterm(&mut r, Gpr::X(0), Gpr::X(1), false, false);
        assert!(r.flags.n && !r.flags.v);
        cterm(&mut r, Gpr::X(0), Gpr::X(1), true, false);
        assert!(!r.flags.n && !r.flags.v);
        assert!(r.flags.c);
    }
}
