//! Vector permutes and element extraction.

use super::{last_active, scalar};
use crate::lanes;
use crate::ops::{ElemDst, PermuteKind, ScalarSrc};
use crate::regfile::{Offset, RegisterFile};
use svemu_core::ElementSize;

pub(super) fn ext(regs: &mut RegisterFile, dst: Offset, a: Offset, b: Offset, offset: usize) {
    let vl = regs.vector_length().bytes();
    let offset = if offset >= vl { 0 } else { offset };
    let mut joined = regs.bytes(a, vl).to_vec();
    joined.extend_from_slice(regs.bytes(b, vl));
    regs.bytes_mut(dst, vl).copy_from_slice(&joined[offset..offset + vl]);
}

/// Broadcasts a `2^log2`-byte element; an index past the end zeroes the
/// destination.
pub(super) fn dup_elem(regs: &mut RegisterFile, log2: u32, dst: Offset, src: Offset, index: usize) {
    let vl = regs.vector_length().bytes();
    let width = 1usize << log2;
    let out = if index < vl / width {
        let start = src + index * width;
        regs.bytes(start, width).repeat(vl / width)
    } else {
        vec![0; vl]
    };
    regs.bytes_mut(dst, vl).copy_from_slice(&out);
}

pub(super) fn insr(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, value: ScalarSrc) {
    let v = scalar(regs, value, esz);
    let mut out = regs.elems(dst, esz);
    out.pop();
    out.insert(0, v);
    regs.set_elems(dst, esz, &out);
}

pub(super) fn rev(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, src: Offset) {
    let mut out = regs.elems(src, esz);
    out.reverse();
    regs.set_elems(dst, esz, &out);
}

pub(super) fn tbl(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, table: Offset, indices: Offset) {
    let table = regs.elems(table, esz);
    let out: Vec<u64> = regs
        .elems(indices, esz)
        .into_iter()
        .map(|idx| usize::try_from(idx).ok().and_then(|i| table.get(i)).copied().unwrap_or(0))
        .collect();
    regs.set_elems(dst, esz, &out);
}

fn narrower(esz: ElementSize) -> ElementSize {
    match esz {
        ElementSize::D => ElementSize::S,
        ElementSize::S => ElementSize::H,
        _ => ElementSize::B,
    }
}

/// Widens half of `src` into `esz` lanes.
pub(super) fn unpk(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, src: Offset, high: bool, unsigned: bool) {
    let from = narrower(esz);
    let n = regs.vector_length().elements(esz);
    let base = if high { n } else { 0 };
    let out: Vec<u64> = (0..n)
        .map(|i| lanes::extend(regs.elem(src, from, base + i), from, !unsigned, esz))
        .collect();
    regs.set_elems(dst, esz, &out);
}

/// ZIP/UZP/TRN over element sequences; shared with the predicate forms.
pub(super) fn permute_lanes(kind: PermuteKind, a: &[u64], b: &[u64], high: bool) -> Vec<u64> {
    let n = a.len();
    let half = n / 2;
    let odd = high as usize;
    let mut out = vec![0u64; n];
    match kind {
        PermuteKind::Zip => {
            let base = if high { half } else { 0 };
            for i in 0..half {
                out[2 * i] = a[base + i];
                out[2 * i + 1] = b[base + i];
            }
        }
        PermuteKind::Uzp => {
            for (i, slot) in out.iter_mut().enumerate() {
                let k = 2 * i + odd;
                *slot = if k < n { a[k] } else { b[k - n] };
            }
        }
        PermuteKind::Trn => {
            for i in 0..half {
                out[2 * i] = a[2 * i + odd];
                out[2 * i + 1] = b[2 * i + odd];
            }
        }
    }
    out
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
    let out = permute_lanes(kind, &regs.elems(a, esz), &regs.elems(b, esz), high);
    regs.set_elems(dst, esz, &out);
}

pub(super) fn compact(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, src: Offset, pg: Offset) {
    let n = regs.vector_length().elements(esz);
    let mut out: Vec<u64> = regs
        .elems(src, esz)
        .into_iter()
        .enumerate()
        .filter(|&(i, _)| regs.lane_active(pg, esz, i))
        .map(|(_, v)| v)
        .collect();
    out.resize(n, 0);
    regs.set_elems(dst, esz, &out);
}

/// Copies the active segment of `a` (first to last active lane) to the
/// bottom of the result and fills the rest from the bottom of `b`.
pub(super) fn splice(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, a: Offset, b: Offset, pg: Offset) {
    let n = regs.vector_length().elements(esz);
    let first = (0..n).find(|&i| regs.lane_active(pg, esz, i));
    let last = last_active(regs, esz, pg);
    let mut out = match (first, last) {
        (Some(f), Some(l)) => regs.elems(a, esz)[f..=l].to_vec(),
        _ => Vec::new(),
    };
    let fill = n - out.len();
    out.extend(regs.elems(b, esz).into_iter().take(fill));
    regs.set_elems(dst, esz, &out);
}

pub(super) fn select(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, a: Offset, b: Offset, pg: Offset) {
    let a_lanes = regs.elems(a, esz);
    let b_lanes = regs.elems(b, esz);
    let out: Vec<u64> = (0..a_lanes.len())
        .map(|i| {
            if regs.lane_active(pg, esz, i) {
                a_lanes[i]
            } else {
                b_lanes[i]
            }
        })
        .collect();
    regs.set_elems(dst, esz, &out);
}

fn write_elem(regs: &mut RegisterFile, esz: ElementSize, dst: ElemDst, value: u64) {
    match dst {
        ElemDst::Gpr(r) => regs.set_gpr(r, value & esz.value_mask()),
        ElemDst::Simd(off) => {
            let vl = regs.vector_length().bytes();
            regs.bytes_mut(off, vl).fill(0);
            regs.set_elem(off, esz, 0, value);
        }
        ElemDst::Vector(off) => {
            let n = regs.vector_length().elements(esz);
            regs.set_elems(off, esz, &vec![value; n]);
        }
    }
}

/// LASTA/LASTB, and with `conditional` set CLASTA/CLASTB.
///
/// The "after" forms take the element after the last active lane, wrapping
/// to element 0 at the end of the vector. With no active lane LASTA reads
/// element 0 and LASTB the last element; the conditional forms instead
/// leave a vector destination alone and zero-extend a scalar one from the
/// element size.
pub(super) fn last(
    regs: &mut RegisterFile,
    esz: ElementSize,
    dst: ElemDst,
    src: Offset,
    pg: Offset,
    after: bool,
    conditional: bool,
) {
    let n = regs.vector_length().elements(esz);
    let index = match last_active(regs, esz, pg) {
        Some(l) if after => (l + 1) % n,
        Some(l) => l,
        None if conditional => {
            match dst {
                ElemDst::Gpr(r) => {
                    let value = regs.gpr(r);
                    regs.set_gpr(r, value & esz.value_mask());
                }
                ElemDst::Simd(off) => {
                    let value = regs.elem(off, esz, 0);
                    write_elem(regs, esz, dst, value);
                }
                ElemDst::Vector(_) => {}
            }
            return;
        }
        None if after => 0,
        None => n - 1,
    };
    let value = regs.elem(src, esz, index);
    write_elem(regs, esz, dst, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regfile::Gpr;
    use svemu_core::VectorLength;
    use ElementSize::{B, D, H, S};

    fn regs() -> RegisterFile {
        RegisterFile::new(VectorLength::from_bytes(16).unwrap())
    }

    #[test]
    fn test_zip_uzp_trn() {
        let a = [0, 1, 2, 3];
        let b = [10, 11, 12, 13];
        assert_eq!(permute_lanes(PermuteKind::Zip, &a, &b, false), vec![0, 10, 1, 11]);
        assert_eq!(permute_lanes(PermuteKind::Zip, &a, &b, true), vec![2, 12, 3, 13]);
        assert_eq!(permute_lanes(PermuteKind::Uzp, &a, &b, false), vec![0, 2, 10, 12]);
        assert_eq!(permute_lanes(PermuteKind::Uzp, &a, &b, true), vec![1, 3, 11, 13]);
        assert_eq!(permute_lanes(PermuteKind::Trn, &a, &b, false), vec![0, 10, 2, 12]);
        assert_eq!(permute_lanes(PermuteKind::Trn, &a, &b, true), vec![1, 11, 3, 13]);
    }

    #[test]
    fn test_ext_and_dup_elem() {
        let mut r = regs();
        let (z0, z1, z2) = (r.zreg_offset(0), r.zreg_offset(1), r.zreg_offset(2));
        r.set_elems(z0, B, &(0..16).collect::<Vec<_>>());
        r.set_elems(z1, B, &(16..32).collect::<Vec<_>>());
        ext(&mut r, z2, z0, z1, 3);
        assert_eq!(r.elem(z2, B, 0), 3);
        assert_eq!(r.elem(z2, B, 15), 18);
        ext(&mut r, z2, z0, z1, 16);
        assert_eq!(r.elems(z2, B), r.elems(z0, B));

        dup_elem(&mut r, 2, z2, z0, 1);
        assert_eq!(r.elems(z2, S), vec![0x0706_0504; 4]);
        dup_elem(&mut r, 3, z2, z0, 2);
        assert_eq!(r.elems(z2, D), vec![0, 0]);
    }

    #[test]
    fn test_tbl_and_unpk() {
        let mut r = regs();
        let (z0, z1, z2) = (r.zreg_offset(0), r.zreg_offset(1), r.zreg_offset(2));
        r.set_elems(z0, S, &[100, 101, 102, 103]);
        r.set_elems(z1, S, &[3, 0, 4, u32::MAX as u64]);
        tbl(&mut r, S, z2, z0, z1);
        assert_eq!(r.elems(z2, S), vec![103, 100, 0, 0]);

        r.set_elems(z0, H, &[0xffff, 1, 2, 3, 0x8000, 5, 6, 7]);
        unpk(&mut r, S, z1, z0, true, false);
        assert_eq!(r.elems(z1, S), vec![0xffff_8000, 5, 6, 7]);
        unpk(&mut r, S, z1, z0, false, true);
        assert_eq!(r.elems(z1, S), vec![0xffff, 1, 2, 3]);
    }

    #[test]
    fn test_compact_and_splice() {
        let mut r = regs();
        let (z0, z1, z2, p0) = (r.zreg_offset(0), r.zreg_offset(1), r.zreg_offset(2), r.preg_offset(0));
        r.set_elems(z0, S, &[1, 2, 3, 4]);
        r.set_elems(z1, S, &[5, 6, 7, 8]);
        r.set_pred_words(p0, &[0x0110]); // lanes 1 and 2

        compact(&mut r, S, z2, z0, p0);
        assert_eq!(r.elems(z2, S), vec![2, 3, 0, 0]);
        splice(&mut r, S, z2, z0, z1, p0);
        assert_eq!(r.elems(z2, S), vec![2, 3, 5, 6]);

        r.set_pred_words(p0, &[0]);
        splice(&mut r, S, z2, z0, z1, p0);
        assert_eq!(r.elems(z2, S), vec![5, 6, 7, 8]);
    }

    #[test]
    fn test_last_and_clast() {
        let mut r = regs();
        let (z0, p0) = (r.zreg_offset(0), r.preg_offset(0));
        r.set_elems(z0, S, &[10, 11, 12, 13]);

        r.set_pred_words(p0, &[0x1000]); // last lane only
        last(&mut r, S, ElemDst::Gpr(Gpr::X(1)), z0, p0, true, false);
        assert_eq!(r.x(1), 10);
        last(&mut r, S, ElemDst::Gpr(Gpr::X(1)), z0, p0, false, false);
        assert_eq!(r.x(1), 13);

        r.set_pred_words(p0, &[0]);
        last(&mut r, S, ElemDst::Gpr(Gpr::X(1)), z0, p0, false, false);
        assert_eq!(r.x(1), 13);
        r.set_x(2, 0xdead_beef_1234_5678);
        last(&mut r, H, ElemDst::Gpr(Gpr::X(2)), z0, p0, true, true);
        assert_eq!(r.x(2), 0x5678);
        let z1 = r.zreg_offset(1);
        r.set_elems(z1, S, &[7, 8, 9, 10]);
        last(&mut r, S, ElemDst::Vector(z1), z0, p0, false, true);
        assert_eq!(r.elems(z1, S), vec![7, 8, 9, 10]);
        last(&mut r, S, ElemDst::Simd(z1), z0, p0, false, true);
        assert_eq!(r.elems(z1, S), vec![7, 0, 0, 0]);
    }
}
