//! Execution of primitive operations.
//!
//! Each helper reads every source it needs into locals before it writes
//! the destination, so any overlap between source and destination
//! registers is harmless.

mod arith;
pub mod fp;
mod mem;
mod perm;
mod pred;
mod reduce;

use crate::memory::GuestMemory;
use crate::ops::{Op, Predication, ScalarSrc};
use crate::regfile::{Offset, RegisterFile};
use crate::EmulationResult;
use svemu_core::ElementSize;

/// Applies one primitive operation.
pub(crate) fn apply(op: &Op, regs: &mut RegisterFile, mem: &mut dyn GuestMemory) -> EmulationResult<()> {
    match op {
        Op::Mov { dst, src, len } => {
            let bytes = regs.bytes(*src, *len).to_vec();
            regs.bytes_mut(*dst, *len).copy_from_slice(&bytes);
        }
        Op::Zero { dst, len } => regs.bytes_mut(*dst, *len).fill(0),
        Op::Dup { esz, dst, value, pred } => arith::dup(regs, *esz, *dst, *value, *pred),
        Op::Unary { op, esz, dst, src, pred } => arith::unary(regs, *op, *esz, *dst, *src, *pred),
        Op::Binary { op, esz, dst, a, b, pred } => arith::binary(regs, *op, *esz, *dst, *a, *b, *pred),
        Op::Ternary { op, esz, dst, acc, a, b, pg } => {
            arith::ternary(regs, *op, *esz, *dst, *acc, *a, *b, *pg)
        }
        Op::Convert {
            unsigned,
            esz,
            src_esz,
            dst,
            src,
            pg,
        } => arith::convert(regs, *unsigned, *esz, *src_esz, *dst, *src, *pg),
        Op::Index { esz, dst, start, step } => arith::index(regs, *esz, *dst, *start, *step),
        Op::Adr {
            esz,
            dst,
            base,
            offset,
            extend,
            shift,
        } => arith::adr(regs, *esz, *dst, *base, *offset, *extend, *shift),

        Op::Reduce { op, esz, dst, src, pg } => reduce::reduce(regs, *op, *esz, *dst, *src, *pg),
        Op::FAddA { esz, dst, src, pg } => reduce::fadda(regs, *esz, *dst, *src, *pg),

        Op::Ext { dst, a, b, offset } => perm::ext(regs, *dst, *a, *b, *offset),
        Op::DupElem { log2, dst, src, index } => perm::dup_elem(regs, *log2, *dst, *src, *index),
        Op::Insr { esz, dst, value } => perm::insr(regs, *esz, *dst, *value),
        Op::RevV { esz, dst, src } => perm::rev(regs, *esz, *dst, *src),
        Op::Tbl {
            esz,
            dst,
            table,
            indices,
        } => perm::tbl(regs, *esz, *dst, *table, *indices),
        Op::Unpk {
            esz,
            dst,
            src,
            high,
            unsigned,
        } => perm::unpk(regs, *esz, *dst, *src, *high, *unsigned),
        Op::Permute {
            kind,
            esz,
            dst,
            a,
            b,
            high,
        } => perm::permute(regs, *kind, *esz, *dst, *a, *b, *high),
        Op::Compact { esz, dst, src, pg } => perm::compact(regs, *esz, *dst, *src, *pg),
        Op::Splice { esz, dst, a, b, pg } => perm::splice(regs, *esz, *dst, *a, *b, *pg),
        Op::Select { esz, dst, a, b, pg } => perm::select(regs, *esz, *dst, *a, *b, *pg),
        Op::LastElem {
            esz,
            dst,
            src,
            pg,
            after,
        } => perm::last(regs, *esz, *dst, *src, *pg, *after, false),
        Op::CondLast {
            esz,
            dst,
            src,
            pg,
            after,
        } => perm::last(regs, *esz, *dst, *src, *pg, *after, true),

        Op::PermuteP {
            kind,
            esz,
            dst,
            a,
            b,
            high,
        } => pred::permute(regs, *kind, *esz, *dst, *a, *b, *high),
        Op::RevP { esz, dst, src } => pred::rev(regs, *esz, *dst, *src),
        Op::Punpk { dst, src, high } => pred::punpk(regs, *dst, *src, *high),
        Op::PredLogic { op, dst, n, m, pg } => pred::logic(regs, *op, *dst, *n, *m, *pg),
        Op::PredTest { d, g, esz } => pred::ptest(regs, *d, *g, *esz),
        Op::PredInit { dst, esz, count } => pred::init(regs, *dst, *esz, *count),
        Op::PFirst { dst, pg } => pred::pfirst(regs, *dst, *pg),
        Op::PNext { esz, dst, pg } => pred::pnext(regs, *esz, *dst, *pg),
        Op::Brk {
            dst,
            n,
            pg,
            after,
            merge,
        } => pred::brk(regs, *dst, *n, *pg, *after, *merge),
        Op::BrkP { dst, n, m, pg, after } => pred::brkp(regs, *dst, *n, *m, *pg, *after),
        Op::BrkN { dst, n, pg } => pred::brkn(regs, *dst, *n, *pg),
        Op::Compare {
            cond,
            esz,
            dst,
            a,
            b,
            pg,
        } => pred::compare(regs, *cond, *esz, *dst, *a, *b, *pg),
        Op::CountP { esz, dst, pn, pg } => {
            let count = pred::count_active(regs, *esz, *pn, *pg);
            regs.set_gpr(*dst, count as u64);
        }
        Op::While {
            esz,
            dst,
            a,
            b,
            sf,
            unsigned,
            eq,
        } => pred::whilep(regs, *esz, *dst, *a, *b, *sf, *unsigned, *eq),
        Op::CTerm { a, b, sf, ne } => pred::cterm(regs, *a, *b, *sf, *ne),

        Op::ScalarSet { dst, value } => regs.set_gpr(*dst, *value),
        Op::ScalarAdd { dst, src, imm } => {
            let value = regs.gpr(*src).wrapping_add(*imm as u64);
            regs.set_gpr(*dst, value);
        }
        Op::ScalarIncDec {
            dst,
            amount,
            decrement,
            sat,
            sf,
        } => arith::scalar_incdec(regs, *dst, *amount, *decrement, *sat, *sf),
        Op::VecIncDec {
            esz,
            dst,
            amount,
            decrement,
            sat,
        } => arith::vec_incdec(regs, *esz, *dst, *amount, *decrement, *sat),

        Op::LoadContig {
            esz,
            msz,
            signed,
            regs: dsts,
            addr,
            pg,
            mode,
        } => mem::load_contig(regs, &*mem, *esz, *msz, *signed, dsts, addr, *pg, *mode)?,
        Op::StoreContig {
            esz,
            msz,
            regs: srcs,
            addr,
            pg,
        } => mem::store_contig(regs, mem, *esz, *msz, srcs, addr, *pg)?,
        Op::LoadBroadcast {
            esz,
            msz,
            signed,
            dst,
            addr,
            pg,
        } => mem::load_broadcast(regs, &*mem, *esz, *msz, *signed, *dst, addr, *pg)?,
        Op::LoadQuad { esz, dst, addr, pg } => mem::load_quad(regs, &*mem, *esz, *dst, addr, *pg)?,
        Op::LoadGather {
            esz,
            msz,
            signed,
            dst,
            addr,
            pg,
            mode,
        } => mem::load_gather(regs, &*mem, *esz, *msz, *signed, *dst, addr, *pg, *mode)?,
        Op::StoreScatter {
            esz,
            msz,
            src,
            addr,
            pg,
        } => mem::store_scatter(regs, mem, *esz, *msz, *src, addr, *pg)?,
        Op::LoadReg { dst, len, addr } => mem::load_reg(regs, &*mem, *dst, *len, addr)?,
        Op::StoreReg { src, len, addr } => mem::store_reg(regs, mem, *src, *len, addr)?,
    }
    Ok(())
}

// ==================== Shared lane plumbing ====================

/// Resolves a scalar source at lane size `esz`.
fn scalar(regs: &RegisterFile, src: ScalarSrc, esz: ElementSize) -> u64 {
    let value = match src {
        ScalarSrc::Gpr(r) => regs.gpr(r),
        ScalarSrc::Imm(v) => v,
        ScalarSrc::VecLow(off) => regs.elem(off, esz, 0),
    };
    value & esz.value_mask()
}

/// Writes freshly computed lanes under a predication mode.
fn write_lanes(regs: &mut RegisterFile, esz: ElementSize, dst: Offset, pred: Predication, values: &[u64]) {
    for (i, &value) in values.iter().enumerate() {
        match pred {
            Predication::All => regs.set_elem(dst, esz, i, value),
            Predication::Merge(pg) => {
                if regs.lane_active(pg, esz, i) {
                    regs.set_elem(dst, esz, i, value);
                }
            }
            Predication::Zero(pg) => {
                let value = if regs.lane_active(pg, esz, i) { value } else { 0 };
                regs.set_elem(dst, esz, i, value);
            }
        }
    }
}

/// Index of the last active lane of `pg` at `esz`.
fn last_active(regs: &RegisterFile, esz: ElementSize, pg: Offset) -> Option<usize> {
    let n = regs.vector_length().elements(esz);
    (0..n).rev().find(|&i| regs.lane_active(pg, esz, i))
}
