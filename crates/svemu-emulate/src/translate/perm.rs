//! Permutes, element moves and selects.

use super::{Lowering, TranslateResult};
use crate::ops::{Backend, ElemDst, Op, PermuteKind, Predication, ScalarSrc};
use svemu_core::Opcode;

pub(super) fn translate<B: Backend>(cx: &mut Lowering<'_, B>) -> TranslateResult<bool> {
    use Opcode::*;
    let (opcode, a) = (cx.insn.opcode, cx.insn.args);
    let esz = a.esz;
    let op = match opcode {
        Ext => Op::Ext {
            dst: cx.z(a.rd),
            a: cx.z(a.rn),
            b: cx.z(a.rm),
            offset: a.imm as usize,
        },
        DupX => Op::DupElem {
            log2: a.msz as u32,
            dst: cx.z(a.rd),
            src: cx.z(a.rn),
            index: a.imm as usize,
        },
        DupS => Op::Dup {
            esz,
            dst: cx.z(a.rd),
            value: ScalarSrc::Gpr(cx.xsp(a.rn)),
            pred: Predication::All,
        },
        CpyMR => Op::Dup {
            esz,
            dst: cx.z(a.rd),
            value: ScalarSrc::Gpr(cx.xsp(a.rn)),
            pred: Predication::Merge(cx.p(a.pg)),
        },
        CpyMV => Op::Dup {
            esz,
            dst: cx.z(a.rd),
            value: ScalarSrc::VecLow(cx.z(a.rn)),
            pred: Predication::Merge(cx.p(a.pg)),
        },
        InsrR => Op::Insr {
            esz,
            dst: cx.z(a.rd),
            value: ScalarSrc::Gpr(cx.xzr(a.rn)),
        },
        InsrF => Op::Insr {
            esz,
            dst: cx.z(a.rd),
            value: ScalarSrc::VecLow(cx.z(a.rn)),
        },
        RevV => Op::RevV {
            esz,
            dst: cx.z(a.rd),
            src: cx.z(a.rn),
        },
        Tbl => Op::Tbl {
            esz,
            dst: cx.z(a.rd),
            table: cx.z(a.rn),
            indices: cx.z(a.rm),
        },
        Unpk => {
            if esz.log2() != a.src_esz.log2() + 1 {
                return Err(cx.unallocated());
            }
            Op::Unpk {
                esz,
                dst: cx.z(a.rd),
                src: cx.z(a.rn),
                high: a.high,
                unsigned: a.unsigned,
            }
        }
        ZipZ | UzpZ | TrnZ => Op::Permute {
            kind: kind(opcode),
            esz,
            dst: cx.z(a.rd),
            a: cx.z(a.rn),
            b: cx.z(a.rm),
            high: a.high,
        },
        ZipP | UzpP | TrnP => Op::PermuteP {
            kind: kind(opcode),
            esz,
            dst: cx.p(a.rd),
            a: cx.p(a.rn),
            b: cx.p(a.rm),
            high: a.high,
        },
        RevP => Op::RevP {
            esz,
            dst: cx.p(a.rd),
            src: cx.p(a.rn),
        },
        Punpk => Op::Punpk {
            dst: cx.p(a.rd),
            src: cx.p(a.rn),
            high: a.high,
        },
        Compact => Op::Compact {
            esz,
            dst: cx.z(a.rd),
            src: cx.z(a.rn),
            pg: cx.p(a.pg),
        },
        Splice => Op::Splice {
            esz,
            dst: cx.z(a.rd),
            a: cx.z(a.rd),
            b: cx.z(a.rm),
            pg: cx.p(a.pg),
        },
        SelZpzz => Op::Select {
            esz,
            dst: cx.z(a.rd),
            a: cx.z(a.rn),
            b: cx.z(a.rm),
            pg: cx.p(a.pg),
        },
        LastV | LastR => Op::LastElem {
            esz,
            dst: if opcode == LastR {
                ElemDst::Gpr(cx.xzr(a.rd))
            } else {
                ElemDst::Simd(cx.z(a.rd))
            },
            src: cx.z(a.rn),
            pg: cx.p(a.pg),
            after: a.after,
        },
        ClastZ | ClastV | ClastR => Op::CondLast {
            esz,
            dst: match opcode {
                ClastZ => ElemDst::Vector(cx.z(a.rd)),
                ClastV => ElemDst::Simd(cx.z(a.rd)),
                _ => ElemDst::Gpr(cx.xzr(a.rd)),
            },
            src: cx.z(a.rm),
            pg: cx.p(a.pg),
            after: a.after,
        },
        _ => return Ok(false),
    };
    cx.emit(op);
    Ok(true)
}

fn kind(opcode: Opcode) -> PermuteKind {
    match opcode {
        Opcode::ZipZ | Opcode::ZipP => PermuteKind::Zip,
        Opcode::UzpZ | Opcode::UzpP => PermuteKind::Uzp,
        _ => PermuteKind::Trn,
    }
}
