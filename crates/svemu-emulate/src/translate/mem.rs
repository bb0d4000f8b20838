//! Loads and stores.
//!
//! Immediate offsets scaled by the vector length are resolved here, so the
//! executor only sees byte displacements.

use super::{Lowering, TranslateResult};
use crate::ops::{Address, Backend, Extend, GatherAddr, LoadMode, Op};
use crate::regfile::Offset;
use svemu_core::Opcode;
use svemu_disasm::dtype::dtype_signed;

pub(super) fn translate<B: Backend>(cx: &mut Lowering<'_, B>) -> TranslateResult<bool> {
    use Opcode::*;
    let (opcode, a) = (cx.insn.opcode, cx.insn.args);
    let (esz, msz) = (a.esz, a.msz as u32);
    let base = cx.xsp(a.rn);
    let vl = cx.vl();
    let op = match opcode {
        LdrZ | StrZ | LdrP | StrP => {
            let len = match opcode {
                LdrZ | StrZ => vl.bytes(),
                _ => vl.pred_bytes(),
            };
            let addr = Address::imm(base, a.imm.wrapping_mul(len as i64));
            match opcode {
                LdrZ => Op::LoadReg {
                    dst: cx.z(a.rd),
                    len,
                    addr,
                },
                LdrP => Op::LoadReg {
                    dst: cx.p(a.rd),
                    len,
                    addr,
                },
                StrZ => Op::StoreReg {
                    src: cx.z(a.rd),
                    len,
                    addr,
                },
                _ => Op::StoreReg {
                    src: cx.p(a.rd),
                    len,
                    addr,
                },
            }
        }

        LdZprr | LdZpri | Ldff1Zprr | Ldnf1Zpri => {
            let mode = match opcode {
                Ldff1Zprr => LoadMode::FirstFault,
                Ldnf1Zpri => LoadMode::NonFault,
                _ => LoadMode::Normal,
            };
            Op::LoadContig {
                esz,
                msz,
                signed: dtype_signed(a.dtype),
                regs: reg_list(cx, a.rd, a.nreg),
                addr: contiguous_addr(cx),
                pg: cx.p(a.pg),
                mode,
            }
        }
        StZprr | StZpri => Op::StoreContig {
            esz,
            msz,
            regs: reg_list(cx, a.rd, a.nreg),
            addr: contiguous_addr(cx),
            pg: cx.p(a.pg),
        },

        Ld1r => Op::LoadBroadcast {
            esz,
            msz,
            signed: dtype_signed(a.dtype),
            dst: cx.z(a.rd),
            addr: Address::imm(base, a.imm << msz),
            pg: cx.p(a.pg),
        },
        Ld1rqZprr | Ld1rqZpri => Op::LoadQuad {
            esz,
            dst: cx.z(a.rd),
            addr: if opcode == Ld1rqZprr {
                Address::reg(base, cx.xzr(a.rm), msz)
            } else {
                Address::imm(base, a.imm * 16)
            },
            pg: cx.p(a.pg),
        },

        Ld1Zprz | Ld1Zpiz => Op::LoadGather {
            esz,
            msz,
            signed: !a.unsigned,
            dst: cx.z(a.rd),
            addr: gather_addr(cx),
            pg: cx.p(a.pg),
            mode: if a.first_fault {
                LoadMode::FirstFault
            } else {
                LoadMode::Normal
            },
        },
        St1Zprz | St1Zpiz => Op::StoreScatter {
            esz,
            msz,
            src: cx.z(a.rd),
            addr: gather_addr(cx),
            pg: cx.p(a.pg),
        },

        // Prefetches have no architectural effect.
        Prf => return Ok(true),
        _ => return Ok(false),
    };
    cx.emit(op);
    Ok(true)
}

/// Consecutive registers of a structured access, wrapping at Z31.
fn reg_list<B: Backend>(cx: &Lowering<'_, B>, first: u8, nreg: u8) -> Vec<Offset> {
    (0..=nreg).map(|r| cx.z(first.wrapping_add(r) % 32)).collect()
}

/// `[Xn, Xm, lsl #msz]` or `[Xn, #imm, mul vl]`; the immediate counts
/// whole transfers of `nreg + 1` registers.
fn contiguous_addr<B: Backend>(cx: &Lowering<'_, B>) -> Address {
    let a = cx.insn.args;
    let base = cx.xsp(a.rn);
    match cx.insn.opcode {
        Opcode::LdZprr | Opcode::Ldff1Zprr | Opcode::StZprr => Address::reg(base, cx.xzr(a.rm), a.msz as u32),
        _ => {
            let transfer = (cx.vl().elements(a.esz) << a.msz) as i64 * (a.nreg as i64 + 1);
            Address::imm(base, a.imm.wrapping_mul(transfer))
        }
    }
}

fn gather_addr<B: Backend>(cx: &Lowering<'_, B>) -> GatherAddr {
    let a = cx.insn.args;
    match cx.insn.opcode {
        Opcode::Ld1Zprz | Opcode::St1Zprz => GatherAddr::ScalarPlusVector {
            base: cx.xsp(a.rn),
            offsets: cx.z(a.rm),
            extend: Extend::from_xs(a.xs),
            shift: if a.scale { a.msz as u32 } else { 0 },
        },
        _ => GatherAddr::VectorPlusImm {
            bases: cx.z(a.rn),
            imm: a.imm as u64,
        },
    }
}
