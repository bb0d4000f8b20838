//! Compares, predicate logic, partition breaks and FFR access.

use super::{Lowering, TranslateResult};
use crate::ops::{Backend, Op, Operand2, PredLogicOp};
use crate::pattern::decode_pattern;
use svemu_core::{ElementSize, Opcode};

pub(super) fn translate<B: Backend>(cx: &mut Lowering<'_, B>) -> TranslateResult<bool> {
    use Opcode::*;
    let (opcode, a) = (cx.insn.opcode, cx.insn.args);
    let esz = a.esz;
    match opcode {
        CmpPpzz | CmpPpzw | CmpPpzi => {
            let pg = cx.flag_governor(a.pg);
            let (dst, n) = (cx.p(a.rd), cx.z(a.rn));
            let b = match opcode {
                CmpPpzz => Operand2::Vec(cx.z(a.rm)),
                CmpPpzw => Operand2::Wide(cx.z(a.rm)),
                _ => Operand2::Imm(a.imm as u64),
            };
            cx.emit(Op::Compare {
                cond: a.cond,
                esz,
                dst,
                a: n,
                b,
                pg,
            });
            cx.pred_test(dst, Some(pg), esz);
        }

        AndPppp | BicPppp | EorPppp | SelPppp | OrrPppp | OrnPppp | NorPppp | NandPppp => {
            let pg = cx.flag_governor(a.pg);
            let (dst, n, m) = (cx.p(a.rd), cx.p(a.rn), cx.p(a.rm));
            cx.emit(Op::PredLogic {
                op: logic_op(opcode),
                dst,
                n,
                m,
                pg,
            });
            cx.pred_test(dst, Some(pg), ElementSize::B);
        }

        Ptest => {
            let (d, g) = (cx.p(a.rn), cx.p(a.pg));
            cx.emit(Op::PredTest {
                d,
                g: Some(g),
                esz: ElementSize::B,
            });
        }
        Ptrue => {
            let dst = cx.p(a.rd);
            let count = decode_pattern(cx.vl(), a.pattern, esz);
            cx.emit(Op::PredInit { dst, esz, count });
            cx.pred_test(dst, Some(dst), esz);
        }
        Pfalse => {
            let (dst, len) = (cx.p(a.rd), cx.pred_len());
            cx.emit(Op::Zero { dst, len });
        }

        Setffr => {
            let (dst, count) = (cx.ffr(), cx.vl().elements(ElementSize::B));
            cx.emit(Op::PredInit {
                dst,
                esz: ElementSize::B,
                count,
            });
        }
        Rdffr => {
            let (dst, src, len) = (cx.p(a.rd), cx.ffr(), cx.pred_len());
            cx.emit(Op::Mov { dst, src, len });
        }
        RdffrP => {
            let pg = cx.flag_governor(a.pg);
            let (dst, ffr) = (cx.p(a.rd), cx.ffr());
            cx.emit(Op::PredLogic {
                op: PredLogicOp::And,
                dst,
                n: ffr,
                m: ffr,
                pg,
            });
            cx.pred_test(dst, Some(pg), ElementSize::B);
        }
        Wrffr => {
            let (dst, src, len) = (cx.ffr(), cx.p(a.rn), cx.pred_len());
            cx.emit(Op::Mov { dst, src, len });
        }

        Pfirst => {
            let pg = cx.flag_governor(a.pg);
            let dst = cx.p(a.rd);
            cx.emit(Op::PFirst { dst, pg });
            cx.pred_test(dst, Some(pg), ElementSize::B);
        }
        Pnext => {
            let pg = cx.flag_governor(a.pg);
            let dst = cx.p(a.rd);
            cx.emit(Op::PNext { esz, dst, pg });
            cx.pred_test(dst, Some(pg), esz);
        }

        Brka | Brkb => {
            let pg = cx.flag_governor(a.pg);
            let (dst, n) = (cx.p(a.rd), cx.p(a.rn));
            cx.emit(Op::Brk {
                dst,
                n,
                pg,
                after: a.after,
                merge: a.merge,
            });
            cx.pred_test(dst, Some(pg), ElementSize::B);
        }
        Brkpa | Brkpb => {
            let pg = cx.flag_governor(a.pg);
            let (dst, n, m) = (cx.p(a.rd), cx.p(a.rn), cx.p(a.rm));
            cx.emit(Op::BrkP {
                dst,
                n,
                m,
                pg,
                after: a.after,
            });
            cx.pred_test(dst, Some(pg), ElementSize::B);
        }
        Brkn => {
            let (dst, n, pg) = (cx.p(a.rd), cx.p(a.rn), cx.p(a.pg));
            cx.emit(Op::BrkN { dst, n, pg });
            cx.pred_test(dst, None, ElementSize::B);
        }

        While => {
            let dst = cx.p(a.rd);
            cx.emit(Op::While {
                esz,
                dst,
                a: cx.xzr(a.rn),
                b: cx.xzr(a.rm),
                sf: a.sf,
                unsigned: a.unsigned,
                eq: a.eq,
            });
            cx.pred_test(dst, None, esz);
        }
        Cterm => {
            let op = Op::CTerm {
                a: cx.xzr(a.rn),
                b: cx.xzr(a.rm),
                sf: a.sf,
                ne: a.ne,
            };
            cx.emit(op);
        }

        _ => return Ok(false),
    }
    Ok(true)
}

fn logic_op(opcode: Opcode) -> PredLogicOp {
    match opcode {
        Opcode::AndPppp => PredLogicOp::And,
        Opcode::BicPppp => PredLogicOp::Bic,
        Opcode::EorPppp => PredLogicOp::Eor,
        Opcode::SelPppp => PredLogicOp::Sel,
        Opcode::OrrPppp => PredLogicOp::Orr,
        Opcode::OrnPppp => PredLogicOp::Orn,
        Opcode::NorPppp => PredLogicOp::Nor,
        _ => PredLogicOp::Nand,
    }
}
