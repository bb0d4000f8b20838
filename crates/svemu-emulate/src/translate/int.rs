//! Integer arithmetic, element counts and immediates.

use super::{Lowering, TranslateResult};
use crate::dispatch;
use crate::ops::{Amount, Backend, Extend, Op, Operand2, Predication, Saturation, ScalarSrc};
use crate::pattern::decode_pattern;
use svemu_core::{ElementSize, Opcode};

pub(super) fn translate<B: Backend>(cx: &mut Lowering<'_, B>) -> TranslateResult<bool> {
    use Opcode::*;
    let (opcode, a) = (cx.insn.opcode, cx.insn.args);
    let esz = a.esz;
    match opcode {
        AddZpzz | SubZpzz | SubrZpzz | SmaxZpzz | UmaxZpzz | SminZpzz | UminZpzz | SabdZpzz | UabdZpzz
        | MulZpzz | SmulhZpzz | UmulhZpzz | SdivZpzz | UdivZpzz | SdivrZpzz | UdivrZpzz | OrrZpzz | EorZpzz
        | AndZpzz | BicZpzz | AsrZpzz | LsrZpzz | LslZpzz | AsrrZpzz | LsrrZpzz | LslrZpzz => zpzz(cx)?,

        AsrZpzw | LsrZpzw | LslZpzw => {
            let op = cx.sized(dispatch::wide_shift(opcode))?;
            let (dst, b, pg) = (cx.z(a.rd), cx.z(a.rm), cx.p(a.pg));
            cx.emit(Op::Binary {
                op,
                esz,
                dst,
                a: dst,
                b: Operand2::Wide(b),
                pred: Predication::Merge(pg),
            });
        }
        AsrZpzi | LsrZpzi | LslZpzi | Asrd => {
            let op = cx.sized(dispatch::shift_imm(opcode))?;
            let (dst, pg) = (cx.z(a.rd), cx.p(a.pg));
            cx.emit(Op::Binary {
                op,
                esz,
                dst,
                a: dst,
                b: Operand2::Imm(a.imm as u64),
                pred: Predication::Merge(pg),
            });
        }

        Orv | Eorv | Andv | Saddv | Uaddv | Smaxv | Umaxv | Sminv | Uminv => {
            let op = cx.sized(dispatch::reduce(opcode))?;
            let (dst, src, pg) = (cx.z(a.rd), cx.z(a.rn), cx.p(a.pg));
            cx.emit(Op::Reduce { op, esz, dst, src, pg });
        }

        Movprfx => {
            let (dst, src, len) = (cx.z(a.rd), cx.z(a.rn), cx.vl().bytes());
            cx.emit(Op::Mov { dst, src, len });
        }
        MovprfxM | MovprfxZ | Cls | Clz | Cnt | Cnot | Not | Sxtb | Uxtb | Sxth | Uxth | Sxtw | Uxtw | Abs
        | Neg | Revb | Revh | Revw | Rbit | Fabs | Fneg => {
            let op = cx.sized(dispatch::unary(opcode))?;
            let (dst, src, pg) = (cx.z(a.rd), cx.z(a.rn), cx.p(a.pg));
            let pred = if opcode == MovprfxZ {
                Predication::Zero(pg)
            } else {
                Predication::Merge(pg)
            };
            cx.emit(Op::Unary { op, esz, dst, src, pred });
        }

        Mla | Mls | Mad | Msb => ternary(cx)?,

        AddZzz | SubZzz | SqaddZzz | UqaddZzz | SqsubZzz | UqsubZzz | AndZzz | OrrZzz | EorZzz | BicZzz => {
            zzz(cx)?
        }
        AsrZzw | LsrZzw | LslZzw => {
            let op = cx.sized(dispatch::wide_shift(opcode))?;
            let (dst, src, b) = (cx.z(a.rd), cx.z(a.rn), cx.z(a.rm));
            cx.emit(Op::Binary {
                op,
                esz,
                dst,
                a: src,
                b: Operand2::Wide(b),
                pred: Predication::All,
            });
        }
        AsrZzi | LsrZzi | LslZzi => {
            let op = cx.sized(dispatch::shift_imm(opcode))?;
            let (dst, src) = (cx.z(a.rd), cx.z(a.rn));
            cx.emit(Op::Binary {
                op,
                esz,
                dst,
                a: src,
                b: Operand2::Imm(a.imm as u64),
                pred: Predication::All,
            });
        }
        Adr => {
            let (dst, base, offset) = (cx.z(a.rd), cx.z(a.rn), cx.z(a.rm));
            cx.emit(Op::Adr {
                esz,
                dst,
                base,
                offset,
                extend: Extend::from_xs(a.xs),
                shift: a.imm as u32,
            });
        }

        IndexIi | IndexIr | IndexRi | IndexRr => {
            let start = match opcode {
                IndexIi | IndexIr => ScalarSrc::Imm(a.imm as u64),
                _ => ScalarSrc::Gpr(cx.xzr(a.rn)),
            };
            let step = match opcode {
                IndexIi | IndexRi => ScalarSrc::Imm(a.imm2 as u64),
                _ => ScalarSrc::Gpr(cx.xzr(a.rm)),
            };
            let dst = cx.z(a.rd);
            cx.emit(Op::Index { esz, dst, start, step });
        }
        Addvl | Addpl => {
            let unit = if opcode == Addvl {
                cx.vl().bytes()
            } else {
                cx.vl().pred_bytes()
            };
            let (dst, src) = (cx.xsp(a.rd), cx.xsp(a.rn));
            cx.emit(Op::ScalarAdd {
                dst,
                src,
                imm: a.imm.wrapping_mul(unit as i64),
            });
        }
        Rdvl => {
            let dst = cx.xzr(a.rd);
            cx.emit(Op::ScalarSet {
                dst,
                value: a.imm.wrapping_mul(cx.vl().bytes() as i64) as u64,
            });
        }

        CntR | IncdecR | SincdecR32 | SincdecR64 | IncdecV | SincdecV => element_count(cx),
        Cntp | IncdecpR | IncdecpZ | SincdecpR32 | SincdecpR64 | SincdecpZ => active_count(cx),

        AddZzi | SubZzi | SubrZzi | SqaddZzi | UqaddZzi | SqsubZzi | UqsubZzi | SmaxZzi | UmaxZzi | SminZzi
        | UminZzi | MulZzi | AndZzi | OrrZzi | EorZzi => {
            let op = cx.sized(dispatch::zzi(opcode))?;
            let dst = cx.z(a.rd);
            cx.emit(Op::Binary {
                op,
                esz,
                dst,
                a: dst,
                b: Operand2::Imm(a.imm as u64),
                pred: Predication::All,
            });
        }
        Dupm | DupI | Fdup | Fcpy | CpyMI | CpyZI => dup_imm(cx),

        _ => return Ok(false),
    }
    Ok(true)
}

/// Predicated vector-vector forms; the reversed forms swap sources.
pub(super) fn zpzz<B: Backend>(cx: &mut Lowering<'_, B>) -> TranslateResult<()> {
    let h = cx.sized(dispatch::zpzz(cx.insn.opcode))?;
    let a = cx.insn.args;
    let (dst, m, pg) = (cx.z(a.rd), cx.z(a.rm), cx.p(a.pg));
    let (lhs, rhs) = if h.reversed { (m, dst) } else { (dst, m) };
    cx.emit(Op::Binary {
        op: h.op,
        esz: a.esz,
        dst,
        a: lhs,
        b: Operand2::Vec(rhs),
        pred: Predication::Merge(pg),
    });
    Ok(())
}

/// Unpredicated vector-vector forms.
pub(super) fn zzz<B: Backend>(cx: &mut Lowering<'_, B>) -> TranslateResult<()> {
    let op = cx.sized(dispatch::zzz(cx.insn.opcode))?;
    let a = cx.insn.args;
    let (dst, n, m) = (cx.z(a.rd), cx.z(a.rn), cx.z(a.rm));
    cx.emit(Op::Binary {
        op,
        esz: a.esz,
        dst,
        a: n,
        b: Operand2::Vec(m),
        pred: Predication::All,
    });
    Ok(())
}

/// Multiply-accumulate, integer and fused floating point.
pub(super) fn ternary<B: Backend>(cx: &mut Lowering<'_, B>) -> TranslateResult<()> {
    let h = cx.sized(dispatch::ternary(cx.insn.opcode))?;
    let a = cx.insn.args;
    // MLA-style forms accumulate into the destination; MAD-style forms
    // multiply it and take the addend from `ra`.
    let (acc, mul) = if h.multiplicand { (a.ra, a.rd) } else { (a.rd, a.rn) };
    let (dst, acc, mul, b, pg) = (cx.z(a.rd), cx.z(acc), cx.z(mul), cx.z(a.rm), cx.p(a.pg));
    cx.emit(Op::Ternary {
        op: h.op,
        esz: a.esz,
        dst,
        acc,
        a: mul,
        b,
        pg,
    });
    Ok(())
}

fn saturation(signed_sat: bool, unsigned: bool) -> Saturation {
    match (signed_sat, unsigned) {
        (false, _) => Saturation::Wrap,
        (true, false) => Saturation::Signed,
        (true, true) => Saturation::Unsigned,
    }
}

/// CNT, INC, DEC and their saturating forms: the count is a pattern
/// count times a multiplier, fixed at translation time.
fn element_count<B: Backend>(cx: &mut Lowering<'_, B>) {
    use Opcode::*;
    let a = cx.insn.args;
    let count = decode_pattern(cx.vl(), a.pattern, a.esz) as u64 * a.imm as u64;
    let opcode = cx.insn.opcode;
    let sat = saturation(matches!(opcode, SincdecR32 | SincdecR64 | SincdecV), a.unsigned);
    let op = match opcode {
        CntR => Op::ScalarSet {
            dst: cx.xzr(a.rd),
            value: count,
        },
        IncdecR | SincdecR32 | SincdecR64 => Op::ScalarIncDec {
            dst: cx.xzr(a.rd),
            amount: Amount::Imm(count),
            decrement: a.decrement,
            sat,
            sf: a.sf,
        },
        _ => Op::VecIncDec {
            esz: a.esz,
            dst: cx.z(a.rd),
            amount: Amount::Imm(count),
            decrement: a.decrement,
            sat,
        },
    };
    cx.emit(op);
}

/// CNTP, INCP, DECP and their saturating forms: the count is the number of
/// active predicate elements at run time.
fn active_count<B: Backend>(cx: &mut Lowering<'_, B>) {
    use Opcode::*;
    let a = cx.insn.args;
    let opcode = cx.insn.opcode;
    let amount = Amount::Active {
        esz: a.esz,
        pred: cx.p(a.pg),
    };
    let sat = saturation(matches!(opcode, SincdecpR32 | SincdecpR64 | SincdecpZ), a.unsigned);
    let op = match opcode {
        Cntp => Op::CountP {
            esz: a.esz,
            dst: cx.xzr(a.rd),
            pn: cx.p(a.rn),
            pg: cx.p(a.pg),
        },
        IncdecpR | SincdecpR32 | SincdecpR64 => Op::ScalarIncDec {
            dst: cx.xzr(a.rd),
            amount,
            decrement: a.decrement,
            sat,
            sf: a.sf,
        },
        _ => Op::VecIncDec {
            esz: a.esz,
            dst: cx.z(a.rd),
            amount,
            decrement: a.decrement,
            sat,
        },
    };
    cx.emit(op);
}

/// Immediate broadcasts: DUP, DUPM, FDUP and the predicated CPY/FCPY.
fn dup_imm<B: Backend>(cx: &mut Lowering<'_, B>) {
    let a = cx.insn.args;
    let dst = cx.z(a.rd);
    let (esz, pred) = match cx.insn.opcode {
        // The bitmask immediate is already replicated to 64 bits.
        Opcode::Dupm => (ElementSize::D, Predication::All),
        Opcode::DupI | Opcode::Fdup => (a.esz, Predication::All),
        _ if a.merge => (a.esz, Predication::Merge(cx.p(a.pg))),
        _ => (a.esz, Predication::Zero(cx.p(a.pg))),
    };
    cx.emit(Op::Dup {
        esz,
        dst,
        value: ScalarSrc::Imm(a.imm as u64),
        pred,
    });
}
