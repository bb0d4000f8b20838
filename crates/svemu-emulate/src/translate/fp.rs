//! Floating-point arithmetic and conversions.
//!
//! The predicated and fused forms share their lowering with the integer
//! forms; only the lane operation differs.

use super::{int, Lowering, TranslateResult};
use crate::dispatch;
use crate::ops::{Backend, Op, Predication};
use svemu_core::{ElementSize, Opcode};

pub(super) fn translate<B: Backend>(cx: &mut Lowering<'_, B>) -> TranslateResult<bool> {
    use Opcode::*;
    let (opcode, a) = (cx.insn.opcode, cx.insn.args);
    match opcode {
        FaddZzz | FsubZzz | FmulZzz | Ftssel => int::zzz(cx)?,
        Fexpa => {
            let op = cx.sized(dispatch::unary(opcode))?;
            let (dst, src) = (cx.z(a.rd), cx.z(a.rn));
            cx.emit(Op::Unary {
                op,
                esz: a.esz,
                dst,
                src,
                pred: Predication::All,
            });
        }
        FaddZpzz | FsubZpzz | FmulZpzz | FsubrZpzz | FmaxnmZpzz | FminnmZpzz | FmaxZpzz | FminZpzz
        | FabdZpzz | FdivrZpzz | FdivZpzz => int::zpzz(cx)?,
        Fmla | Fmls | Fnmla | Fnmls | Fmad | Fmsb | Fnmad | Fnmsb => int::ternary(cx)?,
        Fadda => {
            let (dst, src, pg) = (cx.z(a.rd), cx.z(a.rm), cx.p(a.pg));
            cx.emit(Op::FAddA {
                esz: a.esz,
                dst,
                src,
                pg,
            });
        }
        Scvtf | Ucvtf => {
            if a.esz == ElementSize::B || a.src_esz == ElementSize::B {
                return Err(cx.unallocated());
            }
            let (dst, src, pg) = (cx.z(a.rd), cx.z(a.rn), cx.p(a.pg));
            cx.emit(Op::Convert {
                unsigned: opcode == Ucvtf,
                esz: a.esz,
                src_esz: a.src_esz,
                dst,
                src,
                pg,
            });
        }
        _ => return Ok(false),
    }
    Ok(true)
}
