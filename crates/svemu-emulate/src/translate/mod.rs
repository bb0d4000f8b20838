//! Translation of decoded SVE instructions into primitive operations.
//!
//! Translation is a pure function of the decoded instruction and the vector
//! length: it never looks at register or memory contents. Operations are
//! emitted through the [`Backend`] seam in architectural program order.

mod fp;
mod int;
mod mem;
mod perm;
mod pred;

use crate::dispatch::{self, SizeTable};
use crate::ops::{Backend, Op, OpSequence};
use crate::regfile::{Gpr, Layout, Offset, RegisterFile};
use svemu_core::{ElementSize, Instruction, VectorLength};
use svemu_disasm::DecodeError;

/// Result type for translation.
pub type TranslateResult<T> = Result<T, DecodeError>;

/// Translates one instruction for vector length `vl`.
pub fn translate(insn: &Instruction, vl: VectorLength) -> TranslateResult<OpSequence> {
    let mut seq = OpSequence::new(vl);
    translate_into(insn, &mut seq)?;
    Ok(seq)
}

/// Translates one instruction, emitting its operations into `backend`.
///
/// An element size the instruction does not support is reported as an
/// unallocated encoding.
pub fn translate_into<B: Backend>(insn: &Instruction, backend: &mut B) -> TranslateResult<()> {
    let mut cx = Lowering::new(insn, backend);
    if dispatch::sizes(insn.opcode).get(insn.args.esz).is_none() {
        return Err(cx.unallocated());
    }

    let handled = int::translate(&mut cx)?
        || perm::translate(&mut cx)?
        || pred::translate(&mut cx)?
        || fp::translate(&mut cx)?
        || mem::translate(&mut cx)?;
    if !handled {
        return Err(cx.unallocated());
    }
    Ok(())
}

/// Per-instruction translation state.
pub(crate) struct Lowering<'a, B: Backend> {
    pub insn: &'a Instruction,
    layout: Layout,
    out: &'a mut B,
}

impl<'a, B: Backend> Lowering<'a, B> {
    fn new(insn: &'a Instruction, out: &'a mut B) -> Self {
        let layout = Layout::new(out.vector_length());
        Self { insn, layout, out }
    }

    pub fn vl(&self) -> VectorLength {
        self.layout.vector_length()
    }

    pub fn emit(&mut self, op: Op) {
        self.out.emit_op(op);
    }

    pub fn unallocated(&self) -> DecodeError {
        DecodeError::unallocated(self.insn.address, self.insn.word)
    }

    /// Looks up the handler for the instruction's element size.
    pub fn sized<T: Copy>(&self, table: SizeTable<T>) -> TranslateResult<T> {
        table.get(self.insn.args.esz).ok_or_else(|| self.unallocated())
    }

    // ==================== Register operands ====================

    pub fn z(&self, reg: u8) -> Offset {
        self.layout.zreg(reg)
    }

    pub fn p(&self, reg: u8) -> Offset {
        self.layout.preg(reg)
    }

    pub fn ffr(&self) -> Offset {
        self.layout.ffr()
    }

    /// Bytes moved when copying a whole predicate slot.
    pub fn pred_len(&self) -> usize {
        self.layout.pred_stride()
    }

    pub fn xzr(&self, reg: u8) -> Gpr {
        Gpr::zr(reg)
    }

    pub fn xsp(&self, reg: u8) -> Gpr {
        Gpr::sp_or(reg)
    }

    // ==================== Flag-setting predicates ====================

    /// Governing predicate of a flag-setting instruction.
    ///
    /// The flags are computed against the governing predicate as it was
    /// before the instruction ran. When the destination is also the
    /// governing predicate, the old value is first saved to the scratch
    /// predicate and the instruction is governed by the copy.
    pub fn flag_governor(&mut self, pg: u8) -> Offset {
        let args = &self.insn.args;
        if args.set_flags && args.rd == pg {
            let scratch = self.p(RegisterFile::SCRATCH_PRED);
            let op = Op::Mov {
                dst: scratch,
                src: self.p(pg),
                len: self.pred_len(),
            };
            self.emit(op);
            scratch
        } else {
            self.p(pg)
        }
    }

    /// Emits the NZCV update of a flag-setting predicate instruction.
    pub fn pred_test(&mut self, d: Offset, g: Option<Offset>, esz: ElementSize) {
        if self.insn.args.set_flags {
            self.emit(Op::PredTest { d, g, esz });
        }
    }
}

#[cfg(test)]
mod tests;
