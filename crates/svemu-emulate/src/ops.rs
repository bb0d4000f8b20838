//! Primitive operation IR.
//!
//! Translation lowers each decoded instruction to a short sequence of
//! [`Op`]s addressed by register-file byte offsets. Everything that depends
//! only on the instruction and the vector length (pattern counts, scaled
//! immediates, register offsets) is resolved at translation time; the
//! executor only does per-lane work.

use crate::regfile::{Gpr, Offset};
use serde::{Deserialize, Serialize};
use svemu_core::{ElementSize, VectorLength};

/// How inactive destination lanes are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predication {
    /// Unpredicated: every lane is active.
    All,
    /// Inactive lanes keep the destination's prior value.
    Merge(Offset),
    /// Inactive lanes are zeroed.
    Zero(Offset),
}

impl Predication {
    /// Governing predicate offset, if any.
    pub fn governing(&self) -> Option<Offset> {
        match *self {
            Self::All => None,
            Self::Merge(pg) | Self::Zero(pg) => Some(pg),
        }
    }
}

/// Second source operand of a binary lane operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand2 {
    /// Corresponding lane of a vector.
    Vec(Offset),
    /// The 64-bit element of a vector overlapping the lane (wide shifts and
    /// wide compares).
    Wide(Offset),
    /// An immediate broadcast to every lane.
    Imm(u64),
}

/// A scalar value source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarSrc {
    Gpr(Gpr),
    Imm(u64),
    /// Lowest element of a vector register (SIMD&FP scalar view).
    VecLow(Offset),
}

/// Destination of an element extracted from a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElemDst {
    /// General register, zero-extended.
    Gpr(Gpr),
    /// SIMD&FP scalar: lowest element, rest of the Z register zeroed.
    Simd(Offset),
    /// Broadcast to every element of a vector.
    Vector(Offset),
}

/// Extension applied to 32-bit vector offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extend {
    Uxtw,
    Sxtw,
    /// Full 64-bit offsets.
    None,
}

impl Extend {
    /// Maps the decoder's `xs` field.
    pub fn from_xs(xs: u8) -> Self {
        match xs {
            0 => Self::Uxtw,
            1 => Self::Sxtw,
            _ => Self::None,
        }
    }

    /// Applies the extension to a lane value.
    pub fn apply(self, value: u64) -> u64 {
        match self {
            Self::Uxtw => value as u32 as u64,
            Self::Sxtw => value as u32 as i32 as i64 as u64,
            Self::None => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Mov,
    Cls,
    Clz,
    Cnt,
    Cnot,
    Not,
    Abs,
    Neg,
    /// Sign-extend from the given size.
    Sext(ElementSize),
    /// Zero-extend from the given size.
    Zext(ElementSize),
    /// Reverse the order of chunks of the given size.
    Rev(ElementSize),
    Rbit,
    FAbs,
    FNeg,
    /// Exponential accelerator table lookup.
    FExpa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    /// `b - a`; only needed where the first operand cannot be swapped in
    /// (immediate forms).
    Subr,
    Smax,
    Umax,
    Smin,
    Umin,
    Sabd,
    Uabd,
    Mul,
    Smulh,
    Umulh,
    Sdiv,
    Udiv,
    Orr,
    Eor,
    And,
    Bic,
    Asr,
    Lsr,
    Lsl,
    Asrd,
    Sqadd,
    Uqadd,
    Sqsub,
    Uqsub,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FMax,
    FMin,
    FMaxnm,
    FMinnm,
    FAbd,
    /// Trigonometric starting-value select; the second operand carries the
    /// select and sign bits.
    FTssel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TernaryOp {
    /// `acc + a * b`
    Mla,
    /// `acc - a * b`
    Mls,
    /// Fused `acc + a * b`.
    FMla,
    /// Fused `acc + (-a) * b`.
    FMls,
    /// Fused `-acc + (-a) * b`.
    FNmla,
    /// Fused `-acc + a * b`.
    FNmls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReduceOp {
    Orv,
    Eorv,
    Andv,
    /// Signed sum, widened to 64 bits.
    Saddv,
    /// Unsigned sum, widened to 64 bits.
    Uaddv,
    Smaxv,
    Umaxv,
    Sminv,
    Uminv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermuteKind {
    Zip,
    Uzp,
    Trn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredLogicOp {
    And,
    Bic,
    Eor,
    Sel,
    Orr,
    Orn,
    Nor,
    Nand,
}

/// Integer comparison applied lane by lane.
pub use svemu_core::Cond;

/// Source of an element count added to or subtracted from a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    /// Known at translation time (pattern count times multiplier).
    Imm(u64),
    /// Number of active elements of size `esz` in a predicate.
    Active { esz: ElementSize, pred: Offset },
}

/// Saturation of a scalar or vector increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Saturation {
    Wrap,
    Signed,
    Unsigned,
}

/// Scalar or scalar-plus-scalar address: `base + (index << shift) + disp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub base: Gpr,
    pub index: Option<Gpr>,
    pub shift: u32,
    pub disp: i64,
}

impl Address {
    /// `[base, #disp]`
    pub fn imm(base: Gpr, disp: i64) -> Self {
        Self {
            base,
            index: None,
            shift: 0,
            disp,
        }
    }

    /// `[base, index, lsl #shift]`
    pub fn reg(base: Gpr, index: Gpr, shift: u32) -> Self {
        Self {
            base,
            index: Some(index),
            shift,
            disp: 0,
        }
    }
}

/// Load fault behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadMode {
    /// Any active lane fault is a hard fault.
    Normal,
    /// Only the first active lane faults; later faults truncate FFR.
    FirstFault,
    /// Never faults; faults truncate FFR.
    NonFault,
}

/// Per-lane addressing of gathers and scatters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatherAddr {
    /// `base + (extend(offsets[i]) << shift)`
    ScalarPlusVector {
        base: Gpr,
        offsets: Offset,
        extend: Extend,
        shift: u32,
    },
    /// `bases[i] + imm`
    VectorPlusImm { bases: Offset, imm: u64 },
}

/// A primitive operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    // ==================== Moves ====================
    /// Copies `len` arena bytes.
    Mov { dst: Offset, src: Offset, len: usize },
    /// Zeroes `len` arena bytes.
    Zero { dst: Offset, len: usize },
    /// Broadcasts a scalar to every active lane.
    Dup {
        esz: ElementSize,
        dst: Offset,
        value: ScalarSrc,
        pred: Predication,
    },

    // ==================== Lane arithmetic ====================
    Unary {
        op: UnaryOp,
        esz: ElementSize,
        dst: Offset,
        src: Offset,
        pred: Predication,
    },
    Binary {
        op: BinaryOp,
        esz: ElementSize,
        dst: Offset,
        a: Offset,
        b: Operand2,
        pred: Predication,
    },
    /// Merging multiply-accumulate.
    Ternary {
        op: TernaryOp,
        esz: ElementSize,
        dst: Offset,
        acc: Offset,
        a: Offset,
        b: Offset,
        pg: Offset,
    },
    /// Integer to floating-point conversion; lanes are the wider of the two
    /// sizes.
    Convert {
        unsigned: bool,
        esz: ElementSize,
        src_esz: ElementSize,
        dst: Offset,
        src: Offset,
        pg: Offset,
    },
    /// `dst[i] = start + i * step`
    Index {
        esz: ElementSize,
        dst: Offset,
        start: ScalarSrc,
        step: ScalarSrc,
    },
    /// `dst[i] = base[i] + (extend(offset[i]) << shift)`
    Adr {
        esz: ElementSize,
        dst: Offset,
        base: Offset,
        offset: Offset,
        extend: Extend,
        shift: u32,
    },

    // ==================== Reductions ====================
    /// Folds active lanes into the lowest element of `dst`, zeroing the rest.
    Reduce {
        op: ReduceOp,
        esz: ElementSize,
        dst: Offset,
        src: Offset,
        pg: Offset,
    },
    /// Strictly ordered floating-point add of active lanes into a scalar.
    FAddA {
        esz: ElementSize,
        dst: Offset,
        src: Offset,
        pg: Offset,
    },

    // ==================== Permutes ====================
    Ext {
        dst: Offset,
        a: Offset,
        b: Offset,
        offset: usize,
    },
    /// Broadcasts element `index` of `2^log2` bytes (log2 = 4 selects a
    /// 128-bit quadword).
    DupElem {
        log2: u32,
        dst: Offset,
        src: Offset,
        index: usize,
    },
    /// Shifts the vector up one lane and inserts a scalar at lane 0.
    Insr {
        esz: ElementSize,
        dst: Offset,
        value: ScalarSrc,
    },
    RevV {
        esz: ElementSize,
        dst: Offset,
        src: Offset,
    },
    Tbl {
        esz: ElementSize,
        dst: Offset,
        table: Offset,
        indices: Offset,
    },
    /// Widens the low or high half of `src` into `esz` lanes.
    Unpk {
        esz: ElementSize,
        dst: Offset,
        src: Offset,
        high: bool,
        unsigned: bool,
    },
    Permute {
        kind: PermuteKind,
        esz: ElementSize,
        dst: Offset,
        a: Offset,
        b: Offset,
        high: bool,
    },
    Compact {
        esz: ElementSize,
        dst: Offset,
        src: Offset,
        pg: Offset,
    },
    Splice {
        esz: ElementSize,
        dst: Offset,
        a: Offset,
        b: Offset,
        pg: Offset,
    },
    /// `dst[i] = pg[i] ? a[i] : b[i]`
    Select {
        esz: ElementSize,
        dst: Offset,
        a: Offset,
        b: Offset,
        pg: Offset,
    },
    /// LASTA/LASTB.
    LastElem {
        esz: ElementSize,
        dst: ElemDst,
        src: Offset,
        pg: Offset,
        after: bool,
    },
    /// CLASTA/CLASTB: as LastElem, but with no active lane the destination
    /// keeps (or zero-extends) its own value.
    CondLast {
        esz: ElementSize,
        dst: ElemDst,
        src: Offset,
        pg: Offset,
        after: bool,
    },

    // ==================== Predicates ====================
    PermuteP {
        kind: PermuteKind,
        esz: ElementSize,
        dst: Offset,
        a: Offset,
        b: Offset,
        high: bool,
    },
    RevP {
        esz: ElementSize,
        dst: Offset,
        src: Offset,
    },
    Punpk {
        dst: Offset,
        src: Offset,
        high: bool,
    },
    PredLogic {
        op: PredLogicOp,
        dst: Offset,
        n: Offset,
        m: Offset,
        pg: Offset,
    },
    /// Sets NZCV from PredTest(d, g & esz mask); `g` of `None` is an
    /// all-true predicate at `esz`.
    PredTest {
        d: Offset,
        g: Option<Offset>,
        esz: ElementSize,
    },
    /// Sets the first `count` elements of size `esz`, clears the rest.
    PredInit {
        dst: Offset,
        esz: ElementSize,
        count: usize,
    },
    PFirst {
        dst: Offset,
        pg: Offset,
    },
    PNext {
        esz: ElementSize,
        dst: Offset,
        pg: Offset,
    },
    /// BRKA/BRKB.
    Brk {
        dst: Offset,
        n: Offset,
        pg: Offset,
        after: bool,
        merge: bool,
    },
    /// BRKPA/BRKPB.
    BrkP {
        dst: Offset,
        n: Offset,
        m: Offset,
        pg: Offset,
        after: bool,
    },
    /// BRKN: `dst` is also the propagated operand.
    BrkN { dst: Offset, n: Offset, pg: Offset },
    Compare {
        cond: Cond,
        esz: ElementSize,
        dst: Offset,
        a: Offset,
        b: Operand2,
        pg: Offset,
    },
    /// `dst = count(pn & pg)` at `esz`.
    CountP {
        esz: ElementSize,
        dst: Gpr,
        pn: Offset,
        pg: Offset,
    },
    While {
        esz: ElementSize,
        dst: Offset,
        a: Gpr,
        b: Gpr,
        sf: bool,
        unsigned: bool,
        eq: bool,
    },
    CTerm {
        a: Gpr,
        b: Gpr,
        sf: bool,
        ne: bool,
    },

    // ==================== Scalars ====================
    ScalarSet { dst: Gpr, value: u64 },
    ScalarAdd { dst: Gpr, src: Gpr, imm: i64 },
    /// Increment or decrement a general register by an element count.
    ScalarIncDec {
        dst: Gpr,
        amount: Amount,
        decrement: bool,
        sat: Saturation,
        sf: bool,
    },
    /// Increment or decrement every lane by an element count.
    VecIncDec {
        esz: ElementSize,
        dst: Offset,
        amount: Amount,
        decrement: bool,
        sat: Saturation,
    },

    // ==================== Memory ====================
    /// Contiguous load of `regs.len()` interleaved registers.
    LoadContig {
        esz: ElementSize,
        msz: u32,
        signed: bool,
        regs: Vec<Offset>,
        addr: Address,
        pg: Offset,
        mode: LoadMode,
    },
    /// Contiguous store of `regs.len()` interleaved registers.
    StoreContig {
        esz: ElementSize,
        msz: u32,
        regs: Vec<Offset>,
        addr: Address,
        pg: Offset,
    },
    /// Loads one element and broadcasts it to active lanes.
    LoadBroadcast {
        esz: ElementSize,
        msz: u32,
        signed: bool,
        dst: Offset,
        addr: Address,
        pg: Offset,
    },
    /// Loads one predicated quadword and replicates it.
    LoadQuad {
        esz: ElementSize,
        dst: Offset,
        addr: Address,
        pg: Offset,
    },
    LoadGather {
        esz: ElementSize,
        msz: u32,
        signed: bool,
        dst: Offset,
        addr: GatherAddr,
        pg: Offset,
        mode: LoadMode,
    },
    StoreScatter {
        esz: ElementSize,
        msz: u32,
        src: Offset,
        addr: GatherAddr,
        pg: Offset,
    },
    /// Unpredicated byte-stream fill of a register (LDR).
    LoadReg { dst: Offset, len: usize, addr: Address },
    /// Unpredicated byte-stream spill of a register (STR).
    StoreReg { src: Offset, len: usize, addr: Address },
}

impl Op {
    /// Returns true if the operation accesses guest memory.
    pub fn is_memory(&self) -> bool {
        matches!(
            self,
            Self::LoadContig { .. }
                | Self::StoreContig { .. }
                | Self::LoadBroadcast { .. }
                | Self::LoadQuad { .. }
                | Self::LoadGather { .. }
                | Self::StoreScatter { .. }
                | Self::LoadReg { .. }
                | Self::StoreReg { .. }
        )
    }

    /// Returns true if the operation writes the condition flags.
    pub fn sets_flags(&self) -> bool {
        matches!(self, Self::PredTest { .. } | Self::CTerm { .. })
    }
}

/// Consumer of primitive operations.
///
/// Translation emits operations in architectural program order; a backend
/// may record them, execute them directly or compile them.
pub trait Backend {
    /// Vector length the operations are emitted for.
    fn vector_length(&self) -> VectorLength;

    /// Accepts one primitive operation.
    fn emit_op(&mut self, op: Op);
}

/// The operations one instruction lowers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpSequence {
    vl: VectorLength,
    ops: Vec<Op>,
}

impl OpSequence {
    /// Create an empty sequence for vector length `vl`.
    pub fn new(vl: VectorLength) -> Self {
        Self { vl, ops: Vec::new() }
    }

    /// The emitted operations.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Op> {
        self.ops.iter()
    }
}

impl Backend for OpSequence {
    fn vector_length(&self) -> VectorLength {
        self.vl
    }

    fn emit_op(&mut self, op: Op) {
        self.ops.push(op);
    }
}

impl<'a> IntoIterator for &'a OpSequence {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
