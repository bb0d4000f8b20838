//! Element-size dispatch tables.
//!
//! For each instruction family a table maps every element size to the
//! size-specific handler, or to nothing when the architecture leaves that
//! size form unallocated. Lookups are total over the four sizes; an absent
//! entry is translated as an undefined instruction, never defaulted.

use crate::ops::{BinaryOp, ReduceOp, TernaryOp, UnaryOp};
use svemu_core::{ElementSize, Opcode};

/// A handler per element size; `None` marks an unallocated size form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeTable<T: Copy>([Option<T>; 4]);

impl<T: Copy> SizeTable<T> {
    /// A table with no allocated size.
    pub const NONE: Self = Self([None; 4]);

    /// Creates a table from explicit per-size entries (B, H, S, D).
    pub const fn new(entries: [Option<T>; 4]) -> Self {
        Self(entries)
    }

    /// The same handler for every size.
    pub const fn all(h: T) -> Self {
        Self([Some(h), Some(h), Some(h), Some(h)])
    }

    /// The handler for every size except bytes.
    pub const fn no_byte(h: T) -> Self {
        Self([None, Some(h), Some(h), Some(h)])
    }

    /// The handler for word and doubleword sizes only.
    pub const fn word_up(h: T) -> Self {
        Self([None, None, Some(h), Some(h)])
    }

    /// The handler for every size except doublewords.
    pub const fn no_double(h: T) -> Self {
        Self([Some(h), Some(h), Some(h), None])
    }

    /// The handler for doublewords only.
    pub const fn double_only(h: T) -> Self {
        Self([None, None, None, Some(h)])
    }

    /// Looks up the handler for `esz`.
    pub fn get(&self, esz: ElementSize) -> Option<T> {
        self.0[esz as usize]
    }

    /// Returns true if no size is allocated.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

/// Binary lane handler with operand order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHandler {
    pub op: BinaryOp,
    /// Reversed forms (SUBR, SDIVR, LSLR...) swap the two sources.
    pub reversed: bool,
}

const fn fwd(op: BinaryOp) -> BinaryHandler {
    BinaryHandler { op, reversed: false }
}

const fn rev(op: BinaryOp) -> BinaryHandler {
    BinaryHandler { op, reversed: true }
}

/// Predicated vector-vector integer and floating-point operations.
pub fn zpzz(opcode: Opcode) -> SizeTable<BinaryHandler> {
    use BinaryOp::*;
    match opcode {
        Opcode::AddZpzz => SizeTable::all(fwd(Add)),
        Opcode::SubZpzz => SizeTable::all(fwd(Sub)),
        Opcode::SubrZpzz => SizeTable::all(rev(Sub)),
        Opcode::SmaxZpzz => SizeTable::all(fwd(Smax)),
        Opcode::UmaxZpzz => SizeTable::all(fwd(Umax)),
        Opcode::SminZpzz => SizeTable::all(fwd(Smin)),
        Opcode::UminZpzz => SizeTable::all(fwd(Umin)),
        Opcode::SabdZpzz => SizeTable::all(fwd(Sabd)),
        Opcode::UabdZpzz => SizeTable::all(fwd(Uabd)),
        Opcode::MulZpzz => SizeTable::all(fwd(Mul)),
        Opcode::SmulhZpzz => SizeTable::all(fwd(Smulh)),
        Opcode::UmulhZpzz => SizeTable::all(fwd(Umulh)),
        Opcode::SdivZpzz => SizeTable::word_up(fwd(Sdiv)),
        Opcode::UdivZpzz => SizeTable::word_up(fwd(Udiv)),
        Opcode::SdivrZpzz => SizeTable::word_up(rev(Sdiv)),
        Opcode::UdivrZpzz => SizeTable::word_up(rev(Udiv)),
        Opcode::OrrZpzz => SizeTable::all(fwd(Orr)),
        Opcode::EorZpzz => SizeTable::all(fwd(Eor)),
        Opcode::AndZpzz => SizeTable::all(fwd(And)),
        Opcode::BicZpzz => SizeTable::all(fwd(Bic)),
        Opcode::AsrZpzz => SizeTable::all(fwd(Asr)),
        Opcode::LsrZpzz => SizeTable::all(fwd(Lsr)),
        Opcode::LslZpzz => SizeTable::all(fwd(Lsl)),
        Opcode::AsrrZpzz => SizeTable::all(rev(Asr)),
        Opcode::LsrrZpzz => SizeTable::all(rev(Lsr)),
        Opcode::LslrZpzz => SizeTable::all(rev(Lsl)),
        Opcode::FaddZpzz => SizeTable::no_byte(fwd(FAdd)),
        Opcode::FsubZpzz => SizeTable::no_byte(fwd(FSub)),
        Opcode::FmulZpzz => SizeTable::no_byte(fwd(FMul)),
        Opcode::FsubrZpzz => SizeTable::no_byte(rev(FSub)),
        Opcode::FmaxnmZpzz => SizeTable::no_byte(fwd(FMaxnm)),
        Opcode::FminnmZpzz => SizeTable::no_byte(fwd(FMinnm)),
        Opcode::FmaxZpzz => SizeTable::no_byte(fwd(FMax)),
        Opcode::FminZpzz => SizeTable::no_byte(fwd(FMin)),
        Opcode::FabdZpzz => SizeTable::no_byte(fwd(FAbd)),
        Opcode::FdivZpzz => SizeTable::no_byte(fwd(FDiv)),
        Opcode::FdivrZpzz => SizeTable::no_byte(rev(FDiv)),
        _ => SizeTable::NONE,
    }
}

/// Unpredicated vector-vector operations.
pub fn zzz(opcode: Opcode) -> SizeTable<BinaryOp> {
    use BinaryOp::*;
    match opcode {
        Opcode::AddZzz => SizeTable::all(Add),
        Opcode::SubZzz => SizeTable::all(Sub),
        Opcode::SqaddZzz => SizeTable::all(Sqadd),
        Opcode::UqaddZzz => SizeTable::all(Uqadd),
        Opcode::SqsubZzz => SizeTable::all(Sqsub),
        Opcode::UqsubZzz => SizeTable::all(Uqsub),
        // Bitwise operations are size-agnostic and always run on doublewords.
        Opcode::AndZzz => SizeTable::double_only(And),
        Opcode::OrrZzz => SizeTable::double_only(Orr),
        Opcode::EorZzz => SizeTable::double_only(Eor),
        Opcode::BicZzz => SizeTable::double_only(Bic),
        Opcode::FaddZzz => SizeTable::no_byte(FAdd),
        Opcode::FsubZzz => SizeTable::no_byte(FSub),
        Opcode::FmulZzz => SizeTable::no_byte(FMul),
        Opcode::Ftssel => SizeTable::no_byte(FTssel),
        _ => SizeTable::NONE,
    }
}

/// Shifts by the overlapping 64-bit element, predicated and unpredicated.
pub fn wide_shift(opcode: Opcode) -> SizeTable<BinaryOp> {
    use BinaryOp::*;
    match opcode {
        Opcode::AsrZpzw | Opcode::AsrZzw => SizeTable::no_double(Asr),
        Opcode::LsrZpzw | Opcode::LsrZzw => SizeTable::no_double(Lsr),
        Opcode::LslZpzw | Opcode::LslZzw => SizeTable::no_double(Lsl),
        _ => SizeTable::NONE,
    }
}

/// Shifts by immediate, predicated and unpredicated.
pub fn shift_imm(opcode: Opcode) -> SizeTable<BinaryOp> {
    use BinaryOp::*;
    match opcode {
        Opcode::AsrZpzi | Opcode::AsrZzi => SizeTable::all(Asr),
        Opcode::LsrZpzi | Opcode::LsrZzi => SizeTable::all(Lsr),
        Opcode::LslZpzi | Opcode::LslZzi => SizeTable::all(Lsl),
        Opcode::Asrd => SizeTable::all(Asrd),
        _ => SizeTable::NONE,
    }
}

/// Unpredicated vector-immediate arithmetic.
pub fn zzi(opcode: Opcode) -> SizeTable<BinaryOp> {
    use BinaryOp::*;
    match opcode {
        Opcode::AddZzi => SizeTable::all(Add),
        Opcode::SubZzi => SizeTable::all(Sub),
        Opcode::SubrZzi => SizeTable::all(Subr),
        Opcode::SqaddZzi => SizeTable::all(Sqadd),
        Opcode::UqaddZzi => SizeTable::all(Uqadd),
        Opcode::SqsubZzi => SizeTable::all(Sqsub),
        Opcode::UqsubZzi => SizeTable::all(Uqsub),
        Opcode::SmaxZzi => SizeTable::all(Smax),
        Opcode::UmaxZzi => SizeTable::all(Umax),
        Opcode::SminZzi => SizeTable::all(Smin),
        Opcode::UminZzi => SizeTable::all(Umin),
        Opcode::MulZzi => SizeTable::all(Mul),
        Opcode::AndZzi => SizeTable::double_only(And),
        Opcode::OrrZzi => SizeTable::double_only(Orr),
        Opcode::EorZzi => SizeTable::double_only(Eor),
        _ => SizeTable::NONE,
    }
}

/// Unary operations; all but FEXPA are predicated.
pub fn unary(opcode: Opcode) -> SizeTable<UnaryOp> {
    use ElementSize::{B, H, S};
    use UnaryOp::*;
    match opcode {
        Opcode::Cls => SizeTable::all(Cls),
        Opcode::Clz => SizeTable::all(Clz),
        Opcode::Cnt => SizeTable::all(Cnt),
        Opcode::Cnot => SizeTable::all(Cnot),
        Opcode::Not => SizeTable::all(Not),
        Opcode::Abs => SizeTable::all(Abs),
        Opcode::Neg => SizeTable::all(Neg),
        Opcode::Rbit => SizeTable::all(Rbit),
        Opcode::Fabs => SizeTable::no_byte(FAbs),
        Opcode::Fneg => SizeTable::no_byte(FNeg),
        Opcode::Sxtb => SizeTable::no_byte(Sext(B)),
        Opcode::Uxtb => SizeTable::no_byte(Zext(B)),
        Opcode::Sxth => SizeTable::word_up(Sext(H)),
        Opcode::Uxth => SizeTable::word_up(Zext(H)),
        Opcode::Sxtw => SizeTable::double_only(Sext(S)),
        Opcode::Uxtw => SizeTable::double_only(Zext(S)),
        Opcode::Revb => SizeTable::no_byte(Rev(B)),
        Opcode::Revh => SizeTable::word_up(Rev(H)),
        Opcode::Revw => SizeTable::double_only(Rev(S)),
        Opcode::MovprfxM | Opcode::MovprfxZ => SizeTable::all(Mov),
        Opcode::Fexpa => SizeTable::no_byte(FExpa),
        _ => SizeTable::NONE,
    }
}

/// Horizontal reductions.
pub fn reduce(opcode: Opcode) -> SizeTable<ReduceOp> {
    use ReduceOp::*;
    match opcode {
        Opcode::Orv => SizeTable::all(Orv),
        Opcode::Eorv => SizeTable::all(Eorv),
        Opcode::Andv => SizeTable::all(Andv),
        // The signed sum of doublewords is UADDV.
        Opcode::Saddv => SizeTable::no_double(Saddv),
        Opcode::Uaddv => SizeTable::all(Uaddv),
        Opcode::Smaxv => SizeTable::all(Smaxv),
        Opcode::Umaxv => SizeTable::all(Umaxv),
        Opcode::Sminv => SizeTable::all(Sminv),
        Opcode::Uminv => SizeTable::all(Uminv),
        _ => SizeTable::NONE,
    }
}

/// Multiply-accumulate handler with operand roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TernaryHandler {
    pub op: TernaryOp,
    /// The multiplicand forms (MAD, FMAD...) multiply the destination and
    /// take the addend from a separate register.
    pub multiplicand: bool,
}

const fn acc(op: TernaryOp) -> TernaryHandler {
    TernaryHandler {
        op,
        multiplicand: false,
    }
}

const fn mad(op: TernaryOp) -> TernaryHandler {
    TernaryHandler {
        op,
        multiplicand: true,
    }
}

/// Multiply-add families.
pub fn ternary(opcode: Opcode) -> SizeTable<TernaryHandler> {
    use TernaryOp::*;
    match opcode {
        Opcode::Mla => SizeTable::all(acc(Mla)),
        Opcode::Mls => SizeTable::all(acc(Mls)),
        Opcode::Mad => SizeTable::all(mad(Mla)),
        Opcode::Msb => SizeTable::all(mad(Mls)),
        Opcode::Fmla => SizeTable::no_byte(acc(FMla)),
        Opcode::Fmls => SizeTable::no_byte(acc(FMls)),
        Opcode::Fnmla => SizeTable::no_byte(acc(FNmla)),
        Opcode::Fnmls => SizeTable::no_byte(acc(FNmls)),
        Opcode::Fmad => SizeTable::no_byte(mad(FMla)),
        Opcode::Fmsb => SizeTable::no_byte(mad(FMls)),
        Opcode::Fnmad => SizeTable::no_byte(mad(FNmla)),
        Opcode::Fnmsb => SizeTable::no_byte(mad(FNmls)),
        _ => SizeTable::NONE,
    }
}

/// Allocated sizes of any opcode; the handler is the opcode itself.
pub fn sizes(opcode: Opcode) -> SizeTable<Opcode> {
    SizeTable::new(ElementSize::ALL.map(|e| opcode.allows_size(e).then_some(opcode)))
}
