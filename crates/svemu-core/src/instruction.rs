//! Decoded SVE instruction representation.

use crate::register::ElementSize;
use crate::Operand;
use std::fmt;

/// One variant per decoded SVE instruction form.
///
/// Forms are named after the mnemonic plus the operand shape used by the
/// architecture reference (`zpzz`: predicated vector/vector, `zzi`:
/// unpredicated vector/immediate, `pppp`: predicate logical and so on).
/// Everything that varies within a form lives in [`Args`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Opcode {
    // ==== Integer binary, predicated ====
    AddZpzz,
    SubZpzz,
    SubrZpzz,
    SmaxZpzz,
    UmaxZpzz,
    SminZpzz,
    UminZpzz,
    SabdZpzz,
    UabdZpzz,
    MulZpzz,
    SmulhZpzz,
    UmulhZpzz,
    SdivZpzz,
    UdivZpzz,
    SdivrZpzz,
    UdivrZpzz,
    OrrZpzz,
    EorZpzz,
    AndZpzz,
    BicZpzz,
    AsrZpzz,
    LsrZpzz,
    LslZpzz,
    AsrrZpzz,
    LsrrZpzz,
    LslrZpzz,
    AsrZpzw,
    LsrZpzw,
    LslZpzw,
    AsrZpzi,
    LsrZpzi,
    LslZpzi,
    Asrd,

    // ==== Reductions ====
    Orv,
    Eorv,
    Andv,
    Saddv,
    Uaddv,
    Smaxv,
    Umaxv,
    Sminv,
    Uminv,

    // ==== Move prefix ====
    MovprfxZ,
    MovprfxM,
    Movprfx,

    // ==== Integer unary, predicated ====
    Cls,
    Clz,
    Cnt,
    Cnot,
    Fabs,
    Fneg,
    Not,
    Sxtb,
    Uxtb,
    Sxth,
    Uxth,
    Sxtw,
    Uxtw,
    Abs,
    Neg,
    Revb,
    Revh,
    Revw,
    Rbit,

    // ==== Multiply-add ====
    Mla,
    Mls,
    Mad,
    Msb,

    // ==== Integer, unpredicated ====
    AddZzz,
    SubZzz,
    SqaddZzz,
    UqaddZzz,
    SqsubZzz,
    UqsubZzz,
    AndZzz,
    OrrZzz,
    EorZzz,
    BicZzz,
    AsrZzw,
    LsrZzw,
    LslZzw,
    AsrZzi,
    LsrZzi,
    LslZzi,
    Adr,

    // ==== Index generation and stack frame ====
    IndexIi,
    IndexIr,
    IndexRi,
    IndexRr,
    Addvl,
    Addpl,
    Rdvl,

    // ==== Element count ====
    CntR,
    IncdecR,
    SincdecR32,
    SincdecR64,
    IncdecV,
    SincdecV,

    // ==== Immediates ====
    AndZzi,
    OrrZzi,
    EorZzi,
    Dupm,
    Fcpy,
    CpyMI,
    CpyZI,
    Fdup,
    DupI,
    AddZzi,
    SubZzi,
    SubrZzi,
    SqaddZzi,
    UqaddZzi,
    SqsubZzi,
    UqsubZzi,
    SmaxZzi,
    UmaxZzi,
    SminZzi,
    UminZzi,
    MulZzi,

    // ==== Permutes ====
    Ext,
    DupS,
    DupX,
    InsrF,
    InsrR,
    RevV,
    Tbl,
    Unpk,
    ZipP,
    UzpP,
    TrnP,
    RevP,
    Punpk,
    ZipZ,
    UzpZ,
    TrnZ,
    Compact,
    LastV,
    LastR,
    ClastZ,
    ClastV,
    ClastR,
    CpyMV,
    CpyMR,
    Splice,
    SelZpzz,

    // ==== Compares ====
    CmpPpzz,
    CmpPpzw,
    CmpPpzi,

    // ==== Predicate logical ====
    AndPppp,
    BicPppp,
    EorPppp,
    SelPppp,
    OrrPppp,
    OrnPppp,
    NorPppp,
    NandPppp,

    // ==== Predicate misc ====
    Ptest,
    Ptrue,
    Pfalse,
    Setffr,
    RdffrP,
    Rdffr,
    Wrffr,
    Pfirst,
    Pnext,
    Brka,
    Brkb,
    Brkpa,
    Brkpb,
    Brkn,
    Cntp,
    IncdecpR,
    IncdecpZ,
    SincdecpR32,
    SincdecpR64,
    SincdecpZ,
    Cterm,
    While,

    // ==== Floating point ====
    FaddZzz,
    FsubZzz,
    FmulZzz,
    FaddZpzz,
    FsubZpzz,
    FmulZpzz,
    FsubrZpzz,
    FmaxnmZpzz,
    FminnmZpzz,
    FmaxZpzz,
    FminZpzz,
    FabdZpzz,
    FdivrZpzz,
    FdivZpzz,
    Fmla,
    Fmls,
    Fnmla,
    Fnmls,
    Fmad,
    Fmsb,
    Fnmad,
    Fnmsb,
    Fadda,
    Fexpa,
    Ftssel,
    Scvtf,
    Ucvtf,

    // ==== Memory ====
    LdrZ,
    LdrP,
    StrZ,
    StrP,
    Ld1r,
    LdZprr,
    LdZpri,
    Ldff1Zprr,
    Ldnf1Zpri,
    Ld1rqZprr,
    Ld1rqZpri,
    StZprr,
    StZpri,
    Ld1Zprz,
    Ld1Zpiz,
    St1Zprz,
    St1Zpiz,
    Prf,
}

impl Opcode {
    /// Returns true if the instruction accesses guest memory.
    pub fn is_memory(self) -> bool {
        matches!(
            self,
            Self::LdrZ
                | Self::LdrP
                | Self::StrZ
                | Self::StrP
                | Self::Ld1r
                | Self::LdZprr
                | Self::LdZpri
                | Self::Ldff1Zprr
                | Self::Ldnf1Zpri
                | Self::Ld1rqZprr
                | Self::Ld1rqZpri
                | Self::StZprr
                | Self::StZpri
                | Self::Ld1Zprz
                | Self::Ld1Zpiz
                | Self::St1Zprz
                | Self::St1Zpiz
        )
    }

    /// Returns true if the architecture allocates this form at element size
    /// `esz`. Forms whose size is not restricted accept every size.
    pub fn allows_size(self, esz: ElementSize) -> bool {
        use ElementSize::{B, D, S};
        match self {
            Self::SdivZpzz
            | Self::UdivZpzz
            | Self::SdivrZpzz
            | Self::UdivrZpzz
            | Self::Sxth
            | Self::Uxth
            | Self::Revh
            | Self::Compact
            | Self::Adr => matches!(esz, S | D),
            // The bitwise forms have no size field and always run on
            // doublewords.
            Self::Sxtw
            | Self::Uxtw
            | Self::Revw
            | Self::AndZzz
            | Self::OrrZzz
            | Self::EorZzz
            | Self::BicZzz
            | Self::AndZzi
            | Self::OrrZzi
            | Self::EorZzi => esz == D,
            Self::AsrZpzw
            | Self::LsrZpzw
            | Self::LslZpzw
            | Self::AsrZzw
            | Self::LsrZzw
            | Self::LslZzw
            | Self::Saddv
            | Self::CmpPpzw => esz != D,
            Self::Sxtb
            | Self::Uxtb
            | Self::Revb
            | Self::Fabs
            | Self::Fneg
            | Self::IncdecV
            | Self::SincdecV
            | Self::IncdecpZ
            | Self::SincdecpZ
            | Self::FaddZzz
            | Self::FsubZzz
            | Self::FmulZzz
            | Self::FaddZpzz
            | Self::FsubZpzz
            | Self::FmulZpzz
            | Self::FsubrZpzz
            | Self::FmaxnmZpzz
            | Self::FminnmZpzz
            | Self::FmaxZpzz
            | Self::FminZpzz
            | Self::FabdZpzz
            | Self::FdivrZpzz
            | Self::FdivZpzz
            | Self::Fmla
            | Self::Fmls
            | Self::Fnmla
            | Self::Fnmls
            | Self::Fmad
            | Self::Fmsb
            | Self::Fnmad
            | Self::Fnmsb
            | Self::Fadda
            | Self::Fdup
            | Self::Fcpy
            | Self::Fexpa
            | Self::Ftssel => esz != B,
            _ => true,
        }
    }

    /// Returns true if the instruction writes guest memory.
    pub fn is_store(self) -> bool {
        matches!(
            self,
            Self::StrZ | Self::StrP | Self::StZprr | Self::StZpri | Self::St1Zprz | Self::St1Zpiz
        )
    }
}

/// Integer comparison condition used by the compare-to-predicate family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cond {
    #[default]
    Eq,
    Ne,
    Ge,
    Gt,
    Lt,
    Le,
    /// Unsigned higher or same.
    Hs,
    /// Unsigned higher.
    Hi,
    /// Unsigned lower.
    Lo,
    /// Unsigned lower or same.
    Ls,
}

impl Cond {
    /// Mnemonic suffix (`eq`, `hs`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Ge => "ge",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Hs => "hs",
            Self::Hi => "hi",
            Self::Lo => "lo",
            Self::Ls => "ls",
        }
    }

    /// Returns true for the unsigned conditions.
    pub const fn is_unsigned(self) -> bool {
        matches!(self, Self::Hs | Self::Hi | Self::Lo | Self::Ls)
    }
}

/// Decoded argument record.
///
/// Created once per instruction and consumed by translation. Fields that an
/// instruction form does not use keep their default value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Args {
    pub rd: u8,
    pub rn: u8,
    pub rm: u8,
    pub ra: u8,
    pub pg: u8,
    /// Element size of the operation.
    pub esz: ElementSize,
    /// Source element size for widening/narrowing forms (unpack, convert).
    pub src_esz: ElementSize,
    /// Primary immediate (already expanded).
    pub imm: i64,
    /// Secondary immediate (INDEX start, etc.).
    pub imm2: i64,
    /// Predicate constraint pattern.
    pub pattern: u8,
    /// Memory data type (`dtype` field) for loads.
    pub dtype: u8,
    /// log2 of the memory access size.
    pub msz: u8,
    /// Number of registers in a structured access, minus one.
    pub nreg: u8,
    /// Offset kind for gathers/scatters and ADR: 0 = uxtw, 1 = sxtw, 2 = 64-bit.
    pub xs: u8,
    /// Offsets are scaled by the memory access size.
    pub scale: bool,
    /// Compare condition.
    pub cond: Cond,
    pub set_flags: bool,
    pub unsigned: bool,
    /// Selects the high half (ZIP2, UZP2, TRN2, PUNPKHI, UNPKHI).
    pub high: bool,
    pub decrement: bool,
    /// Merging rather than zeroing predication.
    pub merge: bool,
    /// Inclusive bound (WHILELE/WHILELS).
    pub eq: bool,
    /// 64-bit scalar operands.
    pub sf: bool,
    pub ne: bool,
    /// Select the element after the last active one (LASTA/CLASTA, BRKA).
    pub after: bool,
    /// First-faulting gather.
    pub first_fault: bool,
}

/// A decoded SVE instruction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// Address the word was fetched from.
    pub address: u64,
    /// Raw instruction word.
    pub word: u32,
    /// Decoded form.
    pub opcode: Opcode,
    /// Decoded fields.
    pub args: Args,
    /// Assembly mnemonic (e.g., "add", "ld1w", "whilelo").
    pub mnemonic: String,
    /// Operands, destination first.
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// SVE instructions are always 4 bytes.
    pub const SIZE: usize = 4;

    /// Creates a new instruction without operands.
    pub fn new(
        address: u64,
        word: u32,
        opcode: Opcode,
        args: Args,
        mnemonic: impl Into<String>,
    ) -> Self {
        Self {
            address,
            word,
            opcode,
            args,
            mnemonic: mnemonic.into(),
            operands: Vec::new(),
        }
    }

    /// Adds an operand.
    pub fn with_operand(mut self, op: Operand) -> Self {
        self.operands.push(op);
        self
    }

    /// Sets operands.
    pub fn with_operands(mut self, ops: Vec<Operand>) -> Self {
        self.operands = ops;
        self
    }

    /// Returns the address of the following instruction.
    pub fn end_address(&self) -> u64 {
        self.address.wrapping_add(Self::SIZE as u64)
    }

    /// Returns the raw bytes of the instruction.
    pub fn bytes(&self) -> [u8; 4] {
        self.word.to_le_bytes()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        for (i, op) in self.operands.iter().enumerate() {
            if i == 0 {
                write!(f, " {}", op)?;
            } else {
                write!(f, ", {}", op)?;
            }
        }
        Ok(())
    }
}
