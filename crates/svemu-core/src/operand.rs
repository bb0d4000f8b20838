//! Instruction operand types used for disassembly and tracing.

use crate::register::{preg_name, vscalar_name, wreg_name, xreg_name, zreg_name, ElementSize};
use std::fmt;

/// How a governing predicate treats inactive destination lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PredQualifier {
    /// Plain predicate operand (no qualifier).
    None,
    /// Merging (`/m`): inactive lanes keep their value.
    Merging,
    /// Zeroing (`/z`): inactive lanes become zero.
    Zeroing,
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// Vector register, optionally with an arrangement.
    ZReg { reg: u8, esz: Option<ElementSize> },
    /// Consecutive vector register list used by structured loads/stores.
    ZList { first: u8, count: u8, esz: ElementSize },
    /// Vector register element selected by index.
    ZElem { reg: u8, esz: ElementSize, index: u32 },
    /// Predicate register.
    PReg {
        reg: u8,
        esz: Option<ElementSize>,
        qualifier: PredQualifier,
    },
    /// 64-bit general register; `sp` selects SP instead of XZR for index 31.
    XReg { reg: u8, sp: bool },
    /// 32-bit general register.
    WReg { reg: u8, sp: bool },
    /// SIMD&FP scalar register (b/h/s/d view).
    VScalar { reg: u8, esz: ElementSize },
    /// Signed immediate.
    Imm(i64),
    /// Unsigned immediate printed in hex.
    Hex(u64),
    /// Floating-point immediate.
    FImm(f64),
    /// Predicate constraint pattern.
    Pattern(u8),
    /// `mul #n` multiplier.
    Mul(u8),
    /// `lsl #n` shift.
    Lsl(u8),
    /// Prefetch operation (`pldl1keep`, ...).
    PrfOp(u8),
    /// Memory reference.
    Memory(MemoryRef),
}

impl Operand {
    /// Creates a sized vector register operand.
    pub fn z(reg: u8, esz: ElementSize) -> Self {
        Self::ZReg {
            reg,
            esz: Some(esz),
        }
    }

    /// Creates a predicate operand without an arrangement.
    pub fn p(reg: u8, qualifier: PredQualifier) -> Self {
        Self::PReg {
            reg,
            esz: None,
            qualifier,
        }
    }

    /// Creates a sized predicate operand.
    pub fn p_sized(reg: u8, esz: ElementSize) -> Self {
        Self::PReg {
            reg,
            esz: Some(esz),
            qualifier: PredQualifier::None,
        }
    }

    /// Creates a general register operand sized by `sf`.
    pub fn gpr(reg: u8, sf: bool, sp: bool) -> Self {
        if sf {
            Self::XReg { reg, sp }
        } else {
            Self::WReg { reg, sp }
        }
    }

    /// Returns true if this is a register operand of any kind.
    pub fn is_register(&self) -> bool {
        matches!(
            self,
            Self::ZReg { .. }
                | Self::ZList { .. }
                | Self::ZElem { .. }
                | Self::PReg { .. }
                | Self::XReg { .. }
                | Self::WReg { .. }
                | Self::VScalar { .. }
        )
    }

    /// Returns true if this is a memory operand.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory(_))
    }
}

/// Returns the assembler name of a predicate constraint pattern.
pub fn pattern_name(pattern: u8) -> String {
    match pattern {
        0x00 => "pow2".to_string(),
        0x01..=0x08 => format!("vl{}", pattern),
        0x09..=0x0d => format!("vl{}", 16u32 << (pattern - 9)),
        0x1d => "mul4".to_string(),
        0x1e => "mul3".to_string(),
        0x1f => "all".to_string(),
        _ => format!("#{}", pattern),
    }
}

/// Returns the assembler name of a prefetch operation.
pub fn prfop_name(op: u8) -> String {
    const LEVELS: [&str; 3] = ["l1", "l2", "l3"];
    let kind = if op & 8 != 0 { "pst" } else { "pld" };
    let level = ((op >> 1) & 3) as usize;
    let policy = if op & 1 != 0 { "strm" } else { "keep" };
    match LEVELS.get(level) {
        Some(level) if op < 16 => format!("{}{}{}", kind, level, policy),
        _ => format!("#{}", op),
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZReg { reg, esz: Some(esz) } => write!(f, "{}.{}", zreg_name(*reg), esz),
            Self::ZReg { reg, esz: None } => write!(f, "{}", zreg_name(*reg)),
            Self::ZList { first, count, esz } => {
                write!(f, "{{")?;
                for i in 0..*count {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}.{}", zreg_name((first + i) % 32), esz)?;
                }
                write!(f, "}}")
            }
            Self::ZElem { reg, esz, index } => {
                write!(f, "{}.{}[{}]", zreg_name(*reg), esz, index)
            }
            Self::PReg {
                reg,
                esz,
                qualifier,
            } => {
                write!(f, "{}", preg_name(*reg))?;
                if let Some(esz) = esz {
                    write!(f, ".{}", esz)?;
                }
                match qualifier {
                    PredQualifier::None => Ok(()),
                    PredQualifier::Merging => write!(f, "/m"),
                    PredQualifier::Zeroing => write!(f, "/z"),
                }
            }
            Self::XReg { reg, sp } => write!(f, "{}", xreg_name(*reg, *sp)),
            Self::WReg { reg, sp } => write!(f, "{}", wreg_name(*reg, *sp)),
            Self::VScalar { reg, esz } => write!(f, "{}", vscalar_name(*reg, *esz)),
            Self::Imm(value) => write!(f, "#{}", value),
            Self::Hex(value) => write!(f, "#{:#x}", value),
            Self::FImm(value) => {
                if value.fract() == 0.0 {
                    write!(f, "#{:.1}", value)
                } else {
                    write!(f, "#{}", value)
                }
            }
            Self::Pattern(pattern) => write!(f, "{}", pattern_name(*pattern)),
            Self::Mul(value) => write!(f, "mul #{}", value),
            Self::Lsl(value) => write!(f, "lsl #{}", value),
            Self::PrfOp(op) => write!(f, "{}", prfop_name(*op)),
            Self::Memory(mem) => write!(f, "{}", mem),
        }
    }
}

/// Base of a memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemBase {
    /// 64-bit general register or SP.
    Scalar(u8),
    /// Vector of per-lane base addresses.
    Vector { reg: u8, esz: ElementSize },
}

/// Extension applied to 32-bit vector offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemExtend {
    /// 64-bit offsets, no extension.
    None,
    /// Zero-extended 32-bit offsets.
    Uxtw,
    /// Sign-extended 32-bit offsets.
    Sxtw,
}

/// Index part of a memory reference.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemIndex {
    /// No offset.
    None,
    /// Immediate offset, optionally scaled by the vector length (`mul vl`).
    Imm { value: i64, mul_vl: bool },
    /// General register offset with an optional left shift.
    Scalar { reg: u8, shift: u8 },
    /// Per-lane vector offset.
    Vector {
        reg: u8,
        esz: ElementSize,
        extend: MemExtend,
        shift: u8,
    },
}

/// A memory reference operand.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryRef {
    /// Base register.
    pub base: MemBase,
    /// Offset applied to the base.
    pub index: MemIndex,
}

impl MemoryRef {
    /// Creates a `[base, #imm, mul vl]` reference.
    pub fn scalar_imm(base: u8, value: i64, mul_vl: bool) -> Self {
        Self {
            base: MemBase::Scalar(base),
            index: if value == 0 {
                MemIndex::None
            } else {
                MemIndex::Imm { value, mul_vl }
            },
        }
    }

    /// Creates a `[base, xm, lsl #shift]` reference.
    pub fn scalar_reg(base: u8, reg: u8, shift: u8) -> Self {
        Self {
            base: MemBase::Scalar(base),
            index: MemIndex::Scalar { reg, shift },
        }
    }
}

impl fmt::Display for MemoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        match self.base {
            MemBase::Scalar(reg) => write!(f, "{}", xreg_name(reg, true))?,
            MemBase::Vector { reg, esz } => write!(f, "{}.{}", zreg_name(reg), esz)?,
        }
        match self.index {
            MemIndex::None => {}
            MemIndex::Imm { value, mul_vl } => {
                write!(f, ", #{}", value)?;
                if mul_vl {
                    write!(f, ", mul vl")?;
                }
            }
            MemIndex::Scalar { reg, shift } => {
                write!(f, ", {}", xreg_name(reg, false))?;
                if shift != 0 {
                    write!(f, ", lsl #{}", shift)?;
                }
            }
            MemIndex::Vector {
                reg,
                esz,
                extend,
                shift,
            } => {
                write!(f, ", {}.{}", zreg_name(reg), esz)?;
                match extend {
                    MemExtend::None if shift != 0 => write!(f, ", lsl #{}", shift)?,
                    MemExtend::None => {}
                    MemExtend::Uxtw => write!(f, ", uxtw")?,
                    MemExtend::Sxtw => write!(f, ", sxtw")?,
                }
                if extend != MemExtend::None && shift != 0 {
                    write!(f, " #{}", shift)?;
                }
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_display() {
        assert_eq!(Operand::z(3, ElementSize::S).to_string(), "z3.s");
        assert_eq!(Operand::p(1, PredQualifier::Merging).to_string(), "p1/m");
        assert_eq!(Operand::p_sized(2, ElementSize::B).to_string(), "p2.b");
        assert_eq!(Operand::gpr(31, true, true).to_string(), "sp");
        assert_eq!(
            Operand::ZList {
                first: 30,
                count: 3,
                esz: ElementSize::H
            }
            .to_string(),
            "{z30.h, z31.h, z0.h}"
        );
    }

    #[test]
    fn test_pattern_names() {
        assert_eq!(pattern_name(0), "pow2");
        assert_eq!(pattern_name(7), "vl7");
        assert_eq!(pattern_name(0x0d), "vl256");
        assert_eq!(pattern_name(0x1f), "all");
        assert_eq!(pattern_name(0x14), "#20");
    }

    #[test]
    fn test_prfop_names() {
        assert_eq!(prfop_name(0), "pldl1keep");
        assert_eq!(prfop_name(3), "pldl2strm");
        assert_eq!(prfop_name(13), "pstl3strm");
        assert_eq!(prfop_name(6), "#6");
        assert_eq!(prfop_name(15), "#15");
    }

    #[test]
    fn test_memory_display() {
        assert_eq!(MemoryRef::scalar_imm(0, 0, true).to_string(), "[x0]");
        assert_eq!(MemoryRef::scalar_imm(31, -2, true).to_string(), "[sp, #-2, mul vl]");
        assert_eq!(MemoryRef::scalar_reg(1, 2, 3).to_string(), "[x1, x2, lsl #3]");
        let gather = MemoryRef {
            base: MemBase::Scalar(0),
            index: MemIndex::Vector {
                reg: 1,
                esz: ElementSize::S,
                extend: MemExtend::Sxtw,
                shift: 2,
            },
        };
        assert_eq!(gather.to_string(), "[x0, z1.s, sxtw #2]");
    }
}
