//! SVE register identifiers and element sizes.

use std::fmt;

/// Number of scalable vector registers (Z0-Z31).
pub const NUM_ZREGS: usize = 32;

/// Number of architectural predicate registers (P0-P15).
pub const NUM_PREGS: usize = 16;

/// Predicate index reserved for the first-fault register.
pub const FFR_INDEX: u8 = 16;

/// Per-size masks selecting the predicate bits that govern a lane.
///
/// At element size `esz` only every `1 << esz`-th predicate bit is
/// meaningful; consumers must ignore the rest.
pub const PRED_ESZ_MASKS: [u64; 4] = [
    0xffff_ffff_ffff_ffff,
    0x5555_5555_5555_5555,
    0x1111_1111_1111_1111,
    0x0101_0101_0101_0101,
];

/// Element (lane) size of a vector operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ElementSize {
    /// 8-bit lanes.
    #[default]
    B = 0,
    /// 16-bit lanes.
    H = 1,
    /// 32-bit lanes.
    S = 2,
    /// 64-bit lanes.
    D = 3,
}

impl ElementSize {
    /// All element sizes, smallest first.
    pub const ALL: [Self; 4] = [Self::B, Self::H, Self::S, Self::D];

    /// Decodes a 2-bit size field.
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::B,
            1 => Self::H,
            2 => Self::S,
            _ => Self::D,
        }
    }

    /// Converts a log2 byte size, returning `None` for values outside 0..=3
    /// (including the `-1` produced by an unallocated tsz field).
    pub fn from_log2(log2: i32) -> Option<Self> {
        match log2 {
            0 => Some(Self::B),
            1 => Some(Self::H),
            2 => Some(Self::S),
            3 => Some(Self::D),
            _ => None,
        }
    }

    /// log2 of the lane size in bytes.
    pub const fn log2(self) -> u32 {
        self as u32
    }

    /// Lane size in bytes.
    pub const fn bytes(self) -> usize {
        1 << (self as usize)
    }

    /// Lane size in bits.
    pub const fn bits(self) -> u32 {
        8 << (self as u32)
    }

    /// Mask of the value bits of one lane.
    pub const fn value_mask(self) -> u64 {
        u64::MAX >> (64 - self.bits())
    }

    /// Mask of the governing predicate bits for this size.
    pub const fn pred_mask(self) -> u64 {
        PRED_ESZ_MASKS[self as usize]
    }

    /// Arrangement suffix used in assembly syntax.
    pub const fn suffix(self) -> char {
        match self {
            Self::B => 'b',
            Self::H => 'h',
            Self::S => 's',
            Self::D => 'd',
        }
    }

    /// Size letter used inside mnemonics such as `cntw` or `ld1w`.
    pub const fn mnemonic_suffix(self) -> char {
        match self {
            Self::B => 'b',
            Self::H => 'h',
            Self::S => 'w',
            Self::D => 'd',
        }
    }

    /// The next larger element size, if any.
    pub fn wider(self) -> Option<Self> {
        Self::from_log2(self as i32 + 1)
    }
}

impl fmt::Display for ElementSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Returns the name of a vector register.
pub fn zreg_name(reg: u8) -> String {
    format!("z{}", reg)
}

/// Returns the name of a predicate register, including the first-fault register.
pub fn preg_name(reg: u8) -> String {
    if reg == FFR_INDEX {
        "ffr".to_string()
    } else {
        format!("p{}", reg)
    }
}

/// Returns the name of a 64-bit general register.
///
/// Register 31 is the stack pointer when `sp` is set and the zero register
/// otherwise.
pub fn xreg_name(reg: u8, sp: bool) -> String {
    match (reg, sp) {
        (31, true) => "sp".to_string(),
        (31, false) => "xzr".to_string(),
        _ => format!("x{}", reg),
    }
}

/// Returns the name of a 32-bit general register.
pub fn wreg_name(reg: u8, sp: bool) -> String {
    match (reg, sp) {
        (31, true) => "wsp".to_string(),
        (31, false) => "wzr".to_string(),
        _ => format!("w{}", reg),
    }
}

/// Returns the name of a SIMD&FP scalar register viewed at an element size.
pub fn vscalar_name(reg: u8, esz: ElementSize) -> String {
    format!("{}{}", esz.suffix(), reg)
}
