//! Register file arena.
//!
//! All scalable state lives in one byte arena: the 32 Z registers (VL bytes
//! each) followed by the 16 P registers, the first-fault register and one
//! scratch predicate. Every predicate slot is padded to a whole number of
//! 64-bit words and the padding is kept zero, so predicate helpers can
//! work a word at a time. Primitive operations address registers by their
//! byte offset in the arena.

use crate::flags::Flags;
use crate::EmulationResult;
use serde::{Deserialize, Serialize};
use svemu_core::{ElementSize, Error, VectorLength, FFR_INDEX, NUM_PREGS, NUM_ZREGS};

/// Byte offset of a register in the arena.
pub type Offset = usize;

/// A general-purpose register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gpr {
    /// X0-X30; X31 reads as zero and ignores writes.
    X(u8),
    /// The stack pointer.
    Sp,
}

impl Gpr {
    /// Register 31 as the zero register.
    pub fn zr(reg: u8) -> Self {
        Self::X(reg & 31)
    }

    /// Register 31 as the stack pointer.
    pub fn sp_or(reg: u8) -> Self {
        if reg & 31 == 31 {
            Self::Sp
        } else {
            Self::X(reg & 31)
        }
    }
}

impl std::fmt::Display for Gpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X(31) => write!(f, "xzr"),
            Self::X(r) => write!(f, "x{}", r),
            Self::Sp => write!(f, "sp"),
        }
    }
}

/// Arena layout for one vector length.
///
/// Translation resolves register operands to offsets through a layout
/// without needing a register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    vl: VectorLength,
    /// Bytes per predicate slot, rounded up to whole words.
    pred_stride: usize,
}

impl Layout {
    /// Number of predicate slots in the arena.
    const PRED_SLOTS: usize = NUM_PREGS + 2;

    pub fn new(vl: VectorLength) -> Self {
        Self {
            vl,
            pred_stride: vl.pred_words() * 8,
        }
    }

    pub fn vector_length(&self) -> VectorLength {
        self.vl
    }

    /// Bytes per predicate slot including padding.
    pub fn pred_stride(&self) -> usize {
        self.pred_stride
    }

    /// Total arena size in bytes.
    pub fn size(&self) -> usize {
        NUM_ZREGS * self.vl.bytes() + Self::PRED_SLOTS * self.pred_stride
    }

    /// Arena offset of Z register `reg`.
    pub fn zreg(&self, reg: u8) -> Offset {
        (reg as usize % NUM_ZREGS) * self.vl.bytes()
    }

    /// Arena offset of predicate slot `reg` (16 is FFR, 17 the scratch
    /// predicate).
    pub fn preg(&self, reg: u8) -> Offset {
        NUM_ZREGS * self.vl.bytes() + (reg as usize % Self::PRED_SLOTS) * self.pred_stride
    }

    /// Arena offset of the first-fault register.
    pub fn ffr(&self) -> Offset {
        self.preg(FFR_INDEX)
    }
}

/// The SVE register file for one virtual CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    layout: Layout,
    vl: VectorLength,
    data: Vec<u8>,
    x: [u64; 31],
    sp: u64,
    /// Condition flags.
    pub flags: Flags,
}

impl RegisterFile {
    /// Predicate slot of the scratch predicate used to preserve a governing
    /// predicate that an instruction overwrites.
    pub const SCRATCH_PRED: u8 = FFR_INDEX + 1;

    /// Creates a zeroed register file.
    pub fn new(vl: VectorLength) -> Self {
        let layout = Layout::new(vl);
        Self {
            layout,
            vl,
            data: vec![0; layout.size()],
            x: [0; 31],
            sp: 0,
            flags: Flags::default(),
        }
    }

    /// The configured vector length.
    pub fn vector_length(&self) -> VectorLength {
        self.vl
    }

    /// The arena layout.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Bytes per predicate slot including padding.
    pub fn pred_stride(&self) -> usize {
        self.layout.pred_stride()
    }

    // ==================== Offsets ====================

    /// Arena offset of Z register `reg`.
    pub fn zreg_offset(&self, reg: u8) -> Offset {
        self.layout.zreg(reg)
    }

    /// Arena offset of predicate slot `reg` (16 is FFR, 17 the scratch
    /// predicate).
    pub fn preg_offset(&self, reg: u8) -> Offset {
        self.layout.preg(reg)
    }

    /// Arena offset of the first-fault register.
    pub fn ffr_offset(&self) -> Offset {
        self.layout.ffr()
    }

    /// Checked variant of [`zreg_offset`](Self::zreg_offset).
    pub fn try_zreg_offset(&self, reg: u8) -> EmulationResult<Offset> {
        if reg as usize >= NUM_ZREGS {
            return Err(Error::InvalidRegister { class: "vector", index: reg }.into());
        }
        Ok(self.zreg_offset(reg))
    }

    /// Checked variant of [`preg_offset`](Self::preg_offset); accepts the
    /// architectural predicates and FFR.
    pub fn try_preg_offset(&self, reg: u8) -> EmulationResult<Offset> {
        if reg > FFR_INDEX {
            return Err(Error::InvalidRegister { class: "predicate", index: reg }.into());
        }
        Ok(self.preg_offset(reg))
    }

    // ==================== Raw bytes ====================

    /// Bytes of the arena at `offset`.
    pub fn bytes(&self, offset: Offset, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    /// Mutable bytes of the arena at `offset`.
    pub fn bytes_mut(&mut self, offset: Offset, len: usize) -> &mut [u8] {
        &mut self.data[offset..offset + len]
    }

    /// Contents of Z register `reg`.
    pub fn zreg(&self, reg: u8) -> &[u8] {
        self.bytes(self.zreg_offset(reg), self.vl.bytes())
    }

    /// Mutable contents of Z register `reg`.
    pub fn zreg_mut(&mut self, reg: u8) -> &mut [u8] {
        let offset = self.zreg_offset(reg);
        let len = self.vl.bytes();
        self.bytes_mut(offset, len)
    }

    /// Contents of predicate register `reg` (VL / 8 bytes, no padding).
    pub fn preg(&self, reg: u8) -> &[u8] {
        self.bytes(self.preg_offset(reg), self.vl.pred_bytes())
    }

    /// Overwrites predicate register `reg`; bits past the predicate length
    /// are dropped.
    pub fn set_preg(&mut self, reg: u8, bytes: &[u8]) {
        let offset = self.preg_offset(reg);
        let len = self.vl.pred_bytes().min(bytes.len());
        self.data[offset..offset + len].copy_from_slice(&bytes[..len]);
    }

    // ==================== Lanes ====================

    /// Reads lane `index` of size `esz` from the vector at `offset`.
    pub fn elem(&self, offset: Offset, esz: ElementSize, index: usize) -> u64 {
        let n = esz.bytes();
        let start = offset + index * n;
        let mut buf = [0u8; 8];
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        u64::from_le_bytes(buf)
    }

    /// Writes lane `index` of size `esz` in the vector at `offset`.
    pub fn set_elem(&mut self, offset: Offset, esz: ElementSize, index: usize, value: u64) {
        let n = esz.bytes();
        let start = offset + index * n;
        self.data[start..start + n].copy_from_slice(&value.to_le_bytes()[..n]);
    }

    /// Reads all lanes of the vector at `offset`.
    pub fn elems(&self, offset: Offset, esz: ElementSize) -> Vec<u64> {
        (0..self.vl.elements(esz))
            .map(|i| self.elem(offset, esz, i))
            .collect()
    }

    /// Writes all lanes of the vector at `offset`.
    pub fn set_elems(&mut self, offset: Offset, esz: ElementSize, values: &[u64]) {
        for (i, &v) in values.iter().enumerate() {
            self.set_elem(offset, esz, i, v);
        }
    }

    // ==================== Predicates ====================

    /// Mask of the valid bits of predicate word `w`.
    fn pred_word_mask(&self, w: usize) -> u64 {
        let bits = self.vl.pred_bytes() * 8;
        let valid = bits.saturating_sub(w * 64).min(64);
        if valid == 64 {
            u64::MAX
        } else {
            (1u64 << valid) - 1
        }
    }

    /// Reads the predicate at `offset` as 64-bit words.
    pub fn pred_words(&self, offset: Offset) -> Vec<u64> {
        self.data[offset..offset + self.layout.pred_stride()]
            .chunks_exact(8)
            .map(|c| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(c);
                u64::from_le_bytes(buf)
            })
            .collect()
    }

    /// Writes the predicate at `offset` from 64-bit words, keeping the
    /// padding bits zero.
    pub fn set_pred_words(&mut self, offset: Offset, words: &[u64]) {
        for (w, &value) in words.iter().enumerate().take(self.vl.pred_words()) {
            let value = value & self.pred_word_mask(w);
            let start = offset + w * 8;
            self.data[start..start + 8].copy_from_slice(&value.to_le_bytes());
        }
    }

    /// Tests predicate bit `bit` of the predicate at `offset`.
    pub fn pred_bit(&self, offset: Offset, bit: usize) -> bool {
        self.data[offset + bit / 8] & (1 << (bit % 8)) != 0
    }

    /// Returns true if lane `index` of size `esz` is active.
    pub fn lane_active(&self, pg: Offset, esz: ElementSize, index: usize) -> bool {
        self.pred_bit(pg, index << esz.log2())
    }

    /// An all-ones predicate at element size `esz`, as words.
    pub fn ones(&self, esz: ElementSize) -> Vec<u64> {
        (0..self.vl.pred_words())
            .map(|w| esz.pred_mask() & self.pred_word_mask(w))
            .collect()
    }

    // ==================== Scalars ====================

    /// Reads a general register.
    pub fn gpr(&self, reg: Gpr) -> u64 {
        match reg {
            Gpr::X(r) if r < 31 => self.x[r as usize],
            Gpr::X(_) => 0,
            Gpr::Sp => self.sp,
        }
    }

    /// Writes a general register; writes to XZR are discarded.
    pub fn set_gpr(&mut self, reg: Gpr, value: u64) {
        match reg {
            Gpr::X(r) if r < 31 => self.x[r as usize] = value,
            Gpr::X(_) => {}
            Gpr::Sp => self.sp = value,
        }
    }

    /// Reads X register `reg` (31 reads as zero).
    pub fn x(&self, reg: u8) -> u64 {
        self.gpr(Gpr::X(reg))
    }

    /// Writes X register `reg`.
    pub fn set_x(&mut self, reg: u8, value: u64) {
        self.set_gpr(Gpr::X(reg), value);
    }

    /// Reads the stack pointer.
    pub fn sp(&self) -> u64 {
        self.sp
    }

    /// Writes the stack pointer.
    pub fn set_sp(&mut self, value: u64) {
        self.sp = value;
    }

    // ==================== Snapshots ====================

    /// Captures the architectural state.
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            vector_length: self.vl.bytes(),
            z: (0..NUM_ZREGS as u8).map(|r| self.zreg(r).to_vec()).collect(),
            p: (0..NUM_PREGS as u8).map(|r| self.preg(r).to_vec()).collect(),
            ffr: self.preg(FFR_INDEX).to_vec(),
            x: self.x.to_vec(),
            sp: self.sp,
            flags: self.flags,
        }
    }

    /// Hash of the architectural state for quick comparison.
    pub fn state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        let arch_len = self.preg_offset(Self::SCRATCH_PRED);
        self.data[..arch_len].hash(&mut hasher);
        self.x.hash(&mut hasher);
        self.sp.hash(&mut hasher);
        self.flags.hash(&mut hasher);
        hasher.finish()
    }
}

/// Serializable copy of the architectural register state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSnapshot {
    /// Vector length in bytes.
    pub vector_length: usize,
    /// Z0-Z31, little-endian bytes.
    pub z: Vec<Vec<u8>>,
    /// P0-P15, one bit per vector byte.
    pub p: Vec<Vec<u8>>,
    /// First-fault register.
    pub ffr: Vec<u8>,
    /// X0-X30.
    pub x: Vec<u64>,
    /// Stack pointer.
    pub sp: u64,
    /// Condition flags.
    pub flags: Flags,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs(bytes: usize) -> RegisterFile {
        RegisterFile::new(VectorLength::from_bytes(bytes).unwrap())
    }

    #[test]
    fn test_layout() {
        let r = regs(32);
        assert_eq!(r.zreg_offset(1), 32);
        assert_eq!(r.preg_offset(0), 32 * 32);
        assert_eq!(r.pred_stride(), 8);
        assert_eq!(r.ffr_offset(), 32 * 32 + 16 * 8);
        assert!(r.try_preg_offset(16).is_ok());
        assert!(r.try_preg_offset(17).is_err());
        assert!(r.try_zreg_offset(32).is_err());

        let r = regs(256);
        assert_eq!(r.pred_stride(), 32);
    }

    #[test]
    fn test_lanes() {
        let mut r = regs(16);
        let z1 = r.zreg_offset(1);
        r.set_elem(z1, ElementSize::S, 1, 0x1122_3344_5566);
        assert_eq!(r.elem(z1, ElementSize::S, 1), 0x3344_5566);
        assert_eq!(r.elem(z1, ElementSize::B, 4), 0x66);
        assert_eq!(r.elems(z1, ElementSize::D), vec![0x3344_5566_0000_0000, 0]);
    }

    #[test]
    fn test_predicate_padding_stays_zero() {
        let mut r = regs(16);
        let p0 = r.preg_offset(0);
        r.set_pred_words(p0, &[u64::MAX]);
        assert_eq!(r.pred_words(p0), vec![0xffff]);
        assert_eq!(r.preg(0), &[0xff, 0xff]);
        assert!(r.lane_active(p0, ElementSize::D, 1));
        assert_eq!(r.ones(ElementSize::S), vec![0x1111]);
    }

    #[test]
    fn test_gprs() {
        let mut r = regs(16);
        r.set_gpr(Gpr::sp_or(31), 0x8000);
        r.set_gpr(Gpr::zr(31), 5);
        r.set_x(3, 7);
        assert_eq!(r.sp(), 0x8000);
        assert_eq!(r.x(31), 0);
        assert_eq!(r.gpr(Gpr::X(3)), 7);
        assert_eq!(Gpr::sp_or(31).to_string(), "sp");
    }

    #[test]
    fn test_snapshot_and_hash() {
        let mut a = regs(32);
        let b = a.clone();
        assert_eq!(a.state_hash(), b.state_hash());
        a.set_x(0, 1);
        assert_ne!(a.state_hash(), b.state_hash());

        let snap = a.snapshot();
        assert_eq!(snap.z.len(), 32);
        assert_eq!(snap.p[0].len(), 4);
        assert_eq!(snap.x[0], 1);

        // The scratch predicate is not architectural state.
        let mut c = b.clone();
        let tmp = c.preg_offset(RegisterFile::SCRATCH_PRED);
        c.set_pred_words(tmp, &[1]);
        assert_eq!(c.state_hash(), b.state_hash());
    }
}
