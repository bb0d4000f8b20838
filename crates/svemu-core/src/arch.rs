//! Vector length configuration.

use crate::register::ElementSize;
use crate::Error;

/// Granule that every vector length is a multiple of (128 bits).
pub const VL_GRANULE_BYTES: usize = 16;

/// Largest vector length supported by the architecture (2048 bits).
pub const MAX_VL_BYTES: usize = 256;

/// The runtime-configured SVE vector length.
///
/// Stored in bytes. Predicate registers hold one bit per vector byte, so
/// their size is always `bytes() / 8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct VectorLength(usize);

impl VectorLength {
    /// The minimum vector length (128 bits).
    pub const MIN: Self = Self(VL_GRANULE_BYTES);
    /// The maximum vector length (2048 bits).
    pub const MAX: Self = Self(MAX_VL_BYTES);

    /// Creates a vector length from a size in bytes.
    pub fn from_bytes(bytes: usize) -> Result<Self, Error> {
        if bytes == 0 || bytes % VL_GRANULE_BYTES != 0 || bytes > MAX_VL_BYTES {
            return Err(Error::InvalidVectorLength(bytes));
        }
        Ok(Self(bytes))
    }

    /// Creates a vector length from a size in bits.
    pub fn from_bits(bits: usize) -> Result<Self, Error> {
        if bits % 8 != 0 {
            return Err(Error::InvalidVectorLength(bits / 8));
        }
        Self::from_bytes(bits / 8)
    }

    /// Vector register size in bytes.
    pub const fn bytes(self) -> usize {
        self.0
    }

    /// Vector register size in bits.
    pub const fn bits(self) -> usize {
        self.0 * 8
    }

    /// Predicate register size in bytes.
    pub const fn pred_bytes(self) -> usize {
        self.0 / 8
    }

    /// Number of 64-bit words needed to hold a predicate register.
    pub const fn pred_words(self) -> usize {
        (self.pred_bytes() + 7) / 8
    }

    /// Number of lanes of the given element size.
    pub const fn elements(self, esz: ElementSize) -> usize {
        self.0 >> esz.log2()
    }
}

impl Default for VectorLength {
    fn default() -> Self {
        Self(32)
    }
}

impl TryFrom<usize> for VectorLength {
    type Error = Error;

    fn try_from(bytes: usize) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl From<VectorLength> for usize {
    fn from(vl: VectorLength) -> usize {
        vl.bytes()
    }
}

impl std::fmt::Display for VectorLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bits", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_lengths() {
        for bytes in (16..=256).step_by(16) {
            let vl = VectorLength::from_bytes(bytes).unwrap();
            assert_eq!(vl.bytes(), bytes);
            assert_eq!(vl.pred_bytes(), bytes / 8);
        }
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(VectorLength::from_bytes(0).is_err());
        assert!(VectorLength::from_bytes(24).is_err());
        assert!(VectorLength::from_bytes(272).is_err());
        assert!(VectorLength::from_bits(100).is_err());
    }

    #[test]
    fn test_elements_and_words() {
        let vl = VectorLength::from_bits(512).unwrap();
        assert_eq!(vl.elements(ElementSize::B), 64);
        assert_eq!(vl.elements(ElementSize::D), 8);
        assert_eq!(vl.pred_words(), 1);
        let vl = VectorLength::from_bits(2048).unwrap();
        assert_eq!(vl.pred_words(), 4);
        assert_eq!(VectorLength::from_bits(384).unwrap().pred_words(), 1);
    }
}
