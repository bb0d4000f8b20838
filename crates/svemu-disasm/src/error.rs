//! Decoding error types.

use thiserror::Error;

/// Error type for instruction decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The word lies in the SVE encoding space but names no allocated
    /// instruction (or an absent element-size form). Surfaces to the guest
    /// as an undefined instruction.
    #[error("unallocated encoding at {address:#x}: {word:#010x}")]
    Unallocated { address: u64, word: u32 },

    /// Instruction was truncated (not enough bytes).
    #[error("truncated instruction at {address:#x}: need {needed} bytes, have {available}")]
    Truncated {
        address: u64,
        needed: usize,
        available: usize,
    },

    /// The word is outside the SVE encoding space or uses a feature the
    /// decoder does not model.
    #[error("unsupported instruction at {address:#x} ({word:#010x}): {reason}")]
    Unsupported {
        address: u64,
        word: u32,
        reason: String,
    },
}

impl DecodeError {
    /// Creates a new Unallocated error.
    pub fn unallocated(address: u64, word: u32) -> Self {
        Self::Unallocated { address, word }
    }

    /// Creates a new Truncated error.
    pub fn truncated(address: u64, needed: usize, available: usize) -> Self {
        Self::Truncated {
            address,
            needed,
            available,
        }
    }

    /// Creates a new Unsupported error.
    pub fn unsupported(address: u64, word: u32, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            address,
            word,
            reason: reason.into(),
        }
    }

    /// Returns true if this error should be reported to the guest as an
    /// undefined instruction.
    pub fn is_unallocated(&self) -> bool {
        matches!(self, Self::Unallocated { .. })
    }

    /// Address of the offending instruction.
    pub fn address(&self) -> u64 {
        match self {
            Self::Unallocated { address, .. }
            | Self::Truncated { address, .. }
            | Self::Unsupported { address, .. } => *address,
        }
    }
}
