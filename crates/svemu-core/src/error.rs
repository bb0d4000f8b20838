//! Error types for svemu-core.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Vector length is not a multiple of 128 bits or exceeds the maximum.
    #[error("invalid vector length: {0} bytes (must be a multiple of 16, at most 256)")]
    InvalidVectorLength(usize),

    /// Register index outside the architectural register set.
    #[error("invalid {class} register index {index}")]
    InvalidRegister { class: &'static str, index: u8 },
}
