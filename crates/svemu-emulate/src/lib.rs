//! # svemu-emulate
//!
//! Translation and execution of ARM SVE instructions.
//!
//! This crate provides:
//! - A register file arena holding the Z, P and FFR registers for a
//!   configured vector length, plus the scalar registers and NZCV flags
//! - The `Op`/`OpSequence` primitive operation IR and the [`Backend`] seam
//! - Element-size dispatch tables and a pure translator from decoded
//!   instructions to primitive operations
//! - An executor that applies primitive operations to a register file and
//!   guest memory, including first-fault and non-fault loads
//! - Execution tracing and a small driver for straight-line SVE code
//!
//! # Example
//!
//! ```
//! use svemu_emulate::{Emulator, EmulatorConfig};
//!
//! let mut emu = Emulator::new(EmulatorConfig::default()).unwrap();
//! // ptrue p0.b ; ands p1.b, p0/z, p0.b, p0.b
//! let result = emu.run_words(0x1000, &[0x2518_e3e0, 0x2540_4001]).unwrap();
//! assert_eq!(result.instruction_count, 2);
//! assert!(emu.regs().flags.n);
//! ```

pub mod dispatch;
pub mod executor;
pub mod flags;
pub mod helpers;
pub mod lanes;
pub mod memory;
pub mod ops;
pub mod pattern;
pub mod regfile;
pub mod trace;
pub mod translate;

pub use executor::{execute, Emulator, EmulatorConfig, ExecutionResult, StopReason};
pub use flags::{pred_test, Flags};
pub use memory::{GuestMemory, SparseMemory};
pub use ops::{Backend, Op, OpSequence};
pub use pattern::decode_pattern;
pub use regfile::{Gpr, Layout, RegisterFile, RegisterSnapshot};
pub use trace::{ExecutionTrace, TraceStep};
pub use translate::translate;

use svemu_disasm::DecodeError;
use thiserror::Error;

/// Errors that can occur during translation or execution.
#[derive(Debug, Error)]
pub enum EmulationError {
    /// The word could not be decoded; unallocated encodings surface to the
    /// guest as undefined instructions.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// An active lane touched unmapped guest memory.
    #[error("memory fault at {address:#x} ({size} bytes)")]
    MemoryFault { address: u64, size: usize },

    /// An operation sequence was translated for a different vector length
    /// than the register file it is applied to.
    #[error("vector length mismatch: translated for {expected} bytes, register file has {actual}")]
    VectorLengthMismatch { expected: usize, actual: usize },

    #[error("Maximum instruction count exceeded: {0}")]
    MaxInstructionsExceeded(usize),

    #[error(transparent)]
    Core(#[from] svemu_core::Error),
}

/// Result type for emulation operations.
pub type EmulationResult<T> = Result<T, EmulationError>;
