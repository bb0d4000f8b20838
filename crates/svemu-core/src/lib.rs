//! # svemu-core
//!
//! Core abstractions shared by the svemu decoder and emulator. This crate
//! defines the architecture-level types for the ARM Scalable Vector
//! Extension: element sizes, the configured vector length, register
//! naming, decoded instruction forms and their operands.

pub mod arch;
pub mod error;
pub mod instruction;
pub mod operand;
pub mod register;

pub use arch::VectorLength;
pub use error::Error;
pub use instruction::{Args, Cond, Instruction, Opcode};
pub use operand::{pattern_name, prfop_name, MemBase, MemExtend, MemIndex, MemoryRef, Operand, PredQualifier};
pub use register::{ElementSize, FFR_INDEX, NUM_PREGS, NUM_ZREGS};
