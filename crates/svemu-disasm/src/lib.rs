//! # svemu-disasm
//!
//! Field decoder and immediate expanders for ARM SVE instruction words.
//!
//! The decoder maps a 32-bit little-endian instruction word to an
//! [`Instruction`](svemu_core::Instruction): a typed opcode, the decoded
//! argument record, and a mnemonic/operand list for tracing. Words inside
//! the SVE encoding space that name no instruction, including element-size
//! forms the architecture leaves unallocated (`sdiv z0.b`, `sxtw z0.s`,
//! `saddv d0, p0, z0.d`), are reported as [`DecodeError::Unallocated`].
//!
//! # Example
//!
//! ```
//! use svemu_disasm::SveDecoder;
//!
//! let insn = SveDecoder::new().decode(0x2518_e3e0, 0x1000).unwrap();
//! assert_eq!(insn.to_string(), "ptrue p0.b");
//! ```

pub mod dtype;
pub mod error;
pub mod fields;
pub mod immediates;
pub mod sve;
pub mod traits;

pub use error::DecodeError;
pub use sve::SveDecoder;
pub use traits::{DecodedInstruction, Disassembler};
