//! SVE instruction decoder.
//!
//! SVE instructions are identified by bits [31:24]:
//! - 0x04, 0x05: integer data processing and permutes
//! - 0x24, 0x25: compares and predicate operations
//! - 0x65: floating point
//! - 0x84, 0x85, 0xA4, 0xA5, 0xC4, 0xC5, 0xE4, 0xE5: loads and stores
//!
//! Each group decoder returns `None` for words inside its encoding space
//! that name no allocated instruction. Group decoders read the size field
//! structurally; the top-level decoder then rejects size forms the
//! architecture leaves unallocated ([`Opcode::allows_size`]). Both cases
//! become [`DecodeError::Unallocated`].

mod fp;
mod int;
mod mem;
mod perm;
mod pred;

use crate::{DecodeError, DecodedInstruction, Disassembler};
use svemu_core::{Args, ElementSize, Instruction, Opcode, Operand, PredQualifier};

/// A decoded form before it is bound to an address.
pub(crate) struct Form {
    opcode: Opcode,
    mnemonic: String,
    args: Args,
    operands: Vec<Operand>,
}

impl Form {
    pub(crate) fn new(opcode: Opcode, mnemonic: impl Into<String>, args: Args) -> Self {
        Self {
            opcode,
            mnemonic: mnemonic.into(),
            args,
            operands: Vec::new(),
        }
    }

    pub(crate) fn ops(mut self, operands: Vec<Operand>) -> Self {
        self.operands = operands;
        self
    }

    fn into_instruction(self, address: u64, word: u32) -> Instruction {
        Instruction::new(address, word, self.opcode, self.args, self.mnemonic)
            .with_operands(self.operands)
    }
}

// ==== Operand shorthands ====

pub(crate) fn z(reg: u8, esz: ElementSize) -> Operand {
    Operand::z(reg, esz)
}

pub(crate) fn p(reg: u8) -> Operand {
    Operand::p(reg, PredQualifier::None)
}

pub(crate) fn pm(reg: u8) -> Operand {
    Operand::p(reg, PredQualifier::Merging)
}

pub(crate) fn pz(reg: u8) -> Operand {
    Operand::p(reg, PredQualifier::Zeroing)
}

pub(crate) fn ps(reg: u8, esz: ElementSize) -> Operand {
    Operand::p_sized(reg, esz)
}

pub(crate) fn x(reg: u8) -> Operand {
    Operand::XReg { reg, sp: false }
}

pub(crate) fn xsp(reg: u8) -> Operand {
    Operand::XReg { reg, sp: true }
}

pub(crate) fn w(reg: u8) -> Operand {
    Operand::WReg { reg, sp: false }
}

pub(crate) fn v(reg: u8, esz: ElementSize) -> Operand {
    Operand::VScalar { reg, esz }
}

pub(crate) fn esz(word: u32) -> ElementSize {
    ElementSize::from_bits(crate::fields::size(word))
}

/// SVE instruction decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SveDecoder;

impl SveDecoder {
    /// Creates a new SVE decoder.
    pub fn new() -> Self {
        Self
    }

    /// Returns true if `word` lies in one of the SVE major opcode groups.
    pub fn is_sve_instruction(word: u32) -> bool {
        matches!(
            word >> 24,
            0x04 | 0x05 | 0x24 | 0x25 | 0x65 | 0x84 | 0x85 | 0xa4 | 0xa5 | 0xc4 | 0xc5 | 0xe4 | 0xe5
        )
    }

    /// Decodes one instruction word fetched from `address`.
    pub fn decode(&self, word: u32, address: u64) -> Result<Instruction, DecodeError> {
        let form = match word >> 24 {
            0x04 => int::decode(word),
            0x05 => perm::decode(word),
            0x24 | 0x25 => pred::decode(word),
            0x65 => fp::decode(word),
            0x84 | 0x85 | 0xa4 | 0xa5 | 0xc4 | 0xc5 | 0xe4 | 0xe5 => mem::decode(word),
            _ => {
                return Err(DecodeError::unsupported(
                    address,
                    word,
                    "not in the SVE encoding space",
                ))
            }
        };

        match form {
            Some(form) if form.opcode.allows_size(form.args.esz) => {
                let insn = form.into_instruction(address, word);
                log::trace!("{:#x}: {:08x} {}", address, word, insn);
                Ok(insn)
            }
            _ => Err(DecodeError::unallocated(address, word)),
        }
    }
}

impl Disassembler for SveDecoder {
    fn decode_instruction(&self, bytes: &[u8], address: u64) -> Result<DecodedInstruction, DecodeError> {
        if bytes.len() < 4 {
            return Err(DecodeError::truncated(address, 4, bytes.len()));
        }
        let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let instruction = self.decode(word, address)?;
        Ok(DecodedInstruction {
            instruction,
            size: 4,
        })
    }
}
