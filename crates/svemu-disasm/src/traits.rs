//! Disassembler traits.

use crate::DecodeError;
use svemu_core::Instruction;

/// Result of decoding an instruction.
#[derive(Debug, Clone)]
pub struct DecodedInstruction {
    /// The decoded instruction.
    pub instruction: Instruction,
    /// Number of bytes consumed.
    pub size: usize,
}

/// Trait for instruction decoders.
pub trait Disassembler {
    /// Decode a single instruction starting at the given address.
    ///
    /// # Arguments
    /// * `bytes` - The raw bytes to decode (little-endian)
    /// * `address` - The virtual address of the first byte
    fn decode_instruction(&self, bytes: &[u8], address: u64) -> Result<DecodedInstruction, DecodeError>;

    /// Returns the instruction size in bytes.
    fn instruction_size(&self) -> usize {
        4
    }

    /// Disassemble a block of code into instructions.
    ///
    /// Decoding resumes at the next word after an error, so every aligned
    /// word yields exactly one entry.
    fn disassemble_block(&self, bytes: &[u8], start_address: u64) -> Vec<Result<Instruction, DecodeError>> {
        let size = self.instruction_size();
        let mut instructions = Vec::with_capacity(bytes.len() / size);
        let mut offset = 0;

        while offset < bytes.len() {
            let address = start_address.wrapping_add(offset as u64);
            match self.decode_instruction(&bytes[offset..], address) {
                Ok(decoded) => {
                    offset += decoded.size;
                    instructions.push(Ok(decoded.instruction));
                }
                Err(e) => {
                    offset += size;
                    instructions.push(Err(e));
                }
            }
        }

        instructions
    }
}
