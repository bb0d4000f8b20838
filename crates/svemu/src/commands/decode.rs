//! Disassembly of raw instruction words.

use anyhow::{Context, Result};
use svemu_core::VectorLength;
use svemu_disasm::{Disassembler, SveDecoder};
use svemu_emulate::translate;

/// Print one line per word; with `ops_vl` set, follow each instruction with
/// the primitive operations it lowers to at that vector length.
pub fn decode(words: &[u32], address: u64, ops_vl: Option<usize>) -> Result<()> {
    let vl = ops_vl
        .map(VectorLength::from_bytes)
        .transpose()
        .context("Invalid vector length")?;
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();

    let decoder = SveDecoder::new();
    for (result, &word) in decoder.disassemble_block(&bytes, address).into_iter().zip(words) {
        match result {
            Ok(insn) => {
                println!("{:#010x}:  {:08x}  {}", insn.address, word, insn);
                if let Some(vl) = vl {
                    match translate(&insn, vl) {
                        Ok(seq) => {
                            for op in &seq {
                                println!("              {:?}", op);
                            }
                        }
                        Err(e) => println!("              <{}>", e),
                    }
                }
            }
            Err(e) => println!("{:#010x}:  {:08x}  <{}>", e.address(), word, e),
        }
    }
    Ok(())
}
