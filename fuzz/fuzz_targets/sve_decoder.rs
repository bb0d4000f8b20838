#![no_main]

use libfuzzer_sys::fuzz_target;
use svemu_core::VectorLength;
use svemu_disasm::{Disassembler, SveDecoder};
use svemu_emulate::translate;

fuzz_target!(|data: &[u8]| {
    // SVE instructions are fixed 32-bit
    if data.len() < 4 {
        return;
    }

    let decoder = SveDecoder::new();
    let vl = VectorLength::from_bytes(16 * (1 + data[0] as usize % 16)).unwrap();

    let mut offset = 0;
    let mut count = 0;
    while offset + 4 <= data.len() && count < 100 {
        if let Ok(decoded) = decoder.decode_instruction(&data[offset..], 0x1000 + offset as u64) {
            assert_eq!(decoded.size, 4);
            // Every rejection at translation is an unallocated encoding
            if let Err(e) = translate(&decoded.instruction, vl) {
                assert!(e.is_unallocated());
            }
        }
        offset += 4;
        count += 1;
    }
});
