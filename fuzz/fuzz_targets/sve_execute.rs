#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use svemu_emulate::{Emulator, EmulatorConfig, Gpr};

/// Straight-line SVE code with an initial scalar state
#[derive(Debug, Arbitrary)]
struct FuzzedRun {
    vl_granules: u8,
    x: [u64; 4],
    sp: u64,
    words: Vec<u32>,
    mapped_pages: u8,
}

fuzz_target!(|run: FuzzedRun| {
    let config = EmulatorConfig {
        vector_length: 16 * (1 + run.vl_granules as usize % 16),
        max_instructions: 64,
        record_trace: true,
        ..Default::default()
    };
    let Ok(mut emu) = Emulator::new(config) else {
        return;
    };

    // Point the address registers into a small mapped window
    emu.memory_mut().map_region(0x10000, 0x1000 * (1 + run.mapped_pages as u64 % 8));
    for (i, &v) in run.x.iter().enumerate() {
        emu.regs_mut().set_gpr(Gpr::X(i as u8), 0x10000 + (v & 0x7fff));
    }
    emu.regs_mut().set_gpr(Gpr::Sp, run.sp);

    // Memory faults are guest-visible errors, not crashes
    if let Ok(result) = emu.run_words(0x1000, &run.words) {
        let trace = emu.trace().unwrap();
        assert_eq!(trace.len(), result.instruction_count);
    }
});
