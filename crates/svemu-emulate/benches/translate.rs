//! Benchmarks for translation and execution of decoded SVE instructions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use svemu_core::{Instruction, VectorLength};
use svemu_disasm::SveDecoder;
use svemu_emulate::{execute, translate, Emulator, EmulatorConfig, RegisterFile, SparseMemory};

/// Loop body of a strip-mined vector add, without the memory accesses.
const SVE_LOOP: &[u32] = &[
    0x2518_e3e0, // ptrue p0.b
    0x25a1_1c00, // whilelo p0.s, x0, x1
    0x0480_0440, // add z0.s, p1/m, z0.s, z2.s
    0x6582_0020, // fadd z0.s, z1.s, z2.s
    0x0494_0000, // sdiv z0.s, p0/m, z0.s, z0.s
    0x04e0_e3e0, // cntd x0
    0x2550_c020, // ptest p0, p1.b
];

fn decoded() -> Vec<Instruction> {
    let decoder = SveDecoder::new();
    SVE_LOOP
        .iter()
        .enumerate()
        .filter_map(|(i, &w)| decoder.decode(w, 0x1000 + 4 * i as u64).ok())
        .collect()
}

fn bench_translate(c: &mut Criterion) {
    let insns = decoded();
    let mut group = c.benchmark_group("sve_translate");

    for bytes in [16, 64, 256] {
        let vl = VectorLength::from_bytes(bytes).unwrap();
        group.bench_with_input(BenchmarkId::new("vector_loop", vl.bits()), &vl, |b, &vl| {
            b.iter(|| {
                for insn in &insns {
                    let _ = translate(black_box(insn), vl);
                }
            })
        });
    }

    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let insns = decoded();
    let mut group = c.benchmark_group("sve_execute");

    for bytes in [16, 64, 256] {
        let vl = VectorLength::from_bytes(bytes).unwrap();
        let seqs: Vec<_> = insns.iter().filter_map(|i| translate(i, vl).ok()).collect();
        group.bench_with_input(BenchmarkId::new("vector_loop", vl.bits()), &seqs, |b, seqs| {
            let mut regs = RegisterFile::new(vl);
            let mut mem = SparseMemory::new();
            b.iter(|| {
                for seq in seqs {
                    let _ = execute(black_box(seq), &mut regs, &mut mem);
                }
            })
        });
    }

    group.bench_function("emulator_run_words", |b| {
        b.iter(|| {
            let mut emu = Emulator::new(EmulatorConfig::default()).unwrap();
            emu.run_words(0x1000, black_box(SVE_LOOP)).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_translate, bench_execute);
criterion_main!(benches);
