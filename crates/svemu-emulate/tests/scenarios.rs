//! End-to-end scenarios: decoded words run through the emulator, and
//! hand-built operation sequences run through the executor.

use svemu_core::{ElementSize, VectorLength};
use svemu_emulate::ops::{Address, ElemDst, LoadMode, PermuteKind};
use svemu_emulate::{
    execute, Backend, EmulationError, Emulator, EmulatorConfig, Gpr, Op, OpSequence, RegisterFile,
    SparseMemory, StopReason,
};

use ElementSize::{B, D, S};

// ptrue p0.b
const PTRUE_P0_B: u32 = 0x2518_e3e0;
// ptrue p0.b, pow2
const PTRUE_P0_B_POW2: u32 = 0x2518_e000;
// ands p1.b, p0/z, p0.b, p0.b
const ANDS_P1: u32 = 0x2540_4001;
// sdiv z0.s, p0/m, z0.s, z0.s
const SDIV_Z0: u32 = 0x0494_0000;
// setffr
const SETFFR: u32 = 0x252c_9000;
// ldff1b {z0.b}, p0/z, [x1]
const LDFF1B_XZR: u32 = 0xa41f_6020;
// fexpa z0.s, z1.s
const FEXPA_Z0_S: u32 = 0x04a0_b820;
// ftssel z0.d, z1.d, z2.d
const FTSSEL_Z0_D: u32 = 0x04e2_b020;

fn emulator(vector_length: usize) -> Emulator {
    Emulator::new(EmulatorConfig {
        vector_length,
        ..Default::default()
    })
    .unwrap()
}

fn vl(bytes: usize) -> VectorLength {
    VectorLength::from_bytes(bytes).unwrap()
}

fn run(regs: &mut RegisterFile, mem: &mut SparseMemory, ops: Vec<Op>) -> Result<(), EmulationError> {
    let mut seq = OpSequence::new(regs.vector_length());
    for op in ops {
        seq.emit_op(op);
    }
    execute(&seq, regs, mem)
}

fn all_true(regs: &RegisterFile, reg: u8) -> Op {
    Op::PredInit {
        dst: regs.preg_offset(reg),
        esz: B,
        count: regs.vector_length().bytes(),
    }
}

#[test]
fn test_ptrue_ands_at_maximum_length() {
    let mut emu = emulator(256);
    let result = emu.run_words(0x1000, &[PTRUE_P0_B, ANDS_P1]).unwrap();
    assert_eq!(result.stop_reason, StopReason::EndOfInstructions);

    assert_eq!(emu.regs().preg(1), &[0xff; 32][..]);
    let flags = emu.regs().flags;
    assert!(flags.n);
    assert!(!flags.z);
    assert!(!flags.c);
    assert!(!flags.v);
}

#[test]
fn test_pow2_pattern() {
    // 48 byte lanes; the largest power of two is 32.
    let mut emu = emulator(48);
    emu.run_words(0, &[PTRUE_P0_B_POW2]).unwrap();
    assert_eq!(emu.regs().preg(0), &[0xff, 0xff, 0xff, 0xff, 0, 0][..]);
}

#[test]
fn test_divide_by_zero_yields_zero() {
    let mut emu = emulator(32);
    let z0 = emu.regs().zreg_offset(0);
    emu.regs_mut()
        .set_elems(z0, S, &[0, 5, (-7i32) as u32 as u64, i32::MIN as u32 as u64, 0, 1, 2, 3]);
    emu.run_words(0, &[PTRUE_P0_B, SDIV_Z0]).unwrap();
    assert_eq!(emu.regs().elems(z0, S), vec![0, 1, 1, 1, 0, 1, 1, 1]);
}

#[test]
fn test_clast_without_active_lanes() {
    let mut regs = RegisterFile::new(vl(32));
    let mut mem = SparseMemory::new();
    let (z1, z2, p0) = (regs.zreg_offset(1), regs.zreg_offset(2), regs.preg_offset(0));
    regs.set_elems(z1, S, &[1, 2, 3, 4, 5, 6, 7, 8]);
    regs.set_elems(z2, S, &[9; 8]);
    regs.set_x(0, 0x0000_dead_beef_1234);

    let ops = vec![
        Op::CondLast {
            esz: S,
            dst: ElemDst::Gpr(Gpr::X(0)),
            src: z1,
            pg: p0,
            after: false,
        },
        Op::CondLast {
            esz: S,
            dst: ElemDst::Vector(z2),
            src: z1,
            pg: p0,
            after: true,
        },
    ];
    run(&mut regs, &mut mem, ops).unwrap();

    // The scalar is truncated to the element size, the vector untouched.
    assert_eq!(regs.x(0), 0xbeef_1234);
    assert_eq!(regs.elems(z2, S), vec![9; 8]);

    // With an active lane the element after it is extracted.
    let mut p = vec![0u8; 4];
    p[1] = 0x01; // lane 2 of .s
    regs.set_preg(0, &p);
    let ops = vec![Op::CondLast {
        esz: S,
        dst: ElemDst::Gpr(Gpr::X(0)),
        src: z1,
        pg: p0,
        after: true,
    }];
    run(&mut regs, &mut mem, ops).unwrap();
    assert_eq!(regs.x(0), 4);
}

fn first_fault_load(regs: &RegisterFile, mode: LoadMode) -> Op {
    Op::LoadContig {
        esz: S,
        msz: 2,
        signed: false,
        regs: vec![regs.zreg_offset(0)],
        addr: Address::imm(Gpr::X(0), 0),
        pg: regs.preg_offset(0),
        mode,
    }
}

#[test]
fn test_first_fault_load_truncates_ffr() {
    let mut regs = RegisterFile::new(vl(32));
    let mut mem = SparseMemory::new();
    mem.map_region(0x1000, 0x1000);

    let z0 = regs.zreg_offset(0);
    regs.set_elems(z0, S, &[0x55; 8]);
    // Lanes 0 and 1 are mapped, lane 2 starts the unmapped page.
    regs.set_x(0, 0x1ff8);
    let ffr = regs.ffr_offset();
    let ops = vec![
        all_true(&regs, 0),
        Op::PredInit {
            dst: ffr,
            esz: B,
            count: 32,
        },
        first_fault_load(&regs, LoadMode::FirstFault),
    ];
    run(&mut regs, &mut mem, ops).unwrap();

    assert_eq!(regs.elems(z0, S), vec![0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(regs.bytes(ffr, 4), &[0xff, 0x00, 0x00, 0x00]);

    // A fault on the first active lane is reported.
    regs.set_x(0, 0x2000);
    let ops = vec![first_fault_load(&regs, LoadMode::FirstFault)];
    let err = run(&mut regs, &mut mem, ops).unwrap_err();
    assert!(matches!(err, EmulationError::MemoryFault { address: 0x2000, .. }));

    // A non-faulting load never reports one.
    let ops = vec![
        Op::PredInit {
            dst: ffr,
            esz: B,
            count: 32,
        },
        first_fault_load(&regs, LoadMode::NonFault),
    ];
    run(&mut regs, &mut mem, ops).unwrap();
    assert_eq!(regs.bytes(ffr, 4), &[0, 0, 0, 0]);
}

#[test]
fn test_zip_then_uzp_restores_operands() {
    let mut regs = RegisterFile::new(vl(64));
    let mut mem = SparseMemory::new();
    let z: Vec<_> = (0..6).map(|r| regs.zreg_offset(r)).collect();
    let a: Vec<u64> = (0..16).collect();
    let b: Vec<u64> = (100..116).collect();
    regs.set_elems(z[0], S, &a);
    regs.set_elems(z[1], S, &b);

    let permute = |kind, dst, a, b, high| Op::Permute {
        kind,
        esz: S,
        dst,
        a,
        b,
        high,
    };
    let ops = vec![
        permute(PermuteKind::Zip, z[2], z[0], z[1], false),
        permute(PermuteKind::Zip, z[3], z[0], z[1], true),
        permute(PermuteKind::Uzp, z[4], z[2], z[3], false),
        permute(PermuteKind::Uzp, z[5], z[2], z[3], true),
    ];
    run(&mut regs, &mut mem, ops).unwrap();

    assert_eq!(regs.elems(z[2], S)[..4], [0, 100, 1, 101]);
    assert_eq!(regs.elems(z[4], S), a);
    assert_eq!(regs.elems(z[5], S), b);
}

#[test]
fn test_compact_with_all_lanes_is_identity() {
    let mut regs = RegisterFile::new(vl(32));
    let mut mem = SparseMemory::new();
    let (z0, z1, p0) = (regs.zreg_offset(0), regs.zreg_offset(1), regs.preg_offset(0));
    let values: Vec<u64> = (1..=8).map(|v| v * 0x1111).collect();
    regs.set_elems(z0, S, &values);

    let ops = vec![
        all_true(&regs, 0),
        Op::Compact {
            esz: S,
            dst: z1,
            src: z0,
            pg: p0,
        },
    ];
    run(&mut regs, &mut mem, ops).unwrap();
    assert_eq!(regs.elems(z1, S), values);
}

#[test]
fn test_stop_and_resume_after_max_instructions() {
    let mut emu = Emulator::new(EmulatorConfig {
        max_instructions: 3,
        ..Default::default()
    })
    .unwrap();
    let result = emu.run_words(0, &[PTRUE_P0_B; 5]).unwrap();
    assert_eq!(result.stop_reason, StopReason::MaxInstructions);
    assert_eq!(result.path, vec![0, 4, 8]);

    emu.reset();
    let result = emu.run_words(0, &[PTRUE_P0_B]).unwrap();
    assert_eq!(result.stop_reason, StopReason::EndOfInstructions);
}

#[test]
fn test_first_fault_load_with_zero_offset_register() {
    let mut emu = emulator(32);
    let data: Vec<u8> = (1..=32).collect();
    emu.memory_mut().load_section(0x4000, &data);
    emu.regs_mut().set_x(1, 0x4000);

    let result = emu.run_words(0, &[PTRUE_P0_B, SETFFR, LDFF1B_XZR]).unwrap();
    assert_eq!(result.stop_reason, StopReason::EndOfInstructions);
    assert_eq!(result.instruction_count, 3);

    let regs = emu.regs();
    assert_eq!(regs.bytes(regs.zreg_offset(0), 32), &data[..]);
    assert_eq!(regs.bytes(regs.ffr_offset(), 4), &[0xff; 4]);
}

#[test]
fn test_fexpa_builds_powers_of_two() {
    let mut emu = emulator(32);
    let z1 = emu.regs().zreg_offset(1);
    // Biased exponent in bits [13:6], table index in bits [5:0].
    let lanes: Vec<u64> = (0..8).map(|i| (126 + i / 2) << 6 | (i % 2) * 32).collect();
    emu.regs_mut().set_elems(z1, S, &lanes);

    emu.run_words(0, &[FEXPA_Z0_S]).unwrap();
    let z0 = emu.regs().zreg_offset(0);
    let expected: Vec<u64> = (0..8)
        .map(|i| {
            let scale = 2.0f32.powi(i / 2 - 1);
            let frac = if i % 2 == 0 { 1.0 } else { std::f32::consts::SQRT_2 };
            (scale * frac).to_bits() as u64
        })
        .collect();
    assert_eq!(emu.regs().elems(z0, S), expected);
}

#[test]
fn test_ftssel_selects_one_and_sign() {
    let mut emu = emulator(32);
    let (z1, z2) = (emu.regs().zreg_offset(1), emu.regs().zreg_offset(2));
    emu.regs_mut().set_elems(z1, D, &[2.5f64.to_bits(); 4]);
    emu.regs_mut().set_elems(z2, D, &[0, 1, 2, 3]);

    emu.run_words(0, &[FTSSEL_Z0_D]).unwrap();
    let z0 = emu.regs().zreg_offset(0);
    let expected: Vec<u64> = [2.5f64, 1.0, -2.5, -1.0].iter().map(|v| v.to_bits()).collect();
    assert_eq!(emu.regs().elems(z0, D), expected);
}

#[test]
fn test_prefetches_have_no_effect() {
    // Nothing is mapped; prefetches neither fault nor touch state.
    let mut emu = emulator(32);
    let before = emu.regs().state_hash();
    let words = [
        0x85c0_0000, // prfb pldl1keep, p0, [x0]
        0x8482_cc20, // prfh pldl1keep, p3, [x1, x2, lsl #1]
        0xc461_e000, // prfd pldl1keep, p0, [x0, z1.d, lsl #3]
        0x8403_e0a0, // prfb pldl1keep, p0, [z5.s, #3]
    ];
    let result = emu.run_words(0, &words).unwrap();
    assert_eq!(result.stop_reason, StopReason::EndOfInstructions);
    assert_eq!(result.instruction_count, 4);
    assert_eq!(emu.regs().state_hash(), before);
}

#[test]
fn test_unallocated_size_stops_emulation() {
    // fexpa z0.b has no byte form.
    let mut emu = emulator(32);
    let result = emu.run_words(0x100, &[PTRUE_P0_B, 0x0420_b820]).unwrap();
    assert_eq!(
        result.stop_reason,
        StopReason::Undefined {
            address: 0x104,
            word: 0x0420_b820
        }
    );
    assert_eq!(result.instruction_count, 1);
}
