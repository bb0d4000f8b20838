use super::*;
use crate::ops::{Address, BinaryOp, LoadMode, Operand2, Predication};
use svemu_core::{Args, Cond, Opcode};
use svemu_disasm::SveDecoder;
use ElementSize::{B, S};

fn vl() -> VectorLength {
    VectorLength::from_bytes(32).unwrap()
}

fn layout() -> Layout {
    Layout::new(vl())
}

fn lower(word: u32) -> Vec<Op> {
    let insn = SveDecoder::new().decode(word, 0x1000).unwrap();
    translate(&insn, vl()).unwrap().ops().to_vec()
}

fn manual(opcode: Opcode, args: Args) -> TranslateResult<OpSequence> {
    let insn = Instruction::new(0x40, 0x1234_5678, opcode, args, "test");
    translate(&insn, vl())
}

#[test]
fn test_predicated_add() {
    // add z0.s, p1/m, z0.s, z2.s
    let l = layout();
    assert_eq!(
        lower(0x0480_0440),
        vec![Op::Binary {
            op: BinaryOp::Add,
            esz: S,
            dst: l.zreg(0),
            a: l.zreg(0),
            b: Operand2::Vec(l.zreg(2)),
            pred: Predication::Merge(l.preg(1)),
        }]
    );
}

#[test]
fn test_reversed_forms_swap_sources() {
    let l = layout();
    let args = Args {
        rd: 0,
        rn: 0,
        rm: 2,
        pg: 1,
        esz: S,
        ..Args::default()
    };
    let seq = manual(Opcode::SubrZpzz, args).unwrap();
    assert_eq!(
        seq.ops()[0],
        Op::Binary {
            op: BinaryOp::Sub,
            esz: S,
            dst: l.zreg(0),
            a: l.zreg(2),
            b: Operand2::Vec(l.zreg(0)),
            pred: Predication::Merge(l.preg(1)),
        }
    );
}

#[test]
fn test_unsupported_size_is_unallocated() {
    let args = Args {
        esz: B,
        ..Args::default()
    };
    let err = manual(Opcode::SdivZpzz, args).unwrap_err();
    assert!(err.is_unallocated());
    assert_eq!(err.address(), 0x40);

    let args = Args {
        esz: B,
        ..Args::default()
    };
    assert!(manual(Opcode::Compact, args).unwrap_err().is_unallocated());
}

#[test]
fn test_compare_saves_overwritten_governor() {
    // cmpeq p0.b, p0/z, z0.b, z1.b
    let l = layout();
    let scratch = l.preg(RegisterFile::SCRATCH_PRED);
    assert_eq!(
        lower(0x2401_a000),
        vec![
            Op::Mov {
                dst: scratch,
                src: l.preg(0),
                len: l.pred_stride(),
            },
            Op::Compare {
                cond: Cond::Eq,
                esz: B,
                dst: l.preg(0),
                a: l.zreg(0),
                b: Operand2::Vec(l.zreg(1)),
                pg: scratch,
            },
            Op::PredTest {
                d: l.preg(0),
                g: Some(scratch),
                esz: B,
            },
        ]
    );
}

#[test]
fn test_flag_setting_logic() {
    let l = layout();
    // ands p1.b, p0/z, p0.b, p0.b: no overlap, no copy
    let ops = lower(0x2540_4001);
    assert_eq!(ops.len(), 2);
    assert_eq!(
        ops[1],
        Op::PredTest {
            d: l.preg(1),
            g: Some(l.preg(0)),
            esz: B,
        }
    );

    // ands p0.b, p0/z, p1.b, p1.b
    let ops = lower(0x2541_4020);
    assert_eq!(ops.len(), 3);
    assert!(matches!(ops[0], Op::Mov { .. }));
}

#[test]
fn test_ptrue_and_while() {
    let l = layout();
    assert_eq!(
        lower(0x2518_e3e0),
        vec![Op::PredInit {
            dst: l.preg(0),
            esz: B,
            count: 32,
        }]
    );

    // whilelo p0.s, x0, x1
    let ops = lower(0x25a1_1c00);
    assert_eq!(ops.len(), 2);
    assert_eq!(
        ops[1],
        Op::PredTest {
            d: l.preg(0),
            g: None,
            esz: S,
        }
    );
}

#[test]
fn test_counts_resolve_at_translation() {
    // cntd x0 at 256 bits
    assert_eq!(
        lower(0x04e0_e3e0),
        vec![Op::ScalarSet {
            dst: Gpr::X(0),
            value: 4,
        }]
    );
}

#[test]
fn test_memory_addressing() {
    let l = layout();
    // ldr z1, [sp, #-1, mul vl]
    assert_eq!(
        lower(0x85bf_5fe1),
        vec![Op::LoadReg {
            dst: l.zreg(1),
            len: 32,
            addr: Address::imm(Gpr::Sp, -32),
        }]
    );

    // ld1w {z0.s}, p0/z, [x0]
    assert_eq!(
        lower(0xa540_a000),
        vec![Op::LoadContig {
            esz: S,
            msz: 2,
            signed: false,
            regs: vec![l.zreg(0)],
            addr: Address::imm(Gpr::X(0), 0),
            pg: l.preg(0),
            mode: LoadMode::Normal,
        }]
    );
}

#[test]
fn test_structured_immediate_scales_by_register_count() {
    let l = layout();
    // ld3w {z30.s, z31.s, z0.s}, p0/z, [x0, #-3, mul vl]
    let args = Args {
        rd: 30,
        rn: 0,
        esz: S,
        msz: 2,
        dtype: 10,
        nreg: 2,
        imm: -1,
        ..Args::default()
    };
    let seq = manual(Opcode::LdZpri, args).unwrap();
    match &seq.ops()[0] {
        Op::LoadContig { regs, addr, .. } => {
            assert_eq!(regs, &vec![l.zreg(30), l.zreg(31), l.zreg(0)]);
            assert_eq!(addr.disp, -96);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_prefetch_emits_nothing() {
    let seq = manual(Opcode::Prf, Args::default()).unwrap();
    assert!(seq.is_empty());
}
