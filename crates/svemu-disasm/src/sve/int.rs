//! Integer data processing (bits [31:24] = 0x04).

use super::{esz, p, pm, pz, v, w, x, xsp, z, Form};
use crate::fields::{bit, extract, pg3, rd, rm, rn, sextract};
use crate::immediates::{tszimm_esz, tszimm_shl, tszimm_shr};
use svemu_core::{Args, ElementSize, MemBase, MemExtend, MemIndex, MemoryRef, Opcode, Operand};

pub(crate) fn decode(word: u32) -> Option<Form> {
    if bit(word, 21) {
        decode_unpredicated(word)
    } else {
        decode_predicated(word)
    }
}

// ==== Predicated ====

fn decode_predicated(word: u32) -> Option<Form> {
    let class = extract(word, 13, 3);
    match class {
        0b000 => decode_zpzz(word),
        0b001 => decode_reduce(word),
        0b100 => decode_shift(word),
        0b101 => decode_unary(word),
        0b010 | 0b011 | 0b110 | 0b111 => decode_mla(word),
        _ => None,
    }
}

fn zpzz_form(word: u32, opcode: Opcode, mnemonic: &str) -> Form {
    let e = esz(word);
    let args = Args {
        rd: rd(word),
        rn: rd(word),
        rm: rn(word),
        pg: pg3(word),
        esz: e,
        ..Args::default()
    };
    Form::new(opcode, mnemonic, args).ops(vec![
        z(rd(word), e),
        pm(pg3(word)),
        z(rd(word), e),
        z(rn(word), e),
    ])
}

fn decode_zpzz(word: u32) -> Option<Form> {
    let group = extract(word, 19, 2);
    let opc = extract(word, 16, 3);
    let (opcode, mnemonic) = match (group, opc) {
        (0b00, 0b000) => (Opcode::AddZpzz, "add"),
        (0b00, 0b001) => (Opcode::SubZpzz, "sub"),
        (0b00, 0b011) => (Opcode::SubrZpzz, "subr"),
        (0b01, 0b000) => (Opcode::SmaxZpzz, "smax"),
        (0b01, 0b001) => (Opcode::UmaxZpzz, "umax"),
        (0b01, 0b010) => (Opcode::SminZpzz, "smin"),
        (0b01, 0b011) => (Opcode::UminZpzz, "umin"),
        (0b01, 0b100) => (Opcode::SabdZpzz, "sabd"),
        (0b01, 0b101) => (Opcode::UabdZpzz, "uabd"),
        (0b10, 0b000) => (Opcode::MulZpzz, "mul"),
        (0b10, 0b010) => (Opcode::SmulhZpzz, "smulh"),
        (0b10, 0b011) => (Opcode::UmulhZpzz, "umulh"),
        (0b10, 0b100) => (Opcode::SdivZpzz, "sdiv"),
        (0b10, 0b101) => (Opcode::UdivZpzz, "udiv"),
        (0b10, 0b110) => (Opcode::SdivrZpzz, "sdivr"),
        (0b10, 0b111) => (Opcode::UdivrZpzz, "udivr"),
        (0b11, 0b000) => (Opcode::OrrZpzz, "orr"),
        (0b11, 0b001) => (Opcode::EorZpzz, "eor"),
        (0b11, 0b010) => (Opcode::AndZpzz, "and"),
        (0b11, 0b011) => (Opcode::BicZpzz, "bic"),
        _ => return None,
    };
    Some(zpzz_form(word, opcode, mnemonic))
}

fn decode_reduce(word: u32) -> Option<Form> {
    let group = extract(word, 19, 2);
    let opc = extract(word, 16, 3);
    let e = esz(word);
    let (opcode, mnemonic) = match (group, opc) {
        (0b11, 0b000) => (Opcode::Orv, "orv"),
        (0b11, 0b001) => (Opcode::Eorv, "eorv"),
        (0b11, 0b010) => (Opcode::Andv, "andv"),
        (0b10, 0b000) | (0b10, 0b001) => {
            let merge = opc == 0b001;
            let args = Args {
                rd: rd(word),
                rn: rn(word),
                pg: pg3(word),
                esz: e,
                merge,
                ..Args::default()
            };
            let opcode = if merge { Opcode::MovprfxM } else { Opcode::MovprfxZ };
            let pred = if merge { pm(pg3(word)) } else { pz(pg3(word)) };
            return Some(
                Form::new(opcode, "movprfx", args).ops(vec![z(rd(word), e), pred, z(rn(word), e)]),
            );
        }
        (0b00, 0b000) => (Opcode::Saddv, "saddv"),
        (0b00, 0b001) => (Opcode::Uaddv, "uaddv"),
        (0b01, 0b000) => (Opcode::Smaxv, "smaxv"),
        (0b01, 0b001) => (Opcode::Umaxv, "umaxv"),
        (0b01, 0b010) => (Opcode::Sminv, "sminv"),
        (0b01, 0b011) => (Opcode::Uminv, "uminv"),
        _ => return None,
    };
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        pg: pg3(word),
        esz: e,
        ..Args::default()
    };
    // Additions are accumulated in 64 bits.
    let dst_esz = match opcode {
        Opcode::Saddv | Opcode::Uaddv => ElementSize::D,
        _ => e,
    };
    Some(
        Form::new(opcode, mnemonic, args).ops(vec![
            v(rd(word), dst_esz),
            p(pg3(word)),
            z(rn(word), e),
        ]),
    )
}

fn decode_shift(word: u32) -> Option<Form> {
    let group = extract(word, 19, 2);
    let opc = extract(word, 16, 3);
    match group {
        0b00 => {
            let tsz = (extract(word, 22, 2) << 5) | extract(word, 5, 5);
            let e = tszimm_esz(tsz)?;
            let (opcode, mnemonic, shift) = match opc {
                0b000 => (Opcode::AsrZpzi, "asr", tszimm_shr(tsz, e)),
                0b001 => (Opcode::LsrZpzi, "lsr", tszimm_shr(tsz, e)),
                0b011 => (Opcode::LslZpzi, "lsl", tszimm_shl(tsz, e)),
                0b100 => (Opcode::Asrd, "asrd", tszimm_shr(tsz, e)),
                _ => return None,
            };
            let args = Args {
                rd: rd(word),
                rn: rd(word),
                pg: pg3(word),
                esz: e,
                imm: shift as i64,
                ..Args::default()
            };
            Some(Form::new(opcode, mnemonic, args).ops(vec![
                z(rd(word), e),
                pm(pg3(word)),
                z(rd(word), e),
                Operand::Imm(shift as i64),
            ]))
        }
        0b10 => {
            let (opcode, mnemonic) = match opc {
                0b000 => (Opcode::AsrZpzz, "asr"),
                0b001 => (Opcode::LsrZpzz, "lsr"),
                0b011 => (Opcode::LslZpzz, "lsl"),
                0b100 => (Opcode::AsrrZpzz, "asrr"),
                0b101 => (Opcode::LsrrZpzz, "lsrr"),
                0b111 => (Opcode::LslrZpzz, "lslr"),
                _ => return None,
            };
            Some(zpzz_form(word, opcode, mnemonic))
        }
        0b11 => {
            let e = esz(word);
            if e == ElementSize::D {
                return None;
            }
            let (opcode, mnemonic) = match opc {
                0b000 => (Opcode::AsrZpzw, "asr"),
                0b001 => (Opcode::LsrZpzw, "lsr"),
                0b011 => (Opcode::LslZpzw, "lsl"),
                _ => return None,
            };
            let mut form = zpzz_form(word, opcode, mnemonic);
            form.operands[3] = z(rn(word), ElementSize::D);
            Some(form)
        }
        _ => None,
    }
}

fn decode_unary(word: u32) -> Option<Form> {
    let group = extract(word, 19, 2);
    let opc = extract(word, 16, 3);
    let e = esz(word);
    let (opcode, mnemonic) = match (group, opc) {
        (0b11, 0b000) => (Opcode::Cls, "cls"),
        (0b11, 0b001) => (Opcode::Clz, "clz"),
        (0b11, 0b010) => (Opcode::Cnt, "cnt"),
        (0b11, 0b011) => (Opcode::Cnot, "cnot"),
        (0b11, 0b100) => (Opcode::Fabs, "fabs"),
        (0b11, 0b101) => (Opcode::Fneg, "fneg"),
        (0b11, 0b110) => (Opcode::Not, "not"),
        (0b10, 0b000) => (Opcode::Sxtb, "sxtb"),
        (0b10, 0b001) => (Opcode::Uxtb, "uxtb"),
        (0b10, 0b010) => (Opcode::Sxth, "sxth"),
        (0b10, 0b011) => (Opcode::Uxth, "uxth"),
        (0b10, 0b100) => (Opcode::Sxtw, "sxtw"),
        (0b10, 0b101) => (Opcode::Uxtw, "uxtw"),
        (0b10, 0b110) => (Opcode::Abs, "abs"),
        (0b10, 0b111) => (Opcode::Neg, "neg"),
        _ => return None,
    };
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        pg: pg3(word),
        esz: e,
        ..Args::default()
    };
    Some(Form::new(opcode, mnemonic, args).ops(vec![
        z(rd(word), e),
        pm(pg3(word)),
        z(rn(word), e),
    ]))
}

fn decode_mla(word: u32) -> Option<Form> {
    let e = esz(word);
    let (opcode, mnemonic) = match extract(word, 13, 3) {
        0b010 => (Opcode::Mla, "mla"),
        0b011 => (Opcode::Mls, "mls"),
        0b110 => (Opcode::Mad, "mad"),
        0b111 => (Opcode::Msb, "msb"),
        _ => return None,
    };
    let accumulate = matches!(opcode, Opcode::Mla | Opcode::Mls);
    let args = if accumulate {
        Args {
            rd: rd(word),
            ra: rd(word),
            rn: rn(word),
            rm: rm(word),
            pg: pg3(word),
            esz: e,
            ..Args::default()
        }
    } else {
        Args {
            rd: rd(word),
            rn: rd(word),
            ra: rn(word),
            rm: rm(word),
            pg: pg3(word),
            esz: e,
            ..Args::default()
        }
    };
    Some(Form::new(opcode, mnemonic, args).ops(vec![
        z(rd(word), e),
        pm(pg3(word)),
        z(rn(word), e),
        z(rm(word), e),
    ]))
}

// ==== Unpredicated ====

fn decode_unpredicated(word: u32) -> Option<Form> {
    let op = extract(word, 10, 6);
    match op >> 2 {
        0b0000 | 0b0001 => decode_zzz(word),
        0b0011 if op == 0b001100 => decode_logical_zzz(word),
        0b0100 => decode_index(word),
        0b0101 if op >> 1 == 0b01010 => decode_stack(word),
        0b1000 => decode_shift_zzw(word),
        0b1001 => decode_shift_zzi(word),
        0b1010 => decode_adr(word),
        0b1011 if op == 0b101111 && extract(word, 16, 8) == 0b0010_0000 => {
            let args = Args {
                rd: rd(word),
                rn: rn(word),
                ..Args::default()
            };
            Some(Form::new(Opcode::Movprfx, "movprfx", args).ops(vec![
                Operand::ZReg {
                    reg: rd(word),
                    esz: None,
                },
                Operand::ZReg {
                    reg: rn(word),
                    esz: None,
                },
            ]))
        }
        0b1011 if op == 0b101100 => decode_ftssel(word),
        0b1011 if op == 0b101110 && extract(word, 16, 5) == 0 => decode_fexpa(word),
        0b1100 | 0b1110 | 0b1111 => decode_element_count(word),
        _ => None,
    }
}

fn decode_ftssel(word: u32) -> Option<Form> {
    let e = esz(word);
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        esz: e,
        ..Args::default()
    };
    Some(Form::new(Opcode::Ftssel, "ftssel", args).ops(vec![
        z(rd(word), e),
        z(rn(word), e),
        z(rm(word), e),
    ]))
}

fn decode_fexpa(word: u32) -> Option<Form> {
    let e = esz(word);
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        esz: e,
        ..Args::default()
    };
    Some(Form::new(Opcode::Fexpa, "fexpa", args).ops(vec![z(rd(word), e), z(rn(word), e)]))
}

fn decode_zzz(word: u32) -> Option<Form> {
    let e = esz(word);
    let (opcode, mnemonic) = match extract(word, 10, 3) {
        0b000 => (Opcode::AddZzz, "add"),
        0b001 => (Opcode::SubZzz, "sub"),
        0b100 => (Opcode::SqaddZzz, "sqadd"),
        0b101 => (Opcode::UqaddZzz, "uqadd"),
        0b110 => (Opcode::SqsubZzz, "sqsub"),
        0b111 => (Opcode::UqsubZzz, "uqsub"),
        _ => return None,
    };
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        esz: e,
        ..Args::default()
    };
    Some(Form::new(opcode, mnemonic, args).ops(vec![
        z(rd(word), e),
        z(rn(word), e),
        z(rm(word), e),
    ]))
}

fn decode_logical_zzz(word: u32) -> Option<Form> {
    let (opcode, mnemonic) = match extract(word, 22, 2) {
        0b00 => (Opcode::AndZzz, "and"),
        0b01 => (Opcode::OrrZzz, "orr"),
        0b10 => (Opcode::EorZzz, "eor"),
        _ => (Opcode::BicZzz, "bic"),
    };
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        esz: ElementSize::D,
        ..Args::default()
    };
    let d = ElementSize::D;
    if opcode == Opcode::OrrZzz && rn(word) == rm(word) {
        return Some(
            Form::new(opcode, "mov", args).ops(vec![z(rd(word), d), z(rn(word), d)]),
        );
    }
    Some(Form::new(opcode, mnemonic, args).ops(vec![
        z(rd(word), d),
        z(rn(word), d),
        z(rm(word), d),
    ]))
}

fn scalar_for(e: ElementSize, reg: u8) -> Operand {
    if e == ElementSize::D {
        x(reg)
    } else {
        w(reg)
    }
}

fn decode_index(word: u32) -> Option<Form> {
    let e = esz(word);
    let mut args = Args {
        rd: rd(word),
        esz: e,
        ..Args::default()
    };
    let (opcode, start, step) = match extract(word, 10, 2) {
        0b00 => {
            args.imm = sextract(word, 5, 5) as i64;
            args.imm2 = sextract(word, 16, 5) as i64;
            (Opcode::IndexIi, Operand::Imm(args.imm), Operand::Imm(args.imm2))
        }
        0b01 => {
            args.rn = rn(word);
            args.imm2 = sextract(word, 16, 5) as i64;
            (Opcode::IndexRi, scalar_for(e, args.rn), Operand::Imm(args.imm2))
        }
        0b10 => {
            args.imm = sextract(word, 5, 5) as i64;
            args.rm = rm(word);
            (Opcode::IndexIr, Operand::Imm(args.imm), scalar_for(e, args.rm))
        }
        _ => {
            args.rn = rn(word);
            args.rm = rm(word);
            (Opcode::IndexRr, scalar_for(e, args.rn), scalar_for(e, args.rm))
        }
    };
    Some(Form::new(opcode, "index", args).ops(vec![z(rd(word), e), start, step]))
}

fn decode_stack(word: u32) -> Option<Form> {
    let imm = sextract(word, 5, 6) as i64;
    let args = Args {
        rd: rd(word),
        rn: rm(word),
        imm,
        ..Args::default()
    };
    match extract(word, 21, 3) {
        0b001 => Some(Form::new(Opcode::Addvl, "addvl", args).ops(vec![
            xsp(rd(word)),
            xsp(rm(word)),
            Operand::Imm(imm),
        ])),
        0b011 => Some(Form::new(Opcode::Addpl, "addpl", args).ops(vec![
            xsp(rd(word)),
            xsp(rm(word)),
            Operand::Imm(imm),
        ])),
        0b101 if rm(word) == 0b11111 => {
            Some(Form::new(Opcode::Rdvl, "rdvl", args).ops(vec![x(rd(word)), Operand::Imm(imm)]))
        }
        _ => None,
    }
}

fn decode_shift_zzw(word: u32) -> Option<Form> {
    let e = esz(word);
    if e == ElementSize::D {
        return None;
    }
    let (opcode, mnemonic) = match extract(word, 10, 2) {
        0b00 => (Opcode::AsrZzw, "asr"),
        0b01 => (Opcode::LsrZzw, "lsr"),
        0b11 => (Opcode::LslZzw, "lsl"),
        _ => return None,
    };
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        esz: e,
        ..Args::default()
    };
    Some(Form::new(opcode, mnemonic, args).ops(vec![
        z(rd(word), e),
        z(rn(word), e),
        z(rm(word), ElementSize::D),
    ]))
}

fn decode_shift_zzi(word: u32) -> Option<Form> {
    let tsz = (extract(word, 22, 2) << 5) | extract(word, 16, 5);
    let e = tszimm_esz(tsz)?;
    let (opcode, mnemonic, shift) = match extract(word, 10, 2) {
        0b00 => (Opcode::AsrZzi, "asr", tszimm_shr(tsz, e)),
        0b01 => (Opcode::LsrZzi, "lsr", tszimm_shr(tsz, e)),
        0b11 => (Opcode::LslZzi, "lsl", tszimm_shl(tsz, e)),
        _ => return None,
    };
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        esz: e,
        imm: shift as i64,
        ..Args::default()
    };
    Some(Form::new(opcode, mnemonic, args).ops(vec![
        z(rd(word), e),
        z(rn(word), e),
        Operand::Imm(shift as i64),
    ]))
}

fn decode_adr(word: u32) -> Option<Form> {
    let msz = extract(word, 10, 2) as u8;
    let (e, xs, extend) = match extract(word, 22, 2) {
        0b00 => (ElementSize::D, 1, MemExtend::Sxtw),
        0b01 => (ElementSize::D, 0, MemExtend::Uxtw),
        0b10 => (ElementSize::S, 2, MemExtend::None),
        _ => (ElementSize::D, 2, MemExtend::None),
    };
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        esz: e,
        xs,
        imm: msz as i64,
        ..Args::default()
    };
    let mem = MemoryRef {
        base: MemBase::Vector { reg: rn(word), esz: e },
        index: MemIndex::Vector {
            reg: rm(word),
            esz: e,
            extend,
            shift: msz,
        },
    };
    Some(Form::new(Opcode::Adr, "adr", args).ops(vec![z(rd(word), e), Operand::Memory(mem)]))
}

fn count_operands(head: Vec<Operand>, pattern: u8, mul: i64) -> Vec<Operand> {
    let mut ops = head;
    if pattern != 0x1f || mul != 1 {
        ops.push(Operand::Pattern(pattern));
    }
    if mul != 1 {
        ops.push(Operand::Mul(mul as u8));
    }
    ops
}

fn decode_element_count(word: u32) -> Option<Form> {
    let e = esz(word);
    let pattern = extract(word, 5, 5) as u8;
    let mul = extract(word, 16, 4) as i64 + 1;
    let b20 = bit(word, 20);
    let b11 = bit(word, 11);
    let b10 = bit(word, 10);
    let sfx = e.mnemonic_suffix();
    let reg = rd(word);
    let base = Args {
        rd: reg,
        rn: reg,
        esz: e,
        pattern,
        imm: mul,
        ..Args::default()
    };

    match extract(word, 12, 4) {
        0b1100 => {
            if e == ElementSize::B {
                return None;
            }
            if b20 {
                if b11 {
                    return None;
                }
                let args = Args {
                    decrement: b10,
                    ..base
                };
                let name = format!("{}{}", if b10 { "dec" } else { "inc" }, sfx);
                Some(
                    Form::new(Opcode::IncdecV, name, args)
                        .ops(count_operands(vec![z(reg, e)], pattern, mul)),
                )
            } else {
                let args = Args {
                    decrement: b11,
                    unsigned: b10,
                    ..base
                };
                let name = format!(
                    "{}{}{}",
                    if b10 { "uq" } else { "sq" },
                    if b11 { "dec" } else { "inc" },
                    sfx
                );
                Some(
                    Form::new(Opcode::SincdecV, name, args)
                        .ops(count_operands(vec![z(reg, e)], pattern, mul)),
                )
            }
        }
        0b1110 => {
            if b20 {
                if b11 {
                    return None;
                }
                let args = Args {
                    decrement: b10,
                    sf: true,
                    ..base
                };
                let name = format!("{}{}", if b10 { "dec" } else { "inc" }, sfx);
                Some(
                    Form::new(Opcode::IncdecR, name, args)
                        .ops(count_operands(vec![x(reg)], pattern, mul)),
                )
            } else {
                if b11 || b10 {
                    return None;
                }
                let args = Args { sf: true, ..base };
                Some(
                    Form::new(Opcode::CntR, format!("cnt{}", sfx), args)
                        .ops(count_operands(vec![x(reg)], pattern, mul)),
                )
            }
        }
        0b1111 => {
            let args = Args {
                decrement: b11,
                unsigned: b10,
                sf: b20,
                ..base
            };
            let name = format!(
                "{}{}{}",
                if b10 { "uq" } else { "sq" },
                if b11 { "dec" } else { "inc" },
                sfx
            );
            let (opcode, head) = if b20 {
                (Opcode::SincdecR64, vec![x(reg)])
            } else if b10 {
                (Opcode::SincdecR32, vec![w(reg)])
            } else {
                (Opcode::SincdecR32, vec![x(reg), w(reg)])
            };
            Some(Form::new(opcode, name, args).ops(count_operands(head, pattern, mul)))
        }
        _ => None,
    }
}
