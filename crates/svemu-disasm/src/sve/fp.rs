//! Floating point (bits [31:24] = 0x65).

use super::{esz, pm, v, z, Form};
use crate::fields::{bit, extract, pg3, rd, rm, rn};
use svemu_core::{Args, ElementSize, Opcode};

pub(crate) fn decode(word: u32) -> Option<Form> {
    // No floating-point form has byte elements.
    if esz(word) == ElementSize::B {
        return None;
    }
    if bit(word, 21) {
        return decode_fma(word);
    }
    match (extract(word, 20, 1), extract(word, 13, 3)) {
        (_, 0b000) => decode_unpredicated(word),
        (0, 0b100) => decode_predicated(word),
        (1, 0b001) if extract(word, 16, 5) == 0b11000 => decode_fadda(word),
        (1, 0b101) if extract(word, 19, 2) == 0b10 => decode_convert(word),
        _ => None,
    }
}

fn decode_unpredicated(word: u32) -> Option<Form> {
    let e = esz(word);
    let (opcode, name) = match extract(word, 10, 3) {
        0b000 => (Opcode::FaddZzz, "fadd"),
        0b001 => (Opcode::FsubZzz, "fsub"),
        0b010 => (Opcode::FmulZzz, "fmul"),
        _ => return None,
    };
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        esz: e,
        ..Args::default()
    };
    Some(Form::new(opcode, name, args).ops(vec![
        z(rd(word), e),
        z(rn(word), e),
        z(rm(word), e),
    ]))
}

fn decode_predicated(word: u32) -> Option<Form> {
    let e = esz(word);
    let (opcode, name) = match extract(word, 16, 4) {
        0b0000 => (Opcode::FaddZpzz, "fadd"),
        0b0001 => (Opcode::FsubZpzz, "fsub"),
        0b0010 => (Opcode::FmulZpzz, "fmul"),
        0b0011 => (Opcode::FsubrZpzz, "fsubr"),
        0b0100 => (Opcode::FmaxnmZpzz, "fmaxnm"),
        0b0101 => (Opcode::FminnmZpzz, "fminnm"),
        0b0110 => (Opcode::FmaxZpzz, "fmax"),
        0b0111 => (Opcode::FminZpzz, "fmin"),
        0b1000 => (Opcode::FabdZpzz, "fabd"),
        0b1100 => (Opcode::FdivrZpzz, "fdivr"),
        0b1101 => (Opcode::FdivZpzz, "fdiv"),
        _ => return None,
    };
    let args = Args {
        rd: rd(word),
        rn: rd(word),
        rm: rn(word),
        pg: pg3(word),
        esz: e,
        ..Args::default()
    };
    Some(Form::new(opcode, name, args).ops(vec![
        z(rd(word), e),
        pm(pg3(word)),
        z(rd(word), e),
        z(rn(word), e),
    ]))
}

fn decode_fma(word: u32) -> Option<Form> {
    let e = esz(word);
    let (opcode, name) = match extract(word, 13, 3) {
        0b000 => (Opcode::Fmla, "fmla"),
        0b001 => (Opcode::Fmls, "fmls"),
        0b010 => (Opcode::Fnmla, "fnmla"),
        0b011 => (Opcode::Fnmls, "fnmls"),
        0b100 => (Opcode::Fmad, "fmad"),
        0b101 => (Opcode::Fmsb, "fmsb"),
        0b110 => (Opcode::Fnmad, "fnmad"),
        _ => (Opcode::Fnmsb, "fnmsb"),
    };
    // Accumulating forms add into Zda; the multiplicand forms multiply Zdn
    // and take the addend from bits 9:5.
    let args = if extract(word, 15, 1) == 0 {
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
    Some(Form::new(opcode, name, args).ops(vec![
        z(rd(word), e),
        pm(pg3(word)),
        z(rn(word), e),
        z(rm(word), e),
    ]))
}

fn decode_fadda(word: u32) -> Option<Form> {
    let e = esz(word);
    let args = Args {
        rd: rd(word),
        rn: rd(word),
        rm: rn(word),
        pg: pg3(word),
        esz: e,
        ..Args::default()
    };
    Some(Form::new(Opcode::Fadda, "fadda", args).ops(vec![
        v(rd(word), e),
        super::p(pg3(word)),
        v(rd(word), e),
        z(rn(word), e),
    ]))
}

fn decode_convert(word: u32) -> Option<Form> {
    use ElementSize::{D, H, S};
    let unsigned = bit(word, 16);
    let (dst, src) = match (extract(word, 22, 2), extract(word, 17, 2)) {
        (0b01, 0b01) => (H, H),
        (0b01, 0b10) => (H, S),
        (0b01, 0b11) => (H, D),
        (0b10, 0b10) => (S, S),
        (0b11, 0b00) => (D, S),
        (0b11, 0b10) => (S, D),
        (0b11, 0b11) => (D, D),
        _ => return None,
    };
    let (opcode, name) = if unsigned {
        (Opcode::Ucvtf, "ucvtf")
    } else {
        (Opcode::Scvtf, "scvtf")
    };
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        pg: pg3(word),
        esz: dst,
        src_esz: src,
        unsigned,
        ..Args::default()
    };
    Some(Form::new(opcode, name, args).ops(vec![
        z(rd(word), dst),
        pm(pg3(word)),
        z(rn(word), src),
    ]))
}
