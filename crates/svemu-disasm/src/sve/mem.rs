//! Loads and stores (bits [31:24] = 0x84, 0x85, 0xA4, 0xA5, 0xC4, 0xC5,
//! 0xE4, 0xE5).

use super::{p, pz, z, Form};
use crate::dtype::{dtype_esz, dtype_msz, dtype_suffix, msz_dtype, msz_suffix};
use crate::fields::{bit, extract, pg3, rd, rm, rn, sextract};
use svemu_core::{Args, ElementSize, MemBase, MemExtend, MemIndex, MemoryRef, Opcode, Operand};

pub(crate) fn decode(word: u32) -> Option<Form> {
    match word >> 25 {
        0b100_0010 => decode_gather32(word),
        0b101_0010 => decode_contiguous_load(word),
        0b110_0010 => decode_gather64(word),
        0b111_0010 => decode_store(word),
        _ => None,
    }
}

fn zlist(first: u8, nreg: u8, e: ElementSize) -> Operand {
    Operand::ZList {
        first,
        count: nreg + 1,
        esz: e,
    }
}

fn mem(m: MemoryRef) -> Operand {
    Operand::Memory(m)
}

fn imm9(word: u32) -> i64 {
    ((sextract(word, 16, 6) << 3) | extract(word, 10, 3) as i32) as i64
}

fn extend_of(xs: u8) -> MemExtend {
    match xs {
        0 => MemExtend::Uxtw,
        1 => MemExtend::Sxtw,
        _ => MemExtend::None,
    }
}

// ==== Register fill/spill ====

fn decode_ldr_str(word: u32, store: bool) -> Option<Form> {
    let imm = imm9(word);
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        imm,
        ..Args::default()
    };
    let addr = mem(MemoryRef::scalar_imm(rn(word), imm, true));
    let name = if store { "str" } else { "ldr" };
    match extract(word, 13, 3) {
        0b000 if !bit(word, 4) => {
            let opcode = if store { Opcode::StrP } else { Opcode::LdrP };
            Some(Form::new(opcode, name, args).ops(vec![p(rd(word) & 15), addr]))
        }
        0b010 => {
            let opcode = if store { Opcode::StrZ } else { Opcode::LdrZ };
            Some(Form::new(opcode, name, args).ops(vec![
                Operand::ZReg {
                    reg: rd(word),
                    esz: None,
                },
                addr,
            ]))
        }
        _ => None,
    }
}

// ==== Prefetches ====

/// PRFB/PRFH/PRFW/PRFD. Bit 4 must be clear; the prefetch itself has no
/// architectural effect.
fn prefetch(word: u32, msz: u8, addr: MemoryRef) -> Option<Form> {
    if bit(word, 4) {
        return None;
    }
    let args = Args {
        rn: rn(word),
        rm: rm(word),
        pg: pg3(word),
        msz,
        ..Args::default()
    };
    Some(
        Form::new(Opcode::Prf, format!("prf{}", msz_suffix(msz)), args).ops(vec![
            Operand::PrfOp(extract(word, 0, 4) as u8),
            p(pg3(word)),
            mem(addr),
        ]),
    )
}

/// `[zn.<T>, #imm]` with the 5-bit immediate scaled by the access size.
fn vector_imm(word: u32, e: ElementSize, msz: u8) -> MemoryRef {
    let imm = (extract(word, 16, 5) as i64) << msz;
    MemoryRef {
        base: MemBase::Vector { reg: rn(word), esz: e },
        index: if imm == 0 {
            MemIndex::None
        } else {
            MemIndex::Imm { value: imm, mul_vl: false }
        },
    }
}

fn vector_offset(word: u32, e: ElementSize, extend: MemExtend, shift: u8) -> MemoryRef {
    MemoryRef {
        base: MemBase::Scalar(rn(word)),
        index: MemIndex::Vector {
            reg: rm(word),
            esz: e,
            extend,
            shift,
        },
    }
}

// ==== Contiguous loads ====

fn decode_contiguous_load(word: u32) -> Option<Form> {
    let dtype = extract(word, 21, 4) as u8;
    let msz = extract(word, 23, 2) as u8;
    let nreg = extract(word, 21, 2) as u8;
    let base = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        pg: pg3(word),
        ..Args::default()
    };
    let imm4 = sextract(word, 16, 4) as i64;

    match extract(word, 13, 3) {
        0b000 | 0b001 => {
            // LD1RQ; other register counts are reserved.
            if nreg != 0 {
                return None;
            }
            let e = ElementSize::from_bits(msz as u32);
            let args = Args {
                dtype: msz_dtype(msz),
                msz,
                esz: e,
                ..base
            };
            let name = format!("ld1rq{}", msz_suffix(msz));
            if extract(word, 13, 3) == 0 {
                if rm(word) == 31 {
                    return None;
                }
                Some(Form::new(Opcode::Ld1rqZprr, name, args).ops(vec![
                    zlist(rd(word), 0, e),
                    pz(pg3(word)),
                    mem(MemoryRef::scalar_reg(rn(word), rm(word), msz)),
                ]))
            } else {
                if bit(word, 20) {
                    return None;
                }
                let args = Args { imm: imm4, ..args };
                Some(Form::new(Opcode::Ld1rqZpri, name, args).ops(vec![
                    zlist(rd(word), 0, e),
                    pz(pg3(word)),
                    mem(MemoryRef::scalar_imm(rn(word), imm4 * 16, false)),
                ]))
            }
        }
        0b010 | 0b011 => {
            let first_fault = extract(word, 13, 3) == 0b011;
            // LD1 reserves xzr as the offset; LDFF1 reads it as zero.
            if rm(word) == 31 && !first_fault {
                return None;
            }
            let e = dtype_esz(dtype);
            let m = dtype_msz(dtype);
            let args = Args {
                dtype,
                msz: m,
                esz: e,
                ..base
            };
            let (opcode, prefix) = if first_fault {
                (Opcode::Ldff1Zprr, "ldff1")
            } else {
                (Opcode::LdZprr, "ld1")
            };
            Some(
                Form::new(opcode, format!("{}{}", prefix, dtype_suffix(dtype)), args).ops(vec![
                    zlist(rd(word), 0, e),
                    pz(pg3(word)),
                    if rm(word) == 31 {
                        mem(MemoryRef::scalar_imm(rn(word), 0, false))
                    } else {
                        mem(MemoryRef::scalar_reg(rn(word), rm(word), m))
                    },
                ]),
            )
        }
        0b101 => {
            let non_fault = bit(word, 20);
            let e = dtype_esz(dtype);
            let m = dtype_msz(dtype);
            let args = Args {
                dtype,
                msz: m,
                esz: e,
                imm: imm4,
                ..base
            };
            let (opcode, prefix) = if non_fault {
                (Opcode::Ldnf1Zpri, "ldnf1")
            } else {
                (Opcode::LdZpri, "ld1")
            };
            Some(
                Form::new(opcode, format!("{}{}", prefix, dtype_suffix(dtype)), args).ops(vec![
                    zlist(rd(word), 0, e),
                    pz(pg3(word)),
                    mem(MemoryRef::scalar_imm(rn(word), imm4, true)),
                ]),
            )
        }
        0b110 => {
            if rm(word) == 31 {
                return None;
            }
            let e = ElementSize::from_bits(msz as u32);
            let args = Args {
                dtype: msz_dtype(msz),
                msz,
                esz: e,
                nreg,
                ..base
            };
            Some(Form::new(Opcode::LdZprr, structured_name("ld", nreg, msz), args).ops(vec![
                zlist(rd(word), nreg, e),
                pz(pg3(word)),
                mem(MemoryRef::scalar_reg(rn(word), rm(word), msz)),
            ]))
        }
        0b111 => {
            if bit(word, 20) {
                return None;
            }
            let e = ElementSize::from_bits(msz as u32);
            let args = Args {
                dtype: msz_dtype(msz),
                msz,
                esz: e,
                nreg,
                imm: imm4,
                ..base
            };
            Some(Form::new(Opcode::LdZpri, structured_name("ld", nreg, msz), args).ops(vec![
                zlist(rd(word), nreg, e),
                pz(pg3(word)),
                mem(MemoryRef::scalar_imm(rn(word), imm4 * (nreg as i64 + 1), true)),
            ]))
        }
        _ => None,
    }
}

/// `ld2w`, `st4b`, ... for structured accesses; `ldnt1`/`stnt1` for the
/// single-register non-temporal forms that share the encoding.
fn structured_name(prefix: &str, nreg: u8, msz: u8) -> String {
    if nreg == 0 {
        format!("{}nt1{}", prefix, msz_suffix(msz))
    } else {
        format!("{}{}{}", prefix, nreg + 1, msz_suffix(msz))
    }
}

// ==== Broadcast, fill and gather (32-bit lanes) ====

fn decode_gather32(word: u32) -> Option<Form> {
    let msz = extract(word, 23, 2) as u8;

    if bit(word, 22) && bit(word, 15) {
        return decode_ld1r(word);
    }
    if extract(word, 21, 2) == 0 && extract(word, 13, 3) == 0b111 {
        return prefetch(word, msz, vector_imm(word, ElementSize::S, msz));
    }
    if extract(word, 22, 3) == 0b110 {
        return decode_ldr_str(word, false);
    }
    if extract(word, 22, 3) == 0b111 && !bit(word, 15) {
        let pmsz = extract(word, 13, 2) as u8;
        let imm6 = sextract(word, 16, 6) as i64;
        return prefetch(word, pmsz, MemoryRef::scalar_imm(rn(word), imm6, true));
    }
    if extract(word, 21, 2) == 0 && extract(word, 13, 3) == 0b110 {
        if rm(word) == 31 {
            return None;
        }
        return prefetch(word, msz, MemoryRef::scalar_reg(rn(word), rm(word), msz));
    }
    if msz == 3 {
        return None;
    }

    let unsigned = bit(word, 14);
    let first_fault = bit(word, 13);
    // No sign-extending word load into word lanes.
    if msz == 2 && !unsigned {
        return None;
    }

    if !bit(word, 15) {
        let xs = extract(word, 22, 1) as u8;
        let scale = bit(word, 21);
        if scale && msz == 0 {
            let pmsz = extract(word, 13, 2) as u8;
            return prefetch(word, pmsz, vector_offset(word, ElementSize::S, extend_of(xs), pmsz));
        }
        return Some(gather_vector_offset(word, ElementSize::S, msz, xs, scale, unsigned, first_fault));
    }
    if extract(word, 21, 2) == 0b01 {
        return Some(gather_vector_base(word, ElementSize::S, msz, unsigned, first_fault));
    }
    None
}

fn decode_ld1r(word: u32) -> Option<Form> {
    let dtype = ((extract(word, 23, 2) << 2) | extract(word, 13, 2)) as u8;
    let e = dtype_esz(dtype);
    let m = dtype_msz(dtype);
    let imm = extract(word, 16, 6) as i64;
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        pg: pg3(word),
        dtype,
        msz: m,
        esz: e,
        imm,
        ..Args::default()
    };
    Some(
        Form::new(Opcode::Ld1r, format!("ld1r{}", dtype_suffix(dtype)), args).ops(vec![
            zlist(rd(word), 0, e),
            pz(pg3(word)),
            mem(MemoryRef::scalar_imm(rn(word), imm << m, false)),
        ]),
    )
}

fn gather_name(store: bool, msz: u8, unsigned: bool, first_fault: bool) -> String {
    if store {
        return format!("st1{}", msz_suffix(msz));
    }
    let prefix = if first_fault { "ldff1" } else { "ld1" };
    let sign = if unsigned { "" } else { "s" };
    format!("{}{}{}", prefix, sign, msz_suffix(msz))
}

fn gather_vector_offset(
    word: u32,
    e: ElementSize,
    msz: u8,
    xs: u8,
    scale: bool,
    unsigned: bool,
    first_fault: bool,
) -> Form {
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        pg: pg3(word),
        esz: e,
        msz,
        xs,
        scale,
        unsigned,
        first_fault,
        ..Args::default()
    };
    let addr = vector_offset(word, e, extend_of(xs), if scale { msz } else { 0 });
    Form::new(Opcode::Ld1Zprz, gather_name(false, msz, unsigned, first_fault), args).ops(vec![
        zlist(rd(word), 0, e),
        pz(pg3(word)),
        mem(addr),
    ])
}

fn gather_vector_base(word: u32, e: ElementSize, msz: u8, unsigned: bool, first_fault: bool) -> Form {
    let imm = (extract(word, 16, 5) as i64) << msz;
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        pg: pg3(word),
        esz: e,
        msz,
        imm,
        unsigned,
        first_fault,
        ..Args::default()
    };
    let addr = vector_imm(word, e, msz);
    Form::new(Opcode::Ld1Zpiz, gather_name(false, msz, unsigned, first_fault), args).ops(vec![
        zlist(rd(word), 0, e),
        pz(pg3(word)),
        mem(addr),
    ])
}

// ==== Gather (64-bit lanes) ====

fn decode_gather64(word: u32) -> Option<Form> {
    let msz = extract(word, 23, 2) as u8;
    let unsigned = bit(word, 14);
    let first_fault = bit(word, 13);
    let d = ElementSize::D;
    let pmsz = extract(word, 13, 2) as u8;

    if bit(word, 15) && extract(word, 21, 2) == 0 && extract(word, 13, 2) == 0b11 {
        return prefetch(word, msz, vector_imm(word, d, msz));
    }
    // The scaled byte-offset slots hold the gather prefetches.
    if msz == 0 && bit(word, 21) {
        if !bit(word, 15) {
            let xs = extract(word, 22, 1) as u8;
            return prefetch(word, pmsz, vector_offset(word, d, extend_of(xs), pmsz));
        }
        if bit(word, 22) {
            return prefetch(word, pmsz, vector_offset(word, d, MemExtend::None, pmsz));
        }
    }
    if msz == 3 && !unsigned {
        return None;
    }

    if !bit(word, 15) {
        let xs = extract(word, 22, 1) as u8;
        let scale = bit(word, 21);
        return Some(gather_vector_offset(word, d, msz, xs, scale, unsigned, first_fault));
    }
    if bit(word, 22) {
        let scale = bit(word, 21);
        return Some(gather_vector_offset(word, d, msz, 2, scale, unsigned, first_fault));
    }
    if extract(word, 21, 2) == 0b01 {
        return Some(gather_vector_base(word, d, msz, unsigned, first_fault));
    }
    None
}

// ==== Stores ====

fn decode_store(word: u32) -> Option<Form> {
    let msz = extract(word, 23, 2) as u8;
    let op = extract(word, 13, 3);
    if extract(word, 22, 3) == 0b110 && (op == 0b000 || op == 0b010) {
        return decode_ldr_str(word, true);
    }
    let base = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        pg: pg3(word),
        msz,
        ..Args::default()
    };
    let imm4 = sextract(word, 16, 4) as i64;

    match op {
        0b010 | 0b111 if op == 0b010 || !bit(word, 20) => {
            let e = ElementSize::from_bits(extract(word, 21, 2));
            if (msz as u32) > e.log2() {
                return None;
            }
            let name = format!("st1{}", msz_suffix(msz));
            if op == 0b010 {
                if rm(word) == 31 {
                    return None;
                }
                let args = Args { esz: e, ..base };
                Some(Form::new(Opcode::StZprr, name, args).ops(vec![
                    zlist(rd(word), 0, e),
                    p(pg3(word)),
                    mem(MemoryRef::scalar_reg(rn(word), rm(word), msz)),
                ]))
            } else {
                let args = Args {
                    esz: e,
                    imm: imm4,
                    ..base
                };
                Some(Form::new(Opcode::StZpri, name, args).ops(vec![
                    zlist(rd(word), 0, e),
                    p(pg3(word)),
                    mem(MemoryRef::scalar_imm(rn(word), imm4, true)),
                ]))
            }
        }
        0b011 => {
            if rm(word) == 31 {
                return None;
            }
            let nreg = extract(word, 21, 2) as u8;
            let e = ElementSize::from_bits(msz as u32);
            let args = Args { esz: e, nreg, ..base };
            Some(Form::new(Opcode::StZprr, structured_name("st", nreg, msz), args).ops(vec![
                zlist(rd(word), nreg, e),
                p(pg3(word)),
                mem(MemoryRef::scalar_reg(rn(word), rm(word), msz)),
            ]))
        }
        0b111 => {
            let nreg = extract(word, 21, 2) as u8;
            let e = ElementSize::from_bits(msz as u32);
            let args = Args {
                esz: e,
                nreg,
                imm: imm4,
                ..base
            };
            Some(Form::new(Opcode::StZpri, structured_name("st", nreg, msz), args).ops(vec![
                zlist(rd(word), nreg, e),
                p(pg3(word)),
                mem(MemoryRef::scalar_imm(rn(word), imm4 * (nreg as i64 + 1), true)),
            ]))
        }
        0b100 | 0b110 => {
            let xs = extract(word, 14, 1) as u8;
            let scale = bit(word, 21);
            let e = if bit(word, 22) { ElementSize::S } else { ElementSize::D };
            scatter_vector_offset(word, e, msz, xs, scale)
        }
        0b101 => match extract(word, 21, 2) {
            0b00 | 0b01 => scatter_vector_offset(word, ElementSize::D, msz, 2, bit(word, 21)),
            0b10 => scatter_vector_base(word, ElementSize::D, msz),
            _ => scatter_vector_base(word, ElementSize::S, msz),
        },
        _ => None,
    }
}

fn scatter_vector_offset(word: u32, e: ElementSize, msz: u8, xs: u8, scale: bool) -> Option<Form> {
    if (msz as u32) > e.log2() || (scale && msz == 0) {
        return None;
    }
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        pg: pg3(word),
        esz: e,
        msz,
        xs,
        scale,
        ..Args::default()
    };
    let addr = vector_offset(word, e, extend_of(xs), if scale { msz } else { 0 });
    Some(Form::new(Opcode::St1Zprz, gather_name(true, msz, true, false), args).ops(vec![
        zlist(rd(word), 0, e),
        p(pg3(word)),
        mem(addr),
    ]))
}

fn scatter_vector_base(word: u32, e: ElementSize, msz: u8) -> Option<Form> {
    if (msz as u32) > e.log2() {
        return None;
    }
    let imm = (extract(word, 16, 5) as i64) << msz;
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        pg: pg3(word),
        esz: e,
        msz,
        imm,
        ..Args::default()
    };
    let addr = vector_imm(word, e, msz);
    Some(Form::new(Opcode::St1Zpiz, gather_name(true, msz, true, false), args).ops(vec![
        zlist(rd(word), 0, e),
        p(pg3(word)),
        mem(addr),
    ]))
}
