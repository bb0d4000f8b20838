//! Bitwise immediates, wide immediates and permutes (bits [31:24] = 0x05).

use super::{esz, p, pm, ps, pz, v, w, x, xsp, z, Form};
use crate::fields::{bit, extract, pd, pg3, pg4, rd, rm, rn};
use crate::immediates::{decode_bit_masks, expand_imm_sh8s, fp_bits_to_f64, vfp_expand_imm};
use svemu_core::{Args, ElementSize, Opcode, Operand};

pub(crate) fn decode(word: u32) -> Option<Form> {
    if !bit(word, 21) {
        return match extract(word, 18, 4) {
            0b0000 => decode_bitwise_imm(word),
            0b0100..=0b0111 => decode_cpy_imm(word),
            _ => None,
        };
    }
    match extract(word, 13, 3) {
        0b000 if extract(word, 22, 2) == 0 => decode_ext(word),
        0b001 => decode_dup_tbl(word),
        0b010 => decode_pred_permute(word),
        0b011 => decode_vec_permute(word),
        0b100 => decode_pred_zpz(word),
        0b101 => decode_pred_rpz(word),
        0b110 | 0b111 => decode_sel(word),
        _ => None,
    }
}

fn scalar(e: ElementSize, reg: u8) -> Operand {
    if e == ElementSize::D {
        x(reg)
    } else {
        w(reg)
    }
}

/// Smallest element size in which `mask` repeats, for display.
fn mask_esz(mask: u64) -> ElementSize {
    if mask == (mask & 0xff).wrapping_mul(0x0101_0101_0101_0101) {
        ElementSize::B
    } else if mask == (mask & 0xffff).wrapping_mul(0x0001_0001_0001_0001) {
        ElementSize::H
    } else if mask == (mask & 0xffff_ffff).wrapping_mul(0x0000_0001_0000_0001) {
        ElementSize::S
    } else {
        ElementSize::D
    }
}

fn decode_bitwise_imm(word: u32) -> Option<Form> {
    let mask = decode_bit_masks(extract(word, 5, 13))?;
    let shown = mask_esz(mask);
    let imm = Operand::Hex(mask & shown.value_mask());
    let args = Args {
        rd: rd(word),
        rn: rd(word),
        esz: ElementSize::D,
        imm: mask as i64,
        ..Args::default()
    };
    let (opcode, mnemonic) = match extract(word, 22, 2) {
        0b00 => (Opcode::OrrZzi, "orr"),
        0b01 => (Opcode::EorZzi, "eor"),
        0b10 => (Opcode::AndZzi, "and"),
        _ => {
            return Some(
                Form::new(Opcode::Dupm, "dupm", args).ops(vec![z(rd(word), shown), imm]),
            )
        }
    };
    Some(Form::new(opcode, mnemonic, args).ops(vec![z(rd(word), shown), z(rd(word), shown), imm]))
}

fn decode_cpy_imm(word: u32) -> Option<Form> {
    let e = esz(word);
    let pg = extract(word, 16, 4) as u8;
    match extract(word, 13, 3) {
        0b110 => {
            let bits = vfp_expand_imm(e, extract(word, 5, 8))?;
            let args = Args {
                rd: rd(word),
                pg,
                esz: e,
                imm: bits as i64,
                merge: true,
                ..Args::default()
            };
            Some(Form::new(Opcode::Fcpy, "fmov", args).ops(vec![
                z(rd(word), e),
                pm(pg),
                Operand::FImm(fp_bits_to_f64(e, bits)),
            ]))
        }
        0b000 | 0b001 | 0b010 | 0b011 => {
            let merge = bit(word, 14);
            let sh = bit(word, 13);
            if sh && e == ElementSize::B {
                return None;
            }
            let imm = expand_imm_sh8s(extract(word, 5, 9));
            let args = Args {
                rd: rd(word),
                pg,
                esz: e,
                imm,
                merge,
                ..Args::default()
            };
            let (opcode, pred) = if merge {
                (Opcode::CpyMI, pm(pg))
            } else {
                (Opcode::CpyZI, pz(pg))
            };
            Some(Form::new(opcode, "mov", args).ops(vec![z(rd(word), e), pred, Operand::Imm(imm)]))
        }
        _ => None,
    }
}

fn decode_ext(word: u32) -> Option<Form> {
    let imm = (extract(word, 16, 5) << 3) | extract(word, 10, 3);
    let args = Args {
        rd: rd(word),
        rn: rd(word),
        rm: rn(word),
        esz: ElementSize::B,
        imm: imm as i64,
        ..Args::default()
    };
    let b = ElementSize::B;
    Some(Form::new(Opcode::Ext, "ext", args).ops(vec![
        z(rd(word), b),
        z(rd(word), b),
        z(rn(word), b),
        Operand::Imm(imm as i64),
    ]))
}

fn decode_dup_tbl(word: u32) -> Option<Form> {
    let e = esz(word);
    match extract(word, 10, 3) {
        0b000 => {
            let tsz = extract(word, 16, 5);
            if tsz == 0 {
                return None;
            }
            let imm7 = (extract(word, 22, 2) << 5) | tsz;
            let log2 = tsz.trailing_zeros();
            let index = imm7 >> (log2 + 1);
            let args = Args {
                rd: rd(word),
                rn: rn(word),
                msz: log2 as u8,
                imm: index as i64,
                esz: ElementSize::from_log2(log2 as i32).unwrap_or(ElementSize::D),
                ..Args::default()
            };
            let src = match ElementSize::from_log2(log2 as i32) {
                Some(elem) => Operand::ZElem {
                    reg: rn(word),
                    esz: elem,
                    index,
                },
                None => Operand::ZReg {
                    reg: rn(word),
                    esz: None,
                },
            };
            let dst = match ElementSize::from_log2(log2 as i32) {
                Some(elem) => z(rd(word), elem),
                None => Operand::ZReg {
                    reg: rd(word),
                    esz: None,
                },
            };
            let mut ops = vec![dst, src];
            if log2 == 4 {
                ops.push(Operand::Imm(index as i64));
            }
            Some(Form::new(Opcode::DupX, "dup", args).ops(ops))
        }
        0b100 => {
            let args = Args {
                rd: rd(word),
                rn: rn(word),
                rm: rm(word),
                esz: e,
                ..Args::default()
            };
            Some(Form::new(Opcode::Tbl, "tbl", args).ops(vec![
                z(rd(word), e),
                Operand::ZList {
                    first: rn(word),
                    count: 1,
                    esz: e,
                },
                z(rm(word), e),
            ]))
        }
        0b110 => decode_dup_insr(word),
        _ => None,
    }
}

fn decode_dup_insr(word: u32) -> Option<Form> {
    let e = esz(word);
    let sel = extract(word, 16, 5);
    let base = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rn(word),
        esz: e,
        ..Args::default()
    };
    match sel {
        0b00000 => {
            let src = if e == ElementSize::D {
                xsp(rn(word))
            } else {
                Operand::WReg {
                    reg: rn(word),
                    sp: true,
                }
            };
            Some(Form::new(Opcode::DupS, "mov", base).ops(vec![z(rd(word), e), src]))
        }
        0b00100 => Some(
            Form::new(Opcode::InsrR, "insr", base).ops(vec![z(rd(word), e), scalar(e, rn(word))]),
        ),
        0b10100 => Some(
            Form::new(Opcode::InsrF, "insr", base).ops(vec![z(rd(word), e), v(rn(word), e)]),
        ),
        0b11000 => {
            Some(Form::new(Opcode::RevV, "rev", base).ops(vec![z(rd(word), e), z(rn(word), e)]))
        }
        0b10000..=0b10011 => {
            let src_esz = ElementSize::from_log2(e.log2() as i32 - 1)?;
            let unsigned = bit(word, 17);
            let high = bit(word, 16);
            let args = Args {
                src_esz,
                unsigned,
                high,
                ..base
            };
            let name = format!(
                "{}unpk{}",
                if unsigned { "u" } else { "s" },
                if high { "hi" } else { "lo" }
            );
            Some(Form::new(Opcode::Unpk, name, args).ops(vec![z(rd(word), e), z(rn(word), src_esz)]))
        }
        _ => None,
    }
}

fn permute_name(opc: u32) -> Option<(&'static str, bool)> {
    match opc {
        0b000 => Some(("zip1", false)),
        0b001 => Some(("zip2", true)),
        0b010 => Some(("uzp1", false)),
        0b011 => Some(("uzp2", true)),
        0b100 => Some(("trn1", false)),
        0b101 => Some(("trn2", true)),
        _ => None,
    }
}

fn decode_pred_permute(word: u32) -> Option<Form> {
    if bit(word, 9) || bit(word, 4) {
        return None;
    }
    let e = esz(word);
    let pn = extract(word, 5, 4) as u8;
    let dst = pd(word);
    if !bit(word, 20) {
        let opc = extract(word, 10, 3);
        let (mnemonic, high) = permute_name(opc)?;
        let opcode = match opc >> 1 {
            0b00 => Opcode::ZipP,
            0b01 => Opcode::UzpP,
            _ => Opcode::TrnP,
        };
        let pm_reg = extract(word, 16, 4) as u8;
        let args = Args {
            rd: dst,
            rn: pn,
            rm: pm_reg,
            esz: e,
            high,
            ..Args::default()
        };
        return Some(Form::new(opcode, mnemonic, args).ops(vec![
            ps(dst, e),
            ps(pn, e),
            ps(pm_reg, e),
        ]));
    }
    if extract(word, 10, 3) != 0 {
        return None;
    }
    let args = Args {
        rd: dst,
        rn: pn,
        esz: e,
        ..Args::default()
    };
    match extract(word, 16, 4) {
        0b0100 => Some(Form::new(Opcode::RevP, "rev", args).ops(vec![ps(dst, e), ps(pn, e)])),
        0b0000 | 0b0001 if e == ElementSize::B => {
            let high = bit(word, 16);
            let args = Args { high, ..args };
            let name = if high { "punpkhi" } else { "punpklo" };
            Some(Form::new(Opcode::Punpk, name, args).ops(vec![
                ps(dst, ElementSize::H),
                ps(pn, ElementSize::B),
            ]))
        }
        _ => None,
    }
}

fn decode_vec_permute(word: u32) -> Option<Form> {
    let e = esz(word);
    let opc = extract(word, 10, 3);
    let (mnemonic, high) = permute_name(opc)?;
    let opcode = match opc >> 1 {
        0b00 => Opcode::ZipZ,
        0b01 => Opcode::UzpZ,
        _ => Opcode::TrnZ,
    };
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        esz: e,
        high,
        ..Args::default()
    };
    Some(Form::new(opcode, mnemonic, args).ops(vec![
        z(rd(word), e),
        z(rn(word), e),
        z(rm(word), e),
    ]))
}

fn decode_pred_zpz(word: u32) -> Option<Form> {
    let e = esz(word);
    let pg = pg3(word);
    let base = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rn(word),
        pg,
        esz: e,
        ..Args::default()
    };
    let sel = extract(word, 16, 5);
    let after = sel & 1 == 0;
    match sel {
        0b00000 => Some(Form::new(Opcode::CpyMV, "mov", base).ops(vec![
            z(rd(word), e),
            pm(pg),
            v(rn(word), e),
        ])),
        0b00001 => Some(Form::new(Opcode::Compact, "compact", base).ops(vec![
            z(rd(word), e),
            p(pg),
            z(rn(word), e),
        ])),
        0b00010 | 0b00011 => {
            let args = Args { after, ..base };
            let name = if after { "lasta" } else { "lastb" };
            Some(Form::new(Opcode::LastV, name, args).ops(vec![v(rd(word), e), p(pg), z(rn(word), e)]))
        }
        0b00100..=0b00111 => {
            let (opcode, mnemonic) = match sel {
                0b00100 => (Opcode::Revb, "revb"),
                0b00101 => (Opcode::Revh, "revh"),
                0b00110 => (Opcode::Revw, "revw"),
                _ => (Opcode::Rbit, "rbit"),
            };
            Some(Form::new(opcode, mnemonic, base).ops(vec![
                z(rd(word), e),
                pm(pg),
                z(rn(word), e),
            ]))
        }
        0b01000 | 0b01001 => {
            let args = Args {
                rn: rd(word),
                after,
                ..base
            };
            let name = if after { "clasta" } else { "clastb" };
            Some(Form::new(Opcode::ClastZ, name, args).ops(vec![
                z(rd(word), e),
                p(pg),
                z(rd(word), e),
                z(rn(word), e),
            ]))
        }
        0b01010 | 0b01011 => {
            let args = Args {
                rn: rd(word),
                after,
                ..base
            };
            let name = if after { "clasta" } else { "clastb" };
            Some(Form::new(Opcode::ClastV, name, args).ops(vec![
                v(rd(word), e),
                p(pg),
                v(rd(word), e),
                z(rn(word), e),
            ]))
        }
        0b01100 => {
            let args = Args {
                rn: rd(word),
                ..base
            };
            Some(Form::new(Opcode::Splice, "splice", args).ops(vec![
                z(rd(word), e),
                p(pg),
                z(rd(word), e),
                z(rn(word), e),
            ]))
        }
        _ => None,
    }
}

fn decode_pred_rpz(word: u32) -> Option<Form> {
    let e = esz(word);
    let pg = pg3(word);
    let sel = extract(word, 16, 5);
    let after = sel & 1 == 0;
    let base = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rn(word),
        pg,
        esz: e,
        sf: e == ElementSize::D,
        ..Args::default()
    };
    match sel {
        0b00000 | 0b00001 => {
            let args = Args { after, ..base };
            let name = if after { "lasta" } else { "lastb" };
            Some(Form::new(Opcode::LastR, name, args).ops(vec![
                scalar(e, rd(word)),
                p(pg),
                z(rn(word), e),
            ]))
        }
        0b01000 => {
            let src = if e == ElementSize::D {
                xsp(rn(word))
            } else {
                Operand::WReg {
                    reg: rn(word),
                    sp: true,
                }
            };
            Some(Form::new(Opcode::CpyMR, "mov", base).ops(vec![z(rd(word), e), pm(pg), src]))
        }
        0b10000 | 0b10001 => {
            let args = Args {
                rn: rd(word),
                after,
                ..base
            };
            let name = if after { "clasta" } else { "clastb" };
            Some(Form::new(Opcode::ClastR, name, args).ops(vec![
                scalar(e, rd(word)),
                p(pg),
                scalar(e, rd(word)),
                z(rn(word), e),
            ]))
        }
        _ => None,
    }
}

fn decode_sel(word: u32) -> Option<Form> {
    let e = esz(word);
    let pg = pg4(word);
    let args = Args {
        rd: rd(word),
        rn: rn(word),
        rm: rm(word),
        pg,
        esz: e,
        ..Args::default()
    };
    if rd(word) == rm(word) {
        return Some(Form::new(Opcode::SelZpzz, "mov", args).ops(vec![
            z(rd(word), e),
            pm(pg),
            z(rn(word), e),
        ]));
    }
    Some(Form::new(Opcode::SelZpzz, "sel", args).ops(vec![
        z(rd(word), e),
        p(pg),
        z(rn(word), e),
        z(rm(word), e),
    ]))
}
