//! Compares and predicate operations (bits [31:24] = 0x24, 0x25).

use super::{esz, p, ps, pz, w, x, z, Form};
use crate::fields::{bit, extract, pd, pg3, pg4, rd, rm, rn, sextract};
use crate::immediates::{expand_imm_sh8s, expand_imm_sh8u, fp_bits_to_f64, vfp_expand_imm};
use svemu_core::{Args, Cond, ElementSize, Opcode, Operand};

pub(crate) fn decode(word: u32) -> Option<Form> {
    if word >> 24 == 0x24 {
        return decode_cmp_vec(word);
    }
    let b21 = bit(word, 21);
    match (b21, extract(word, 14, 2)) {
        (false, 0b00) | (false, 0b10) => decode_cmp_simm(word),
        (false, 0b01) if !bit(word, 20) => decode_pred_logical(word),
        (false, 0b01) => decode_brk(word),
        (false, 0b11) if !bit(word, 20) => decode_brkp(word),
        (false, 0b11) => decode_pred_misc(word),
        (true, 0b00) => decode_while_cterm(word),
        (true, 0b10) => decode_pred_count(word),
        (true, 0b11) => decode_wide_imm(word),
        _ => None,
    }
}

// ==== Compares ====

fn cmp_form(word: u32, opcode: Opcode, cond: Cond, rhs: Operand, args: Args) -> Form {
    let e = args.esz;
    let mnemonic = format!("cmp{}", cond.name());
    Form::new(opcode, mnemonic, args).ops(vec![
        ps(pd(word), e),
        pz(pg3(word)),
        z(rn(word), e),
        rhs,
    ])
}

fn decode_cmp_vec(word: u32) -> Option<Form> {
    let e = esz(word);
    let ne = bit(word, 4);
    let base = Args {
        rd: pd(word),
        rn: rn(word),
        pg: pg3(word),
        esz: e,
        set_flags: true,
        ..Args::default()
    };

    if bit(word, 21) {
        let imm = extract(word, 14, 7) as i64;
        let cond = match (bit(word, 13), ne) {
            (false, false) => Cond::Hs,
            (false, true) => Cond::Hi,
            (true, false) => Cond::Lo,
            (true, true) => Cond::Ls,
        };
        let args = Args { imm, cond, ..base };
        return Some(cmp_form(word, Opcode::CmpPpzi, cond, Operand::Imm(imm), args));
    }

    let (cond, wide) = match (extract(word, 13, 3), ne) {
        (0b000, false) => (Cond::Hs, false),
        (0b000, true) => (Cond::Hi, false),
        (0b001, false) => (Cond::Eq, true),
        (0b001, true) => (Cond::Ne, true),
        (0b010, false) => (Cond::Ge, true),
        (0b010, true) => (Cond::Gt, true),
        (0b011, false) => (Cond::Lt, true),
        (0b011, true) => (Cond::Le, true),
        (0b100, false) => (Cond::Ge, false),
        (0b100, true) => (Cond::Gt, false),
        (0b101, false) => (Cond::Eq, false),
        (0b101, true) => (Cond::Ne, false),
        (0b110, false) => (Cond::Hs, true),
        (0b110, true) => (Cond::Hi, true),
        (0b111, false) => (Cond::Lo, true),
        _ => (Cond::Ls, true),
    };
    let args = Args {
        rm: rm(word),
        cond,
        ..base
    };
    if wide {
        if e == ElementSize::D {
            return None;
        }
        Some(cmp_form(word, Opcode::CmpPpzw, cond, z(rm(word), ElementSize::D), args))
    } else {
        Some(cmp_form(word, Opcode::CmpPpzz, cond, z(rm(word), e), args))
    }
}

fn decode_cmp_simm(word: u32) -> Option<Form> {
    let ne = bit(word, 4);
    let cond = match (extract(word, 13, 3), ne) {
        (0b000, false) => Cond::Ge,
        (0b000, true) => Cond::Gt,
        (0b001, false) => Cond::Lt,
        (0b001, true) => Cond::Le,
        (0b100, false) => Cond::Eq,
        (0b100, true) => Cond::Ne,
        _ => return None,
    };
    let imm = sextract(word, 16, 5) as i64;
    let args = Args {
        rd: pd(word),
        rn: rn(word),
        pg: pg3(word),
        esz: esz(word),
        imm,
        cond,
        set_flags: true,
        ..Args::default()
    };
    Some(cmp_form(word, Opcode::CmpPpzi, cond, Operand::Imm(imm), args))
}

// ==== Predicate logical and breaks ====

fn flag_suffix(name: &str, s: bool) -> String {
    if s {
        format!("{}s", name)
    } else {
        name.to_string()
    }
}

fn decode_pred_logical(word: u32) -> Option<Form> {
    let s = bit(word, 22);
    let key = (bit(word, 23), bit(word, 9), bit(word, 4));
    let (opcode, name) = match key {
        (false, false, false) => (Opcode::AndPppp, "and"),
        (false, false, true) => (Opcode::BicPppp, "bic"),
        (false, true, false) => (Opcode::EorPppp, "eor"),
        (false, true, true) => (Opcode::SelPppp, "sel"),
        (true, false, false) => (Opcode::OrrPppp, "orr"),
        (true, false, true) => (Opcode::OrnPppp, "orn"),
        (true, true, false) => (Opcode::NorPppp, "nor"),
        (true, true, true) => (Opcode::NandPppp, "nand"),
    };
    if s && opcode == Opcode::SelPppp {
        return None;
    }
    let pg = pg4(word);
    let pn = extract(word, 5, 4) as u8;
    let pm_reg = extract(word, 16, 4) as u8;
    let args = Args {
        rd: pd(word),
        rn: pn,
        rm: pm_reg,
        pg,
        esz: ElementSize::B,
        set_flags: s,
        ..Args::default()
    };
    let b = ElementSize::B;
    let gov = if opcode == Opcode::SelPppp { p(pg) } else { pz(pg) };
    Some(Form::new(opcode, flag_suffix(name, s), args).ops(vec![
        ps(pd(word), b),
        gov,
        ps(pn, b),
        ps(pm_reg, b),
    ]))
}

fn decode_brkp(word: u32) -> Option<Form> {
    if bit(word, 23) || bit(word, 9) {
        return None;
    }
    let s = bit(word, 22);
    let after = !bit(word, 4);
    let pg = pg4(word);
    let pn = extract(word, 5, 4) as u8;
    let pm_reg = extract(word, 16, 4) as u8;
    let args = Args {
        rd: pd(word),
        rn: pn,
        rm: pm_reg,
        pg,
        esz: ElementSize::B,
        set_flags: s,
        after,
        ..Args::default()
    };
    let opcode = if after { Opcode::Brkpa } else { Opcode::Brkpb };
    let name = if after { "brkpa" } else { "brkpb" };
    let b = ElementSize::B;
    Some(Form::new(opcode, flag_suffix(name, s), args).ops(vec![
        ps(pd(word), b),
        pz(pg),
        ps(pn, b),
        ps(pm_reg, b),
    ]))
}

fn decode_brk(word: u32) -> Option<Form> {
    if bit(word, 9) {
        return None;
    }
    let s = bit(word, 22);
    let pg = pg4(word);
    let pn = extract(word, 5, 4) as u8;
    let b = ElementSize::B;
    match extract(word, 16, 4) {
        0b0000 => {
            let after = !bit(word, 23);
            let merge = bit(word, 4);
            if merge && s {
                return None;
            }
            let args = Args {
                rd: pd(word),
                rn: pn,
                pg,
                esz: b,
                set_flags: s,
                merge,
                after,
                ..Args::default()
            };
            let opcode = if after { Opcode::Brka } else { Opcode::Brkb };
            let name = if after { "brka" } else { "brkb" };
            let gov = if merge {
                super::pm(pg)
            } else {
                pz(pg)
            };
            Some(Form::new(opcode, flag_suffix(name, s), args).ops(vec![
                ps(pd(word), b),
                gov,
                ps(pn, b),
            ]))
        }
        0b1000 if !bit(word, 23) && !bit(word, 4) => {
            let args = Args {
                rd: pd(word),
                rn: pn,
                rm: pd(word),
                pg,
                esz: b,
                set_flags: s,
                ..Args::default()
            };
            Some(Form::new(Opcode::Brkn, flag_suffix("brkn", s), args).ops(vec![
                ps(pd(word), b),
                pz(pg),
                ps(pn, b),
                ps(pd(word), b),
            ]))
        }
        _ => None,
    }
}

fn decode_pred_misc(word: u32) -> Option<Form> {
    let e = esz(word);
    let sel = extract(word, 16, 4);
    let op = extract(word, 10, 6);
    let dst = pd(word);
    let low_pg = extract(word, 5, 4) as u8;
    let base = Args {
        rd: dst,
        esz: e,
        ..Args::default()
    };
    match (sel, op) {
        (0b0000, 0b110000..=0b111111) => {
            if extract(word, 22, 2) != 0b01 || bit(word, 9) || extract(word, 0, 5) != 0 {
                return None;
            }
            let args = Args {
                rn: low_pg,
                pg: pg4(word),
                esz: ElementSize::B,
                set_flags: true,
                ..base
            };
            Some(Form::new(Opcode::Ptest, "ptest", args).ops(vec![
                p(pg4(word)),
                ps(low_pg, ElementSize::B),
            ]))
        }
        (0b1000, 0b111000) | (0b1001, 0b111000) => {
            if bit(word, 4) {
                return None;
            }
            let s = sel & 1 != 0;
            let pattern = extract(word, 5, 5) as u8;
            let args = Args {
                pattern,
                set_flags: s,
                ..base
            };
            let mut ops = vec![ps(dst, e)];
            if pattern != 0x1f {
                ops.push(Operand::Pattern(pattern));
            }
            Some(Form::new(Opcode::Ptrue, flag_suffix("ptrue", s), args).ops(ops))
        }
        (0b1000, 0b111001) => {
            if extract(word, 22, 2) != 0 || extract(word, 4, 6) != 0 {
                return None;
            }
            Some(Form::new(Opcode::Pfalse, "pfalse", base).ops(vec![ps(dst, ElementSize::B)]))
        }
        (0b1000, 0b111100) => {
            if bit(word, 23) || bit(word, 9) || bit(word, 4) {
                return None;
            }
            let s = bit(word, 22);
            let args = Args {
                pg: low_pg,
                esz: ElementSize::B,
                set_flags: s,
                ..base
            };
            Some(Form::new(Opcode::RdffrP, flag_suffix("rdffr", s), args).ops(vec![
                ps(dst, ElementSize::B),
                pz(low_pg),
            ]))
        }
        (0b1001, 0b111100) => {
            if extract(word, 22, 2) != 0 || extract(word, 4, 6) != 0 {
                return None;
            }
            Some(Form::new(Opcode::Rdffr, "rdffr", base).ops(vec![ps(dst, ElementSize::B)]))
        }
        (0b1000, 0b110000) => {
            if extract(word, 22, 2) != 0b01 || bit(word, 9) || bit(word, 4) {
                return None;
            }
            let args = Args {
                rn: dst,
                pg: low_pg,
                esz: ElementSize::B,
                set_flags: true,
                ..base
            };
            Some(Form::new(Opcode::Pfirst, "pfirst", args).ops(vec![
                ps(dst, ElementSize::B),
                p(low_pg),
                ps(dst, ElementSize::B),
            ]))
        }
        (0b1001, 0b110001) => {
            if bit(word, 9) || bit(word, 4) {
                return None;
            }
            let args = Args {
                rn: dst,
                pg: low_pg,
                set_flags: true,
                ..base
            };
            Some(Form::new(Opcode::Pnext, "pnext", args).ops(vec![
                ps(dst, e),
                p(low_pg),
                ps(dst, e),
            ]))
        }
        _ => None,
    }
}

// ==== Scalar/predicate interactions ====

fn decode_while_cterm(word: u32) -> Option<Form> {
    let e = esz(word);
    match extract(word, 13, 3) {
        0b000 if bit(word, 10) => {
            let sf = bit(word, 12);
            let unsigned = bit(word, 11);
            let eq = bit(word, 4);
            let args = Args {
                rd: pd(word),
                rn: rn(word),
                rm: rm(word),
                esz: e,
                sf,
                unsigned,
                eq,
                set_flags: true,
                ..Args::default()
            };
            let name = match (unsigned, eq) {
                (false, false) => "whilelt",
                (false, true) => "whilele",
                (true, false) => "whilelo",
                (true, true) => "whilels",
            };
            let reg = |r| if sf { x(r) } else { w(r) };
            Some(Form::new(Opcode::While, name, args).ops(vec![
                ps(pd(word), e),
                reg(rn(word)),
                reg(rm(word)),
            ]))
        }
        0b001 => {
            if !bit(word, 23) || extract(word, 10, 3) != 0 || extract(word, 0, 4) != 0 {
                return None;
            }
            let sf = bit(word, 22);
            let ne = bit(word, 4);
            let args = Args {
                rn: rn(word),
                rm: rm(word),
                sf,
                ne,
                set_flags: true,
                ..Args::default()
            };
            let name = if ne { "ctermne" } else { "ctermeq" };
            let reg = |r| if sf { x(r) } else { w(r) };
            Some(Form::new(Opcode::Cterm, name, args).ops(vec![reg(rn(word)), reg(rm(word))]))
        }
        _ => None,
    }
}

fn decode_pred_count(word: u32) -> Option<Form> {
    let e = esz(word);
    let dst = rd(word);
    let low_pg = extract(word, 5, 4) as u8;

    if word == 0x252c_9000 {
        return Some(Form::new(Opcode::Setffr, "setffr", Args::default()));
    }
    if word & 0xffff_fe1f == 0x2528_9000 {
        let args = Args {
            rn: low_pg,
            ..Args::default()
        };
        return Some(Form::new(Opcode::Wrffr, "wrffr", args).ops(vec![ps(low_pg, ElementSize::B)]));
    }

    let op5 = extract(word, 11, 5);
    if extract(word, 16, 5) == 0 && extract(word, 14, 2) == 0b10 {
        if bit(word, 9) {
            return None;
        }
        let args = Args {
            rd: dst,
            rn: low_pg,
            pg: pg4(word),
            esz: e,
            sf: true,
            ..Args::default()
        };
        return Some(Form::new(Opcode::Cntp, "cntp", args).ops(vec![
            x(dst),
            p(pg4(word)),
            ps(low_pg, e),
        ]));
    }
    if op5 != 0b10000 && op5 != 0b10001 {
        return None;
    }
    let to_reg = op5 == 0b10001;
    let base = Args {
        rd: dst,
        rn: dst,
        pg: low_pg,
        esz: e,
        ..Args::default()
    };

    if extract(word, 17, 4) == 0b0110 {
        if extract(word, 9, 2) != 0 {
            return None;
        }
        let decrement = bit(word, 16);
        let name = if decrement { "decp" } else { "incp" };
        let args = Args { decrement, sf: true, ..base };
        if to_reg {
            return Some(Form::new(Opcode::IncdecpR, name, args).ops(vec![x(dst), ps(low_pg, e)]));
        }
        if e == ElementSize::B {
            return None;
        }
        return Some(Form::new(Opcode::IncdecpZ, name, args).ops(vec![z(dst, e), ps(low_pg, e)]));
    }

    if extract(word, 18, 3) == 0b010 {
        let decrement = bit(word, 17);
        let unsigned = bit(word, 16);
        let name = format!(
            "{}{}p",
            if unsigned { "uq" } else { "sq" },
            if decrement { "dec" } else { "inc" }
        );
        let args = Args {
            decrement,
            unsigned,
            ..base
        };
        if !to_reg {
            if extract(word, 9, 2) != 0 || e == ElementSize::B {
                return None;
            }
            return Some(Form::new(Opcode::SincdecpZ, name, args).ops(vec![z(dst, e), ps(low_pg, e)]));
        }
        return match extract(word, 9, 2) {
            0b00 => {
                let args = Args { sf: false, ..args };
                let ops = if unsigned {
                    vec![w(dst), ps(low_pg, e)]
                } else {
                    vec![x(dst), ps(low_pg, e), w(dst)]
                };
                Some(Form::new(Opcode::SincdecpR32, name, args).ops(ops))
            }
            0b10 => {
                let args = Args { sf: true, ..args };
                Some(Form::new(Opcode::SincdecpR64, name, args).ops(vec![x(dst), ps(low_pg, e)]))
            }
            _ => None,
        };
    }
    None
}

// ==== Unpredicated immediates ====

fn decode_wide_imm(word: u32) -> Option<Form> {
    let e = esz(word);
    let dst = rd(word);
    let sh = bit(word, 13);
    let imm9 = extract(word, 5, 9);
    let base = Args {
        rd: dst,
        rn: dst,
        esz: e,
        ..Args::default()
    };

    match extract(word, 19, 2) {
        0b00 => {
            if sh && e == ElementSize::B {
                return None;
            }
            let (opcode, name) = match extract(word, 16, 3) {
                0b000 => (Opcode::AddZzi, "add"),
                0b001 => (Opcode::SubZzi, "sub"),
                0b011 => (Opcode::SubrZzi, "subr"),
                0b100 => (Opcode::SqaddZzi, "sqadd"),
                0b101 => (Opcode::UqaddZzi, "uqadd"),
                0b110 => (Opcode::SqsubZzi, "sqsub"),
                0b111 => (Opcode::UqsubZzi, "uqsub"),
                _ => return None,
            };
            let imm = expand_imm_sh8u(imm9);
            let args = Args { imm, ..base };
            Some(Form::new(opcode, name, args).ops(vec![z(dst, e), z(dst, e), Operand::Imm(imm)]))
        }
        0b01 => {
            if sh {
                return None;
            }
            let (opcode, name, signed) = match extract(word, 16, 3) {
                0b000 => (Opcode::SmaxZzi, "smax", true),
                0b001 => (Opcode::UmaxZzi, "umax", false),
                0b010 => (Opcode::SminZzi, "smin", true),
                0b011 => (Opcode::UminZzi, "umin", false),
                _ => return None,
            };
            let imm = if signed {
                (imm9 & 0xff) as u8 as i8 as i64
            } else {
                (imm9 & 0xff) as i64
            };
            let args = Args { imm, ..base };
            Some(Form::new(opcode, name, args).ops(vec![z(dst, e), z(dst, e), Operand::Imm(imm)]))
        }
        0b10 => {
            if sh || extract(word, 16, 3) != 0 {
                return None;
            }
            let imm = (imm9 & 0xff) as u8 as i8 as i64;
            let args = Args { imm, ..base };
            Some(Form::new(Opcode::MulZzi, "mul", args).ops(vec![
                z(dst, e),
                z(dst, e),
                Operand::Imm(imm),
            ]))
        }
        _ => {
            if extract(word, 17, 2) != 0 {
                return None;
            }
            if !bit(word, 16) {
                if sh && e == ElementSize::B {
                    return None;
                }
                let imm = expand_imm_sh8s(imm9);
                let args = Args { imm, ..base };
                return Some(Form::new(Opcode::DupI, "mov", args).ops(vec![z(dst, e), Operand::Imm(imm)]));
            }
            if sh {
                return None;
            }
            let bits = vfp_expand_imm(e, imm9 & 0xff)?;
            let args = Args {
                imm: bits as i64,
                ..base
            };
            Some(Form::new(Opcode::Fdup, "fmov", args).ops(vec![
                z(dst, e),
                Operand::FImm(fp_bits_to_f64(e, bits)),
            ]))
        }
    }
}
