//! Loads and stores.
//!
//! Loads gather every lane into a buffer before anything is written back,
//! so a faulting load leaves the destination registers untouched. Stores
//! write lane by lane in ascending order; a fault stops the store with the
//! earlier lanes already performed.
//!
//! First-fault and non-fault loads never report a fault past the point the
//! architecture allows. Instead the lane that would have faulted, and every
//! lane after it, are zeroed in the destination and cleared in FFR.

use crate::lanes;
use crate::memory::GuestMemory;
use crate::ops::{Address, GatherAddr, LoadMode};
use crate::regfile::{Offset, RegisterFile};
use crate::EmulationResult;
use log::debug;
use svemu_core::ElementSize;

fn effective(regs: &RegisterFile, addr: &Address) -> u64 {
    let index = addr.index.map_or(0, |r| regs.gpr(r) << addr.shift);
    regs.gpr(addr.base)
        .wrapping_add(index)
        .wrapping_add(addr.disp as u64)
}

fn msz_size(msz: u32) -> ElementSize {
    match msz {
        0 => ElementSize::B,
        1 => ElementSize::H,
        2 => ElementSize::S,
        _ => ElementSize::D,
    }
}

/// Clears FFR from lane `lane` of size `esz` upward.
fn truncate_ffr(regs: &mut RegisterFile, esz: ElementSize, lane: usize) {
    let ffr = regs.ffr_offset();
    let first_bit = lane << esz.log2();
    let words: Vec<u64> = regs
        .pred_words(ffr)
        .into_iter()
        .enumerate()
        .map(|(w, word)| {
            let lo = w * 64;
            if first_bit <= lo {
                0
            } else if first_bit >= lo + 64 {
                word
            } else {
                word & ((1u64 << (first_bit - lo)) - 1)
            }
        })
        .collect();
    regs.set_pred_words(ffr, &words);
}

/// Performs the lane accesses of a load. `addrs[i]` holds the addresses of
/// lane `i` (one per register for structure loads). Returns the loaded,
/// extended values indexed `[register][lane]`.
#[allow(clippy::too_many_arguments)]
fn load_lanes(
    regs: &mut RegisterFile,
    mem: &dyn GuestMemory,
    esz: ElementSize,
    msz: u32,
    signed: bool,
    pg: Offset,
    addrs: &[Vec<u64>],
    mode: LoadMode,
) -> EmulationResult<Vec<Vec<u64>>> {
    let nregs = addrs.first().map_or(1, Vec::len);
    let mut out = vec![vec![0u64; addrs.len()]; nregs];
    let mut first_active = true;
    for (i, lane_addrs) in addrs.iter().enumerate() {
        if !regs.lane_active(pg, esz, i) {
            continue;
        }
        for (r, &address) in lane_addrs.iter().enumerate() {
            match mem.read_uint(address, 1 << msz) {
                Ok(v) => out[r][i] = lanes::extend(v, msz_size(msz), signed, esz),
                Err(err) => {
                    let suppress = match mode {
                        LoadMode::Normal => false,
                        LoadMode::FirstFault => !first_active,
                        LoadMode::NonFault => true,
                    };
                    if !suppress {
                        return Err(err);
                    }
                    debug!("suppressed fault at {:#x}, lane {}: truncating FFR", address, i);
                    truncate_ffr(regs, esz, i);
                    for lane in out.iter_mut() {
                        lane[i..].fill(0);
                    }
                    return Ok(out);
                }
            }
        }
        first_active = false;
    }
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
pub(super) fn load_contig(
    regs: &mut RegisterFile,
    mem: &dyn GuestMemory,
    esz: ElementSize,
    msz: u32,
    signed: bool,
    dsts: &[Offset],
    addr: &Address,
    pg: Offset,
    mode: LoadMode,
) -> EmulationResult<()> {
    let base = effective(regs, addr);
    let nregs = dsts.len();
    let n = regs.vector_length().elements(esz);
    let addrs: Vec<Vec<u64>> = (0..n)
        .map(|i| {
            (0..nregs)
                .map(|r| base.wrapping_add(((i * nregs + r) as u64) << msz))
                .collect()
        })
        .collect();
    let values = load_lanes(regs, mem, esz, msz, signed, pg, &addrs, mode)?;
    for (&dst, lanes) in dsts.iter().zip(&values) {
        regs.set_elems(dst, esz, lanes);
    }
    Ok(())
}

pub(super) fn store_contig(
    regs: &RegisterFile,
    mem: &mut dyn GuestMemory,
    esz: ElementSize,
    msz: u32,
    srcs: &[Offset],
    addr: &Address,
    pg: Offset,
) -> EmulationResult<()> {
    let base = effective(regs, addr);
    let nregs = srcs.len();
    for i in 0..regs.vector_length().elements(esz) {
        if !regs.lane_active(pg, esz, i) {
            continue;
        }
        for (r, &src) in srcs.iter().enumerate() {
            let address = base.wrapping_add(((i * nregs + r) as u64) << msz);
            mem.write_uint(address, regs.elem(src, esz, i), 1 << msz)?;
        }
    }
    Ok(())
}

/// LD1R: one element, read only if some lane is active.
#[allow(clippy::too_many_arguments)]
pub(super) fn load_broadcast(
    regs: &mut RegisterFile,
    mem: &dyn GuestMemory,
    esz: ElementSize,
    msz: u32,
    signed: bool,
    dst: Offset,
    addr: &Address,
    pg: Offset,
) -> EmulationResult<()> {
    let n = regs.vector_length().elements(esz);
    let any = (0..n).any(|i| regs.lane_active(pg, esz, i));
    let value = if any {
        let raw = mem.read_uint(effective(regs, addr), 1 << msz)?;
        lanes::extend(raw, msz_size(msz), signed, esz)
    } else {
        0
    };
    let out: Vec<u64> = (0..n)
        .map(|i| if regs.lane_active(pg, esz, i) { value } else { 0 })
        .collect();
    regs.set_elems(dst, esz, &out);
    Ok(())
}

/// LD1RQ: a predicated 16-byte block, replicated to every quadword.
pub(super) fn load_quad(
    regs: &mut RegisterFile,
    mem: &dyn GuestMemory,
    esz: ElementSize,
    dst: Offset,
    addr: &Address,
    pg: Offset,
) -> EmulationResult<()> {
    let base = effective(regs, addr);
    let per_quad = 16 / esz.bytes();
    let mut quad = Vec::with_capacity(per_quad);
    for j in 0..per_quad {
        let value = if regs.lane_active(pg, esz, j) {
            mem.read_uint(base.wrapping_add((j * esz.bytes()) as u64), esz.bytes())?
        } else {
            0
        };
        quad.push(value);
    }
    let n = regs.vector_length().elements(esz);
    let out: Vec<u64> = (0..n).map(|i| quad[i % per_quad]).collect();
    regs.set_elems(dst, esz, &out);
    Ok(())
}

fn gather_addrs(regs: &RegisterFile, esz: ElementSize, addr: &GatherAddr) -> Vec<u64> {
    let n = regs.vector_length().elements(esz);
    match *addr {
        GatherAddr::ScalarPlusVector {
            base,
            offsets,
            extend,
            shift,
        } => {
            let base = regs.gpr(base);
            (0..n)
                .map(|i| base.wrapping_add(extend.apply(regs.elem(offsets, esz, i)) << shift))
                .collect()
        }
        GatherAddr::VectorPlusImm { bases, imm } => (0..n)
            .map(|i| regs.elem(bases, esz, i).wrapping_add(imm))
            .collect(),
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn load_gather(
    regs: &mut RegisterFile,
    mem: &dyn GuestMemory,
    esz: ElementSize,
    msz: u32,
    signed: bool,
    dst: Offset,
    addr: &GatherAddr,
    pg: Offset,
    mode: LoadMode,
) -> EmulationResult<()> {
    let addrs: Vec<Vec<u64>> = gather_addrs(regs, esz, addr)
        .into_iter()
        .map(|a| vec![a])
        .collect();
    let values = load_lanes(regs, mem, esz, msz, signed, pg, &addrs, mode)?;
    if let Some(lanes) = values.first() {
        regs.set_elems(dst, esz, lanes);
    }
    Ok(())
}

pub(super) fn store_scatter(
    regs: &RegisterFile,
    mem: &mut dyn GuestMemory,
    esz: ElementSize,
    msz: u32,
    src: Offset,
    addr: &GatherAddr,
    pg: Offset,
) -> EmulationResult<()> {
    for (i, address) in gather_addrs(regs, esz, addr).into_iter().enumerate() {
        if regs.lane_active(pg, esz, i) {
            mem.write_uint(address, regs.elem(src, esz, i), 1 << msz)?;
        }
    }
    Ok(())
}

pub(super) fn load_reg(
    regs: &mut RegisterFile,
    mem: &dyn GuestMemory,
    dst: Offset,
    len: usize,
    addr: &Address,
) -> EmulationResult<()> {
    let mut buf = vec![0u8; len];
    mem.read(effective(regs, addr), &mut buf)?;
    regs.bytes_mut(dst, len).copy_from_slice(&buf);
    Ok(())
}

pub(super) fn store_reg(
    regs: &RegisterFile,
    mem: &mut dyn GuestMemory,
    src: Offset,
    len: usize,
    addr: &Address,
) -> EmulationResult<()> {
    mem.write(effective(regs, addr), regs.bytes(src, len))
}
