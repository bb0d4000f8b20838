//! Straight-line execution of instruction words.

use anyhow::{bail, Context, Result};
use svemu_core::ElementSize;
use svemu_emulate::{Emulator, EmulatorConfig, ExecutionResult, Gpr, RegisterFile};

/// Options of the `run` command beyond the emulator configuration.
pub struct RunOptions {
    pub address: u64,
    pub trace: bool,
    pub json: bool,
    pub regs: Vec<String>,
    pub maps: Vec<String>,
    pub loads: Vec<String>,
}

pub fn run(config: EmulatorConfig, words: &[u32], options: &RunOptions) -> Result<()> {
    let mut emu = Emulator::new(config).context("Invalid emulator configuration")?;

    for entry in &options.maps {
        let (base, size) = parse_map(entry)?;
        emu.memory_mut().map_region(base, size);
    }
    for entry in &options.loads {
        let (base, path) = entry
            .split_once('=')
            .with_context(|| format!("Invalid load: {}. Use format: 0x1000=file.bin", entry))?;
        let base = crate::parse_hex(base).map_err(anyhow::Error::msg)?;
        let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path))?;
        emu.memory_mut().load_section(base, &data);
    }
    for entry in &options.regs {
        let (reg, value) = parse_reg_assignment(entry)?;
        emu.regs_mut().set_gpr(reg, value);
    }

    let result = emu.run_words(options.address, words)?;

    if options.json {
        let output = serde_json::json!({
            "result": result,
            "registers": emu.regs().snapshot(),
            "trace": emu.trace(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if options.trace {
            print_trace(&emu);
        }
        print_run_result(&result, emu.regs());
    }
    Ok(())
}

/// Parses a register assignment such as `x0=0x1234` or `sp=0x8000`.
fn parse_reg_assignment(s: &str) -> Result<(Gpr, u64)> {
    let Some((name, value)) = s.split_once('=') else {
        bail!("Invalid register assignment: {}. Use format: x0=0x1234", s);
    };
    let name = name.to_lowercase();
    let reg = match name.as_str() {
        "sp" => Gpr::Sp,
        _ => {
            let num = name
                .strip_prefix('x')
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|&n| n < 31);
            match num {
                Some(n) => Gpr::X(n),
                None => bail!("Unknown register: {}", name),
            }
        }
    };
    let value = crate::parse_hex(value)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Invalid hex value: {}", value))?;
    Ok((reg, value))
}

/// Parses `base:size`, both in hex.
fn parse_map(s: &str) -> Result<(u64, u64)> {
    let Some((base, size)) = s.split_once(':') else {
        bail!("Invalid mapping: {}. Use format: 0x1000:0x2000", s);
    };
    let base = crate::parse_hex(base).map_err(anyhow::Error::msg)?;
    let size = crate::parse_hex(size).map_err(anyhow::Error::msg)?;
    Ok((base, size))
}

fn print_trace(emu: &Emulator) {
    let Some(trace) = emu.trace() else {
        return;
    };
    println!("Trace ({} steps)", trace.len());
    for step in &trace.steps {
        println!(
            "  {:#010x}  {:08x}  {:<40} {} ops  {}",
            step.address, step.word, step.disassembly, step.op_count, step.flags
        );
    }
    println!();
}

fn print_run_result(result: &ExecutionResult, regs: &RegisterFile) {
    println!("Emulation Results");
    println!("=================");
    println!("Vector length: {} bits", regs.vector_length().bits());
    println!("Instructions executed: {}", result.instruction_count);
    println!("Stop reason: {:?}", result.stop_reason);
    println!("Flags: {}", regs.flags);

    let snapshot = regs.snapshot();
    let nonzero_x: Vec<_> = snapshot.x.iter().enumerate().filter(|(_, &v)| v != 0).collect();
    if !nonzero_x.is_empty() || snapshot.sp != 0 {
        println!("\nGeneral registers:");
        for (i, v) in nonzero_x {
            println!("  x{:<3} {:#018x}", i, v);
        }
        if snapshot.sp != 0 {
            println!("  sp   {:#018x}", snapshot.sp);
        }
    }

    let zregs: Vec<_> = snapshot
        .z
        .iter()
        .enumerate()
        .filter(|(_, z)| z.iter().any(|&b| b != 0))
        .collect();
    if !zregs.is_empty() {
        println!("\nVector registers (.d lanes, lowest first):");
        for (i, _) in zregs {
            let lanes = regs.elems(regs.zreg_offset(i as u8), ElementSize::D);
            let lanes: Vec<String> = lanes.iter().map(|v| format!("{:016x}", v)).collect();
            println!("  z{:<3} {}", i, lanes.join(" "));
        }
    }

    let pregs: Vec<_> = snapshot
        .p
        .iter()
        .enumerate()
        .filter(|(_, p)| p.iter().any(|&b| b != 0))
        .collect();
    if !pregs.is_empty() || snapshot.ffr.iter().any(|&b| b != 0) {
        println!("\nPredicate registers (bytes, lowest first):");
        for (i, p) in pregs {
            println!("  p{:<3} {}", i, hex_bytes(p));
        }
        println!("  ffr  {}", hex_bytes(&snapshot.ffr));
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reg_assignment() {
        assert_eq!(parse_reg_assignment("x3=0x10").unwrap(), (Gpr::X(3), 0x10));
        assert_eq!(parse_reg_assignment("SP=8000").unwrap(), (Gpr::Sp, 0x8000));
        assert!(parse_reg_assignment("x31=1").is_err());
        assert!(parse_reg_assignment("x0").is_err());
        assert!(parse_reg_assignment("x0=zz").is_err());
    }

    #[test]
    fn test_parse_map() {
        assert_eq!(parse_map("0x1000:0x2000").unwrap(), (0x1000, 0x2000));
        assert!(parse_map("0x1000").is_err());
    }
}
