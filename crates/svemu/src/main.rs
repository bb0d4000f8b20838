//! svemu - decode and trace ARM SVE instruction words
//!
//! Usage:
//!   svemu decode <WORD>...          Disassemble instruction words
//!   svemu run <WORD>... [--vl N]    Execute words and print the final state

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "svemu")]
#[command(about = "Decode and trace ARM SVE instruction words", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Disassemble instruction words
    Decode {
        /// Instruction words in hex (e.g. 2518e3e0)
        #[arg(required = true, value_parser = parse_word)]
        words: Vec<u32>,
        /// Address of the first word
        #[arg(short, long, default_value = "0", value_parser = parse_hex)]
        address: u64,
        /// Show the primitive operations each word lowers to
        #[arg(long)]
        ops: bool,
        /// Vector length in bytes used with --ops
        #[arg(long, default_value = "32")]
        vl: usize,
    },
    /// Execute instruction words as straight-line code
    Run {
        /// Instruction words in hex
        #[arg(required = true, value_parser = parse_word)]
        words: Vec<u32>,
        /// Address of the first word
        #[arg(short, long, default_value = "0x1000", value_parser = parse_hex)]
        address: u64,
        /// Emulator configuration (JSON); flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Vector length in bytes
        #[arg(long)]
        vl: Option<usize>,
        /// Maximum number of instructions to execute
        #[arg(short, long)]
        max_instructions: Option<usize>,
        /// Print the execution trace
        #[arg(long)]
        trace: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Set initial register value (format: x0=0x1234, sp=0x8000)
        #[arg(short, long)]
        reg: Vec<String>,
        /// Map zeroed guest memory (format: base:size, in hex)
        #[arg(long)]
        map: Vec<String>,
        /// Load a file into guest memory (format: base=path)
        #[arg(long)]
        load: Vec<String>,
    },
}

pub(crate) fn parse_hex(s: &str) -> Result<u64, String> {
    let s = s.strip_prefix("0x").unwrap_or(s).replace('_', "");
    u64::from_str_radix(&s, 16).map_err(|e| e.to_string())
}

fn parse_word(s: &str) -> Result<u32, String> {
    let value = parse_hex(s)?;
    u32::try_from(value).map_err(|_| format!("{} does not fit in 32 bits", s))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            words,
            address,
            ops,
            vl,
        } => commands::decode(&words, address, ops.then_some(vl)),
        Commands::Run {
            words,
            address,
            config,
            vl,
            max_instructions,
            trace,
            json,
            reg,
            map,
            load,
        } => {
            let mut config = match config {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read config: {}", path.display()))?;
                    serde_json::from_str(&text)
                        .with_context(|| format!("Invalid config: {}", path.display()))?
                }
                None => svemu_emulate::EmulatorConfig::default(),
            };
            if let Some(vl) = vl {
                config.vector_length = vl;
            }
            if let Some(max) = max_instructions {
                config.max_instructions = max;
            }
            config.record_trace |= trace || json;
            if words.is_empty() {
                bail!("No instruction words given");
            }
            let options = commands::RunOptions {
                address,
                trace,
                json,
                regs: reg,
                maps: map,
                loads: load,
            };
            commands::run(config, &words, &options)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word() {
        assert_eq!(parse_word("2518e3e0"), Ok(0x2518_e3e0));
        assert_eq!(parse_word("0x2518_e3e0"), Ok(0x2518_e3e0));
        assert!(parse_word("1_0000_0000").is_err());
        assert!(parse_word("xyz").is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from(["svemu", "run", "2518e3e0", "--vl", "64", "-r", "x0=0x10"]).unwrap();
        match cli.command {
            Commands::Run { words, vl, reg, .. } => {
                assert_eq!(words, vec![0x2518_e3e0]);
                assert_eq!(vl, Some(64));
                assert_eq!(reg, vec!["x0=0x10".to_string()]);
            }
            _ => panic!("expected run"),
        }
    }
}
