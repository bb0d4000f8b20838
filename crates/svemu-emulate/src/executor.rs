//! Executor and straight-line driver.

use crate::helpers;
use crate::memory::{GuestMemory, SparseMemory};
use crate::ops::{Backend, OpSequence};
use crate::regfile::RegisterFile;
use crate::trace::{ExecutionTrace, TraceStep};
use crate::translate::translate;
use crate::{EmulationError, EmulationResult};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use svemu_core::{Instruction, VectorLength};
use svemu_disasm::SveDecoder;

/// Applies a translated operation sequence to a register file and memory.
///
/// Operations run in order; an error aborts the sequence, leaving the
/// effects of the operations before it in place.
pub fn execute(seq: &OpSequence, regs: &mut RegisterFile, mem: &mut dyn GuestMemory) -> EmulationResult<()> {
    let expected = seq.vector_length().bytes();
    let actual = regs.vector_length().bytes();
    if expected != actual {
        return Err(EmulationError::VectorLengthMismatch { expected, actual });
    }
    for op in seq {
        trace!("{:?}", op);
        helpers::apply(op, regs, mem)?;
    }
    Ok(())
}

/// Configuration for the emulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Vector length in bytes.
    pub vector_length: usize,
    /// Maximum number of instructions to execute.
    pub max_instructions: usize,
    /// Record an execution trace.
    pub record_trace: bool,
    /// Stop with [`StopReason::Undefined`] at an unallocated encoding
    /// instead of returning the decode error.
    pub stop_on_unallocated: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            vector_length: 32,
            max_instructions: 10_000,
            record_trace: false,
            stop_on_unallocated: true,
        }
    }
}

impl EmulatorConfig {
    /// Checks the configuration and returns the vector length.
    pub fn validate(&self) -> EmulationResult<VectorLength> {
        Ok(VectorLength::from_bytes(self.vector_length)?)
    }
}

/// Reason why execution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Reached end of provided instructions.
    EndOfInstructions,
    /// Executed maximum instructions.
    MaxInstructions,
    /// Reached an unallocated encoding (a guest undefined instruction).
    Undefined { address: u64, word: u32 },
}

/// Result of executing instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Why execution stopped.
    pub stop_reason: StopReason,
    /// Number of instructions executed.
    pub instruction_count: usize,
    /// Path of executed instruction addresses.
    pub path: Vec<u64>,
}

/// Decodes, translates and executes SVE instructions against one register
/// file and guest memory.
#[derive(Debug)]
pub struct Emulator {
    config: EmulatorConfig,
    decoder: SveDecoder,
    regs: RegisterFile,
    memory: SparseMemory,
    /// Instructions executed since the last reset.
    executed: usize,
    trace: Option<ExecutionTrace>,
}

impl Emulator {
    /// Create a new emulator; fails if the vector length is invalid.
    pub fn new(config: EmulatorConfig) -> EmulationResult<Self> {
        let vl = config.validate()?;
        let regs = RegisterFile::new(vl);
        let trace = config
            .record_trace
            .then(|| ExecutionTrace::new(vl.bytes(), regs.state_hash()));
        Ok(Self {
            config,
            decoder: SveDecoder::new(),
            regs,
            memory: SparseMemory::new(),
            executed: 0,
            trace,
        })
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn vector_length(&self) -> VectorLength {
        self.regs.vector_length()
    }

    /// Get the register file.
    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// Get a mutable reference to the register file.
    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    pub fn memory(&self) -> &SparseMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut SparseMemory {
        &mut self.memory
    }

    /// The trace recorded so far, if tracing is enabled.
    pub fn trace(&self) -> Option<&ExecutionTrace> {
        self.trace.as_ref()
    }

    /// Number of instructions executed since the last reset.
    pub fn instruction_count(&self) -> usize {
        self.executed
    }

    /// Reset registers, memory, counters and trace.
    pub fn reset(&mut self) {
        self.regs = RegisterFile::new(self.regs.vector_length());
        self.memory = SparseMemory::new();
        self.executed = 0;
        if self.trace.is_some() {
            self.trace = Some(ExecutionTrace::new(
                self.regs.vector_length().bytes(),
                self.regs.state_hash(),
            ));
        }
    }

    /// Decode, translate and execute a single instruction word.
    ///
    /// Returns the decoded instruction. Unallocated encodings are returned
    /// as [`EmulationError::Decode`] before any state changes.
    pub fn step(&mut self, address: u64, word: u32) -> EmulationResult<Instruction> {
        if self.executed >= self.config.max_instructions {
            return Err(EmulationError::MaxInstructionsExceeded(self.config.max_instructions));
        }

        let insn = self.decoder.decode(word, address)?;
        let seq = translate(&insn, self.regs.vector_length())?;
        debug!("{:#x}: {} ({} ops)", address, insn, seq.len());

        execute(&seq, &mut self.regs, &mut self.memory)?;
        self.executed += 1;

        if let Some(trace) = self.trace.as_mut() {
            trace.push(TraceStep {
                address,
                word,
                disassembly: insn.to_string(),
                op_count: seq.len(),
                flags: self.regs.flags,
                post_state_hash: self.regs.state_hash(),
            });
        }
        Ok(insn)
    }

    /// Execute consecutive instruction words starting at `base`.
    pub fn run_words(&mut self, base: u64, words: &[u32]) -> EmulationResult<ExecutionResult> {
        let mut path = Vec::with_capacity(words.len());
        let mut instruction_count = 0;

        for (i, &word) in words.iter().enumerate() {
            if self.executed >= self.config.max_instructions {
                return Ok(ExecutionResult {
                    stop_reason: StopReason::MaxInstructions,
                    instruction_count,
                    path,
                });
            }

            let address = base.wrapping_add(4 * i as u64);
            match self.step(address, word) {
                Ok(_) => {}
                Err(EmulationError::Decode(e)) if e.is_unallocated() && self.config.stop_on_unallocated => {
                    debug!("{:#x}: undefined instruction {:08x}", address, word);
                    return Ok(ExecutionResult {
                        stop_reason: StopReason::Undefined { address, word },
                        instruction_count,
                        path,
                    });
                }
                Err(e) => return Err(e),
            }
            path.push(address);
            instruction_count += 1;
        }

        Ok(ExecutionResult {
            stop_reason: StopReason::EndOfInstructions,
            instruction_count,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Op;

    // ptrue p0.b
    const PTRUE_P0_B: u32 = 0x2518_e3e0;
    // ands p1.b, p0/z, p0.b, p0.b
    const ANDS_P1: u32 = 0x2540_4001;
    const UNALLOCATED: u32 = 0x0411_0000;

    #[test]
    fn test_simple_execution() {
        let mut emu = Emulator::new(EmulatorConfig::default()).unwrap();
        let result = emu.run_words(0x1000, &[PTRUE_P0_B, ANDS_P1]).unwrap();

        assert_eq!(result.stop_reason, StopReason::EndOfInstructions);
        assert_eq!(result.instruction_count, 2);
        assert_eq!(result.path, vec![0x1000, 0x1004]);
        assert_eq!(emu.regs().preg(1), &[0xff; 4]);
        let flags = emu.regs().flags;
        assert!(flags.n && !flags.z && !flags.c && !flags.v);
    }

    #[test]
    fn test_stop_at_undefined() {
        let mut emu = Emulator::new(EmulatorConfig::default()).unwrap();
        let result = emu.run_words(0x2000, &[PTRUE_P0_B, UNALLOCATED, ANDS_P1]).unwrap();
        assert_eq!(
            result.stop_reason,
            StopReason::Undefined {
                address: 0x2004,
                word: UNALLOCATED,
            }
        );
        assert_eq!(result.instruction_count, 1);

        let mut emu = Emulator::new(EmulatorConfig {
            stop_on_unallocated: false,
            ..Default::default()
        })
        .unwrap();
        let err = emu.run_words(0x2000, &[UNALLOCATED]).unwrap_err();
        assert!(matches!(err, EmulationError::Decode(e) if e.is_unallocated()));
    }

    #[test]
    fn test_max_instructions() {
        let mut emu = Emulator::new(EmulatorConfig {
            max_instructions: 1,
            ..Default::default()
        })
        .unwrap();
        let result = emu.run_words(0, &[PTRUE_P0_B, ANDS_P1]).unwrap();
        assert_eq!(result.stop_reason, StopReason::MaxInstructions);
        assert_eq!(result.instruction_count, 1);
        assert!(matches!(
            emu.step(8, PTRUE_P0_B),
            Err(EmulationError::MaxInstructionsExceeded(1))
        ));
    }

    #[test]
    fn test_invalid_vector_length() {
        let config = EmulatorConfig {
            vector_length: 24,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(Emulator::new(config).is_err());
    }

    #[test]
    fn test_vector_length_mismatch() {
        let mut seq = OpSequence::new(VectorLength::from_bytes(16).unwrap());
        seq.emit_op(Op::Zero { dst: 0, len: 16 });
        let mut regs = RegisterFile::new(VectorLength::from_bytes(32).unwrap());
        let mut mem = SparseMemory::new();
        let err = execute(&seq, &mut regs, &mut mem).unwrap_err();
        assert!(matches!(
            err,
            EmulationError::VectorLengthMismatch {
                expected: 16,
                actual: 32
            }
        ));
    }

    #[test]
    fn test_trace_recording_is_deterministic() {
        let config = EmulatorConfig {
            record_trace: true,
            ..Default::default()
        };
        let mut a = Emulator::new(config.clone()).unwrap();
        let mut b = Emulator::new(config).unwrap();
        a.run_words(0x1000, &[PTRUE_P0_B, ANDS_P1]).unwrap();
        b.run_words(0x1000, &[PTRUE_P0_B, ANDS_P1]).unwrap();

        let (ta, tb) = (a.trace().unwrap(), b.trace().unwrap());
        assert_eq!(ta.len(), 2);
        assert_eq!(ta.steps[1].op_count, 2);
        assert!(ta.steps[1].flags.n);
        assert!(ta.is_identical(tb));

        a.reset();
        assert!(a.trace().unwrap().is_empty());
        assert_eq!(a.instruction_count(), 0);
    }

    #[test]
    fn test_config_from_json() {
        let config: EmulatorConfig = serde_json::from_str(r#"{"vector_length": 64}"#).unwrap();
        assert_eq!(config.vector_length, 64);
        assert_eq!(config.max_instructions, 10_000);
        assert!(config.stop_on_unallocated);
    }
}
