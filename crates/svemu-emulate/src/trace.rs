//! Execution trace recording and comparison.
//!
//! A trace records, per executed instruction, its address and encoding,
//! the number of primitive operations it lowered to, the resulting flags
//! and a hash of the architectural state afterwards. Two runs of the same
//! code at the same vector length must produce identical traces; comparing
//! traces from two backends locates the first instruction where they
//! disagree.

use crate::flags::Flags;
use serde::{Deserialize, Serialize};

/// A single step in the execution trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Instruction address.
    pub address: u64,
    /// Instruction word.
    pub word: u32,
    /// Disassembly of the instruction.
    pub disassembly: String,
    /// Number of primitive operations executed.
    pub op_count: usize,
    /// Flags after execution.
    pub flags: Flags,
    /// State after execution.
    pub post_state_hash: u64,
}

/// Complete execution trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    /// Vector length in bytes the trace was recorded at.
    pub vector_length: usize,
    /// Steps in the trace.
    pub steps: Vec<TraceStep>,
    /// Initial state hash.
    pub initial_state_hash: u64,
    /// Final state hash.
    pub final_state_hash: u64,
}

impl ExecutionTrace {
    /// Create an empty trace starting from the given state.
    pub fn new(vector_length: usize, initial_state_hash: u64) -> Self {
        Self {
            vector_length,
            steps: Vec::new(),
            initial_state_hash,
            final_state_hash: initial_state_hash,
        }
    }

    /// Append a step; the final state hash follows the last step.
    pub fn push(&mut self, step: TraceStep) {
        self.final_state_hash = step.post_state_hash;
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check if two traces are identical.
    pub fn is_identical(&self, other: &ExecutionTrace) -> bool {
        if self.vector_length != other.vector_length {
            return false;
        }
        if self.steps.len() != other.steps.len() {
            return false;
        }
        if self.initial_state_hash != other.initial_state_hash {
            return false;
        }
        if self.final_state_hash != other.final_state_hash {
            return false;
        }
        self.steps
            .iter()
            .zip(other.steps.iter())
            .all(|(a, b)| a.address == b.address && a.flags == b.flags && a.post_state_hash == b.post_state_hash)
    }

    /// Find the first divergence point between two traces.
    pub fn find_divergence(&self, other: &ExecutionTrace) -> Option<usize> {
        for (i, (a, b)) in self.steps.iter().zip(other.steps.iter()).enumerate() {
            if a.address != b.address || a.post_state_hash != b.post_state_hash {
                return Some(i);
            }
        }
        if self.steps.len() != other.steps.len() {
            return Some(self.steps.len().min(other.steps.len()));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(address: u64, hash: u64) -> TraceStep {
        TraceStep {
            address,
            word: 0,
            disassembly: String::new(),
            op_count: 1,
            flags: Flags::default(),
            post_state_hash: hash,
        }
    }

    #[test]
    fn test_identical_traces() {
        let mut a = ExecutionTrace::new(32, 7);
        a.push(step(0x1000, 1));
        a.push(step(0x1004, 2));
        let b = a.clone();
        assert!(a.is_identical(&b));
        assert_eq!(a.find_divergence(&b), None);
        assert_eq!(a.final_state_hash, 2);
    }

    #[test]
    fn test_divergence() {
        let mut a = ExecutionTrace::new(32, 7);
        let mut b = ExecutionTrace::new(32, 7);
        a.push(step(0x1000, 1));
        b.push(step(0x1000, 1));
        a.push(step(0x1004, 2));
        b.push(step(0x1004, 3));
        assert!(!a.is_identical(&b));
        assert_eq!(a.find_divergence(&b), Some(1));

        // A prefix diverges where the shorter trace ends.
        let mut c = a.clone();
        c.steps.truncate(1);
        assert_eq!(a.find_divergence(&c), Some(1));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut a = ExecutionTrace::new(16, 0);
        a.push(step(0x40, 9));
        let json = serde_json::to_string(&a).unwrap();
        let back: ExecutionTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
