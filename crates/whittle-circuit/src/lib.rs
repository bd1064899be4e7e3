//! Data model for partitioned circuits and their approximation state.
//!
//! A circuit is split into independently synthesizable partitions; a
//! design point assigns every partition a precision degree. This crate
//! holds those value types plus the truth-table comparison that scores
//! a design point — no tool invocation and no search logic lives here.

pub mod netlist;
pub mod partition;
pub mod stream;
pub mod truth;

pub use netlist::Netlist;
pub use partition::{Partition, PartitionRegistry};
pub use stream::{ApproxStream, StreamError, ABSENT};
pub use truth::TruthTable;

use serde::{Deserialize, Serialize};

/// Score of one fully assembled candidate circuit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Hamming mismatch rate against ground truth, in `[0, 1]`.
    pub error: f64,
    /// Synthesized implementation cost, `>= 0`.
    pub area: f64,
}

impl EvaluationResult {
    pub fn feasible(&self, threshold: f64) -> bool {
        self.error <= threshold
    }
}
