//! Collaborator contracts consumed by the search engine.
//!
//! Implementations must be injectable and usable from a parallel
//! evaluation batch, hence `Send + Sync` everywhere. Results carry the
//! failing tool's context (see [`ToolError`]), mirroring the rule that
//! the engine learns *which* external call failed, never how the tool
//! works internally.

use std::sync::Arc;

use whittle_circuit::{Netlist, TruthTable};

use crate::ToolError;

/// Output of one partitioning call: the shared top-level wiring plus one
/// slot per requested partition. `None` marks a degenerate slot the
/// partitioner produced no module for.
#[derive(Debug, Clone)]
pub struct PartitionOutput {
    pub toplevel: Netlist,
    pub modules: Vec<Option<Netlist>>,
}

/// A generated testbench plus the port widths discovered while
/// generating it.
#[derive(Debug, Clone)]
pub struct Stimulus {
    pub testbench: Netlist,
    pub num_inputs: usize,
    pub num_outputs: usize,
}

/// Splits a circuit into independently synthesizable sub-modules.
pub trait Partitioner: Send + Sync {
    fn partition(&self, circuit: &Netlist, target_count: usize)
        -> Result<PartitionOutput, ToolError>;
}

/// Estimates the standard-cell count of a circuit. Used only to decide
/// whether the hierarchical decomposer recurses further.
pub trait SizeEstimator: Send + Sync {
    fn cell_count(&self, circuit: &Netlist) -> Result<usize, ToolError>;
}

/// Produces a reduced-precision variant of a partition.
///
/// Must be deterministic for a given `(partition, degree)` pair so that
/// cached artifacts can be reused across candidates and iterations.
pub trait Approximator: Send + Sync {
    fn approximate(
        &self,
        partition: &Netlist,
        degree: i32,
        num_inputs: usize,
        num_outputs: usize,
    ) -> Result<Netlist, ToolError>;
}

/// Simulates an assembled circuit against a testbench, yielding the
/// observed output truth table.
pub trait Simulator: Send + Sync {
    fn run(&self, circuit: &Netlist, testbench: &Netlist) -> Result<TruthTable, ToolError>;
}

/// Synthesizes an assembled circuit and reports its area.
pub trait Synthesizer: Send + Sync {
    fn synthesize(&self, circuit: &Netlist) -> Result<f64, ToolError>;
}

/// Generates stimulus (a testbench artifact) for one partition, invoked
/// once per leaf partition before any search begins.
pub trait StimulusGenerator: Send + Sync {
    fn generate(&self, partition: &Netlist) -> Result<Stimulus, ToolError>;
}

/// The full set of collaborators a run needs, bundled for injection.
#[derive(Clone)]
pub struct Toolchain {
    pub partitioner: Arc<dyn Partitioner>,
    pub size_estimator: Arc<dyn SizeEstimator>,
    pub approximator: Arc<dyn Approximator>,
    pub simulator: Arc<dyn Simulator>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub stimulus: Arc<dyn StimulusGenerator>,
}
