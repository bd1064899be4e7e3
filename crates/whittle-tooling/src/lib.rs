//! External-toolchain seam.
//!
//! The search engine treats partitioning, approximation, simulation and
//! synthesis as opaque collaborators behind the traits in [`traits`].
//! This crate defines those traits, the process-backed implementations
//! that shell out to the real logic-synthesis tools, and a tool-free
//! model toolchain over a toy netlist dialect for engine tests.

pub mod bmf;
pub mod iverilog;
pub mod lsoracle;
pub mod model;
pub mod ports;
pub mod stimulus;
pub mod traits;
pub mod yosys;

mod process;

pub use traits::{
    Approximator, PartitionOutput, Partitioner, Simulator, SizeEstimator, Stimulus,
    StimulusGenerator, Synthesizer, Toolchain,
};

/// Failure of an external collaborator. Fatal for the current run: the
/// area/error comparison is only sound when every candidate in a
/// generation has a valid result, so tool failures are never retried or
/// silently dropped.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{tool} exited with status {status}: {stderr}")]
    Failed {
        tool: String,
        status: i32,
        stderr: String,
    },

    #[error("{tool} output not understood: {reason}")]
    Unparsable { tool: String, reason: String },

    #[error("i/o while running {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn io(tool: impl Into<String>, source: std::io::Error) -> Self {
        ToolError::Io {
            tool: tool.into(),
            source,
        }
    }

    pub fn unparsable(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::Unparsable {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}
