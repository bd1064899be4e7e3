//! Run configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use whittle_search::hierarchy::{DecomposeConfig, DEFAULT_TOLERANCE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Error bound every emitted result must honor.
    pub threshold: f64,
    /// Partition count for the flat search.
    pub num_parts: usize,
    /// Root of the run's on-disk output (log, artifacts, result).
    pub output_dir: PathBuf,
    /// Hierarchical decomposition knobs.
    pub decompose: DecomposeConfig,
    /// Error margin tolerated on an adopted hierarchical round.
    pub tolerance: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            num_parts: 8,
            output_dir: PathBuf::from("output"),
            decompose: DecomposeConfig::default(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}
