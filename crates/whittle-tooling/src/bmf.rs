//! Boolean-matrix-factorization approximator wrapper.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use whittle_circuit::Netlist;

use crate::process;
use crate::traits::Approximator;
use crate::ToolError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmfConfig {
    /// Path to the factorizer binary.
    pub binary: PathBuf,
    /// Directory for partition sources and approximated output.
    pub workdir: PathBuf,
}

/// Invokes the external factorizer on a partition netlist, asking for a
/// rank-`degree` reconstruction of its truth table, and reads the
/// reduced-precision netlist back.
///
/// The factorizer is deterministic for a given input and degree, which
/// is what makes write-once caching of its artifacts sound.
pub struct BmfApproximator {
    config: BmfConfig,
    scratch: AtomicU64,
}

impl BmfApproximator {
    pub fn new(config: BmfConfig) -> Result<Self, ToolError> {
        fs::create_dir_all(&config.workdir).map_err(|e| ToolError::io("bmf", e))?;
        Ok(Self {
            config,
            scratch: AtomicU64::new(0),
        })
    }
}

impl Approximator for BmfApproximator {
    fn approximate(
        &self,
        partition: &Netlist,
        degree: i32,
        num_inputs: usize,
        num_outputs: usize,
    ) -> Result<Netlist, ToolError> {
        let id = self.scratch.fetch_add(1, Ordering::Relaxed);
        let src = self
            .config
            .workdir
            .join(format!("{}__{}.v", partition.module, id));
        fs::write(&src, &partition.text).map_err(|e| ToolError::io("bmf", e))?;

        let out_file = self
            .config
            .workdir
            .join(format!("{}_approx_k={}.v", partition.module, degree));

        process::run(
            "bmf",
            Command::new(&self.config.binary)
                .arg(&src)
                .arg(degree.to_string())
                .arg(num_inputs.to_string())
                .arg(num_outputs.to_string())
                .arg(&out_file),
        )?;

        let text = fs::read_to_string(&out_file).map_err(|e| ToolError::io("bmf", e))?;
        Ok(Netlist::new(partition.module.clone(), text))
    }
}
