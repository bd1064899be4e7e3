//! Circuit partitioning through LSOracle.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use whittle_circuit::Netlist;

use crate::process;
use crate::traits::{PartitionOutput, Partitioner};
use crate::ToolError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LsOracleConfig {
    /// Path to the lsoracle binary.
    pub binary: PathBuf,
    /// Directory that receives per-call partition output directories.
    pub workdir: PathBuf,
    /// Optional partitioner configuration file (`-c`).
    pub part_config: Option<PathBuf>,
}

/// LSOracle-backed partitioner.
///
/// One call writes the source netlist, asks LSOracle to partition it,
/// and reads back the top-level wiring plus `<module>_<i>.v` for each
/// slot; a missing file marks a degenerate slot.
pub struct LsOracle {
    config: LsOracleConfig,
    scratch: AtomicU64,
}

impl LsOracle {
    pub fn new(config: LsOracleConfig) -> Result<Self, ToolError> {
        fs::create_dir_all(&config.workdir).map_err(|e| ToolError::io("lsoracle", e))?;
        Ok(Self {
            config,
            scratch: AtomicU64::new(0),
        })
    }
}

impl Partitioner for LsOracle {
    fn partition(
        &self,
        circuit: &Netlist,
        target_count: usize,
    ) -> Result<PartitionOutput, ToolError> {
        let id = self.scratch.fetch_add(1, Ordering::Relaxed);
        let dir = self
            .config
            .workdir
            .join(format!("partition_{}_{}", circuit.module, id));
        fs::create_dir_all(&dir).map_err(|e| ToolError::io("lsoracle", e))?;

        let src = dir.join(format!("{}.in.v", circuit.module));
        fs::write(&src, &circuit.text).map_err(|e| ToolError::io("lsoracle", e))?;

        let config_flag = self
            .config
            .part_config
            .as_ref()
            .map(|p| format!(" -c {}", p.display()))
            .unwrap_or_default();
        let command = format!(
            "read_verilog {}; partitioning {}{}; get_all_partitions {}",
            src.display(),
            target_count,
            config_flag,
            dir.display(),
        );
        process::run(
            "lsoracle",
            Command::new(&self.config.binary).arg("-c").arg(command),
        )?;

        let top_path = dir.join(format!("{}.v", circuit.module));
        let top_text = fs::read_to_string(&top_path).map_err(|e| ToolError::io("lsoracle", e))?;
        let toplevel = Netlist::new(circuit.module.clone(), top_text);

        let mut modules = Vec::with_capacity(target_count);
        for i in 0..target_count {
            let name = format!("{}_{}", circuit.module, i);
            match fs::read_to_string(dir.join(format!("{name}.v"))) {
                Ok(text) => modules.push(Some(Netlist::new(name, text))),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => modules.push(None),
                Err(e) => return Err(ToolError::io("lsoracle", e)),
            }
        }

        Ok(PartitionOutput { toplevel, modules })
    }
}
