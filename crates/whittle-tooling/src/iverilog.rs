//! Gate-level simulation through Icarus Verilog.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use whittle_circuit::{Netlist, TruthTable};

use crate::process;
use crate::traits::Simulator;
use crate::ToolError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IverilogConfig {
    /// Path to the iverilog compiler.
    pub iverilog: PathBuf,
    /// Path to the vvp runtime.
    pub vvp: PathBuf,
    /// Directory for scratch sources and compiled images.
    pub workdir: PathBuf,
}

/// Compile-and-run simulator: `iverilog` builds an image from the
/// circuit plus testbench, `vvp` executes it, and the printed rows
/// become the truth table.
pub struct Iverilog {
    config: IverilogConfig,
    scratch: AtomicU64,
}

impl Iverilog {
    pub fn new(config: IverilogConfig) -> Result<Self, ToolError> {
        fs::create_dir_all(&config.workdir).map_err(|e| ToolError::io("iverilog", e))?;
        Ok(Self {
            config,
            scratch: AtomicU64::new(0),
        })
    }
}

impl Simulator for Iverilog {
    fn run(&self, circuit: &Netlist, testbench: &Netlist) -> Result<TruthTable, ToolError> {
        let id = self.scratch.fetch_add(1, Ordering::Relaxed);
        let base = self.config.workdir.join(format!("sim_{}_{}", circuit.module, id));

        let circuit_file = base.with_extension("v");
        let tb_file = base.with_extension("tb.v");
        let image = base.with_extension("iv");
        fs::write(&circuit_file, &circuit.text).map_err(|e| ToolError::io("iverilog", e))?;
        fs::write(&tb_file, &testbench.text).map_err(|e| ToolError::io("iverilog", e))?;

        process::run(
            "iverilog",
            Command::new(&self.config.iverilog)
                .arg("-o")
                .arg(&image)
                .arg(&circuit_file)
                .arg(&tb_file),
        )?;
        let out = process::run("vvp", Command::new(&self.config.vvp).arg(&image));
        // The compiled image is scratch either way.
        let _ = fs::remove_file(&image);
        Ok(TruthTable::from_text(&out?.stdout))
    }
}
