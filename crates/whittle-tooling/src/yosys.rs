//! Area and cell-count estimation through yosys.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use whittle_circuit::Netlist;

use crate::process;
use crate::traits::{SizeEstimator, Synthesizer};
use crate::ToolError;

/// ABC mapping script used for every synthesis call.
pub const DEFAULT_ABC_SCRIPT: &str = "strash;fraig;refactor;rewrite -z;scorr;map";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YosysConfig {
    /// Path to the yosys binary.
    pub yosys: PathBuf,
    /// Liberty cell library for mapping and area reporting.
    pub liberty: PathBuf,
    /// Directory for scratch netlists and synthesis output.
    pub workdir: PathBuf,
}

/// Yosys-backed synthesizer and size estimator.
///
/// Concurrent calls land in distinct scratch files; candidates in one
/// generation share the same top module name, so names alone are not
/// unique.
pub struct Yosys {
    config: YosysConfig,
    abc_script: PathBuf,
    scratch: AtomicU64,
}

impl Yosys {
    pub fn new(config: YosysConfig) -> Result<Self, ToolError> {
        fs::create_dir_all(&config.workdir).map_err(|e| ToolError::io("yosys", e))?;
        let abc_script = config.workdir.join("abc.script");
        fs::write(&abc_script, DEFAULT_ABC_SCRIPT).map_err(|e| ToolError::io("yosys", e))?;
        Ok(Self {
            config,
            abc_script,
            scratch: AtomicU64::new(0),
        })
    }

    fn write_scratch(&self, netlist: &Netlist) -> Result<PathBuf, ToolError> {
        let id = self.scratch.fetch_add(1, Ordering::Relaxed);
        let path = self
            .config
            .workdir
            .join(format!("{}__{}.v", netlist.module, id));
        fs::write(&path, &netlist.text).map_err(|e| ToolError::io("yosys", e))?;
        Ok(path)
    }

    fn run_script(&self, script: String) -> Result<String, ToolError> {
        let out = process::run(
            "yosys",
            Command::new(&self.config.yosys).arg("-p").arg(script),
        )?;
        Ok(out.stdout)
    }
}

impl Synthesizer for Yosys {
    fn synthesize(&self, circuit: &Netlist) -> Result<f64, ToolError> {
        let src = self.write_scratch(circuit)?;
        let syn = src.with_extension("syn.v");
        let liberty = self.config.liberty.display();
        let script = format!(
            "read_verilog {src}; synth -flatten; dfflibmap -liberty {liberty}; \
             abc -liberty {liberty} -script {abc}; stat -liberty {liberty}; \
             write_verilog {syn}",
            src = src.display(),
            abc = self.abc_script.display(),
            syn = syn.display(),
        );
        let stdout = self.run_script(script)?;
        parse_chip_area(&stdout).ok_or_else(|| {
            ToolError::unparsable("yosys", format!("no chip area for {}", circuit.module))
        })
    }
}

impl SizeEstimator for Yosys {
    fn cell_count(&self, circuit: &Netlist) -> Result<usize, ToolError> {
        let src = self.write_scratch(circuit)?;
        let script = format!(
            "read_verilog {}; synth -flatten; opt; opt_clean -purge; techmap; stat",
            src.display()
        );
        let stdout = self.run_script(script)?;
        parse_cell_count(&stdout).ok_or_else(|| {
            ToolError::unparsable("yosys", format!("no cell count for {}", circuit.module))
        })
    }
}

/// Last `Chip area` line of a `stat -liberty` report.
fn parse_chip_area(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .filter(|l| l.contains("Chip area"))
        .last()
        .and_then(|l| l.split_whitespace().last())
        .and_then(|t| t.parse().ok())
}

/// Last `Number of cells` line of a `stat` report.
fn parse_cell_count(stdout: &str) -> Option<usize> {
    stdout
        .lines()
        .filter(|l| l.contains("Number of cells:"))
        .last()
        .and_then(|l| l.split_whitespace().last())
        .and_then(|t| t.parse().ok())
}
