//! Run reporting: the append-only iteration log, the artifact store,
//! and the final result record.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use whittle_circuit::Netlist;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("i/o at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoding record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ReportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One adopted iteration as it lands in the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    /// The adopted design: a degree stream for the flat search, the
    /// advanced leaf for the hierarchical one.
    pub design: String,
    pub error: f64,
    pub area: f64,
    /// Area as a percentage of the original exact-circuit area.
    pub area_pct: f64,
    pub elapsed_secs: f64,
}

/// Final result record: what the requested threshold bought.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub threshold: f64,
    pub label: String,
    pub error: f64,
    pub area: f64,
    pub area_pct: f64,
    pub original_area: f64,
    pub artifact: Option<PathBuf>,
}

/// Append-only JSON-lines log of adopted iterations.
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    pub fn create(path: PathBuf) -> Result<Self, ReportError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReportError::io(&path, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ReportError::io(&path, e))?;
        Ok(Self { path, file })
    }

    pub fn append(&mut self, record: &IterationRecord) -> Result<(), ReportError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|e| ReportError::io(&self.path, e))
    }
}

/// Directory-backed store for assembled-circuit provenance artifacts.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn create(dir: PathBuf) -> Result<Self, ReportError> {
        fs::create_dir_all(&dir).map_err(|e| ReportError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Write (or overwrite) one named artifact, returning its path.
    pub fn persist(&self, name: &str, netlist: &Netlist) -> Result<PathBuf, ReportError> {
        let path = self.dir.join(format!("{name}.v"));
        fs::write(&path, &netlist.text).map_err(|e| ReportError::io(&path, e))?;
        Ok(path)
    }
}

/// Write the final result record next to the winning artifact.
pub fn write_result(dir: &Path, record: &ResultRecord) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;
    let path = dir.join("result.json");
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&path, json).map_err(|e| ReportError::io(&path, e))?;
    Ok(path)
}
