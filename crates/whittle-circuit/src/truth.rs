//! Simulated truth tables and the Hamming error rate between them.

use serde::{Deserialize, Serialize};

/// Output of one simulation run: one row of output bits per stimulus
/// vector, as the simulator printed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthTable {
    rows: Vec<String>,
}

impl TruthTable {
    pub fn new(rows: Vec<String>) -> Self {
        Self { rows }
    }

    /// Parse simulator output: one row per non-empty line consisting of
    /// bit characters. Other lines (banners, timestamps) are skipped.
    pub fn from_text(text: &str) -> Self {
        let rows = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && l.chars().all(|c| matches!(c, '0' | '1' | 'x' | 'z')))
            .map(str::to_string)
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Total number of tested bit positions.
    pub fn positions(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// Fraction of this table's bit positions where `other` diverges.
    ///
    /// `self` is the ground truth and defines the tested positions: a
    /// missing or short row in `other` counts its uncovered positions as
    /// mismatches, while surplus output in `other` is ignored. An empty
    /// ground truth yields 0.0.
    pub fn hamming_error_rate(&self, other: &TruthTable) -> f64 {
        let total = self.positions();
        if total == 0 {
            return 0.0;
        }

        let mut mismatches = 0usize;
        for (i, truth_row) in self.rows.iter().enumerate() {
            match other.rows.get(i) {
                None => mismatches += truth_row.len(),
                Some(cand_row) => {
                    let mut cand = cand_row.chars();
                    for t in truth_row.chars() {
                        match cand.next() {
                            Some(c) if c == t => {}
                            _ => mismatches += 1,
                        }
                    }
                }
            }
        }
        mismatches as f64 / total as f64
    }
}
