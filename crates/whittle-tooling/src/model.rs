//! Model toolchain — tool-free collaborator implementations over a toy
//! netlist dialect, for exercising the engine without a synthesis stack.
//!
//! The dialect is one directive per line:
//!
//! ```text
//! top  <name>
//! part <name> in=<n> out=<m> k=<k> cells=<c>
//! tb   <name> vectors=<v>
//! ```
//!
//! A `part` line is a partition with `m` output bits at precision
//! degree `k` (`k == m` is exact). The model simulator flips the first
//! `m - k` output bits of every row, so an assembled circuit's error
//! rate against the all-exact ground truth is exactly
//! `sum(m_i - k_i) / sum(m_i)`, and the model synthesizer prices a part
//! at `cells * k / m` — both closed forms the engine tests assert on.

use whittle_circuit::{Netlist, TruthTable};

use crate::traits::{
    Approximator, PartitionOutput, Partitioner, Simulator, SizeEstimator, Stimulus,
    StimulusGenerator, Synthesizer, Toolchain,
};
use crate::ToolError;

const DEFAULT_VECTORS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPart {
    pub name: String,
    pub inputs: usize,
    pub outputs: usize,
    pub degree: usize,
    pub cells: usize,
}

impl ModelPart {
    fn to_line(&self) -> String {
        format!(
            "part {} in={} out={} k={} cells={}",
            self.name, self.inputs, self.outputs, self.degree, self.cells
        )
    }
}

/// An exact model partition as a standalone netlist.
pub fn part(name: &str, inputs: usize, outputs: usize, cells: usize) -> Netlist {
    let p = ModelPart {
        name: name.to_string(),
        inputs,
        outputs,
        degree: outputs,
        cells,
    };
    Netlist::new(name, format!("{}\n", p.to_line()))
}

/// A model circuit: a `top` line followed by the given parts.
pub fn circuit(module: &str, parts: &[Netlist]) -> Netlist {
    let mut text = format!("top {module}\n");
    for p in parts {
        text.push_str(&p.text);
    }
    Netlist::new(module, text)
}

/// All `part` lines of a netlist, in text order.
pub fn parts_of(netlist: &Netlist) -> Result<Vec<ModelPart>, ToolError> {
    let mut parts = Vec::new();
    for line in netlist.text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("part ") {
            parts.push(parse_part(rest)?);
        }
    }
    Ok(parts)
}

/// Compact `name=k` listing of a netlist's parts, for keying scripted
/// results in tests.
pub fn degree_signature(netlist: &Netlist) -> String {
    parts_of(netlist)
        .unwrap_or_default()
        .iter()
        .map(|p| format!("{}={}", p.name, p.degree))
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_part(rest: &str) -> Result<ModelPart, ToolError> {
    let mut tokens = rest.split_whitespace();
    let name = tokens
        .next()
        .ok_or_else(|| ToolError::unparsable("model", "part line without name"))?
        .to_string();
    let mut part = ModelPart {
        name,
        inputs: 0,
        outputs: 0,
        degree: 0,
        cells: 0,
    };
    for token in tokens {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| ToolError::unparsable("model", format!("bad field '{token}'")))?;
        let value: usize = value
            .parse()
            .map_err(|_| ToolError::unparsable("model", format!("bad value '{token}'")))?;
        match key {
            "in" => part.inputs = value,
            "out" => part.outputs = value,
            "k" => part.degree = value,
            "cells" => part.cells = value,
            _ => return Err(ToolError::unparsable("model", format!("bad field '{token}'"))),
        }
    }
    Ok(part)
}

fn tb_vectors(testbench: &Netlist) -> usize {
    testbench
        .text
        .lines()
        .filter_map(|l| l.trim().strip_prefix("tb "))
        .filter_map(|rest| rest.split_whitespace().find_map(|t| t.strip_prefix("vectors=")))
        .filter_map(|v| v.parse().ok())
        .next()
        .unwrap_or(DEFAULT_VECTORS)
}

/// Splits a circuit's parts into contiguous runs, one per slot; slots
/// beyond the part count come back degenerate.
#[derive(Debug, Default)]
pub struct ModelPartitioner;

impl Partitioner for ModelPartitioner {
    fn partition(
        &self,
        circuit: &Netlist,
        target_count: usize,
    ) -> Result<PartitionOutput, ToolError> {
        let parts = parts_of(circuit)?;
        let toplevel = Netlist::new(circuit.module.clone(), format!("top {}\n", circuit.module));

        let per_slot = parts.len().div_ceil(target_count.max(1));
        let mut modules = Vec::with_capacity(target_count);
        for i in 0..target_count {
            let chunk: Vec<&ModelPart> =
                parts.iter().skip(i * per_slot).take(per_slot).collect();
            if chunk.is_empty() {
                modules.push(None);
                continue;
            }
            let name = format!("{}_{}", circuit.module, i);
            let text: String = chunk.iter().map(|p| format!("{}\n", p.to_line())).collect();
            modules.push(Some(Netlist::new(name, text)));
        }
        Ok(PartitionOutput { toplevel, modules })
    }
}

#[derive(Debug, Default)]
pub struct ModelSizeEstimator;

impl SizeEstimator for ModelSizeEstimator {
    fn cell_count(&self, circuit: &Netlist) -> Result<usize, ToolError> {
        Ok(parts_of(circuit)?.iter().map(|p| p.cells).sum())
    }
}

/// Rewrites a single-part module's degree field. Deterministic, so the
/// engine's write-once cache holds.
#[derive(Debug, Default)]
pub struct ModelApproximator;

impl Approximator for ModelApproximator {
    fn approximate(
        &self,
        partition: &Netlist,
        degree: i32,
        _num_inputs: usize,
        _num_outputs: usize,
    ) -> Result<Netlist, ToolError> {
        let parts = parts_of(partition)?;
        let [only]: [ModelPart; 1] = parts.try_into().map_err(|_| {
            ToolError::unparsable("model", format!("{} is not a single part", partition.module))
        })?;
        if degree < 1 || degree as usize > only.outputs {
            return Err(ToolError::unparsable(
                "model",
                format!("degree {degree} out of range for {}", only.name),
            ));
        }
        let approximated = ModelPart {
            degree: degree as usize,
            ..only
        };
        Ok(Netlist::new(
            partition.module.clone(),
            format!("{}\n", approximated.to_line()),
        ))
    }
}

/// Emits `vectors` identical rows in which each part contributes its
/// `out` bits with the first `out - k` flipped to `1`.
#[derive(Debug, Default)]
pub struct ModelSimulator;

impl Simulator for ModelSimulator {
    fn run(&self, circuit: &Netlist, testbench: &Netlist) -> Result<TruthTable, ToolError> {
        let parts = parts_of(circuit)?;
        let mut row = String::new();
        for p in &parts {
            for bit in 0..p.outputs {
                row.push(if bit < p.outputs - p.degree { '1' } else { '0' });
            }
        }
        let rows = vec![row; tb_vectors(testbench)];
        Ok(TruthTable::new(rows))
    }
}

/// Prices each part at `cells * k / out`, so area shrinks linearly as a
/// partition's degree drops.
#[derive(Debug, Default)]
pub struct ModelSynthesizer;

impl Synthesizer for ModelSynthesizer {
    fn synthesize(&self, circuit: &Netlist) -> Result<f64, ToolError> {
        Ok(parts_of(circuit)?
            .iter()
            .map(|p| p.cells as f64 * p.degree as f64 / p.outputs.max(1) as f64)
            .sum())
    }
}

#[derive(Debug, Clone)]
pub struct ModelStimulus {
    pub vectors: usize,
}

impl Default for ModelStimulus {
    fn default() -> Self {
        Self {
            vectors: DEFAULT_VECTORS,
        }
    }
}

impl StimulusGenerator for ModelStimulus {
    fn generate(&self, partition: &Netlist) -> Result<Stimulus, ToolError> {
        let parts = parts_of(partition)?;
        if parts.is_empty() {
            return Err(ToolError::unparsable(
                "model",
                format!("{} has no parts", partition.module),
            ));
        }
        let num_inputs = parts.iter().map(|p| p.inputs).sum();
        let num_outputs = parts.iter().map(|p| p.outputs).sum();
        let name = format!("{}_tb", partition.module);
        Ok(Stimulus {
            testbench: Netlist::new(name.clone(), format!("tb {} vectors={}\n", name, self.vectors)),
            num_inputs,
            num_outputs,
        })
    }
}

/// The full model toolchain bundle.
pub fn model_toolchain() -> Toolchain {
    Toolchain {
        partitioner: std::sync::Arc::new(ModelPartitioner),
        size_estimator: std::sync::Arc::new(ModelSizeEstimator),
        approximator: std::sync::Arc::new(ModelApproximator),
        simulator: std::sync::Arc::new(ModelSimulator),
        synthesizer: std::sync::Arc::new(ModelSynthesizer),
        stimulus: std::sync::Arc::new(ModelStimulus::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whittle_circuit::Netlist;

    fn two_part_circuit() -> Netlist {
        circuit("top", &[part("p0", 4, 4, 100), part("p1", 3, 2, 60)])
    }

    #[test]
    fn test_partitioner_one_part_per_slot() {
        let out = ModelPartitioner.partition(&two_part_circuit(), 2).unwrap();
        assert_eq!(out.modules.len(), 2);
        let m0 = out.modules[0].as_ref().unwrap();
        assert!(m0.text.contains("part p0"));
        let m1 = out.modules[1].as_ref().unwrap();
        assert!(m1.text.contains("part p1"));
    }

    #[test]
    fn test_partitioner_marks_degenerate_slots() {
        let out = ModelPartitioner.partition(&two_part_circuit(), 3).unwrap();
        assert!(out.modules[2].is_none());
    }

    #[test]
    fn test_exact_circuit_error_is_zero() {
        let c = two_part_circuit();
        let tb = ModelStimulus::default().generate(&c).unwrap().testbench;
        let exact = ModelSimulator.run(&c, &tb).unwrap();
        assert_eq!(exact.hamming_error_rate(&exact.clone()), 0.0);
    }

    #[test]
    fn test_error_rate_matches_closed_form() {
        let c = two_part_circuit();
        let tb = ModelStimulus::default().generate(&c).unwrap().testbench;
        let ground = ModelSimulator.run(&c, &tb).unwrap();

        let p0 = part("p0", 4, 4, 100);
        let approx = ModelApproximator.approximate(&p0, 2, 4, 4).unwrap();
        let degraded = circuit("top", &[approx, part("p1", 3, 2, 60)]);
        let table = ModelSimulator.run(&degraded, &tb).unwrap();

        // (4 - 2) flipped bits out of 6 output bits.
        let expected = 2.0 / 6.0;
        assert!((ground.hamming_error_rate(&table) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_area_matches_closed_form() {
        let c = two_part_circuit();
        assert_eq!(ModelSynthesizer.synthesize(&c).unwrap(), 160.0);

        let p0 = ModelApproximator
            .approximate(&part("p0", 4, 4, 100), 2, 4, 4)
            .unwrap();
        let degraded = circuit("top", &[p0, part("p1", 3, 2, 60)]);
        // 100 * 2/4 + 60 = 110.
        assert_eq!(ModelSynthesizer.synthesize(&degraded).unwrap(), 110.0);
    }

    #[test]
    fn test_cell_count_sums_parts() {
        assert_eq!(
            ModelSizeEstimator.cell_count(&two_part_circuit()).unwrap(),
            160
        );
    }

    #[test]
    fn test_degree_signature() {
        let p0 = ModelApproximator
            .approximate(&part("p0", 4, 4, 100), 3, 4, 4)
            .unwrap();
        let c = circuit("top", &[p0, part("p1", 3, 2, 60)]);
        assert_eq!(degree_signature(&c), "p0=3,p1=2");
    }

    #[test]
    fn test_approximator_rejects_multi_part_modules() {
        assert!(ModelApproximator
            .approximate(&two_part_circuit(), 2, 7, 6)
            .is_err());
    }
}
