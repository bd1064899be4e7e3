//! Search bootstrap: partition a circuit and assemble everything a
//! controller needs.

use std::sync::Arc;

use whittle_circuit::{Netlist, Partition, PartitionRegistry, TruthTable};
use whittle_tooling::{Stimulus, Toolchain};

use crate::cache::ApproxCache;
use crate::controller::SearchController;
use crate::evaluate::Evaluator;
use crate::SearchError;

/// Everything produced by one partitioning pass over a circuit.
pub struct SearchSetup {
    pub registry: Arc<PartitionRegistry>,
    pub toplevel: Netlist,
    /// The partitioner's module per slot; `None` for absent partitions.
    pub exact_modules: Vec<Option<Arc<Netlist>>>,
    /// Per-partition stimulus, generated once before any search.
    pub partition_stimuli: Vec<Option<Stimulus>>,
    /// The fixed whole-circuit testbench every candidate is scored with.
    pub testbench: Netlist,
    /// Simulation of the assembled all-exact circuit, computed once.
    pub ground_truth: TruthTable,
    /// The assembled all-exact circuit itself.
    pub exact_artifact: Netlist,
}

/// Partition `circuit` into `num_parts` slots, generate per-partition
/// stimulus, and compute the run's ground truth. A caller-supplied
/// testbench drives the whole-circuit simulations; when `None` (leaf
/// workers), one is generated from the circuit itself.
pub fn prepare(
    toolchain: &Toolchain,
    circuit: &Netlist,
    num_parts: usize,
    testbench: Option<Netlist>,
) -> Result<SearchSetup, SearchError> {
    let output = toolchain.partitioner.partition(circuit, num_parts)?;

    let mut partitions = Vec::with_capacity(output.modules.len());
    let mut exact_modules = Vec::with_capacity(output.modules.len());
    let mut partition_stimuli = Vec::with_capacity(output.modules.len());
    for (index, module) in output.modules.iter().enumerate() {
        match module {
            None => {
                log::debug!("partition {index} of {} is empty", circuit.module);
                partitions.push(Partition::absent(index));
                exact_modules.push(None);
                partition_stimuli.push(None);
            }
            Some(netlist) => {
                let stimulus = toolchain.stimulus.generate(netlist)?;
                partitions.push(Partition::new(
                    index,
                    stimulus.num_inputs,
                    stimulus.num_outputs,
                ));
                exact_modules.push(Some(Arc::new(netlist.clone())));
                partition_stimuli.push(Some(stimulus));
            }
        }
    }

    let registry = Arc::new(PartitionRegistry::new(partitions));
    let exact_artifact = Netlist::assemble(
        &output.toplevel,
        exact_modules.iter().flatten().map(Arc::as_ref),
    );
    let testbench = match testbench {
        Some(tb) => tb,
        None => toolchain.stimulus.generate(circuit)?.testbench,
    };
    let ground_truth = toolchain.simulator.run(&exact_artifact, &testbench)?;

    Ok(SearchSetup {
        registry,
        toplevel: output.toplevel,
        exact_modules,
        partition_stimuli,
        testbench,
        ground_truth,
        exact_artifact,
    })
}

impl SearchSetup {
    /// Build the flat controller: a fresh write-once cache seeded with
    /// the exact modules, and an evaluator over this setup.
    pub fn controller(&self, toolchain: &Toolchain, threshold: f64) -> SearchController {
        let cache = Arc::new(ApproxCache::new(
            self.registry.clone(),
            self.exact_modules.clone(),
            toolchain.approximator.clone(),
        ));
        let evaluator = Evaluator::new(
            self.registry.clone(),
            self.toplevel.clone(),
            cache,
            toolchain.simulator.clone(),
            toolchain.synthesizer.clone(),
            self.testbench.clone(),
            self.ground_truth.clone(),
        );
        SearchController::new(evaluator, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whittle_tooling::model;

    #[test]
    fn test_prepare_builds_registry_with_absent_slots() {
        let toolchain = model::model_toolchain();
        let circuit = model::circuit(
            "top",
            &[model::part("p0", 4, 3, 80), model::part("p1", 2, 2, 40)],
        );
        // Three slots for two parts: the last one is degenerate.
        let setup = prepare(&toolchain, &circuit, 3, None).unwrap();

        assert_eq!(setup.registry.len(), 3);
        assert!(setup.registry.get(0).unwrap().exists);
        assert!(!setup.registry.get(2).unwrap().exists);
        assert_eq!(setup.registry.get(0).unwrap().max_degree(), 3);
        assert!(setup.partition_stimuli[2].is_none());
        assert_eq!(setup.ground_truth.hamming_error_rate(&setup.ground_truth.clone()), 0.0);
    }

    #[test]
    fn test_prepare_uses_supplied_testbench() {
        let toolchain = model::model_toolchain();
        let circuit = model::circuit("top", &[model::part("p0", 4, 3, 80)]);
        let tb = Netlist::new("custom_tb", "tb custom_tb vectors=4\n");
        let setup = prepare(&toolchain, &circuit, 1, Some(tb.clone())).unwrap();
        assert_eq!(setup.testbench, tb);
        assert_eq!(setup.ground_truth.rows().len(), 4);
    }
}
