//! Candidate evaluation: assemble, simulate, synthesize.

use std::sync::Arc;

use rayon::prelude::*;

use whittle_circuit::{
    ApproxStream, EvaluationResult, Netlist, PartitionRegistry, TruthTable, ABSENT,
};
use whittle_tooling::{Simulator, Synthesizer, ToolError};

use crate::cache::ApproxCache;
use crate::SearchError;

/// One scored candidate, with its assembled artifact retained as the
/// run's provenance trail.
#[derive(Clone)]
pub struct Evaluated {
    pub stream: ApproxStream,
    pub result: EvaluationResult,
    pub artifact: Arc<Netlist>,
}

/// Score one assembled circuit against the fixed testbench and ground
/// truth.
pub fn score(
    simulator: &dyn Simulator,
    synthesizer: &dyn Synthesizer,
    circuit: &Netlist,
    testbench: &Netlist,
    ground_truth: &TruthTable,
) -> Result<EvaluationResult, ToolError> {
    let table = simulator.run(circuit, testbench)?;
    let error = ground_truth.hamming_error_rate(&table);
    let area = synthesizer.synthesize(circuit)?;
    Ok(EvaluationResult { error, area })
}

/// Scores full-circuit design points, consulting and populating the
/// shared approximation cache.
pub struct Evaluator {
    registry: Arc<PartitionRegistry>,
    toplevel: Netlist,
    cache: Arc<ApproxCache>,
    simulator: Arc<dyn Simulator>,
    synthesizer: Arc<dyn Synthesizer>,
    testbench: Netlist,
    ground_truth: TruthTable,
}

impl Evaluator {
    pub fn new(
        registry: Arc<PartitionRegistry>,
        toplevel: Netlist,
        cache: Arc<ApproxCache>,
        simulator: Arc<dyn Simulator>,
        synthesizer: Arc<dyn Synthesizer>,
        testbench: Netlist,
        ground_truth: TruthTable,
    ) -> Self {
        Self {
            registry,
            toplevel,
            cache,
            simulator,
            synthesizer,
            testbench,
            ground_truth,
        }
    }

    pub fn registry(&self) -> &Arc<PartitionRegistry> {
        &self.registry
    }

    pub fn ground_truth(&self) -> &TruthTable {
        &self.ground_truth
    }

    /// Concatenate the top-level wiring with every existing partition's
    /// cached artifact at the stream's degree.
    pub fn assemble(&self, stream: &ApproxStream) -> Result<Netlist, ToolError> {
        let mut parts = Vec::new();
        for partition in self.registry.existing() {
            let degree = stream.degree(partition.index);
            if degree == ABSENT {
                continue;
            }
            parts.push(self.cache.ensure(partition.index, degree)?);
        }
        Ok(Netlist::assemble(
            &self.toplevel,
            parts.iter().map(Arc::as_ref),
        ))
    }

    pub fn evaluate(&self, stream: &ApproxStream) -> Result<Evaluated, ToolError> {
        let artifact = self.assemble(stream)?;
        let result = score(
            self.simulator.as_ref(),
            self.synthesizer.as_ref(),
            &artifact,
            &self.testbench,
            &self.ground_truth,
        )?;
        log::debug!(
            "evaluated {stream}: error {:.6}, area {:.2}",
            result.error,
            result.area
        );
        Ok(Evaluated {
            stream: stream.clone(),
            result,
            artifact: Arc::new(artifact),
        })
    }

    /// Score a whole generation. Candidates are independent, so they
    /// fan out across the worker pool; this call is the join barrier —
    /// results come back paired with candidates by index, and one
    /// failure abandons the generation.
    pub fn evaluate_generation(
        &self,
        candidates: &[ApproxStream],
    ) -> Result<Vec<Evaluated>, SearchError> {
        for candidate in candidates {
            candidate.validate(&self.registry)?;
        }
        candidates
            .par_iter()
            .enumerate()
            .map(|(candidate, stream)| {
                self.evaluate(stream)
                    .map_err(|source| SearchError::Evaluate { candidate, source })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whittle_circuit::Partition;
    use whittle_tooling::model::{self, ModelSimulator, ModelStimulus, ModelSynthesizer};
    use whittle_tooling::StimulusGenerator;

    fn evaluator() -> Evaluator {
        let p0 = model::part("p0", 4, 4, 100);
        let p1 = model::part("p1", 3, 2, 60);
        let registry = Arc::new(PartitionRegistry::new(vec![
            Partition::new(0, 4, 4),
            Partition::new(1, 3, 2),
        ]));
        let exact = vec![Some(Arc::new(p0.clone())), Some(Arc::new(p1.clone()))];
        let cache = Arc::new(ApproxCache::new(
            registry.clone(),
            exact,
            Arc::new(model::ModelApproximator),
        ));

        let toplevel = Netlist::new("top", "top top\n");
        let circuit = model::circuit("top", &[p0, p1]);
        let testbench = ModelStimulus::default()
            .generate(&circuit)
            .unwrap()
            .testbench;
        let simulator = Arc::new(ModelSimulator);
        let ground_truth = {
            use whittle_tooling::Simulator as _;
            simulator.run(&circuit, &testbench).unwrap()
        };

        Evaluator::new(
            registry,
            toplevel,
            cache,
            simulator,
            Arc::new(ModelSynthesizer),
            testbench,
            ground_truth,
        )
    }

    #[test]
    fn test_exact_stream_scores_zero_error() {
        let evaluator = evaluator();
        let exact = evaluator.registry().all_exact_stream();
        let out = evaluator.evaluate(&exact).unwrap();
        assert_eq!(out.result.error, 0.0);
        assert_eq!(out.result.area, 160.0);
    }

    #[test]
    fn test_degraded_stream_matches_closed_form() {
        let evaluator = evaluator();
        let out = evaluator.evaluate(&ApproxStream::new(vec![2, 2])).unwrap();
        // p0 contributes 4 - 2 flipped bits out of 6.
        assert!((out.result.error - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(out.result.area, 110.0);
    }

    #[test]
    fn test_generation_results_pair_by_index() {
        let evaluator = evaluator();
        let candidates = vec![
            ApproxStream::new(vec![3, 2]),
            ApproxStream::new(vec![4, 2]),
            ApproxStream::new(vec![2, 2]),
        ];
        let evaluated = evaluator.evaluate_generation(&candidates).unwrap();
        assert_eq!(evaluated.len(), 3);
        for (expected, got) in candidates.iter().zip(&evaluated) {
            assert_eq!(&got.stream, expected);
        }
        // Areas drop as p0's degree drops: 135, 160, 110.
        assert_eq!(evaluated[0].result.area, 135.0);
        assert_eq!(evaluated[1].result.area, 160.0);
        assert_eq!(evaluated[2].result.area, 110.0);
    }
}
