//! Flat controller behavior over scripted and model toolchains.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use whittle_circuit::{ApproxStream, Netlist, TruthTable};
use whittle_search::controller::{AcceptedIteration, SearchObserver};
use whittle_search::evaluate::Evaluated;
use whittle_search::{setup, NullObserver, SearchStatus};
use whittle_tooling::model::{
    self, ModelApproximator, ModelPartitioner, ModelSizeEstimator, ModelStimulus,
};
use whittle_tooling::{Approximator, Simulator, Synthesizer, ToolError, Toolchain};

const ROW_BITS: usize = 100;

/// Simulator scripted by part-degree signature: an entry's error rate
/// becomes that many flipped bits in a single 100-bit row. A lookup
/// miss fails the evaluation, so the script doubles as an assertion on
/// which design points ever get simulated.
struct ScriptedSimulator {
    errors: HashMap<String, f64>,
}

impl Simulator for ScriptedSimulator {
    fn run(&self, circuit: &Netlist, _testbench: &Netlist) -> Result<TruthTable, ToolError> {
        let signature = model::degree_signature(circuit);
        let error = *self
            .errors
            .get(&signature)
            .ok_or_else(|| ToolError::unparsable("sim-script", format!("no entry for {signature}")))?;
        let flipped = (error * ROW_BITS as f64).round() as usize;
        let row: String = (0..ROW_BITS)
            .map(|i| if i < flipped { '1' } else { '0' })
            .collect();
        Ok(TruthTable::new(vec![row]))
    }
}

struct ScriptedSynthesizer {
    areas: HashMap<String, f64>,
}

impl Synthesizer for ScriptedSynthesizer {
    fn synthesize(&self, circuit: &Netlist) -> Result<f64, ToolError> {
        let signature = model::degree_signature(circuit);
        self.areas.get(&signature).copied().ok_or_else(|| {
            ToolError::unparsable("synth-script", format!("no entry for {signature}"))
        })
    }
}

fn scripted_toolchain(errors: &[(&str, f64)], areas: &[(&str, f64)]) -> Toolchain {
    Toolchain {
        partitioner: Arc::new(ModelPartitioner),
        size_estimator: Arc::new(ModelSizeEstimator),
        approximator: Arc::new(ModelApproximator),
        simulator: Arc::new(ScriptedSimulator {
            errors: errors.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }),
        synthesizer: Arc::new(ScriptedSynthesizer {
            areas: areas.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }),
        stimulus: Arc::new(ModelStimulus::default()),
    }
}

fn two_partition_circuit() -> Netlist {
    model::circuit("top", &[model::part("p0", 4, 3, 80), model::part("p1", 3, 2, 40)])
}

#[test]
fn test_two_partition_end_to_end() {
    // Partition 0 has max degree 3, partition 1 max degree 2. The only
    // first-generation candidate is [2, 2]: lowering partition 1 would
    // hit the floor. [2, 2] is feasible and adopted; the next
    // generation is empty, so the search converges there.
    let toolchain = scripted_toolchain(
        &[("p0=3,p1=2", 0.0), ("p0=2,p1=2", 0.05)],
        &[("p0=2,p1=2", 80.0)],
    );
    let setup = setup::prepare(&toolchain, &two_partition_circuit(), 2, None).unwrap();
    let mut controller = setup.controller(&toolchain, 0.1);

    let outcome = controller.run(&mut NullObserver).unwrap();
    assert_eq!(outcome.status, SearchStatus::Converged);
    assert_eq!(outcome.stream, ApproxStream::new(vec![2, 2]));
    let result = outcome.result.unwrap();
    assert!((result.error - 0.05).abs() < 1e-12);
    assert_eq!(result.area, 80.0);
    assert_eq!(outcome.history.len(), 1);
}

#[test]
fn test_infeasible_first_generation_keeps_exact_stream() {
    let toolchain = scripted_toolchain(
        &[("p0=3,p1=2", 0.0), ("p0=2,p1=2", 0.05)],
        &[("p0=2,p1=2", 80.0)],
    );
    let setup = setup::prepare(&toolchain, &two_partition_circuit(), 2, None).unwrap();
    let mut controller = setup.controller(&toolchain, 0.01);

    let outcome = controller.run(&mut NullObserver).unwrap();
    assert_eq!(outcome.status, SearchStatus::Infeasible);
    // The previously accepted stream — here the all-exact one — remains
    // the answer.
    assert_eq!(outcome.stream, ApproxStream::new(vec![3, 2]));
    assert!(outcome.result.is_none());
    assert!(outcome.history.is_empty());
}

fn model_circuit() -> Netlist {
    model::circuit("top", &[model::part("p0", 4, 4, 100), model::part("p1", 3, 3, 90)])
}

#[test]
fn test_descent_is_monotone_and_floor_bounded() {
    let toolchain = model::model_toolchain();
    let setup = setup::prepare(&toolchain, &model_circuit(), 2, None).unwrap();
    let mut controller = setup.controller(&toolchain, 1.0);

    let outcome = controller.run(&mut NullObserver).unwrap();
    assert_eq!(outcome.status, SearchStatus::Converged);
    assert_eq!(outcome.stream, ApproxStream::new(vec![2, 2]));
    assert_eq!(outcome.result.unwrap().area, 110.0);

    // Per-partition degrees never increase across accepted iterations,
    // and each adoption moves exactly one coordinate by exactly one.
    let mut previous = setup.registry.all_exact_stream();
    for record in &outcome.history {
        let mut moved = 0;
        for i in 0..previous.len() {
            let before = previous.degree(i);
            let after = record.stream.degree(i);
            assert!(after <= before);
            if after != before {
                assert_eq!(after, before - 1);
                moved += 1;
            }
        }
        assert_eq!(moved, 1);
        previous = record.stream.clone();
    }
}

struct CountingApproximator {
    inner: ModelApproximator,
    calls: AtomicUsize,
}

impl Approximator for CountingApproximator {
    fn approximate(
        &self,
        partition: &Netlist,
        degree: i32,
        num_inputs: usize,
        num_outputs: usize,
    ) -> Result<Netlist, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .approximate(partition, degree, num_inputs, num_outputs)
    }
}

#[test]
fn test_cache_spans_generations() {
    let counting = Arc::new(CountingApproximator {
        inner: ModelApproximator,
        calls: AtomicUsize::new(0),
    });
    let mut toolchain = model::model_toolchain();
    toolchain.approximator = counting.clone();

    let setup = setup::prepare(&toolchain, &model_circuit(), 2, None).unwrap();
    let mut controller = setup.controller(&toolchain, 1.0);
    controller.run(&mut NullObserver).unwrap();

    // The run visits (p0,3), (p1,2) in generation one, re-uses both in
    // generation two, and adds only (p0,2) in generation three.
    assert_eq!(counting.calls.load(Ordering::SeqCst), 3);
}

#[derive(Default)]
struct RecordingObserver {
    generation_sizes: Vec<usize>,
    accepted: Vec<ApproxStream>,
}

impl SearchObserver for RecordingObserver {
    fn generation(&mut self, _iteration: u32, evaluated: &[Evaluated]) {
        self.generation_sizes.push(evaluated.len());
    }

    fn accepted(&mut self, record: &AcceptedIteration) {
        self.accepted.push(record.stream.clone());
    }
}

#[test]
fn test_observer_sees_every_generation_and_adoption() {
    let toolchain = model::model_toolchain();
    let setup = setup::prepare(&toolchain, &model_circuit(), 2, None).unwrap();
    let mut controller = setup.controller(&toolchain, 1.0);

    let mut observer = RecordingObserver::default();
    let outcome = controller.run(&mut observer).unwrap();

    // Generation one offers both coordinates; after that partition 1 is
    // floor-adjacent and only partition 0 can move.
    assert_eq!(observer.generation_sizes, vec![2, 1, 1]);
    assert_eq!(
        observer.accepted,
        outcome
            .history
            .iter()
            .map(|r| r.stream.clone())
            .collect::<Vec<_>>()
    );
}
