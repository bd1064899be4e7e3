//! A run session: bootstrap, search, report, emit.

use std::path::PathBuf;
use std::time::Duration;

use whittle_circuit::{EvaluationResult, Netlist};
use whittle_search::controller::{AcceptedIteration, SearchObserver};
use whittle_search::evaluate::Evaluated;
use whittle_search::hierarchy::{
    GlobalConfig, GlobalEvaluated, GlobalObserver, GlobalRecord, GlobalSearch, ResultLabel,
};
use whittle_search::{setup, SearchStatus};
use whittle_tooling::Toolchain;

use crate::config::RunConfig;
use crate::report::{self, ArtifactStore, IterationRecord, ResultRecord, RunLog};
use crate::CoreError;

/// What a finished run hands back to the caller.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub label: String,
    pub original_area: f64,
    pub result: EvaluationResult,
    pub artifact: Option<PathBuf>,
    pub iterations: usize,
}

/// One approximation run over one circuit, flat or hierarchical.
pub struct Session {
    config: RunConfig,
    toolchain: Toolchain,
}

impl Session {
    pub fn new(config: RunConfig, toolchain: Toolchain) -> Self {
        Self { config, toolchain }
    }

    /// Flat greedy search: partition once, then decrement one
    /// partition's degree per iteration.
    pub fn run_flat(
        &self,
        circuit: &Netlist,
        testbench: &Netlist,
    ) -> Result<RunSummary, CoreError> {
        let original_area = self.toolchain.synthesizer.synthesize(circuit)?;
        log::info!("original design area {original_area:.2}");

        let setup = setup::prepare(
            &self.toolchain,
            circuit,
            self.config.num_parts,
            Some(testbench.clone()),
        )?;

        // Per-partition testbenches are generated exactly once, before
        // the search; keep them next to the partition artifacts.
        let partition_store = ArtifactStore::create(self.config.output_dir.join("partition"))?;
        for stimulus in setup.partition_stimuli.iter().flatten() {
            partition_store.persist(&stimulus.testbench.module, &stimulus.testbench)?;
        }

        let store = ArtifactStore::create(self.config.output_dir.join("approx_design"))?;
        let mut run_log = RunLog::create(self.config.output_dir.join("run.log"))?;
        let mut reporter = Reporter {
            store: &store,
            log: &mut run_log,
            original_area,
        };

        let mut controller = setup.controller(&self.toolchain, self.config.threshold);
        let outcome = controller.run(&mut reporter)?;

        let label = match outcome.status {
            SearchStatus::Converged => "converged",
            SearchStatus::Infeasible => "infeasible",
            SearchStatus::Running => unreachable!("run() returns only on termination"),
        };
        // With no accepted iteration the all-exact circuit is the
        // answer.
        let (result, winner) = match (outcome.result, &outcome.artifact) {
            (Some(result), Some(artifact)) => (result, artifact.as_ref().clone()),
            _ => (
                EvaluationResult {
                    error: 0.0,
                    area: original_area,
                },
                setup.exact_artifact.clone(),
            ),
        };
        let artifact = self.emit(&circuit.module, &winner, label, result, original_area)?;

        Ok(RunSummary {
            label: label.to_string(),
            original_area,
            result,
            artifact: Some(artifact),
            iterations: outcome.history.len(),
        })
    }

    /// Hierarchical search: decompose into leaves, one worker per leaf,
    /// block-coordinate descent at the top. Without a caller-supplied
    /// testbench, stimulus is generated from the circuit.
    pub fn run_recursive(
        &self,
        circuit: &Netlist,
        testbench: Option<&Netlist>,
    ) -> Result<RunSummary, CoreError> {
        let original_area = self.toolchain.synthesizer.synthesize(circuit)?;
        log::info!("original design area {original_area:.2}");

        let store = ArtifactStore::create(self.config.output_dir.join("approx_design"))?;
        let mut run_log = RunLog::create(self.config.output_dir.join("run.log"))?;
        let mut reporter = Reporter {
            store: &store,
            log: &mut run_log,
            original_area,
        };

        let mut global = GlobalSearch::bootstrap(
            &self.toolchain,
            circuit,
            testbench.cloned(),
            &self.config.decompose,
            GlobalConfig {
                threshold: self.config.threshold,
                tolerance: self.config.tolerance,
            },
        )?;
        let outcome = global.run(&mut reporter)?;

        let label = match outcome.label {
            ResultLabel::Met => "met",
            ResultLabel::BestEffort => "best-effort",
        };
        match outcome.record {
            Some(record) => {
                let artifact = self.emit(
                    &circuit.module,
                    &record.artifact,
                    label,
                    record.result,
                    original_area,
                )?;
                Ok(RunSummary {
                    label: label.to_string(),
                    original_area,
                    result: record.result,
                    artifact: Some(artifact),
                    iterations: outcome.history.len(),
                })
            }
            None => {
                // Degraded answer with nothing adopted: report the
                // exact circuit, with no winning artifact to copy.
                let result = EvaluationResult {
                    error: 0.0,
                    area: original_area,
                };
                let record = ResultRecord {
                    threshold: self.config.threshold,
                    label: label.to_string(),
                    error: result.error,
                    area: result.area,
                    area_pct: pct(result.area, original_area),
                    original_area,
                    artifact: None,
                };
                report::write_result(&self.config.output_dir.join("result"), &record)?;
                Ok(RunSummary {
                    label: label.to_string(),
                    original_area,
                    result,
                    artifact: None,
                    iterations: 0,
                })
            }
        }
    }

    /// Copy the winning artifact to the fixed result path and write the
    /// result record beside it.
    fn emit(
        &self,
        module: &str,
        winner: &Netlist,
        label: &str,
        result: EvaluationResult,
        original_area: f64,
    ) -> Result<PathBuf, CoreError> {
        let result_dir = self.config.output_dir.join("result");
        let result_store = ArtifactStore::create(result_dir.clone())?;
        let metric = (self.config.threshold * 100.0).round() as u32;
        let artifact = result_store.persist(&format!("{module}_{metric}metric"), winner)?;

        let record = ResultRecord {
            threshold: self.config.threshold,
            label: label.to_string(),
            error: result.error,
            area: result.area,
            area_pct: pct(result.area, original_area),
            original_area,
            artifact: Some(artifact.clone()),
        };
        report::write_result(&result_dir, &record)?;
        log::info!(
            "{label}: error {:.6}, area {:.2} ({:.2}% of original)",
            result.error,
            result.area,
            record.area_pct
        );
        Ok(artifact)
    }
}

fn pct(area: f64, original: f64) -> f64 {
    if original > 0.0 {
        100.0 * area / original
    } else {
        0.0
    }
}

/// Streams search progress into the artifact store and run log. Both
/// search variants report through the same reporter; a persistence
/// failure degrades the provenance trail but not the search.
struct Reporter<'a> {
    store: &'a ArtifactStore,
    log: &'a mut RunLog,
    original_area: f64,
}

impl Reporter<'_> {
    fn persist(&self, iteration: u32, index: usize, artifact: &Netlist) {
        if let Err(e) = self
            .store
            .persist(&format!("iter{iteration}_design{index}"), artifact)
        {
            log::warn!("could not persist candidate artifact: {e}");
        }
    }

    fn append(&mut self, iteration: u32, design: String, result: EvaluationResult, elapsed: Duration) {
        let record = IterationRecord {
            iteration,
            design,
            error: result.error,
            area: result.area,
            area_pct: pct(result.area, self.original_area),
            elapsed_secs: elapsed.as_secs_f64(),
        };
        if let Err(e) = self.log.append(&record) {
            log::warn!("could not append to run log: {e}");
        }
    }
}

impl SearchObserver for Reporter<'_> {
    fn generation(&mut self, iteration: u32, evaluated: &[Evaluated]) {
        for (index, e) in evaluated.iter().enumerate() {
            self.persist(iteration, index, &e.artifact);
        }
    }

    fn accepted(&mut self, record: &AcceptedIteration) {
        self.append(
            record.iteration,
            record.stream.to_string(),
            record.result,
            record.elapsed,
        );
    }
}

impl GlobalObserver for Reporter<'_> {
    fn round(&mut self, iteration: u32, candidates: &[GlobalEvaluated]) {
        for (index, c) in candidates.iter().enumerate() {
            self.persist(iteration, index, &c.artifact);
        }
    }

    fn accepted(&mut self, record: &GlobalRecord) {
        self.append(
            record.iteration,
            format!("leaf {}", record.worker),
            record.result,
            record.elapsed,
        );
    }
}
