//! Block-coordinate descent over leaf workers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use whittle_circuit::{EvaluationResult, Netlist, TruthTable};
use whittle_tooling::{Simulator, Synthesizer, Toolchain};

use super::decompose::{decompose, DecomposeConfig};
use super::worker::LeafWorker;
use crate::{evaluate, select, SearchError};

/// Error margin tolerated on an adopted round before the hard stop.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct GlobalConfig {
    pub threshold: f64,
    /// A selected candidate whose error exceeds
    /// `threshold + tolerance` stops the search immediately.
    pub tolerance: f64,
}

impl GlobalConfig {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// One adopted global round.
#[derive(Clone)]
pub struct GlobalRecord {
    pub iteration: u32,
    /// Which leaf advanced this round.
    pub worker: usize,
    pub result: EvaluationResult,
    pub artifact: Arc<Netlist>,
    pub elapsed: Duration,
}

/// One scored whole-circuit candidate of a global round.
#[derive(Clone)]
pub struct GlobalEvaluated {
    pub worker: usize,
    pub result: EvaluationResult,
    pub artifact: Arc<Netlist>,
}

/// How the emitted result relates to the requested threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLabel {
    /// The emitted entry satisfies the threshold.
    Met,
    /// No historical entry satisfies the threshold; the emitted entry
    /// (if any) is the minimum-area point seen, as a degraded answer.
    BestEffort,
}

pub struct GlobalOutcome {
    pub label: ResultLabel,
    pub record: Option<GlobalRecord>,
    pub history: Vec<GlobalRecord>,
}

/// Reporting hook for global rounds, mirroring the flat observer.
pub trait GlobalObserver {
    fn round(&mut self, _iteration: u32, _candidates: &[GlobalEvaluated]) {}
    fn accepted(&mut self, _record: &GlobalRecord) {}
}

impl GlobalObserver for crate::controller::NullObserver {}

/// The top-level controller of the hierarchical search.
///
/// The circuit is a fixed list of leaf artifacts, initially all exact.
/// Each round, every non-collapsed worker offers its next variant; the
/// one-leaf-swapped whole-circuit candidates are scored in parallel
/// behind a join barrier, and the round's choice (if tolerable) becomes
/// the new baseline.
pub struct GlobalSearch {
    workers: Vec<LeafWorker>,
    baseline: Vec<Arc<Netlist>>,
    toplevel: Netlist,
    simulator: Arc<dyn Simulator>,
    synthesizer: Arc<dyn Synthesizer>,
    testbench: Netlist,
    ground_truth: TruthTable,
    config: GlobalConfig,
    iteration: u32,
    history: Vec<GlobalRecord>,
}

impl GlobalSearch {
    /// Decompose the circuit, stand up one worker per leaf, and compute
    /// the whole-circuit ground truth from the all-exact baseline. A
    /// caller-supplied testbench drives the whole-circuit simulations;
    /// when `None`, one is generated from the circuit.
    pub fn bootstrap(
        toolchain: &Toolchain,
        circuit: &Netlist,
        testbench: Option<Netlist>,
        decompose_config: &DecomposeConfig,
        config: GlobalConfig,
    ) -> Result<Self, SearchError> {
        let decomposition = decompose(
            toolchain.partitioner.as_ref(),
            toolchain.size_estimator.as_ref(),
            circuit,
            decompose_config,
        )?;

        let mut workers = Vec::with_capacity(decomposition.leaves.len());
        for leaf in &decomposition.leaves {
            workers.push(LeafWorker::bootstrap(toolchain, leaf)?);
        }
        let baseline: Vec<Arc<Netlist>> = workers
            .iter()
            .map(|w| Arc::new(w.exact().clone()))
            .collect();

        let testbench = match testbench {
            Some(tb) => tb,
            None => toolchain.stimulus.generate(circuit)?.testbench,
        };
        let exact = Self::assemble_with(&decomposition.toplevel, &baseline);
        let ground_truth = toolchain.simulator.run(&exact, &testbench)?;

        Ok(Self {
            workers,
            baseline,
            toplevel: decomposition.toplevel,
            simulator: toolchain.simulator.clone(),
            synthesizer: toolchain.synthesizer.clone(),
            testbench,
            ground_truth,
            config,
            iteration: 0,
            history: Vec::new(),
        })
    }

    fn assemble_with(toplevel: &Netlist, leaves: &[Arc<Netlist>]) -> Netlist {
        Netlist::assemble(toplevel, leaves.iter().map(Arc::as_ref))
    }

    pub fn history(&self) -> &[GlobalRecord] {
        &self.history
    }

    /// Run rounds until no worker can advance or the error budget is
    /// conclusively crossed, then emit the best historical result.
    pub fn run(&mut self, observer: &mut dyn GlobalObserver) -> Result<GlobalOutcome, SearchError> {
        loop {
            let started = Instant::now();

            // Every non-collapsed worker offers one variant.
            let mut offers: Vec<(usize, Arc<Netlist>)> = Vec::new();
            for index in 0..self.workers.len() {
                if let Some(variant) = self.workers[index].offer()? {
                    offers.push((index, variant));
                }
            }
            if offers.is_empty() {
                log::info!("no worker can advance; stopping after {} rounds", self.iteration);
                return Ok(self.finish());
            }

            let iteration = self.iteration + 1;

            // One-leaf-swapped whole-circuit candidates, scored in
            // parallel and joined before selection.
            let candidates: Vec<(usize, Netlist)> = offers
                .iter()
                .map(|(worker, variant)| {
                    let mut leaves = self.baseline.clone();
                    leaves[*worker] = variant.clone();
                    (*worker, Self::assemble_with(&self.toplevel, &leaves))
                })
                .collect();
            let evaluated: Vec<GlobalEvaluated> = candidates
                .into_par_iter()
                .enumerate()
                .map(|(index, (worker, artifact))| {
                    evaluate::score(
                        self.simulator.as_ref(),
                        self.synthesizer.as_ref(),
                        &artifact,
                        &self.testbench,
                        &self.ground_truth,
                    )
                    .map(|result| GlobalEvaluated {
                        worker,
                        result,
                        artifact: Arc::new(artifact),
                    })
                    .map_err(|source| SearchError::Evaluate {
                        candidate: index,
                        source,
                    })
                })
                .collect::<Result<_, _>>()?;
            observer.round(iteration, &evaluated);

            let results: Vec<EvaluationResult> = evaluated.iter().map(|e| e.result).collect();
            // Feasible minimum area first; failing that, the round's
            // cheapest candidate, tolerated only within the margin.
            let chosen = select::select(&results, self.config.threshold)
                .or_else(|| select::min_area(&results))
                .expect("offers are non-empty");
            let choice = &evaluated[chosen];

            if choice.result.error > self.config.threshold + self.config.tolerance {
                log::info!(
                    "round {iteration}: error {:.6} beyond tolerated budget {:.6}; hard stop",
                    choice.result.error,
                    self.config.threshold + self.config.tolerance
                );
                return Ok(self.finish());
            }

            let record = GlobalRecord {
                iteration,
                worker: choice.worker,
                result: choice.result,
                artifact: choice.artifact.clone(),
                elapsed: started.elapsed(),
            };
            log::info!(
                "round {iteration}: advanced leaf {} (error {:.6}, area {:.2})",
                self.workers[choice.worker].name(),
                choice.result.error,
                choice.result.area
            );

            self.workers[choice.worker].commit();
            self.baseline[choice.worker] = choice.artifact.clone();
            self.iteration = iteration;
            observer.accepted(&record);
            self.history.push(record);
        }
    }

    /// Minimum-area history entry under the threshold, else the
    /// minimum-area entry overall as a labeled best-effort answer.
    fn finish(&self) -> GlobalOutcome {
        let feasible = min_area_record(
            self.history
                .iter()
                .filter(|r| r.result.feasible(self.config.threshold)),
        );
        match feasible {
            Some(record) => GlobalOutcome {
                label: ResultLabel::Met,
                record: Some(record.clone()),
                history: self.history.clone(),
            },
            None => GlobalOutcome {
                label: ResultLabel::BestEffort,
                record: min_area_record(self.history.iter()).cloned(),
                history: self.history.clone(),
            },
        }
    }
}

fn min_area_record<'a>(
    records: impl Iterator<Item = &'a GlobalRecord>,
) -> Option<&'a GlobalRecord> {
    let mut best: Option<&GlobalRecord> = None;
    for record in records {
        match best {
            Some(b) if b.result.area <= record.result.area => {}
            _ => best = Some(record),
        }
    }
    best
}
