//! The flat greedy search controller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use whittle_circuit::{ApproxStream, EvaluationResult, Netlist};

use crate::evaluate::{Evaluated, Evaluator};
use crate::{generate, select, SearchError};

/// Controller states. `Converged` means no further decrement can be
/// generated; `Infeasible` means the last generation had no candidate
/// under the error bound. Both keep the previously accepted stream as
/// the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Running,
    Converged,
    Infeasible,
}

/// One accepted iteration: the adopted design point, its score, the
/// assembled artifact, and how long the generation took.
#[derive(Clone)]
pub struct AcceptedIteration {
    pub iteration: u32,
    pub stream: ApproxStream,
    pub result: EvaluationResult,
    pub artifact: Arc<Netlist>,
    pub elapsed: Duration,
}

/// Hook for run reporting. The controller calls `generation` with every
/// scored candidate (the provenance trail) and `accepted` after an
/// adoption.
pub trait SearchObserver {
    fn generation(&mut self, _iteration: u32, _evaluated: &[Evaluated]) {}
    fn accepted(&mut self, _record: &AcceptedIteration) {}
}

/// Observer that records nothing.
pub struct NullObserver;

impl SearchObserver for NullObserver {}

/// Terminal result of a controller run.
pub struct SearchOutcome {
    pub status: SearchStatus,
    /// The accepted stream at the last successful adoption (the
    /// all-exact stream when nothing was ever adopted).
    pub stream: ApproxStream,
    pub result: Option<EvaluationResult>,
    pub artifact: Option<Arc<Netlist>>,
    pub history: Vec<AcceptedIteration>,
}

/// Drives generate -> evaluate -> select -> adopt until a termination
/// signal. Owns all mutable search state; `current` is replaced only at
/// the end of an accepted iteration, and `history` is append-only.
pub struct SearchController {
    evaluator: Evaluator,
    threshold: f64,
    current: ApproxStream,
    iteration: u32,
    status: SearchStatus,
    history: Vec<AcceptedIteration>,
}

impl SearchController {
    /// Start from the all-exact stream.
    pub fn new(evaluator: Evaluator, threshold: f64) -> Self {
        let current = evaluator.registry().all_exact_stream();
        Self {
            evaluator,
            threshold,
            current,
            iteration: 0,
            status: SearchStatus::Running,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &ApproxStream {
        &self.current
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn history(&self) -> &[AcceptedIteration] {
        &self.history
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// One generate/evaluate/select/adopt round. Returns the state the
    /// controller is in afterwards.
    pub fn step(&mut self, observer: &mut dyn SearchObserver) -> Result<SearchStatus, SearchError> {
        if self.status != SearchStatus::Running {
            return Ok(self.status);
        }

        let candidates = generate::candidates(&self.current);
        if candidates.is_empty() {
            log::info!("no further decrement possible; converged at {}", self.current);
            self.status = SearchStatus::Converged;
            return Ok(self.status);
        }

        let started = Instant::now();
        let iteration = self.iteration + 1;
        let evaluated = self.evaluator.evaluate_generation(&candidates)?;
        observer.generation(iteration, &evaluated);

        let results: Vec<EvaluationResult> = evaluated.iter().map(|e| e.result).collect();
        let Some(chosen) = select::select(&results, self.threshold) else {
            log::info!(
                "no candidate in generation {iteration} meets error {:.4}; stopping at {}",
                self.threshold,
                self.current
            );
            self.status = SearchStatus::Infeasible;
            return Ok(self.status);
        };

        let adopted = evaluated
            .into_iter()
            .nth(chosen)
            .expect("selector index within generation");
        let record = AcceptedIteration {
            iteration,
            stream: adopted.stream.clone(),
            result: adopted.result,
            artifact: adopted.artifact,
            elapsed: started.elapsed(),
        };
        log::info!(
            "iteration {iteration}: adopted {} (error {:.6}, area {:.2})",
            record.stream,
            record.result.error,
            record.result.area
        );

        self.current = adopted.stream;
        self.iteration = iteration;
        observer.accepted(&record);
        self.history.push(record);
        Ok(SearchStatus::Running)
    }

    /// Run to termination and report the final accepted design point.
    pub fn run(&mut self, observer: &mut dyn SearchObserver) -> Result<SearchOutcome, SearchError> {
        loop {
            if self.step(observer)? != SearchStatus::Running {
                return Ok(self.outcome());
            }
        }
    }

    fn outcome(&self) -> SearchOutcome {
        let last = self.history.last();
        SearchOutcome {
            status: self.status,
            stream: last
                .map(|r| r.stream.clone())
                .unwrap_or_else(|| self.current.clone()),
            result: last.map(|r| r.result),
            artifact: last.map(|r| r.artifact.clone()),
            history: self.history.clone(),
        }
    }
}
