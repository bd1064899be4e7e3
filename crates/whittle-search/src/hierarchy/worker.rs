//! Per-leaf search workers.

use std::sync::Arc;

use whittle_circuit::Netlist;
use whittle_tooling::Toolchain;

use super::decompose::LeafBlock;
use crate::controller::{NullObserver, SearchController, SearchStatus};
use crate::{setup, SearchError};

/// A nested search over one leaf's internal structure.
///
/// The worker produces a private ordered sequence of increasingly
/// approximate variants of its leaf, one new variant per advance, with
/// no error bound of its own — feasibility is judged only at the whole-
/// circuit level. Variants are memoized: an offered-but-unadopted
/// variant is offered again on the next round instead of being
/// recomputed.
pub struct LeafWorker {
    name: String,
    controller: SearchController,
    /// Materialized variants in internal adoption order.
    variants: Vec<Arc<Netlist>>,
    /// How many variants the global baseline has adopted.
    committed: usize,
    exhausted: bool,
    exact: Netlist,
}

impl LeafWorker {
    /// Re-partition the leaf finely, generate its private stimulus, and
    /// stand up the nested controller.
    pub fn bootstrap(toolchain: &Toolchain, leaf: &LeafBlock) -> Result<Self, SearchError> {
        let setup = setup::prepare(toolchain, &leaf.netlist, leaf.suggested_parts, None)?;
        let exact = setup.exact_artifact.clone();
        // The internal descent is unconstrained (threshold 1.0): every
        // candidate is feasible, so each step adopts the minimum-area
        // decrement until the floor.
        let controller = setup.controller(toolchain, 1.0);
        log::debug!(
            "worker {} over {} internal partitions",
            leaf.netlist.module,
            setup.registry.len()
        );
        Ok(Self {
            name: leaf.netlist.module.clone(),
            controller,
            variants: Vec::new(),
            committed: 0,
            exhausted: false,
            exact,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The leaf's exact assembled artifact (the initial baseline).
    pub fn exact(&self) -> &Netlist {
        &self.exact
    }

    /// The next uncommitted variant, running at most one internal
    /// iteration to materialize it. `None` once the internal search is
    /// exhausted and every variant has been committed — the worker is
    /// then fully collapsed.
    pub fn offer(&mut self) -> Result<Option<Arc<Netlist>>, SearchError> {
        if self.committed < self.variants.len() {
            return Ok(Some(self.variants[self.committed].clone()));
        }
        if self.exhausted {
            return Ok(None);
        }
        match self.controller.step(&mut NullObserver)? {
            SearchStatus::Running => {
                let record = self
                    .controller
                    .history()
                    .last()
                    .expect("running step just accepted an iteration");
                self.variants.push(record.artifact.clone());
                Ok(Some(record.artifact.clone()))
            }
            _ => {
                log::debug!("worker {} exhausted after {} variants", self.name, self.variants.len());
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Mark the currently offered variant as adopted into the global
    /// baseline.
    pub fn commit(&mut self) {
        debug_assert!(self.committed < self.variants.len());
        self.committed += 1;
    }
}
