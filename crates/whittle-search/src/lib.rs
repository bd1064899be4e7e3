//! The search and selection engine.
//!
//! Explores the space of per-partition precision degrees for a circuit,
//! looking for the configuration that minimizes synthesized area while
//! keeping output error under a bound. The flat variant greedily
//! decrements one partition per iteration; the hierarchical variant
//! splits oversized partitions into leaves, runs a private search per
//! leaf, and advances one leaf per global step (block-coordinate
//! descent). All candidates of one generation are scored in parallel
//! behind a join barrier before anything is selected.

pub mod cache;
pub mod controller;
pub mod evaluate;
pub mod generate;
pub mod hierarchy;
pub mod select;
pub mod setup;

pub use cache::ApproxCache;
pub use controller::{
    AcceptedIteration, NullObserver, SearchController, SearchObserver, SearchOutcome, SearchStatus,
};
pub use evaluate::{Evaluated, Evaluator};
pub use setup::SearchSetup;

use whittle_circuit::StreamError;
use whittle_tooling::ToolError;

/// Fatal search failures. Normal terminations (convergence, an
/// infeasible generation) are [`SearchStatus`] transitions, not errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// An external tool failed while scoring one candidate of a
    /// generation. The whole generation is abandoned: dropping a single
    /// candidate would corrupt the area/error comparison.
    #[error("evaluating candidate {candidate}: {source}")]
    Evaluate {
        candidate: usize,
        #[source]
        source: ToolError,
    },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}
