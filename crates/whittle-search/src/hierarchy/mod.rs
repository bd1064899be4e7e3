//! Hierarchical (recursive) variant: decompose oversized partitions
//! into leaves, search each leaf privately, and advance one leaf per
//! global step.

pub mod decompose;
pub mod global;
pub mod worker;

pub use decompose::{decompose, DecomposeConfig, Decomposition, LeafBlock};
pub use global::{
    GlobalConfig, GlobalEvaluated, GlobalObserver, GlobalOutcome, GlobalRecord, GlobalSearch,
    ResultLabel, DEFAULT_TOLERANCE,
};
pub use worker::LeafWorker;
