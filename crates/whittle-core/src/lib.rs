//! Run orchestration: bootstrap a search over a circuit, stream its
//! progress into the run log and artifact store, and write the final
//! result record.

pub mod config;
pub mod report;
pub mod session;

pub use config::RunConfig;
pub use report::{ArtifactStore, IterationRecord, ReportError, ResultRecord, RunLog};
pub use session::{RunSummary, Session};

use whittle_search::SearchError;
use whittle_tooling::ToolError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("tool failure: {0}")]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
