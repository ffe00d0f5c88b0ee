//! Scan orchestration.
//!
//! The [`ScanOrchestrator`] turns one repository event into one complete
//! run: fetch metadata, enforce the size ceiling, stage the content, run
//! every enabled engine, publish the comment and tag deltas, and remove the
//! staged file.

mod annotation;
mod orchestrator;
mod stage;
mod summary;

pub use annotation::{annotation_line, build_comment};
pub use orchestrator::{
    OrchestratorConfig, ScanOrchestrator, ScanOrchestratorBuilder, DEFAULT_MAX_FILE_SIZE,
};
pub use stage::ScanStage;
pub use summary::ScanSummary;
