//! Outcome record of one orchestration run.

use crate::core::{EngineResult, ScanError, ScanReason};
use crate::manager::stage::ScanStage;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// What happened during one orchestration run.
///
/// Returned by [`ScanOrchestrator::process`](crate::manager::ScanOrchestrator::process);
/// runs never fail, they end in `Done` or `Aborted`.
#[derive(Debug)]
pub struct ScanSummary {
    /// Unique ID of this run, shared by its audit events.
    pub run_id: Uuid,

    /// The artifact that was processed.
    pub artifact_id: String,

    /// Why the run was triggered.
    pub reason: ScanReason,

    /// Terminal stage: `Done` or `Aborted`.
    pub stage: ScanStage,

    /// Last non-terminal stage the run completed.
    pub last_stage: ScanStage,

    /// Why the run aborted, if it did.
    pub error: Option<ScanError>,

    /// One result per engine that ran.
    pub results: Vec<EngineResult>,

    /// Comment written to the artifact.
    pub comment: Option<String>,

    /// Tags added to the artifact.
    pub tags_added: Vec<String>,

    /// Tags removed from the artifact.
    pub tags_removed: Vec<String>,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl ScanSummary {
    pub(crate) fn begin(artifact_id: impl Into<String>, reason: ScanReason) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            artifact_id: artifact_id.into(),
            reason,
            stage: ScanStage::Start,
            last_stage: ScanStage::Start,
            error: None,
            results: Vec::new(),
            comment: None,
            tags_added: Vec::new(),
            tags_removed: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn advance(&mut self, stage: ScanStage) {
        tracing::debug!(
            run_id = %self.run_id,
            artifact_id = %self.artifact_id,
            from = %self.last_stage,
            to = %stage,
            "Stage reached"
        );
        self.stage = stage;
        self.last_stage = stage;
    }

    pub(crate) fn finish(&mut self, error: Option<ScanError>) {
        self.stage = if error.is_some() {
            ScanStage::Aborted
        } else {
            ScanStage::Done
        };
        self.error = error;
        self.finished_at = Utc::now();
    }

    /// Returns `true` if the run reached `Done`.
    pub fn is_done(&self) -> bool {
        self.stage == ScanStage::Done
    }

    /// Returns `true` if the run was skipped over the size ceiling.
    pub fn is_skipped(&self) -> bool {
        self.error.as_ref().is_some_and(ScanError::is_skip)
    }

    /// Returns `true` if any engine reported a detection.
    pub fn has_detection(&self) -> bool {
        self.results.iter().any(|r| r.outcome.has_detection())
    }

    /// Number of tag writes performed.
    pub fn tag_write_count(&self) -> usize {
        self.tags_added.len() + self.tags_removed.len()
    }

    /// Wall-clock duration of the run in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}
