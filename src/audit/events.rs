//! Audit event types and emission functions.

use crate::core::{EngineOutcome, EngineResult, ScanError, ScanReason, Verdict};
use crate::manager::ScanSummary;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit record of one engine's result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Run this result belongs to.
    pub run_id: Uuid,

    /// Artifact that was scanned.
    pub artifact_id: String,

    /// Engine name.
    pub engine: String,

    /// `clean`, `detected`, `error`, `matched`, `no_match` or `failed`.
    pub outcome: String,

    /// Detection names, if any.
    pub detections: Vec<String>,

    /// Engine version, if reported.
    pub version: Option<String>,
}

impl EngineAuditEvent {
    /// Builds the event for `result`.
    pub fn new(run_id: Uuid, artifact_id: &str, result: &EngineResult) -> Self {
        Self {
            timestamp: Utc::now(),
            run_id,
            artifact_id: artifact_id.to_string(),
            engine: result.engine.as_str().to_string(),
            outcome: outcome_label(&result.outcome).to_string(),
            detections: result
                .verdicts()
                .iter()
                .filter_map(Verdict::detection_name)
                .map(str::to_string)
                .collect(),
            version: result.version.clone(),
        }
    }
}

impl AuditEvent for EngineAuditEvent {
    fn event_type(&self) -> &'static str {
        "engine_result"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Audit record of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Unique run ID.
    pub run_id: Uuid,

    /// Artifact that was processed.
    pub artifact_id: String,

    /// Why the run was triggered.
    pub reason: ScanReason,

    /// Terminal stage.
    pub stage: String,

    /// Last stage completed before the terminal one.
    pub last_stage: String,

    /// Engines that ran.
    pub engines: Vec<String>,

    /// Whether any engine reported a detection.
    pub detected: bool,

    /// Tags added.
    pub tags_added: Vec<String>,

    /// Tags removed.
    pub tags_removed: Vec<String>,

    /// Abort reason, if any.
    pub error: Option<String>,

    /// Run duration in milliseconds.
    pub duration_ms: u64,
}

impl From<&ScanSummary> for RunAuditEvent {
    fn from(summary: &ScanSummary) -> Self {
        Self {
            timestamp: summary.finished_at,
            run_id: summary.run_id,
            artifact_id: summary.artifact_id.clone(),
            reason: summary.reason,
            stage: summary.stage.to_string(),
            last_stage: summary.last_stage.to_string(),
            engines: summary
                .results
                .iter()
                .map(|r| r.engine.as_str().to_string())
                .collect(),
            detected: summary.has_detection(),
            tags_added: summary.tags_added.clone(),
            tags_removed: summary.tags_removed.clone(),
            error: summary.error.as_ref().map(ToString::to_string),
            duration_ms: summary.duration_ms(),
        }
    }
}

impl AuditEvent for RunAuditEvent {
    fn event_type(&self) -> &'static str {
        "scan_finished"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

fn outcome_label(outcome: &EngineOutcome) -> &'static str {
    match outcome {
        EngineOutcome::Single { verdict } => match verdict {
            Verdict::Clean => "clean",
            Verdict::Detected(_) => "detected",
            Verdict::Error => "error",
        },
        EngineOutcome::Matches { verdicts } if verdicts.is_empty() => "no_match",
        EngineOutcome::Matches { .. } => "matched",
        EngineOutcome::Failed { .. } => "failed",
    }
}

/// Emits an audit event for a run starting.
pub fn emit_scan_started(run_id: Uuid, artifact_id: &str, reason: ScanReason) {
    tracing::info!(
        target: "scanhook::audit",
        event_type = "scan_started",
        run_id = %run_id,
        artifact_id = %artifact_id,
        reason = %reason,
        timestamp = %Utc::now().to_rfc3339(),
        "Scan started"
    );
}

/// Emits an audit event for one engine's result.
pub fn emit_engine_result(run_id: Uuid, artifact_id: &str, result: &EngineResult) {
    let event = EngineAuditEvent::new(run_id, artifact_id, result);

    tracing::info!(
        target: "scanhook::audit",
        event_type = event.event_type(),
        run_id = %event.run_id,
        artifact_id = %event.artifact_id,
        engine = %event.engine,
        outcome = %event.outcome,
        detections = ?event.detections,
        version = ?event.version,
        timestamp = %event.timestamp.to_rfc3339(),
        "Engine result"
    );
}

/// Emits an audit event for a run skipped over the size ceiling.
///
/// Recorded at `info` like the other audit events; the operator-facing
/// warning comes from the orchestrator.
pub fn emit_scan_skipped(run_id: Uuid, artifact_id: &str, error: &ScanError) {
    tracing::info!(
        target: "scanhook::audit",
        event_type = "scan_skipped",
        run_id = %run_id,
        artifact_id = %artifact_id,
        reason = %error,
        timestamp = %Utc::now().to_rfc3339(),
        "Scan skipped"
    );
}

/// Emits an audit event for a finished run.
pub fn emit_scan_finished(summary: &ScanSummary) {
    let event = RunAuditEvent::from(summary);

    tracing::info!(
        target: "scanhook::audit",
        event_type = event.event_type(),
        run_id = %event.run_id,
        artifact_id = %event.artifact_id,
        reason = %event.reason,
        stage = %event.stage,
        last_stage = %event.last_stage,
        engines = ?event.engines,
        detected = event.detected,
        tags_added = ?event.tags_added,
        tags_removed = ?event.tags_removed,
        error = ?event.error,
        duration_ms = event.duration_ms,
        timestamp = %event.timestamp.to_rfc3339(),
        "Scan finished"
    );
}
