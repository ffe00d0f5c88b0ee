//! Structured audit logging.
//!
//! This module provides functions for emitting structured audit events
//! using the `tracing` crate under the `scanhook::audit` target. Events can
//! be captured by any tracing subscriber (JSON file, OpenTelemetry, etc.).

mod events;

pub use events::{
    emit_engine_result, emit_scan_finished, emit_scan_skipped, emit_scan_started, AuditEvent,
    EngineAuditEvent, RunAuditEvent,
};
