//! Core traits for the scanhook library.
//!
//! This module defines the `Scanner` capability shared by every
//! detection engine driver.

use crate::core::types::{EngineKind, EngineResult};

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

/// A detection engine driver.
///
/// Drivers scan a file that has already been staged inside the sandbox.
///
/// # Implementation Notes
///
/// - `scan` never fails. Timeouts, missing executables, rejected paths and
///   unexpected exit codes are logged and folded into the returned
///   [`EngineResult`] (`Verdict::Error` for antivirus engines,
///   `EngineOutcome::Failed` for rule engines).
/// - Every path passed to an external process must go through the
///   sandbox's `PathGuard` immediately before the process is launched.
/// - Implementations must be `Send + Sync`; one driver instance serves
///   concurrent scans of different artifacts.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use scanhook::core::{EngineKind, EngineResult, Scanner, Verdict};
/// use async_trait::async_trait;
/// use std::path::Path;
///
/// #[derive(Debug)]
/// struct AlwaysClean;
///
/// #[async_trait]
/// impl Scanner for AlwaysClean {
///     fn engine(&self) -> EngineKind {
///         EngineKind::ClamAv
///     }
///
///     async fn scan(&self, _path: &Path) -> EngineResult {
///         EngineResult::single(EngineKind::ClamAv, Verdict::Clean)
///     }
/// }
/// ```
#[async_trait]
pub trait Scanner: Send + Sync + Debug {
    /// Returns the engine this driver runs.
    fn engine(&self) -> EngineKind;

    /// Scans the staged file at `path`.
    async fn scan(&self, path: &Path) -> EngineResult;

    /// Returns a best-effort engine version string.
    async fn version(&self) -> Option<String> {
        None
    }
}

/// An arc-wrapped scanner for shared ownership.
pub type ArcScanner = std::sync::Arc<dyn Scanner>;
