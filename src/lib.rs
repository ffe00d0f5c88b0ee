//! # Scanhook
//!
//! Event-driven ClamAV and YARA scanning for malware sample repositories.
//!
//! ## Overview
//!
//! When a sample repository reports that an artifact was created or
//! re-uploaded, Scanhook:
//!
//! - Fetches the artifact's metadata and skips it if it is over the size ceiling
//! - Downloads the content into a uniquely named file inside a sandbox directory
//! - Runs every enabled engine (`clamdscan`, `yara`) with a hard timeout
//! - Normalizes each engine's output into a [`Verdict`]
//! - Appends one comment with a line per engine and reconciles `engine:label` tags
//! - Removes the staged file, whatever happened before
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scanhook::{ScanHookConfig, ScanOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanHookConfig::from_env()?;
//!     let orchestrator = ScanOrchestrator::from_config(&config)?;
//!
//!     let summary = orchestrator.on_artifact_created("abc123").await;
//!     println!("{}: {}", summary.artifact_id, summary.stage);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes the MWDB client
//! - `mwdb` - HTTP client for MWDB-compatible repositories
//!
//! ## Architecture
//!
//! - **Core**: Verdicts, engine results, the `Scanner` trait and error types
//! - **Sandbox**: Staged files and the path guard
//! - **Verdict**: Parsing of raw engine output
//! - **Backends**: ClamAV and YARA drivers
//! - **Tags**: Minimal tag deltas per engine
//! - **Repository**: The sample repository client
//! - **Manager**: The per-event state machine
//! - **Audit**: Structured logging of runs

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod config;
pub mod core;
pub mod manager;
pub mod repository;
pub mod sandbox;
pub mod tags;
pub mod verdict;

// Re-export commonly used types at the crate root
pub use crate::core::{
    ArtifactEvent, ArtifactMetadata, EngineKind, EngineOutcome, EngineResult, RepositoryError,
    ScanError, ScanReason, Scanner, Verdict,
};

pub use crate::config::ScanHookConfig;
pub use crate::manager::{ScanOrchestrator, ScanStage, ScanSummary};
pub use crate::repository::SampleRepository;

/// Prelude module for convenient imports.
///
/// ```rust
/// use scanhook::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ScanHookConfig;
    pub use crate::core::{
        ArtifactEvent, ArtifactMetadata, EngineKind, EngineOutcome, EngineResult,
        RepositoryError, ScanError, ScanReason, Scanner, Verdict,
    };
    pub use crate::manager::{ScanOrchestrator, ScanStage, ScanSummary};
    pub use crate::repository::{MemoryRepository, SampleRepository};
    pub use crate::sandbox::Sandbox;
}
