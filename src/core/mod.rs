//! Core types and traits for the scanhook library.
//!
//! This module provides the fundamental building blocks used throughout
//! the library:
//!
//! - [`types`] - `Verdict`, `EngineKind`, `EngineResult`, artifact metadata
//! - [`traits`] - The `Scanner` trait implemented by every engine driver
//! - [`error`] - Structured error types
//! - [`hasher`] - SHA-256 content verification

pub mod error;
pub mod hasher;
pub mod traits;
pub mod types;

// Re-export commonly used types at the core level
pub use error::{RepositoryError, RepositoryResult, ScanError};
pub use hasher::Integrity;
pub use traits::{ArcScanner, Scanner};
pub use types::{
    ArtifactEvent, ArtifactMetadata, EngineFamily, EngineKind, EngineOutcome, EngineResult,
    ScanReason, Verdict,
};
