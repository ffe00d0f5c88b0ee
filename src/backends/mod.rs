//! Scanning backend implementations.
//!
//! This module contains implementations of the `Scanner` trait, one per
//! detection engine, plus the process runner they share.
//!
//! ## Available Backends
//!
//! - [`clamav`] - ClamAV via `clamdscan`
//! - [`yara`] - YARA via the `yara` command line scanner
//! - [`mock`] - A mock scanner for testing
//!
//! ## Implementing a Custom Backend
//!
//! ```rust,ignore
//! use scanhook::core::{EngineKind, EngineResult, Scanner};
//! use async_trait::async_trait;
//! use std::path::Path;
//!
//! #[derive(Debug)]
//! pub struct MyScanner;
//!
//! #[async_trait]
//! impl Scanner for MyScanner {
//!     fn engine(&self) -> EngineKind {
//!         EngineKind::Yara
//!     }
//!
//!     async fn scan(&self, path: &Path) -> EngineResult {
//!         // Validate the path, run the engine, normalize the output
//!         todo!()
//!     }
//! }
//! ```

pub mod clamav;
pub mod mock;
pub mod process;
pub mod yara;

// Re-exports
pub use clamav::{ClamAvConfig, ClamAvScanner};
pub use mock::MockScanner;
pub use process::{run_command, ProcessOutput};
pub use yara::{YaraConfig, YaraScanner};
