//! Sample repository access.
//!
//! The repository owns artifacts, their comments and their tags. This
//! module defines the [`SampleRepository`] capability the orchestrator
//! consumes and two implementations:
//!
//! - [`MwdbClient`] - HTTP client for MWDB-compatible services (feature `mwdb`)
//! - [`MemoryRepository`] - in-memory store for tests and embedding

mod config;
mod memory;
#[cfg(feature = "mwdb")]
mod mwdb;
mod traits;

pub use config::RepositoryConfig;
pub use memory::MemoryRepository;
#[cfg(feature = "mwdb")]
pub use mwdb::MwdbClient;
pub use traits::{ArcRepository, SampleRepository};
