//! In-memory sample repository.
//!
//! Holds artifacts, comments and tags in a map. Used by tests and by
//! embedders that want to drive the pipeline without a live repository.

use crate::core::{ArtifactMetadata, RepositoryError, RepositoryResult};
use crate::repository::traits::{ensure_within_limit, SampleRepository};

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct StoredArtifact {
    content: Vec<u8>,
    declared_size: Option<u64>,
    comments: Vec<String>,
    tags: BTreeSet<String>,
}

/// A sample repository kept entirely in memory.
///
/// # Examples
///
/// ```rust
/// use scanhook::repository::MemoryRepository;
///
/// let repo = MemoryRepository::new()
///     .with_artifact("abc123", b"sample bytes".to_vec())
///     .with_tags("abc123", ["family:test"]);
///
/// assert_eq!(repo.tags("abc123").len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryRepository {
    artifacts: RwLock<HashMap<String, StoredArtifact>>,
    content_fetches: AtomicU64,
    tag_writes: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an artifact with the given content.
    pub fn with_artifact(self, id: impl Into<String>, content: Vec<u8>) -> Self {
        self.insert(id, content);
        self
    }

    /// Overrides the size reported by `fetch_metadata` for `id`.
    pub fn with_declared_size(self, id: impl Into<String>, size: u64) -> Self {
        self.update(id.into(), |artifact| artifact.declared_size = Some(size));
        self
    }

    /// Seeds tags on `id`.
    pub fn with_tags<I, S>(self, id: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.update(id.into(), |artifact| artifact.tags.extend(tags));
        self
    }

    /// Inserts or replaces an artifact's content.
    pub fn insert(&self, id: impl Into<String>, content: Vec<u8>) {
        self.update(id.into(), |artifact| artifact.content = content);
    }

    /// Makes comment and tag writes fail with `Unreachable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Returns the comments written to `id`, oldest first.
    pub fn comments(&self, id: &str) -> Vec<String> {
        self.read(id, |artifact| artifact.comments.clone())
            .unwrap_or_default()
    }

    /// Returns the tags currently on `id`.
    pub fn tags(&self, id: &str) -> BTreeSet<String> {
        self.read(id, |artifact| artifact.tags.clone())
            .unwrap_or_default()
    }

    /// Returns how many times content was downloaded.
    pub fn content_fetch_count(&self) -> u64 {
        self.content_fetches.load(Ordering::Relaxed)
    }

    /// Returns how many tag adds and removes were performed.
    pub fn tag_write_count(&self) -> u64 {
        self.tag_writes.load(Ordering::Relaxed)
    }

    fn update(&self, id: String, f: impl FnOnce(&mut StoredArtifact)) {
        let mut artifacts = self
            .artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(artifacts.entry(id).or_default());
    }

    fn read<T>(&self, id: &str, f: impl FnOnce(&StoredArtifact) -> T) -> Option<T> {
        self.artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .map(f)
    }

    fn write_existing(&self, id: &str, f: impl FnOnce(&mut StoredArtifact)) -> RepositoryResult<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(RepositoryError::Unreachable {
                message: "simulated write failure".to_string(),
            });
        }

        let mut artifacts = self
            .artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let artifact = artifacts
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })?;
        f(artifact);
        Ok(())
    }

    fn not_found(id: &str) -> RepositoryError {
        RepositoryError::NotFound { id: id.to_string() }
    }
}

#[async_trait]
impl SampleRepository for MemoryRepository {
    async fn fetch_metadata(&self, id: &str) -> RepositoryResult<ArtifactMetadata> {
        self.read(id, |artifact| {
            let size = artifact
                .declared_size
                .unwrap_or(artifact.content.len() as u64);
            ArtifactMetadata::new(id, size)
        })
        .ok_or_else(|| Self::not_found(id))
    }

    async fn fetch_content(&self, id: &str, max_size: u64) -> RepositoryResult<Vec<u8>> {
        self.content_fetches.fetch_add(1, Ordering::Relaxed);
        self.read(id, |artifact| {
            ensure_within_limit(artifact.content.len() as u64, max_size)?;
            Ok(artifact.content.clone())
        })
        .ok_or_else(|| Self::not_found(id))?
    }

    async fn add_comment(&self, id: &str, text: &str) -> RepositoryResult<()> {
        self.write_existing(id, |artifact| artifact.comments.push(text.to_string()))
    }

    async fn list_tags(&self, id: &str) -> RepositoryResult<BTreeSet<String>> {
        self.read(id, |artifact| artifact.tags.clone())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn add_tag(&self, id: &str, tag: &str) -> RepositoryResult<()> {
        self.write_existing(id, |artifact| {
            artifact.tags.insert(tag.to_string());
        })?;
        self.tag_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn remove_tag(&self, id: &str, tag: &str) -> RepositoryResult<()> {
        self.write_existing(id, |artifact| {
            artifact.tags.remove(tag);
        })?;
        self.tag_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
