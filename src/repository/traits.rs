//! Sample repository trait definition.

use crate::core::{ArtifactMetadata, RepositoryError, RepositoryResult};

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Client for the repository that owns artifacts, comments and tags.
///
/// One instance is constructed at startup and shared by every unit of
/// work, so implementations must tolerate concurrent use.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use scanhook::core::{ArtifactMetadata, RepositoryResult};
/// use scanhook::repository::SampleRepository;
/// use async_trait::async_trait;
/// use std::collections::BTreeSet;
///
/// #[derive(Debug)]
/// struct MyRepository;
///
/// #[async_trait]
/// impl SampleRepository for MyRepository {
///     async fn fetch_metadata(&self, id: &str) -> RepositoryResult<ArtifactMetadata> {
///         todo!()
///     }
///
///     // ...
/// }
/// ```
#[async_trait]
pub trait SampleRepository: Send + Sync + Debug {
    /// Fetches the artifact's metadata without downloading its content.
    async fn fetch_metadata(&self, id: &str) -> RepositoryResult<ArtifactMetadata>;

    /// Downloads the artifact's bytes.
    ///
    /// Fails with [`RepositoryError::TooLarge`] as soon as the body is known
    /// to exceed `max_size` bytes, without buffering the rest of it.
    async fn fetch_content(&self, id: &str, max_size: u64) -> RepositoryResult<Vec<u8>>;

    /// Appends a comment to the artifact.
    async fn add_comment(&self, id: &str, text: &str) -> RepositoryResult<()>;

    /// Lists the artifact's tags, spelled as stored.
    async fn list_tags(&self, id: &str) -> RepositoryResult<BTreeSet<String>>;

    /// Adds a tag to the artifact.
    async fn add_tag(&self, id: &str, tag: &str) -> RepositoryResult<()>;

    /// Removes a tag from the artifact.
    async fn remove_tag(&self, id: &str, tag: &str) -> RepositoryResult<()>;
}

/// Rejects a body of `size` bytes when it exceeds `max` bytes.
pub(crate) fn ensure_within_limit(size: u64, max: u64) -> RepositoryResult<()> {
    if size > max {
        return Err(RepositoryError::TooLarge { size, max });
    }
    Ok(())
}

/// An arc-wrapped repository for shared ownership.
pub type ArcRepository = std::sync::Arc<dyn SampleRepository>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_inclusive() {
        assert!(ensure_within_limit(0, 0).is_ok());
        assert!(ensure_within_limit(4096, 4096).is_ok());
        assert!(matches!(
            ensure_within_limit(4097, 4096),
            Err(RepositoryError::TooLarge {
                size: 4097,
                max: 4096
            })
        ));
    }
}
