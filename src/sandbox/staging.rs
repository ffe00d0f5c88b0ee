//! Temporary staging of artifact bytes inside the sandbox directory.

use crate::core::ScanError;
use crate::sandbox::guard::PathGuard;

use std::path::{Path, PathBuf};

/// Maximum number of identifier characters kept in a staged file name.
const MAX_ID_CHARS: usize = 64;

/// The sandbox directory shared by all scans.
///
/// Concurrent scans share one `Sandbox`; each staged file gets a unique
/// random name, so no locking is needed.
///
/// # Directory Structure
///
/// ```text
/// sandbox/
/// ├── scanhook_<id>_Ab3xYz91Qw2e   # one file per in-flight scan
/// └── scanhook_<id>_K9pLm2Xc0vB7
/// ```
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    guard: PathGuard,
}

impl Sandbox {
    /// Opens the sandbox at `root`, creating the directory if absent.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ScanError> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            ScanError::configuration(format!(
                "failed to create sandbox directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        let guard = PathGuard::new(&root)?;
        let root = guard.root().to_path_buf();

        tracing::debug!(sandbox = %root.display(), "Sandbox ready");
        Ok(Self { root, guard })
    }

    /// Returns the canonical sandbox directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the guard confining paths to this sandbox.
    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// Creates an empty, uniquely named file inside the sandbox.
    ///
    /// Characters of `prefix` outside `[A-Za-z0-9_-]` are replaced with `_`.
    pub fn stage(&self, prefix: &str) -> Result<StagedFile, ScanError> {
        // Recreate the directory if a temp cleaner removed it.
        std::fs::create_dir_all(&self.root)
            .map_err(|e| ScanError::staging(format!("sandbox directory unavailable: {}", e)))?;

        let temp = tempfile::Builder::new()
            .prefix(&sanitize(prefix))
            .rand_bytes(12)
            .tempfile_in(&self.root)
            .map_err(|e| ScanError::staging(format!("failed to create staged file: {}", e)))?;

        let (file, path) = temp
            .keep()
            .map_err(|e| ScanError::staging(format!("failed to keep staged file: {}", e)))?;
        drop(file);

        tracing::debug!(path = %path.display(), "Staged file created");
        Ok(StagedFile { path, removed: false })
    }

    /// Stages `data` for the artifact `artifact_id`.
    pub async fn stage_bytes(&self, artifact_id: &str, data: &[u8]) -> Result<StagedFile, ScanError> {
        let staged = self.stage(&staging_prefix(artifact_id))?;
        staged.write(data).await?;
        Ok(staged)
    }
}

/// A staged artifact file.
///
/// The file is removed when [`StagedFile::unstage`] is called or, failing
/// that, when the value is dropped. Removal failures are logged and never
/// propagated.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    removed: bool,
}

impl StagedFile {
    /// Returns the absolute path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the file's content with `data`.
    pub async fn write(&self, data: &[u8]) -> Result<(), ScanError> {
        tokio::fs::write(&self.path, data).await.map_err(|e| {
            ScanError::staging(format!(
                "failed to write {} bytes to '{}': {}",
                data.len(),
                self.path.display(),
                e
            ))
        })
    }

    /// Removes the file. Best-effort.
    pub fn unstage(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.removed {
            self.removed = true;
            unstage(&self.path);
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.release();
    }
}

/// Removes `path` if it exists, logging instead of failing.
pub fn unstage(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed staged file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            let err = ScanError::Cleanup {
                path: path.to_path_buf(),
                source: e,
            };
            tracing::error!(path = %path.display(), error = %err, "Failed to remove staged file");
        }
    }
}

/// Builds the file name prefix for an artifact: `scanhook_<id>_`.
pub fn staging_prefix(artifact_id: &str) -> String {
    let id: String = artifact_id.chars().take(MAX_ID_CHARS).collect();
    format!("scanhook_{}_", sanitize(&id))
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sandbox_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("sandbox");
        assert!(!root.exists());

        let sandbox = Sandbox::new(&root).unwrap();
        assert!(sandbox.root().is_dir());
    }

    #[test]
    fn test_stage_creates_unique_files_inside_sandbox() {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();

        let a = sandbox.stage("scanhook_abc_").unwrap();
        let b = sandbox.stage("scanhook_abc_").unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(sandbox.root()));
        assert!(sandbox.guard().validate(a.path()).is_ok());
        assert!(sandbox.guard().validate(b.path()).is_ok());
    }

    #[test]
    fn test_stage_sanitizes_traversal_in_prefix() {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(dir.path().join("sandbox")).unwrap();

        let staged = sandbox.stage(&staging_prefix("../../etc/passwd")).unwrap();
        assert_eq!(staged.path().parent(), Some(sandbox.root()));

        let name = staged.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("scanhook_______etc_passwd_"));
    }

    #[test]
    fn test_staging_prefix_truncates_long_ids() {
        let id = "a".repeat(200);
        let prefix = staging_prefix(&id);
        assert_eq!(prefix.len(), "scanhook_".len() + MAX_ID_CHARS + 1);
    }

    #[tokio::test]
    async fn test_stage_bytes_writes_content() {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();

        let staged = sandbox.stage_bytes("abc123", b"MZ\x90\x00").await.unwrap();
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"MZ\x90\x00");
    }

    #[test]
    fn test_unstage_and_drop_remove_file() {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();

        let staged = sandbox.stage("explicit_").unwrap();
        let path = staged.path().to_path_buf();
        staged.unstage();
        assert!(!path.exists());

        let path = {
            let staged = sandbox.stage("dropped_").unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_unstage_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();

        let staged = sandbox.stage("gone_").unwrap();
        std::fs::remove_file(staged.path()).unwrap();
        staged.unstage();

        unstage(&dir.path().join("never-existed"));
    }
}
