//! Confinement checks for paths handed to scanner processes.

use crate::core::ScanError;

use std::path::{Component, Path, PathBuf};

/// Rejects any path that does not resolve strictly inside the sandbox.
///
/// The sandbox root is canonicalized once at construction; each candidate
/// path is canonicalized at validation time, so symlinks pointing out of
/// the sandbox are caught as well as literal `..` sequences.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Creates a guard for an existing sandbox directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ScanError> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| {
            ScanError::configuration(format!(
                "sandbox directory '{}' cannot be resolved: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    /// Returns the canonical sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates `path` and returns its canonical form.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::PathEscape` if the path contains a `..`
    /// component, cannot be resolved, or resolves to the sandbox root
    /// itself or anywhere outside it.
    pub fn validate(&self, path: &Path) -> Result<PathBuf, ScanError> {
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(ScanError::path_escape(path, "contains a parent directory component"));
        }

        let canonical = path
            .canonicalize()
            .map_err(|e| ScanError::path_escape(path, format!("cannot be resolved: {}", e)))?;

        if canonical == self.root || !canonical.starts_with(&self.root) {
            return Err(ScanError::path_escape(
                path,
                format!("resolves outside '{}'", self.root.display()),
            ));
        }

        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, PathGuard) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("sandbox");
        std::fs::create_dir(&root).unwrap();
        let guard = PathGuard::new(&root).unwrap();
        (dir, guard)
    }

    #[test]
    fn test_accepts_file_inside_sandbox() {
        let (_dir, guard) = sandbox();
        let file = guard.root().join("sample.bin");
        std::fs::write(&file, b"data").unwrap();

        let validated = guard.validate(&file).unwrap();
        assert_eq!(validated, file.canonicalize().unwrap());
    }

    #[test]
    fn test_rejects_parent_directory_sequences() {
        let (_dir, guard) = sandbox();
        let file = guard.root().join("sample.bin");
        std::fs::write(&file, b"data").unwrap();

        // Resolves back inside the sandbox but is rejected regardless.
        let sneaky = guard.root().join("..").join("sandbox").join("sample.bin");
        assert!(matches!(
            guard.validate(&sneaky),
            Err(ScanError::PathEscape { .. })
        ));

        let escaping = guard.root().join("../../etc/passwd");
        assert!(matches!(
            guard.validate(&escaping),
            Err(ScanError::PathEscape { .. })
        ));
    }

    #[test]
    fn test_rejects_absolute_path_outside_sandbox() {
        let (dir, guard) = sandbox();
        let outside = dir.path().join("outside.bin");
        std::fs::write(&outside, b"data").unwrap();

        assert!(matches!(
            guard.validate(&outside),
            Err(ScanError::PathEscape { .. })
        ));
    }

    #[test]
    fn test_rejects_sandbox_root_and_missing_files() {
        let (_dir, guard) = sandbox();
        let root = guard.root().to_path_buf();

        assert!(matches!(
            guard.validate(&root),
            Err(ScanError::PathEscape { .. })
        ));
        assert!(matches!(
            guard.validate(&root.join("missing.bin")),
            Err(ScanError::PathEscape { .. })
        ));
    }

    #[test]
    fn test_rejects_sibling_with_shared_prefix() {
        let (dir, guard) = sandbox();
        let sibling_dir = dir.path().join("sandbox-evil");
        std::fs::create_dir(&sibling_dir).unwrap();
        let sibling = sibling_dir.join("sample.bin");
        std::fs::write(&sibling, b"data").unwrap();

        assert!(guard.validate(&sibling).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_symlink_out_of_sandbox() {
        let (dir, guard) = sandbox();
        let outside = dir.path().join("outside.bin");
        std::fs::write(&outside, b"data").unwrap();
        let link = guard.root().join("link.bin");
        std::os::unix::fs::symlink(&outside, &link).unwrap();

        assert!(matches!(
            guard.validate(&link),
            Err(ScanError::PathEscape { .. })
        ));
    }
}
