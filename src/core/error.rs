//! Error types for the scanhook library.
//!
//! Every failure below the orchestration boundary is represented here.
//! The orchestrator absorbs all of them into a verdict, a logged skip or an
//! aborted summary; none of them escape to the event source.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A required setting (endpoint, credential, engine option) is missing or invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// The artifact could not be fetched from the repository.
    #[error("failed to fetch artifact '{artifact}': {source}")]
    Fetch {
        /// Identifier of the artifact.
        artifact: String,
        /// Underlying repository failure.
        #[source]
        source: RepositoryError,
    },

    /// The artifact exceeds the configured size ceiling.
    ///
    /// This is a deliberate skip rather than a failure.
    #[error("artifact size {size} bytes exceeds maximum {max} bytes")]
    SizeLimitExceeded {
        /// Declared or actual size in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        max: u64,
    },

    /// A path handed to a scanner resolved outside the sandbox directory.
    #[error("path '{}' escapes the sandbox: {reason}", path.display())]
    PathEscape {
        /// The rejected path, as given.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// The scanner process did not finish in time and was killed.
    #[error("scan timed out after {elapsed:?} on engine '{engine}'")]
    Timeout {
        /// Name of the engine that timed out.
        engine: String,
        /// The timeout that expired.
        elapsed: Duration,
    },

    /// The scanner process failed or exited with an unexpected code.
    #[error("engine '{engine}' process failed: {message}")]
    Process {
        /// Name of the engine.
        engine: String,
        /// Exit code, if the process exited normally.
        exit_code: Option<i32>,
        /// Error message describing the failure.
        message: String,
    },

    /// The scanner executable could not be found or launched.
    #[error("engine '{engine}' is unavailable: {reason}")]
    EngineUnavailable {
        /// Name of the engine that is unavailable.
        engine: String,
        /// Human-readable reason for unavailability.
        reason: String,
    },

    /// The artifact bytes could not be written into the sandbox.
    #[error("failed to stage artifact: {reason}")]
    Staging {
        /// Reason for the failure.
        reason: String,
    },

    /// A staged file could not be removed. Logged only.
    #[error("failed to remove staged file '{}': {source}", path.display())]
    Cleanup {
        /// Path of the staged file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Writing a comment or tag back to the repository failed.
    #[error("failed to publish results for artifact '{artifact}': {source}")]
    Publish {
        /// Identifier of the artifact.
        artifact: String,
        /// Underlying repository failure.
        #[source]
        source: RepositoryError,
    },
}

impl ScanError {
    /// Returns `true` if this error is a deliberate skip rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::SizeLimitExceeded { .. })
    }

    /// Returns the engine name if this error is associated with one.
    pub fn engine(&self) -> Option<&str> {
        match self {
            Self::Timeout { engine, .. }
            | Self::Process { engine, .. }
            | Self::EngineUnavailable { engine, .. } => Some(engine),
            _ => None,
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a `Fetch` error.
    ///
    /// A [`RepositoryError::TooLarge`] becomes `SizeLimitExceeded`, so a body
    /// refused for its size is still reported as a skip.
    pub fn fetch(artifact: impl Into<String>, source: RepositoryError) -> Self {
        match source {
            RepositoryError::TooLarge { size, max } => Self::SizeLimitExceeded { size, max },
            source => Self::Fetch {
                artifact: artifact.into(),
                source,
            },
        }
    }

    /// Creates a `Publish` error.
    pub fn publish(artifact: impl Into<String>, source: RepositoryError) -> Self {
        Self::Publish {
            artifact: artifact.into(),
            source,
        }
    }

    /// Creates a `PathEscape` error.
    pub fn path_escape(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::PathEscape {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(engine: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            engine: engine.into(),
            elapsed,
        }
    }

    /// Creates a `Process` error.
    pub fn process(
        engine: impl Into<String>,
        exit_code: Option<i32>,
        message: impl Into<String>,
    ) -> Self {
        Self::Process {
            engine: engine.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Creates an `EngineUnavailable` error.
    pub fn engine_unavailable(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EngineUnavailable {
            engine: engine.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Staging` error.
    pub fn staging(reason: impl Into<String>) -> Self {
        Self::Staging {
            reason: reason.into(),
        }
    }
}

/// Error type for sample repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The artifact does not exist in the repository.
    #[error("artifact not found: {id}")]
    NotFound {
        /// The identifier that was not found.
        id: String,
    },

    /// The repository could not be reached.
    #[error("repository unreachable: {message}")]
    Unreachable {
        /// Transport-level error message.
        message: String,
    },

    /// The repository answered with an unexpected status.
    #[error("repository returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The repository response could not be decoded.
    #[error("malformed repository response: {details}")]
    Decode {
        /// What could not be decoded.
        details: String,
    },

    /// The artifact body exceeds the size the caller is willing to buffer.
    #[error("artifact body of at least {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Bytes seen so far, or the announced length.
        size: u64,
        /// Maximum accepted size.
        max: u64,
    },

    /// The repository refused the request or the data failed verification.
    #[error("repository request rejected: {reason}")]
    Rejected {
        /// Reason for the rejection.
        reason: String,
    },
}

/// A specialized `Result` type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_size_limit_is_a_skip() {
        let skip = ScanError::SizeLimitExceeded {
            size: 100,
            max: 10,
        };
        assert!(skip.is_skip());

        let fetch = ScanError::fetch("abc", RepositoryError::NotFound { id: "abc".into() });
        assert!(!fetch.is_skip());
        assert!(!ScanError::timeout("clamav", Duration::from_secs(1)).is_skip());
    }

    #[test]
    fn test_oversized_body_fetch_is_a_skip() {
        let err = ScanError::fetch(
            "abc",
            RepositoryError::TooLarge {
                size: 4097,
                max: 4096,
            },
        );
        assert!(err.is_skip());
        assert!(matches!(
            err,
            ScanError::SizeLimitExceeded {
                size: 4097,
                max: 4096
            }
        ));
    }

    #[test]
    fn test_scan_error_engine() {
        let err = ScanError::engine_unavailable("clamav", "clamdscan not found");
        assert_eq!(err.engine(), Some("clamav"));

        let err = ScanError::process("yara", Some(1), "could not open rules");
        assert_eq!(err.engine(), Some("yara"));

        let err = ScanError::path_escape("/etc/passwd", "outside sandbox");
        assert_eq!(err.engine(), None);
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::SizeLimitExceeded {
            size: 100_000_000,
            max: 52_428_800,
        };
        assert!(err.to_string().contains("100000000"));
        assert!(err.to_string().contains("52428800"));

        let err = ScanError::path_escape("/tmp/../etc/passwd", "parent directory component");
        assert!(err.to_string().contains("/tmp/../etc/passwd"));
    }

    #[test]
    fn test_fetch_error_keeps_source() {
        use std::error::Error as _;

        let err = ScanError::fetch(
            "abc123",
            RepositoryError::Http {
                status: 503,
                message: "maintenance".into(),
            },
        );
        assert!(err.to_string().contains("abc123"));
        assert!(err.source().is_some());
    }
}
