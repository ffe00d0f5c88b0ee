//! Mock scanner for testing.
//!
//! This module provides a configurable mock scanner that returns a canned
//! outcome without launching any process, and records which paths it was
//! asked to scan.

use crate::core::{EngineKind, EngineOutcome, EngineResult, Scanner, Verdict};
use crate::verdict::antivirus::GENERIC_DETECTION;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// A path observed by a [`MockScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedPath {
    /// The path passed to `scan`.
    pub path: PathBuf,
    /// Whether a file existed at that path during the scan.
    pub existed: bool,
    /// The file content at scan time, if readable.
    pub content: Option<Vec<u8>>,
}

/// A mock scanner for testing purposes.
///
/// # Examples
///
/// ```rust
/// use scanhook::backends::MockScanner;
/// use scanhook::core::EngineKind;
///
/// // An antivirus engine that reports a detection
/// let scanner = MockScanner::new_detected(EngineKind::ClamAv, "Win.Test.EICAR");
///
/// // A rule engine that reports two matches
/// let scanner = MockScanner::new_matches(EngineKind::Yara, ["Rule_A", "Rule_B"]);
/// ```
#[derive(Debug)]
pub struct MockScanner {
    engine: EngineKind,
    outcome: RwLock<EngineOutcome>,
    version: Option<String>,
    latency: Option<Duration>,
    scan_count: AtomicU64,
    observed: RwLock<Vec<ObservedPath>>,
}

impl MockScanner {
    /// Creates a mock scanner that reports nothing for `engine`.
    ///
    /// Antivirus engines report `Clean`, rule engines an empty match set.
    pub fn new_clean(engine: EngineKind) -> Self {
        let outcome = match engine {
            EngineKind::ClamAv => EngineOutcome::Single {
                verdict: Verdict::Clean,
            },
            EngineKind::Yara => EngineOutcome::Matches {
                verdicts: Vec::new(),
            },
        };
        Self::with_outcome(engine, outcome)
    }

    /// Creates an antivirus-style mock reporting one detection.
    ///
    /// The name is trimmed; a blank name reports the generic detection.
    pub fn new_detected(engine: EngineKind, name: impl AsRef<str>) -> Self {
        let verdict = Verdict::detected(name)
            .unwrap_or_else(|| Verdict::Detected(GENERIC_DETECTION.to_string()));
        Self::with_outcome(engine, EngineOutcome::Single { verdict })
    }

    /// Creates a rule-style mock reporting the given matches.
    pub fn new_matches<I, S>(engine: EngineKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let outcome = EngineResult::matches(engine, names).outcome;
        Self::with_outcome(engine, outcome)
    }

    /// Creates a mock whose scan fails.
    pub fn new_failing(engine: EngineKind) -> Self {
        let outcome = match engine {
            EngineKind::ClamAv => EngineOutcome::Single {
                verdict: Verdict::Error,
            },
            EngineKind::Yara => EngineOutcome::Failed {
                reason: "simulated failure".to_string(),
            },
        };
        Self::with_outcome(engine, outcome)
    }

    /// Creates a mock returning `outcome` for `engine`.
    pub fn with_outcome(engine: EngineKind, outcome: EngineOutcome) -> Self {
        Self {
            engine,
            outcome: RwLock::new(outcome),
            version: None,
            latency: None,
            scan_count: AtomicU64::new(0),
            observed: RwLock::new(Vec::new()),
        }
    }

    /// Sets the reported engine version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the simulated latency for scans.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replaces the outcome returned by subsequent scans.
    pub fn set_outcome(&self, outcome: EngineOutcome) {
        *self
            .outcome
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = outcome;
    }

    /// Returns the number of scans performed.
    pub fn scan_count(&self) -> u64 {
        self.scan_count.load(Ordering::Relaxed)
    }

    /// Returns every path this scanner was asked to scan.
    pub fn observed(&self) -> Vec<ObservedPath> {
        self.observed
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Scanner for MockScanner {
    fn engine(&self) -> EngineKind {
        self.engine
    }

    async fn scan(&self, path: &Path) -> EngineResult {
        self.scan_count.fetch_add(1, Ordering::Relaxed);

        let content = std::fs::read(path).ok();
        self.observed
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ObservedPath {
                path: path.to_path_buf(),
                existed: path.exists(),
                content,
            });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let outcome = self
            .outcome
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        EngineResult {
            engine: self.engine,
            outcome,
            version: self.version.clone(),
        }
    }

    async fn version(&self) -> Option<String> {
        self.version.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_scanner_clean() {
        let scanner = MockScanner::new_clean(EngineKind::ClamAv);
        let result = scanner.scan(Path::new("/nonexistent")).await;

        assert_eq!(result.verdicts(), &[Verdict::Clean]);
        assert_eq!(scanner.scan_count(), 1);
        assert!(!scanner.observed()[0].existed);
    }

    #[tokio::test]
    async fn test_mock_detection_name_is_normalized() {
        let padded = MockScanner::new_detected(EngineKind::ClamAv, "  Win.Test.EICAR \n");
        let result = padded.scan(Path::new("/nonexistent")).await;
        assert_eq!(result.verdicts(), &[Verdict::Detected("Win.Test.EICAR".into())]);

        let blank = MockScanner::new_detected(EngineKind::ClamAv, "   ");
        let result = blank.scan(Path::new("/nonexistent")).await;
        assert_eq!(result.verdicts(), &[Verdict::Detected(GENERIC_DETECTION.into())]);
    }

    #[tokio::test]
    async fn test_mock_scanner_matches() {
        let scanner = MockScanner::new_matches(EngineKind::Yara, ["Rule_A", "Rule_B"]);
        let result = scanner.scan(Path::new("/nonexistent")).await;
        assert_eq!(result.verdicts().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_scanner_records_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("sample.bin");
        std::fs::write(&file, b"payload").unwrap();

        let scanner = MockScanner::new_detected(EngineKind::ClamAv, "Eicar").with_version("1.0");
        let result = scanner.scan(&file).await;

        assert_eq!(result.version.as_deref(), Some("1.0"));
        let observed = scanner.observed();
        assert!(observed[0].existed);
        assert_eq!(observed[0].content.as_deref(), Some(&b"payload"[..]));
    }

    #[tokio::test]
    async fn test_mock_scanner_set_outcome() {
        let scanner = MockScanner::new_failing(EngineKind::Yara);
        assert!(scanner.scan(Path::new("/x")).await.outcome.is_failure());

        scanner.set_outcome(EngineOutcome::Matches { verdicts: vec![] });
        assert!(!scanner.scan(Path::new("/x")).await.outcome.is_failure());
    }
}
