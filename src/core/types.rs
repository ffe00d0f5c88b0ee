//! Core types used throughout the scanhook library.
//!
//! This module defines the canonical verdict produced by every engine,
//! the closed set of supported engines, per-engine results and the
//! artifact metadata handed over by the repository.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The normalized outcome of one engine's scan of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum Verdict {
    /// No detection.
    Clean,

    /// A signature or rule matched. The name is non-empty and trimmed.
    Detected(String),

    /// The scan could not be completed.
    Error,
}

impl Verdict {
    /// Creates a `Detected` verdict, or `None` if the trimmed name is empty.
    pub fn detected(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            None
        } else {
            Some(Self::Detected(name.to_string()))
        }
    }

    /// Returns `true` for `Clean`.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Returns `true` for `Detected`.
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected(_))
    }

    /// Returns `true` for `Error`.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Returns the detection name, if any.
    pub fn detection_name(&self) -> Option<&str> {
        match self {
            Self::Detected(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "Undetected"),
            Self::Detected(name) => write!(f, "{}", name),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Verdict cardinality of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineFamily {
    /// At most one detection per scan; the engine owns a single tag.
    Antivirus,
    /// Zero or more named matches per scan; tags accumulate.
    RuleMatching,
}

/// The detection engines this crate can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// ClamAV through `clamdscan`.
    ClamAv,
    /// YARA through the `yara` command line scanner.
    Yara,
}

impl EngineKind {
    /// All engines, in the order they run.
    pub const ALL: [EngineKind; 2] = [EngineKind::ClamAv, EngineKind::Yara];

    /// Stable lowercase identifier, also used as the tag namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClamAv => "clamav",
            Self::Yara => "yara",
        }
    }

    /// Name used in annotation text.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ClamAv => "ClamAV",
            Self::Yara => "YARA",
        }
    }

    /// Returns the verdict cardinality of this engine.
    pub fn family(&self) -> EngineFamily {
        match self {
            Self::ClamAv => EngineFamily::Antivirus,
            Self::Yara => EngineFamily::RuleMatching,
        }
    }

    /// Prefix shared by every tag this engine owns, e.g. `"clamav:"`.
    pub fn tag_prefix(&self) -> String {
        format!("{}:", self.as_str())
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one engine produced for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineOutcome {
    /// Antivirus-style: exactly one verdict.
    Single {
        /// The verdict.
        verdict: Verdict,
    },

    /// Rule-matching style: every verdict is `Detected`. Empty means no matches.
    Matches {
        /// One verdict per matched rule.
        verdicts: Vec<Verdict>,
    },

    /// Rule-matching scan failed. Kept distinct from an empty match set.
    Failed {
        /// Why the scan failed.
        reason: String,
    },
}

impl EngineOutcome {
    /// Returns the verdicts carried by this outcome.
    ///
    /// A failed rule scan contributes no verdicts.
    pub fn verdicts(&self) -> &[Verdict] {
        match self {
            Self::Single { verdict } => std::slice::from_ref(verdict),
            Self::Matches { verdicts } => verdicts,
            Self::Failed { .. } => &[],
        }
    }

    /// Returns `true` if the engine could not complete the scan.
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Single { verdict } => verdict.is_error(),
            Self::Matches { .. } => false,
            Self::Failed { .. } => true,
        }
    }

    /// Returns `true` if anything was detected.
    pub fn has_detection(&self) -> bool {
        self.verdicts().iter().any(Verdict::is_detected)
    }
}

/// Result of one engine's scan, ephemeral to a single orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResult {
    /// Which engine produced the result.
    pub engine: EngineKind,

    /// The normalized outcome.
    pub outcome: EngineOutcome,

    /// Engine version string, reported by antivirus engines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl EngineResult {
    /// Creates an antivirus-style result.
    pub fn single(engine: EngineKind, verdict: Verdict) -> Self {
        Self {
            engine,
            outcome: EngineOutcome::Single { verdict },
            version: None,
        }
    }

    /// Creates a rule-matching result from matched rule names.
    ///
    /// Blank names are dropped.
    pub fn matches<I, S>(engine: EngineKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            engine,
            outcome: EngineOutcome::Matches {
                verdicts: names.into_iter().filter_map(Verdict::detected).collect(),
            },
            version: None,
        }
    }

    /// Creates a failed rule-matching result.
    pub fn failed(engine: EngineKind, reason: impl Into<String>) -> Self {
        Self {
            engine,
            outcome: EngineOutcome::Failed {
                reason: reason.into(),
            },
            version: None,
        }
    }

    /// Sets the engine version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Returns the verdicts carried by this result.
    pub fn verdicts(&self) -> &[Verdict] {
        self.outcome.verdicts()
    }
}

/// Metadata the repository exposes without a content fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Identifier (content hash) of the artifact.
    pub id: String,

    /// Declared size in bytes.
    pub size: u64,
}

impl ArtifactMetadata {
    /// Creates new artifact metadata.
    pub fn new(id: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            size,
        }
    }
}

/// Why a scan was triggered. Used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanReason {
    /// The artifact was uploaded for the first time.
    Created,
    /// An existing artifact was uploaded again.
    Reuploaded,
}

impl fmt::Display for ScanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Reuploaded => write!(f, "reuploaded"),
        }
    }
}

/// An inbound repository event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEvent {
    /// Identifier of the affected artifact.
    pub artifact_id: String,

    /// Why the event fired.
    pub reason: ScanReason,
}

impl ArtifactEvent {
    /// An "artifact created" event.
    pub fn created(artifact_id: impl Into<String>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            reason: ScanReason::Created,
        }
    }

    /// An "artifact re-uploaded" event.
    pub fn reuploaded(artifact_id: impl Into<String>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            reason: ScanReason::Reuploaded,
        }
    }
}
