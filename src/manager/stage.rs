//! Stages of one orchestration run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stage of the scan state machine.
///
/// Runs move forward through
/// `Start → MetadataFetched → SizeChecked → Staged → Scanned → Annotated → CleanedUp → Done`
/// and may end in `Aborted` from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    /// Nothing has happened yet.
    Start,
    /// Artifact metadata was fetched.
    MetadataFetched,
    /// The declared size is within the ceiling.
    SizeChecked,
    /// Content was fetched and written to the sandbox.
    Staged,
    /// Every enabled engine ran.
    Scanned,
    /// The comment and tag deltas were written.
    Annotated,
    /// The staged file was removed.
    CleanedUp,
    /// The run completed.
    Done,
    /// The run stopped early.
    Aborted,
}

impl ScanStage {
    /// Returns `true` for `Done` and `Aborted`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Returns the stage name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::MetadataFetched => "metadata_fetched",
            Self::SizeChecked => "size_checked",
            Self::Staged => "staged",
            Self::Scanned => "scanned",
            Self::Annotated => "annotated",
            Self::CleanedUp => "cleaned_up",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
