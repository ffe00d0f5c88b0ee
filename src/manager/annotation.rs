//! Human-readable annotation text for engine results.
//!
//! One line per engine:
//!
//! ```text
//! ClamAV: Win.Test.EICAR (Version: ClamAV 1.3.1/27342)
//! YARA: EICAR_Test_File, Packed_UPX
//! ```

use crate::core::{EngineFamily, EngineOutcome, EngineResult, Verdict};
use crate::verdict::antivirus::UNKNOWN_VERSION;

/// Builds the annotation line for one engine result.
pub fn annotation_line(result: &EngineResult) -> String {
    let engine = result.engine.display_name();

    match result.engine.family() {
        EngineFamily::Antivirus => {
            let verdict = match &result.outcome {
                EngineOutcome::Single { verdict } => verdict.to_string(),
                EngineOutcome::Matches { verdicts } => verdicts
                    .first()
                    .map(Verdict::to_string)
                    .unwrap_or_else(|| Verdict::Clean.to_string()),
                EngineOutcome::Failed { .. } => Verdict::Error.to_string(),
            };
            let version = result.version.as_deref().unwrap_or(UNKNOWN_VERSION);
            format!("{}: {} (Version: {})", engine, verdict, version)
        }
        EngineFamily::RuleMatching => {
            if result.outcome.is_failure() {
                return format!("{}: {}", engine, Verdict::Error);
            }
            let names: Vec<&str> = result
                .verdicts()
                .iter()
                .filter_map(Verdict::detection_name)
                .collect();
            if names.is_empty() {
                format!("{}: {}", engine, Verdict::Clean)
            } else {
                format!("{}: {}", engine, names.join(", "))
            }
        }
    }
}

/// Builds the comment for a whole run, or `None` if no engine ran.
pub fn build_comment(results: &[EngineResult]) -> Option<String> {
    let text = results
        .iter()
        .map(annotation_line)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    (!text.is_empty()).then_some(text)
}
