//! Verdict parsing for rule-matching engines (the `yara` CLI).

use crate::core::{EngineKind, ScanError, Verdict};

/// Turns a rule engine's exit code and output into matched-rule verdicts.
///
/// - exit `0` with blank output: no matches, `Ok(vec![])`
/// - exit `0` with output: one `Detected` per non-blank line, named by the
///   line's first whitespace-delimited token
/// - any other exit code, or none: `Err(ScanError::Process)`
///
/// A failure is never reported as "no matches"; rule engines use non-zero
/// codes for internal errors such as unreadable rule files.
pub fn parse_rule_output(
    engine: EngineKind,
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<Vec<Verdict>, ScanError> {
    match exit_code {
        Some(0) => Ok(stdout
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .filter_map(Verdict::detected)
            .collect()),
        Some(code) => Err(ScanError::process(
            engine.as_str(),
            Some(code),
            format!("exited with code {}: {}", code, stderr.trim()),
        )),
        None => Err(ScanError::process(
            engine.as_str(),
            None,
            "terminated without an exit code",
        )),
    }
}
