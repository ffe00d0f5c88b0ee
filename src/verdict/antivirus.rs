//! Verdict parsing for antivirus-style engines (clamdscan).
//!
//! The exit code is definitional: `0` is clean, `1` is a detection and
//! anything else, including no exit code at all, is an error. The text
//! output is only consulted to name a detection.

use crate::core::Verdict;

use regex::Regex;
use std::sync::LazyLock;

/// Exit code reported when no virus was found.
pub const EXIT_CLEAN: i32 = 0;

/// Exit code reported when at least one virus was found.
pub const EXIT_DETECTED: i32 = 1;

/// Detection name used when the output carries no `FOUND` line.
pub const GENERIC_DETECTION: &str = "Detected";

/// Version string used when the engine cannot report one.
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Matches `<path-or-label>: <signature> FOUND`.
static FOUND_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+:\s+(.+)\s+FOUND$").expect("FOUND pattern is valid"));

/// Turns an antivirus exit code and its stdout into a verdict.
///
/// `exit_code` is `None` when the process was killed or never exited
/// normally.
pub fn parse_antivirus_output(exit_code: Option<i32>, stdout: &str) -> Verdict {
    match exit_code {
        Some(EXIT_CLEAN) => Verdict::Clean,
        Some(EXIT_DETECTED) => find_signature(stdout)
            .and_then(Verdict::detected)
            .unwrap_or_else(|| Verdict::Detected(GENERIC_DETECTION.to_string())),
        _ => Verdict::Error,
    }
}

/// Returns the first signature named on a `... FOUND` line.
pub fn find_signature(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| line.contains("FOUND"))
        .filter_map(|line| FOUND_LINE.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|name| !name.is_empty())
}

/// Normalizes the output of a `--version` probe.
///
/// Returns the first non-blank line of stdout, falling back to stderr,
/// or [`UNKNOWN_VERSION`] if the probe failed or printed nothing.
pub fn normalize_version(exit_code: Option<i32>, stdout: &str, stderr: &str) -> String {
    if exit_code != Some(0) {
        return UNKNOWN_VERSION.to_string();
    }

    [stdout, stderr]
        .iter()
        .flat_map(|text| text.lines())
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(UNKNOWN_VERSION)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_zero_is_clean() {
        assert_eq!(parse_antivirus_output(Some(0), ""), Verdict::Clean);
        // Output is irrelevant once the exit code says clean.
        assert_eq!(
            parse_antivirus_output(Some(0), "/tmp/x: Eicar FOUND"),
            Verdict::Clean
        );
    }

    #[test]
    fn test_exit_one_with_found_line() {
        assert_eq!(
            parse_antivirus_output(Some(1), "abc123: Win.Test.EICAR FOUND"),
            Verdict::Detected("Win.Test.EICAR".into())
        );
    }

    #[test]
    fn test_exit_one_multiline_output() {
        let output = "\
LibClamAV Warning: something odd
/tmp/sandbox/scanhook_abc_x1: Win.Trojan.Agent-123 FOUND\r
/tmp/sandbox/scanhook_abc_x1: Another.Sig FOUND
";
        assert_eq!(
            parse_antivirus_output(Some(1), output),
            Verdict::Detected("Win.Trojan.Agent-123".into())
        );
    }

    #[test]
    fn test_signature_is_trimmed() {
        assert_eq!(
            parse_antivirus_output(Some(1), "stream:    Eicar-Signature    FOUND   "),
            Verdict::Detected("Eicar-Signature".into())
        );
    }

    #[test]
    fn test_path_containing_colons() {
        assert_eq!(
            parse_antivirus_output(Some(1), "/tmp/a: b/file: Eicar-Signature FOUND"),
            Verdict::Detected("Eicar-Signature".into())
        );
    }

    #[test]
    fn test_exit_one_without_found_line_is_generic() {
        assert_eq!(
            parse_antivirus_output(Some(1), ""),
            Verdict::Detected(GENERIC_DETECTION.into())
        );
        assert_eq!(
            parse_antivirus_output(Some(1), "something happened"),
            Verdict::Detected(GENERIC_DETECTION.into())
        );
        // Keyword is case-sensitive.
        assert_eq!(
            parse_antivirus_output(Some(1), "abc: Eicar found"),
            Verdict::Detected(GENERIC_DETECTION.into())
        );
        // FOUND present but not in the expected shape.
        assert_eq!(
            parse_antivirus_output(Some(1), "FOUND"),
            Verdict::Detected(GENERIC_DETECTION.into())
        );
    }

    #[test]
    fn test_blank_signature_falls_back_to_generic() {
        assert_eq!(
            parse_antivirus_output(Some(1), "abc:    FOUND"),
            Verdict::Detected(GENERIC_DETECTION.into())
        );
    }

    #[test]
    fn test_other_exit_codes_are_errors() {
        assert_eq!(parse_antivirus_output(Some(2), ""), Verdict::Error);
        assert_eq!(
            parse_antivirus_output(Some(2), "/tmp/x: Access denied. ERROR"),
            Verdict::Error
        );
        assert_eq!(parse_antivirus_output(Some(-1), ""), Verdict::Error);
        assert_eq!(parse_antivirus_output(None, "abc: Eicar FOUND"), Verdict::Error);
    }

    #[test]
    fn test_error_text_with_detection_exit_code() {
        assert_eq!(
            parse_antivirus_output(Some(1), "ERROR: partial\nabc: Eicar FOUND"),
            Verdict::Detected("Eicar".into())
        );
    }

    #[test]
    fn test_normalize_version() {
        assert_eq!(
            normalize_version(Some(0), "ClamAV 1.3.1/27342/Tue Jul 16 08:29:44 2024\n", ""),
            "ClamAV 1.3.1/27342/Tue Jul 16 08:29:44 2024"
        );
        assert_eq!(normalize_version(Some(0), "\n", "  ClamAV 1.0.0 \n"), "ClamAV 1.0.0");
        assert_eq!(normalize_version(Some(0), "", ""), UNKNOWN_VERSION);
        assert_eq!(normalize_version(Some(2), "ClamAV 1.0.0", ""), UNKNOWN_VERSION);
        assert_eq!(normalize_version(None, "ClamAV 1.0.0", ""), UNKNOWN_VERSION);
    }
}
