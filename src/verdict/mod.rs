//! Normalization of raw scanner output into [`Verdict`](crate::core::Verdict)s.
//!
//! Pure functions, one strategy per engine family:
//!
//! - [`antivirus`] - exit-code driven, at most one named detection
//! - [`rules`] - zero or more matched rule names

pub mod antivirus;
pub mod rules;

pub use antivirus::{find_signature, normalize_version, parse_antivirus_output};
pub use rules::parse_rule_output;
