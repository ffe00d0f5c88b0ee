//! Minimal tag deltas for engine verdicts.
//!
//! Tags have the form `{engine}:{label}`, lowercase. The two engine
//! families reconcile differently:
//!
//! - **Antivirus**: the engine owns exactly one tag. Every existing tag in
//!   its namespace is removed and one tag is added for a `Detected`
//!   verdict. A tag that would be removed and re-added is left alone. An
//!   `Error` verdict leaves the namespace untouched, so an engine outage
//!   keeps earlier detections but also cannot clear a stale one.
//! - **Rule matching**: one tag per matched rule is added when absent.
//!   Tags for rules that did not match this time are kept; rule sets may
//!   be partial on any given run.

use crate::core::{EngineFamily, EngineKind, Verdict};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tag writes needed to bring an artifact in line with a verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDelta {
    /// Tags to add, lowercase.
    pub to_add: BTreeSet<String>,

    /// Existing tags to remove, spelled as they exist on the artifact.
    pub to_remove: BTreeSet<String>,
}

impl TagDelta {
    /// Returns `true` if no writes are needed.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Number of tag-store writes this delta implies.
    pub fn write_count(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }

    /// Applies the delta to a local copy of the tag set.
    pub fn apply_to(&self, tags: &mut BTreeSet<String>) {
        for tag in &self.to_remove {
            tags.remove(tag);
        }
        for tag in &self.to_add {
            tags.insert(tag.clone());
        }
    }
}

/// Builds the tag for `label` in `engine`'s namespace.
pub fn make_tag(engine: EngineKind, label: &str) -> String {
    format!("{}:{}", engine.as_str(), label.trim()).to_lowercase()
}

/// Returns `true` if `tag` belongs to `engine`'s namespace.
pub fn in_namespace(tag: &str, engine: EngineKind) -> bool {
    tag.to_lowercase().starts_with(&engine.tag_prefix())
}

/// Computes the tag delta for `verdicts` from `engine`.
///
/// `existing` is the artifact's current tag set. Comparison is
/// case-insensitive. An antivirus result with no conclusive verdict
/// (only `Error`, or none at all) yields an empty delta.
pub fn reconcile(existing: &BTreeSet<String>, engine: EngineKind, verdicts: &[Verdict]) -> TagDelta {
    let mut delta = TagDelta::default();

    match engine.family() {
        EngineFamily::Antivirus => {
            if verdicts.iter().all(Verdict::is_error) {
                return delta;
            }

            // A single verdict is expected; keep only the first detection.
            let wanted: Option<String> = verdicts
                .iter()
                .find_map(Verdict::detection_name)
                .map(|name| make_tag(engine, name));

            // Keep one spelling of the wanted tag; everything else in the namespace goes.
            let mut kept = false;
            for tag in existing.iter().filter(|t| in_namespace(t, engine)) {
                if !kept && wanted.as_deref() == Some(tag.to_lowercase().as_str()) {
                    kept = true;
                } else {
                    delta.to_remove.insert(tag.clone());
                }
            }

            if let Some(tag) = wanted {
                if !kept {
                    delta.to_add.insert(tag);
                }
            }
        }
        EngineFamily::RuleMatching => {
            let present: BTreeSet<String> = existing.iter().map(|t| t.to_lowercase()).collect();
            delta.to_add = verdicts
                .iter()
                .filter_map(Verdict::detection_name)
                .map(|name| make_tag(engine, name))
                .filter(|tag| !present.contains(tag))
                .collect();
        }
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn detected(name: &str) -> Verdict {
        Verdict::Detected(name.to_string())
    }

    #[test]
    fn test_make_tag_lowercases() {
        assert_eq!(make_tag(EngineKind::ClamAv, "Win.Test.EICAR"), "clamav:win.test.eicar");
        assert_eq!(make_tag(EngineKind::Yara, "EICAR_Test_File"), "yara:eicar_test_file");
    }

    #[test]
    fn test_antivirus_adds_single_tag() {
        let delta = reconcile(&tags(&["family:emotet"]), EngineKind::ClamAv, &[detected("Win.Test.EICAR")]);
        assert_eq!(delta.to_add, tags(&["clamav:win.test.eicar"]));
        assert!(delta.to_remove.is_empty());
    }

    #[test]
    fn test_antivirus_replaces_stale_tags() {
        let existing = tags(&["clamav:old.sig", "ClamAV:Other.Sig", "yara:rule_a", "family:emotet"]);
        let delta = reconcile(&existing, EngineKind::ClamAv, &[detected("New.Sig")]);

        assert_eq!(delta.to_add, tags(&["clamav:new.sig"]));
        assert_eq!(delta.to_remove, tags(&["clamav:old.sig", "ClamAV:Other.Sig"]));

        let mut after = existing.clone();
        delta.apply_to(&mut after);
        assert_eq!(after.iter().filter(|t| in_namespace(t, EngineKind::ClamAv)).count(), 1);
        assert!(after.contains("yara:rule_a"));
        assert!(after.contains("family:emotet"));
    }

    #[test]
    fn test_antivirus_clean_purges_namespace() {
        let existing = tags(&["clamav:old.sig", "yara:rule_a"]);

        let delta = reconcile(&existing, EngineKind::ClamAv, &[Verdict::Clean]);
        assert!(delta.to_add.is_empty());
        assert_eq!(delta.to_remove, tags(&["clamav:old.sig"]));
    }

    #[test]
    fn test_antivirus_error_leaves_namespace() {
        let existing = tags(&["clamav:old.sig", "ClamAV:Other.Sig", "yara:rule_a"]);

        assert!(reconcile(&existing, EngineKind::ClamAv, &[Verdict::Error]).is_empty());
        assert!(reconcile(&existing, EngineKind::ClamAv, &[]).is_empty());
    }

    #[test]
    fn test_antivirus_same_verdict_twice_is_idempotent() {
        let mut current = BTreeSet::new();
        let verdict = [detected("Win.Test.EICAR")];

        let first = reconcile(&current, EngineKind::ClamAv, &verdict);
        assert_eq!(first.write_count(), 1);
        first.apply_to(&mut current);

        let second = reconcile(&current, EngineKind::ClamAv, &verdict);
        assert!(second.is_empty());
        second.apply_to(&mut current);

        assert_eq!(current, tags(&["clamav:win.test.eicar"]));
    }

    #[test]
    fn test_antivirus_existing_tag_in_other_case_is_kept() {
        let existing = tags(&["ClamAV:Win.Test.EICAR"]);
        let delta = reconcile(&existing, EngineKind::ClamAv, &[detected("Win.Test.EICAR")]);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_antivirus_collapses_case_duplicates() {
        let existing = tags(&["ClamAV:Win.Test.EICAR", "clamav:win.test.eicar"]);
        let delta = reconcile(&existing, EngineKind::ClamAv, &[detected("Win.Test.EICAR")]);

        assert!(delta.to_add.is_empty());
        assert_eq!(delta.to_remove.len(), 1);

        let mut after = existing.clone();
        delta.apply_to(&mut after);
        assert_eq!(after.len(), 1);
    }

    #[test]
    fn test_rules_add_missing_tags_only() {
        let existing = tags(&["yara:rule_a"]);
        let delta = reconcile(
            &existing,
            EngineKind::Yara,
            &[detected("Rule_A"), detected("Rule_B"), detected("rule_b")],
        );
        assert_eq!(delta.to_add, tags(&["yara:rule_b"]));
        assert!(delta.to_remove.is_empty());
    }

    #[test]
    fn test_rules_keep_tags_for_rules_no_longer_matching() {
        let existing = tags(&["yara:rule_a", "yara:rule_old"]);
        let delta = reconcile(&existing, EngineKind::Yara, &[detected("Rule_A")]);
        assert!(delta.is_empty());

        let delta = reconcile(&existing, EngineKind::Yara, &[]);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_rules_rescan_with_same_matches_writes_nothing() {
        let matches = [detected("EICAR_Test_File"), detected("Packed_UPX")];
        let mut current = tags(&["family:test"]);

        let first = reconcile(&current, EngineKind::Yara, &matches);
        assert_eq!(first.write_count(), 2);
        first.apply_to(&mut current);

        for _ in 0..3 {
            let again = reconcile(&current, EngineKind::Yara, &matches);
            assert_eq!(again.write_count(), 0);
        }
    }
}
