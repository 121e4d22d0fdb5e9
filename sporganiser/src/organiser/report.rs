//! Per-run report of everything that did not go cleanly.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::pack::{display_name_of, Tier};

/// One pack-level problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackIssue {
    pub path: PathBuf,
    pub name: String,
    pub reason: String,
}

impl PackIssue {
    pub fn new(path: &Path, reason: impl fmt::Display) -> Self {
        Self {
            path: path.to_path_buf(),
            name: display_name_of(path),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for PackIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// Outcome of the per-pack phase.
///
/// Nothing recorded here aborts a run; the caller decides what to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// `Custom Scenery` entries considered.
    pub entries_found: usize,

    /// Packs that received a tier.
    pub packs_classified: usize,

    /// Packs per tier.
    pub tier_counts: BTreeMap<Tier, usize>,

    /// Entries that do not lead to a pack directory.
    pub unresolved: Vec<PackIssue>,

    /// Packs excluded because their root is unreadable or empty.
    pub build_failures: Vec<PackIssue>,

    /// Malformed airport files; the pack continued without identifiers.
    pub extraction_failures: Vec<PackIssue>,

    /// Packs no rule could classify.
    pub unclassified: Vec<PackIssue>,

    /// Structural anomalies such as folder-in-folder extraction.
    pub structural_warnings: Vec<PackIssue>,

    /// Previous manifest lines whose pack no longer exists.
    pub missing_prior: Vec<String>,

    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl RunReport {
    /// Number of recorded problems, excluding missing prior entries.
    pub fn issue_count(&self) -> usize {
        self.unresolved.len()
            + self.build_failures.len()
            + self.extraction_failures.len()
            + self.unclassified.len()
            + self.structural_warnings.len()
    }

    /// No pack-level problems.
    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }

    pub(crate) fn count_tier(&mut self, tier: Tier) {
        self.packs_classified += 1;
        *self.tier_counts.entry(tier).or_default() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_clean() {
        let report = RunReport::default();
        assert!(report.is_clean());
        assert_eq!(report.issue_count(), 0);
    }

    #[test]
    fn test_issue_count_ignores_missing_prior() {
        let mut report = RunReport::default();
        report.missing_prior.push("Custom Scenery/Gone/".to_string());
        report
            .unclassified
            .push(PackIssue::new(Path::new("/cs/Mystery"), "no rule matched"));

        assert_eq!(report.issue_count(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.unclassified[0].to_string(), "Mystery: no rule matched");
    }

    #[test]
    fn test_count_tier() {
        let mut report = RunReport::default();
        report.count_tier(Tier::Orthophoto);
        report.count_tier(Tier::Orthophoto);
        report.count_tier(Tier::CustomAirport);

        assert_eq!(report.packs_classified, 3);
        assert_eq!(report.tier_counts[&Tier::Orthophoto], 2);
    }

    #[test]
    fn test_serializes_tier_keys_as_names() {
        let mut report = RunReport::default();
        report.count_tier(Tier::TerrainMesh);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["tier_counts"]["TerrainMesh"], 1);
    }
}
