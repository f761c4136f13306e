use std::collections::HashSet;

use crate::model::DiffFinding;

/// Canonical identity: `<code>:<section>:<keys>`.
///
/// `section` comes from the first evidence entry only (`undefined` when there
/// is none). `keys` is the set union of every entry's keys, sorted ascending
/// and comma-joined, so a key repeated across entries counts once.
pub fn compute_dedup_key(finding: &DiffFinding) -> String {
    let section = finding
        .evidence
        .first()
        .map(|evidence| evidence.section.as_str())
        .unwrap_or("undefined");
    let mut keys = finding
        .evidence
        .iter()
        .flat_map(|evidence| evidence.keys.iter().map(String::as_str))
        .collect::<Vec<_>>();
    keys.sort_unstable();
    keys.dedup();
    format!("{}:{}:{}", finding.code, section, keys.join(","))
}

/// Keeps the first finding for each dedup key, in input order.
pub fn deduplicate_findings(findings: &[DiffFinding]) -> Vec<DiffFinding> {
    let mut seen = HashSet::new();
    findings
        .iter()
        .filter(|finding| seen.insert(compute_dedup_key(finding)))
        .cloned()
        .collect()
}
