use std::cmp::Ordering;

use crate::model::DiffFinding;

/// Severity descending, then code, then message. Ties keep input order.
pub fn compare_findings(a: &DiffFinding, b: &DiffFinding) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| a.code.cmp(&b.code))
        .then_with(|| a.message.cmp(&b.message))
}

pub fn sort_findings(findings: &[DiffFinding]) -> Vec<DiffFinding> {
    let mut sorted = findings.to_vec();
    sorted.sort_by(compare_findings);
    sorted
}
