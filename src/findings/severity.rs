use crate::model::{DiffFinding, Severity};

/// Worst severity present, `Info` for an empty set.
pub fn compute_max_severity(findings: &[DiffFinding]) -> Severity {
    findings
        .iter()
        .map(|finding| finding.severity)
        .max()
        .unwrap_or(Severity::Info)
}

#[cfg(test)]
mod tests {
    use super::compute_max_severity;
    use crate::model::codes::{STATUS_MISMATCH, TIMING_DRIFT, VARY_MISMATCH};
    use crate::model::{DiffFinding, Severity};

    #[test]
    fn empty_set_is_info() {
        assert_eq!(compute_max_severity(&[]), Severity::Info);
    }

    #[test]
    fn single_critical_dominates() {
        let mut findings = (0..5)
            .map(|i| {
                DiffFinding::new(VARY_MISMATCH, Severity::Info, format!("vary {i}"))
                    .expect("registered code")
            })
            .collect::<Vec<_>>();
        findings.push(DiffFinding::new(STATUS_MISMATCH, Severity::Warn, "s").expect("code"));
        assert_eq!(compute_max_severity(&findings), Severity::Warn);
        findings.push(DiffFinding::new(TIMING_DRIFT, Severity::Critical, "t").expect("code"));
        assert_eq!(compute_max_severity(&findings), Severity::Critical);
    }
}
