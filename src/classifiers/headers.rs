use crate::classifiers::RuleOutcome;
use crate::model::{ComparedValue, DiffEvidence, DiffFinding, Severity, SignalEnvelope};

pub const HEADERS_SECTION: &str = "headers";

/// Compares one header across both sides. Needs both header maps; the header
/// missing on both sides is not drift.
pub fn compare_header(
    left: &SignalEnvelope,
    right: &SignalEnvelope,
    name: &str,
    code: &str,
    severity: Severity,
) -> RuleOutcome {
    if !left.has_headers() || !right.has_headers() {
        return Ok(None);
    }
    let (l, r) = (left.header(name), right.header(name));
    if l == r {
        return Ok(None);
    }
    let finding = DiffFinding::new(
        code,
        severity,
        format!("{name} differs: {} vs {}", display(l), display(r)),
    )?
    .with_evidence(DiffEvidence::section(HEADERS_SECTION).with_keys([name]))
    .with_values(
        ComparedValue::text_or_absent(l),
        ComparedValue::text_or_absent(r),
    );
    Ok(Some(finding))
}

/// Compares a family of headers case-insensitively and reports every member
/// that differs as one finding keyed by header name.
pub fn compare_header_set(
    left: &SignalEnvelope,
    right: &SignalEnvelope,
    names: &[&str],
    code: &str,
    severity: Severity,
    label: &str,
) -> RuleOutcome {
    if !left.has_headers() || !right.has_headers() {
        return Ok(None);
    }
    let differing = names
        .iter()
        .copied()
        .filter(|name| !same_ignoring_case(left.header(name), right.header(name)))
        .collect::<Vec<_>>();
    if differing.is_empty() {
        return Ok(None);
    }
    let finding = DiffFinding::new(
        code,
        severity,
        format!("{label} differ: {}", differing.join(", ")),
    )?
    .with_evidence(DiffEvidence::section(HEADERS_SECTION).with_keys(differing.iter().copied()))
    .with_values(
        ComparedValue::Text(render_subset(left, &differing)),
        ComparedValue::Text(render_subset(right, &differing)),
    );
    Ok(Some(finding))
}

pub fn display(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("\"{v}\""),
        None => "(absent)".to_string(),
    }
}

fn same_ignoring_case(left: Option<&str>, right: Option<&str>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => l.eq_ignore_ascii_case(r),
        (None, None) => true,
        _ => false,
    }
}

fn render_subset(envelope: &SignalEnvelope, names: &[&str]) -> String {
    names
        .iter()
        .map(|name| format!("{name}={}", display(envelope.header(name))))
        .collect::<Vec<_>>()
        .join("; ")
}
