use serde::{Deserialize, Serialize};

use crate::model::Severity;

/// Outcome of comparing two redirect chains. Ephemeral, feeds finding
/// construction only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedirectChainDrift {
    pub severity: Severity,
    pub hop_count_changed: bool,
    pub hop_count_diff: usize,
    pub final_host_changed: bool,
}

/// Last hop of the chain as given, without normalisation.
pub fn extract_final_host(chain: Option<&[String]>) -> Option<&str> {
    chain?.last().map(String::as_str)
}

/// Missing chains count as empty. Equal when lengths match and every hop
/// matches case-insensitively in order.
pub fn chains_are_equal(left: Option<&[String]>, right: Option<&[String]>) -> bool {
    let left = left.unwrap_or_default();
    let right = right.unwrap_or_default();
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(l, r)| l.to_lowercase() == r.to_lowercase())
}

/// The final hop is compared as a whole URL string, lower-cased. A changed
/// final hop or a hop-count difference of two or more is critical; anything
/// else is info.
pub fn classify_redirect_chain_drift(
    left: Option<&[String]>,
    right: Option<&[String]>,
) -> RedirectChainDrift {
    let left_len = left.map_or(0, <[String]>::len);
    let right_len = right.map_or(0, <[String]>::len);
    let hop_count_diff = left_len.abs_diff(right_len);

    let final_host_changed = match (extract_final_host(left), extract_final_host(right)) {
        (Some(l), Some(r)) => l.to_lowercase() != r.to_lowercase(),
        (None, None) => false,
        _ => true,
    };

    let severity = if final_host_changed || hop_count_diff >= 2 {
        Severity::Critical
    } else {
        Severity::Info
    };

    RedirectChainDrift {
        severity,
        hop_count_changed: hop_count_diff > 0,
        hop_count_diff,
        final_host_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::{chains_are_equal, classify_redirect_chain_drift, extract_final_host};
    use crate::model::Severity;

    fn chain(hops: &[&str]) -> Vec<String> {
        hops.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn identical_chains_are_info() {
        let left = chain(&["http://example.com", "http://redirect1.com"]);
        let right = left.clone();
        let drift = classify_redirect_chain_drift(Some(left.as_slice()), Some(right.as_slice()));
        assert_eq!(drift.severity, Severity::Info);
        assert!(!drift.hop_count_changed);
        assert!(!drift.final_host_changed);
    }

    #[test]
    fn different_final_hop_is_critical() {
        let left = chain(&["http://example.com", "http://final1.com"]);
        let right = chain(&["http://example.com", "http://final2.com"]);
        let drift = classify_redirect_chain_drift(Some(left.as_slice()), Some(right.as_slice()));
        assert_eq!(drift.severity, Severity::Critical);
        assert!(!drift.hop_count_changed);
        assert!(drift.final_host_changed);
    }

    #[test]
    fn two_extra_hops_is_critical_even_with_same_final_hop() {
        let left = chain(&["http://a.test"]);
        let right = chain(&["http://x.test", "http://y.test", "http://A.test"]);
        let drift = classify_redirect_chain_drift(Some(left.as_slice()), Some(right.as_slice()));
        assert_eq!(drift.hop_count_diff, 2);
        assert!(!drift.final_host_changed);
        assert_eq!(drift.severity, Severity::Critical);
    }

    #[test]
    fn one_extra_hop_with_same_final_hop_is_info() {
        let left = chain(&["http://a.test"]);
        let right = chain(&["http://b.test", "http://a.test"]);
        let drift = classify_redirect_chain_drift(Some(left.as_slice()), Some(right.as_slice()));
        assert_eq!(drift.hop_count_diff, 1);
        assert!(drift.hop_count_changed);
        assert_eq!(drift.severity, Severity::Info);
    }

    #[test]
    fn empty_versus_present_is_critical_but_both_empty_is_info() {
        let right = chain(&["http://a.test"]);
        let drift = classify_redirect_chain_drift(None, Some(right.as_slice()));
        assert!(drift.final_host_changed);
        assert_eq!(drift.severity, Severity::Critical);

        let both_empty = classify_redirect_chain_drift(None, Some(&[][..]));
        assert_eq!(both_empty.severity, Severity::Info);
        assert_eq!(both_empty.hop_count_diff, 0);
        assert!(!both_empty.final_host_changed);
    }

    #[test]
    fn final_hop_comparison_ignores_case() {
        let left = chain(&["HTTP://Example.COM/Path"]);
        let right = chain(&["http://example.com/path"]);
        let drift = classify_redirect_chain_drift(Some(left.as_slice()), Some(right.as_slice()));
        assert!(!drift.final_host_changed);
    }

    #[test]
    fn extract_final_host_preserves_case() {
        let hops = chain(&["http://a.test", "HTTPS://B.test"]);
        assert_eq!(extract_final_host(Some(hops.as_slice())), Some("HTTPS://B.test"));
        assert_eq!(extract_final_host(Some(&[][..])), None);
        assert_eq!(extract_final_host(None), None);
    }

    #[test]
    fn chain_equality_rules() {
        let a = chain(&["http://a.test", "http://b.test"]);
        let upper = chain(&["HTTP://A.TEST", "http://B.test"]);
        let shorter = chain(&["http://a.test"]);
        let reordered = chain(&["http://b.test", "http://a.test"]);
        assert!(chains_are_equal(Some(a.as_slice()), Some(a.as_slice())));
        assert!(chains_are_equal(Some(a.as_slice()), Some(upper.as_slice())));
        assert!(!chains_are_equal(Some(a.as_slice()), Some(shorter.as_slice())));
        assert!(!chains_are_equal(Some(a.as_slice()), Some(reordered.as_slice())));
        assert!(chains_are_equal(None, None));
        assert!(chains_are_equal(None, Some(&[][..])));
        assert!(!chains_are_equal(None, Some(shorter.as_slice())));
    }
}
