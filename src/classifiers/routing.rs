use crate::classifiers::redirect::{chains_are_equal, classify_redirect_chain_drift};
use crate::classifiers::{CategoryClassifier, DiffSettings, Rule, RuleOutcome};
use crate::model::codes::{
    FINAL_URL_MISMATCH, PROBE_OUTCOME_MISMATCH, REDIRECT_CHAIN_DRIFT, STATUS_MISMATCH,
};
use crate::model::{
    ComparedValue, DiffEvidence, DiffFinding, FindingCategory, Severity, SignalEnvelope,
};

#[derive(Debug, Clone, Copy)]
pub struct RoutingClassifier;

const RULES: &[Rule] = &[
    Rule {
        code: PROBE_OUTCOME_MISMATCH,
        eval: probe_outcome,
    },
    Rule {
        code: STATUS_MISMATCH,
        eval: status_code,
    },
    Rule {
        code: REDIRECT_CHAIN_DRIFT,
        eval: redirect_chain,
    },
    Rule {
        code: FINAL_URL_MISMATCH,
        eval: final_url,
    },
];

impl CategoryClassifier for RoutingClassifier {
    fn category(&self) -> FindingCategory {
        FindingCategory::Routing
    }

    fn name(&self) -> &str {
        "routing"
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

fn probe_outcome(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    if left.ok != right.ok {
        let (failed_side, error) = if left.ok {
            ("right", right.error_code.as_deref())
        } else {
            ("left", left.error_code.as_deref())
        };
        let finding = DiffFinding::new(
            PROBE_OUTCOME_MISMATCH,
            Severity::Critical,
            format!(
                "{failed_side} probe failed ({}) while the other succeeded",
                error.unwrap_or("no error code")
            ),
        )?
        .with_evidence(DiffEvidence::section("probe").with_keys(["ok"]))
        .with_values(ComparedValue::Flag(left.ok), ComparedValue::Flag(right.ok))
        .with_recommendation("Check that both environments are reachable from the probe host");
        return Ok(Some(finding));
    }

    match (left.ok, left.error_code.as_deref(), right.error_code.as_deref()) {
        (false, Some(l), Some(r)) if l != r => {
            let finding = DiffFinding::new(
                PROBE_OUTCOME_MISMATCH,
                Severity::Warn,
                format!("both probes failed with different errors: {l} vs {r}"),
            )?
            .with_evidence(DiffEvidence::section("probe").with_keys(["error_code"]))
            .with_values(
                ComparedValue::Text(l.to_string()),
                ComparedValue::Text(r.to_string()),
            );
            Ok(Some(finding))
        }
        _ => Ok(None),
    }
}

fn status_code(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    let (Some(l), Some(r)) = (left.status, right.status) else {
        return Ok(None);
    };
    if l == r {
        return Ok(None);
    }
    let severity = if l / 100 != r / 100 {
        Severity::Critical
    } else {
        Severity::Warn
    };
    let finding = DiffFinding::new(
        STATUS_MISMATCH,
        severity,
        format!("status code differs: {l} vs {r}"),
    )?
    .with_evidence(DiffEvidence::section("status"))
    .with_values(ComparedValue::Status(l), ComparedValue::Status(r))
    .with_recommendation("Compare routing and upstream configuration for this path");
    Ok(Some(finding))
}

fn redirect_chain(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    let (l, r) = (left.redirect_chain(), right.redirect_chain());
    if l.is_none() && r.is_none() {
        return Ok(None);
    }
    if chains_are_equal(l, r) {
        return Ok(None);
    }

    let drift = classify_redirect_chain_drift(l, r);
    let left_len = l.map_or(0, <[String]>::len);
    let right_len = r.map_or(0, <[String]>::len);

    let mut keys = Vec::new();
    if drift.hop_count_changed {
        keys.push("hop_count");
    }
    if drift.final_host_changed {
        keys.push("final_hop");
    }
    if keys.is_empty() {
        keys.push("hops");
    }

    let mut message = format!("redirect chain differs: {left_len} vs {right_len} hops");
    if drift.final_host_changed {
        message.push_str(", final hop changed");
    }

    let mut finding = DiffFinding::new(REDIRECT_CHAIN_DRIFT, drift.severity, message)?
        .with_evidence(DiffEvidence::section("redirects").with_keys(keys))
        .with_values(
            ComparedValue::Chain(l.map(<[String]>::to_vec).unwrap_or_default()),
            ComparedValue::Chain(r.map(<[String]>::to_vec).unwrap_or_default()),
        );
    if drift.final_host_changed {
        finding = finding.with_recommendation("Verify redirect rules and canonical host settings");
    }
    Ok(Some(finding))
}

fn final_url(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    let (Some(l), Some(r)) = (left.final_url.as_deref(), right.final_url.as_deref()) else {
        return Ok(None);
    };
    if l.to_lowercase() == r.to_lowercase() {
        return Ok(None);
    }
    let finding = DiffFinding::new(
        FINAL_URL_MISMATCH,
        Severity::Warn,
        format!("final URL differs: {l} vs {r}"),
    )?
    .with_evidence(DiffEvidence::section("final_url"))
    .with_values(
        ComparedValue::Text(l.to_string()),
        ComparedValue::Text(r.to_string()),
    );
    Ok(Some(finding))
}

#[cfg(test)]
mod tests {
    use super::{final_url, probe_outcome, redirect_chain, status_code};
    use crate::classifiers::DiffSettings;
    use crate::model::{ComparedValue, Severity, SignalEnvelope};

    #[test]
    fn outcome_mismatch_is_critical() {
        let left = SignalEnvelope::succeeded();
        let right = SignalEnvelope::failed("ETIMEDOUT");
        let finding = probe_outcome(&left, &right, &DiffSettings::default())
            .expect("valid rule")
            .expect("finding");
        assert_eq!(finding.severity, Severity::Critical);
        assert!(finding.message.contains("ETIMEDOUT"));
    }

    #[test]
    fn both_failed_with_same_error_is_quiet() {
        let left = SignalEnvelope::failed("ECONNREFUSED");
        let right = SignalEnvelope::failed("ECONNREFUSED");
        assert!(probe_outcome(&left, &right, &DiffSettings::default())
            .expect("valid rule")
            .is_none());
    }

    #[test]
    fn status_class_change_is_critical_and_same_class_warn() {
        let settings = DiffSettings::default();
        let ok = SignalEnvelope::succeeded().with_status(200);
        let not_found = SignalEnvelope::succeeded().with_status(404);
        let created = SignalEnvelope::succeeded().with_status(201);
        let critical = status_code(&ok, &not_found, &settings)
            .expect("valid rule")
            .expect("finding");
        assert_eq!(critical.severity, Severity::Critical);
        let warn = status_code(&ok, &created, &settings)
            .expect("valid rule")
            .expect("finding");
        assert_eq!(warn.severity, Severity::Warn);
        assert!(status_code(&ok, &SignalEnvelope::succeeded(), &settings)
            .expect("valid rule")
            .is_none());
    }

    #[test]
    fn redirect_rule_skips_missing_and_equal_chains() {
        let settings = DiffSettings::default();
        let none = SignalEnvelope::succeeded();
        assert!(redirect_chain(&none, &none, &settings)
            .expect("valid rule")
            .is_none());
        let a = SignalEnvelope::succeeded().with_redirects(["http://a.test", "http://b.test"]);
        let a_upper =
            SignalEnvelope::succeeded().with_redirects(["HTTP://A.TEST", "http://b.test"]);
        assert!(redirect_chain(&a, &a_upper, &settings)
            .expect("valid rule")
            .is_none());
    }

    #[test]
    fn redirect_rule_carries_classifier_severity() {
        let settings = DiffSettings::default();
        let left =
            SignalEnvelope::succeeded().with_redirects(["http://a.test", "http://final1.test"]);
        let right =
            SignalEnvelope::succeeded().with_redirects(["http://a.test", "http://final2.test"]);
        let finding = redirect_chain(&left, &right, &settings)
            .expect("valid rule")
            .expect("finding");
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.evidence[0].keys, vec!["final_hop".to_string()]);

        let middle =
            SignalEnvelope::succeeded().with_redirects(["http://x.test", "http://final1.test"]);
        let info = redirect_chain(&left, &middle, &settings)
            .expect("valid rule")
            .expect("finding");
        assert_eq!(info.severity, Severity::Info);
        assert_eq!(info.evidence[0].keys, vec!["hops".to_string()]);
    }

    #[test]
    fn redirect_rule_treats_one_missing_chain_as_empty() {
        let settings = DiffSettings::default();
        let left = SignalEnvelope::succeeded().with_redirects(["http://a.test"]);
        let right = SignalEnvelope::succeeded();
        let finding = redirect_chain(&left, &right, &settings)
            .expect("valid rule")
            .expect("finding");
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.right_value, Some(ComparedValue::Chain(Vec::new())));
    }

    #[test]
    fn final_url_ignores_case() {
        let settings = DiffSettings::default();
        let left = SignalEnvelope::succeeded().with_final_url("https://A.test/");
        let right = SignalEnvelope::succeeded().with_final_url("https://a.test/");
        assert!(final_url(&left, &right, &settings)
            .expect("valid rule")
            .is_none());
    }
}
