use crate::classifiers::headers::{compare_header, compare_header_set};
use crate::classifiers::{CategoryClassifier, DiffSettings, Rule, RuleOutcome};
use crate::model::codes::{CORS_MISMATCH, CSP_MISMATCH, HSTS_MISMATCH, SECURITY_HEADERS_DRIFT};
use crate::model::{FindingCategory, Severity, SignalEnvelope};

const HARDENING_HEADERS: [&str; 4] = [
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
    "permissions-policy",
];

#[derive(Debug, Clone, Copy)]
pub struct SecurityClassifier;

const RULES: &[Rule] = &[
    Rule {
        code: HSTS_MISMATCH,
        eval: hsts,
    },
    Rule {
        code: CSP_MISMATCH,
        eval: csp,
    },
    Rule {
        code: CORS_MISMATCH,
        eval: cors,
    },
    Rule {
        code: SECURITY_HEADERS_DRIFT,
        eval: hardening_headers,
    },
];

impl CategoryClassifier for SecurityClassifier {
    fn category(&self) -> FindingCategory {
        FindingCategory::Security
    }

    fn name(&self) -> &str {
        "security"
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

fn hsts(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    Ok(compare_header(
        left,
        right,
        "strict-transport-security",
        HSTS_MISMATCH,
        Severity::Warn,
    )?
    .map(|finding| {
        finding.with_recommendation("Align HSTS max-age and includeSubDomains across environments")
    }))
}

fn csp(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    compare_header(
        left,
        right,
        "content-security-policy",
        CSP_MISMATCH,
        Severity::Warn,
    )
}

fn cors(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    compare_header(
        left,
        right,
        "access-control-allow-origin",
        CORS_MISMATCH,
        Severity::Warn,
    )
}

fn hardening_headers(
    left: &SignalEnvelope,
    right: &SignalEnvelope,
    _: &DiffSettings,
) -> RuleOutcome {
    compare_header_set(
        left,
        right,
        &HARDENING_HEADERS,
        SECURITY_HEADERS_DRIFT,
        Severity::Info,
        "hardening headers",
    )
}
