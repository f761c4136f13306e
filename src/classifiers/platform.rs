use crate::classifiers::headers::{compare_header, display, HEADERS_SECTION};
use crate::classifiers::{CategoryClassifier, DiffSettings, Rule, RuleOutcome};
use crate::model::codes::{EDGE_PROVIDER_MISMATCH, POWERED_BY_MISMATCH, SERVER_HEADER_MISMATCH};
use crate::model::{
    ComparedValue, DiffEvidence, DiffFinding, FindingCategory, Severity, SignalEnvelope,
};

/// Header whose presence identifies the edge provider, in priority order.
pub const EDGE_FINGERPRINTS: [(&str, &str); 8] = [
    ("cf-ray", "cloudflare"),
    ("x-amz-cf-id", "cloudfront"),
    ("x-vercel-id", "vercel"),
    ("x-nf-request-id", "netlify"),
    ("fastly-debug-digest", "fastly"),
    ("x-akamai-transformed", "akamai"),
    ("x-azure-ref", "azure-front-door"),
    ("fly-request-id", "fly"),
];

#[derive(Debug, Clone, Copy)]
pub struct PlatformClassifier;

const RULES: &[Rule] = &[
    Rule {
        code: SERVER_HEADER_MISMATCH,
        eval: server_header,
    },
    Rule {
        code: POWERED_BY_MISMATCH,
        eval: powered_by,
    },
    Rule {
        code: EDGE_PROVIDER_MISMATCH,
        eval: edge_provider,
    },
];

impl CategoryClassifier for PlatformClassifier {
    fn category(&self) -> FindingCategory {
        FindingCategory::Platform
    }

    fn name(&self) -> &str {
        "platform"
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

/// First matching fingerprint as `(header, provider)`.
pub fn detect_edge_provider(envelope: &SignalEnvelope) -> Option<(&'static str, &'static str)> {
    EDGE_FINGERPRINTS
        .iter()
        .find(|(header, _)| envelope.header(header).is_some())
        .copied()
}

fn server_header(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    compare_header(left, right, "server", SERVER_HEADER_MISMATCH, Severity::Info)
}

fn powered_by(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    compare_header(left, right, "x-powered-by", POWERED_BY_MISMATCH, Severity::Info)
}

fn edge_provider(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    if !left.has_headers() || !right.has_headers() {
        return Ok(None);
    }
    let (l, r) = (detect_edge_provider(left), detect_edge_provider(right));
    let (l_provider, r_provider) = (l.map(|(_, p)| p), r.map(|(_, p)| p));
    if l_provider == r_provider {
        return Ok(None);
    }
    let mut keys = l.into_iter().chain(r).map(|(h, _)| h).collect::<Vec<_>>();
    keys.dedup();
    let finding = DiffFinding::new(
        EDGE_PROVIDER_MISMATCH,
        Severity::Warn,
        format!(
            "edge provider differs: {} vs {}",
            display(l_provider),
            display(r_provider)
        ),
    )?
    .with_evidence(
        DiffEvidence::section(HEADERS_SECTION)
            .with_keys(keys)
            .with_note("provider inferred from response headers"),
    )
    .with_values(
        ComparedValue::text_or_absent(l_provider),
        ComparedValue::text_or_absent(r_provider),
    )
    .with_recommendation("Confirm DNS for both environments points at the intended edge");
    Ok(Some(finding))
}

#[cfg(test)]
mod tests {
    use super::{detect_edge_provider, edge_provider};
    use crate::classifiers::DiffSettings;
    use crate::model::{ComparedValue, Severity, SignalEnvelope};

    #[test]
    fn detects_provider_by_header() {
        let env = SignalEnvelope::succeeded().with_header("CF-RAY", "8a1b-AMS");
        assert_eq!(detect_edge_provider(&env), Some(("cf-ray", "cloudflare")));
        assert_eq!(detect_edge_provider(&SignalEnvelope::succeeded()), None);
    }

    #[test]
    fn provider_change_is_warn() {
        let left = SignalEnvelope::succeeded().with_header("cf-ray", "1");
        let right = SignalEnvelope::succeeded().with_header("x-amz-cf-id", "2");
        let finding = edge_provider(&left, &right, &DiffSettings::default())
            .expect("valid rule")
            .expect("finding");
        assert_eq!(finding.severity, Severity::Warn);
        assert_eq!(
            finding.left_value,
            Some(ComparedValue::Text("cloudflare".to_string()))
        );
        assert_eq!(finding.evidence[0].keys, vec!["cf-ray", "x-amz-cf-id"]);
    }

    #[test]
    fn no_provider_on_either_side_is_quiet() {
        let left = SignalEnvelope::succeeded().with_header("server", "nginx");
        let right = SignalEnvelope::succeeded().with_header("server", "apache");
        assert!(edge_provider(&left, &right, &DiffSettings::default())
            .expect("valid rule")
            .is_none());
    }
}
