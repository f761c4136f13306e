use crate::classifiers::headers::{compare_header, HEADERS_SECTION};
use crate::classifiers::{CategoryClassifier, DiffSettings, Rule, RuleOutcome};
use crate::model::codes::{CONTENT_ENCODING_MISMATCH, CONTENT_LENGTH_DRIFT, CONTENT_TYPE_MISMATCH};
use crate::model::{
    ComparedValue, DiffEvidence, DiffFinding, FindingCategory, Severity, SignalEnvelope,
};

#[derive(Debug, Clone, Copy)]
pub struct ContentClassifier;

const RULES: &[Rule] = &[
    Rule {
        code: CONTENT_TYPE_MISMATCH,
        eval: content_type,
    },
    Rule {
        code: CONTENT_ENCODING_MISMATCH,
        eval: content_encoding,
    },
    Rule {
        code: CONTENT_LENGTH_DRIFT,
        eval: content_length,
    },
];

impl CategoryClassifier for ContentClassifier {
    fn category(&self) -> FindingCategory {
        FindingCategory::Content
    }

    fn name(&self) -> &str {
        "content"
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

fn content_type(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    compare_header(
        left,
        right,
        "content-type",
        CONTENT_TYPE_MISMATCH,
        Severity::Warn,
    )
}

fn content_encoding(
    left: &SignalEnvelope,
    right: &SignalEnvelope,
    _: &DiffSettings,
) -> RuleOutcome {
    compare_header(
        left,
        right,
        "content-encoding",
        CONTENT_ENCODING_MISMATCH,
        Severity::Info,
    )
}

/// Needs a parseable content-length on both sides; chunked responses are
/// not comparable.
fn content_length(
    left: &SignalEnvelope,
    right: &SignalEnvelope,
    settings: &DiffSettings,
) -> RuleOutcome {
    let (Some(l), Some(r)) = (parse_length(left), parse_length(right)) else {
        return Ok(None);
    };
    let largest = l.max(r);
    if l == r || largest == 0 {
        return Ok(None);
    }
    let ratio = l.abs_diff(r) as f64 / largest as f64;
    if ratio < settings.content_length_ratio {
        return Ok(None);
    }
    let finding = DiffFinding::new(
        CONTENT_LENGTH_DRIFT,
        Severity::Warn,
        format!(
            "content-length differs by {:.0}%: {l} vs {r} bytes",
            ratio * 100.0
        ),
    )?
    .with_evidence(DiffEvidence::section(HEADERS_SECTION).with_keys(["content-length"]))
    .with_values(
        ComparedValue::Text(l.to_string()),
        ComparedValue::Text(r.to_string()),
    );
    Ok(Some(finding))
}

fn parse_length(envelope: &SignalEnvelope) -> Option<u64> {
    envelope.header("content-length")?.parse().ok()
}
