use crate::classifiers::headers::{compare_header, compare_header_set};
use crate::classifiers::{CategoryClassifier, DiffSettings, Rule, RuleOutcome};
use crate::model::codes::{CACHE_CONTROL_MISMATCH, CACHE_STATUS_MISMATCH, VARY_MISMATCH};
use crate::model::{FindingCategory, Severity, SignalEnvelope};

const CACHE_STATUS_HEADERS: [&str; 4] = [
    "x-cache",
    "cf-cache-status",
    "x-vercel-cache",
    "x-cache-status",
];

#[derive(Debug, Clone, Copy)]
pub struct CacheClassifier;

const RULES: &[Rule] = &[
    Rule {
        code: CACHE_CONTROL_MISMATCH,
        eval: cache_control,
    },
    Rule {
        code: VARY_MISMATCH,
        eval: vary,
    },
    Rule {
        code: CACHE_STATUS_MISMATCH,
        eval: cache_status,
    },
];

impl CategoryClassifier for CacheClassifier {
    fn category(&self) -> FindingCategory {
        FindingCategory::Cache
    }

    fn name(&self) -> &str {
        "cache"
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

fn cache_control(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    Ok(compare_header(
        left,
        right,
        "cache-control",
        CACHE_CONTROL_MISMATCH,
        Severity::Warn,
    )?
    .map(|finding| {
        finding.with_recommendation("Check CDN and origin cache policies for this path")
    }))
}

fn vary(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    compare_header(left, right, "vary", VARY_MISMATCH, Severity::Info)
}

fn cache_status(left: &SignalEnvelope, right: &SignalEnvelope, _: &DiffSettings) -> RuleOutcome {
    compare_header_set(
        left,
        right,
        &CACHE_STATUS_HEADERS,
        CACHE_STATUS_MISMATCH,
        Severity::Info,
        "cache indicators",
    )
}

#[cfg(test)]
mod tests {
    use super::{cache_control, cache_status};
    use crate::classifiers::DiffSettings;
    use crate::model::{FindingCategory, Severity, SignalEnvelope};

    #[test]
    fn cache_control_drift_is_warn() {
        let left = SignalEnvelope::succeeded().with_header("cache-control", "max-age=60");
        let right = SignalEnvelope::succeeded().with_header("cache-control", "no-store");
        let finding = cache_control(&left, &right, &DiffSettings::default())
            .expect("valid rule")
            .expect("finding");
        assert_eq!(finding.category, FindingCategory::Cache);
        assert_eq!(finding.severity, Severity::Warn);
    }

    #[test]
    fn hit_versus_miss_is_reported_case_insensitively() {
        let left = SignalEnvelope::succeeded().with_header("cf-cache-status", "HIT");
        let right = SignalEnvelope::succeeded().with_header("cf-cache-status", "MISS");
        let same = SignalEnvelope::succeeded().with_header("CF-Cache-Status", "hit");
        let settings = DiffSettings::default();
        assert!(cache_status(&left, &right, &settings)
            .expect("valid rule")
            .is_some());
        assert!(cache_status(&left, &same, &settings)
            .expect("valid rule")
            .is_none());
    }
}
