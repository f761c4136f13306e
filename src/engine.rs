use tracing::{debug, warn};

use crate::classifiers::{ClassifierRegistry, DiffSettings};
use crate::findings::{compute_max_severity, deduplicate_findings, sort_findings};
use crate::model::{
    ComparisonMeta, DiffFinding, EnvDiff, ProbeComparison, ProbeOutcome, RuleFailure,
    SignalEnvelope, StatusComparison, ENV_DIFF_SCHEMA_VERSION,
};

/// Runs every enabled classifier rule over a pair of envelopes and assembles
/// the resulting [`EnvDiff`]. Holds no per-comparison state.
#[derive(Clone, Default)]
pub struct DiffEngine {
    registry: ClassifierRegistry,
    settings: DiffSettings,
}

impl DiffEngine {
    pub fn new(registry: ClassifierRegistry, settings: DiffSettings) -> Self {
        Self { registry, settings }
    }

    pub fn settings(&self) -> &DiffSettings {
        &self.settings
    }

    pub fn build(
        &self,
        left: &SignalEnvelope,
        right: &SignalEnvelope,
        meta: &ComparisonMeta,
    ) -> EnvDiff {
        let (raw, degraded_rules) = self.collect_raw_findings(left, right);
        let deduped = deduplicate_findings(&raw);
        let findings = sort_findings(&deduped);
        let max_severity = compute_max_severity(&findings);
        debug!(
            comparison = %meta.comparison_id,
            raw = raw.len(),
            kept = findings.len(),
            degraded = degraded_rules.len(),
            %max_severity,
            "built environment diff"
        );

        EnvDiff {
            schema_version: ENV_DIFF_SCHEMA_VERSION,
            comparison_id: meta.comparison_id.clone(),
            left_probe_id: resolve_probe_id(meta.left_probe_id.as_deref(), left, "left"),
            right_probe_id: resolve_probe_id(meta.right_probe_id.as_deref(), right, "right"),
            probe: compare_probes(left, right),
            status: compare_status(left, right),
            findings,
            max_severity,
            degraded_rules,
        }
    }

    fn collect_raw_findings(
        &self,
        left: &SignalEnvelope,
        right: &SignalEnvelope,
    ) -> (Vec<DiffFinding>, Vec<RuleFailure>) {
        let mut findings = Vec::new();
        let mut failures = Vec::new();
        for classifier in self.registry.classifiers() {
            for rule in classifier.rules() {
                if !self.settings.is_enabled(rule.code) {
                    continue;
                }
                match (rule.eval)(left, right, &self.settings) {
                    Ok(Some(finding)) => findings.push(finding),
                    Ok(None) => {}
                    Err(err) => {
                        warn!(
                            classifier = classifier.name(),
                            code = rule.code,
                            "rule produced an invalid finding: {err}"
                        );
                        failures.push(RuleFailure {
                            code: rule.code.to_string(),
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
        (findings, failures)
    }
}

/// Builds a diff with the default classifiers and settings.
pub fn build_diff(
    left: &SignalEnvelope,
    right: &SignalEnvelope,
    meta: &ComparisonMeta,
) -> EnvDiff {
    DiffEngine::default().build(left, right, meta)
}

fn resolve_probe_id(explicit: Option<&str>, envelope: &SignalEnvelope, fallback: &str) -> String {
    explicit
        .or(envelope.probe_id.as_deref())
        .unwrap_or(fallback)
        .to_string()
}

fn compare_probes(left: &SignalEnvelope, right: &SignalEnvelope) -> ProbeComparison {
    let left = ProbeOutcome::from(left);
    let right = ProbeOutcome::from(right);
    let changed = left.ok != right.ok || left.error_code != right.error_code;
    ProbeComparison {
        left,
        right,
        changed,
    }
}

fn compare_status(left: &SignalEnvelope, right: &SignalEnvelope) -> Option<StatusComparison> {
    let (l, r) = (left.status?, right.status?);
    Some(StatusComparison {
        left: l,
        right: r,
        changed: l != r,
    })
}
