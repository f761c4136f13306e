use serde::{Deserialize, Serialize};

use crate::model::envelope::SignalEnvelope;
use crate::model::finding::DiffFinding;
use crate::model::severity::Severity;

pub const ENV_DIFF_SCHEMA_VERSION: u32 = 1;

/// Identity of one comparison request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComparisonMeta {
    pub comparison_id: String,
    #[serde(default)]
    pub left_probe_id: Option<String>,
    #[serde(default)]
    pub right_probe_id: Option<String>,
}

impl ComparisonMeta {
    pub fn new(comparison_id: impl Into<String>) -> Self {
        Self {
            comparison_id: comparison_id.into(),
            left_probe_id: None,
            right_probe_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl From<&SignalEnvelope> for ProbeOutcome {
    fn from(envelope: &SignalEnvelope) -> Self {
        Self {
            ok: envelope.ok,
            error_code: envelope.error_code.clone(),
            duration_ms: envelope.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeComparison {
    pub left: ProbeOutcome,
    pub right: ProbeOutcome,
    pub changed: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusComparison {
    pub left: u16,
    pub right: u16,
    pub changed: bool,
}

/// A rule that could not produce a finding because it failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleFailure {
    pub code: String,
    pub reason: String,
}

/// Result of one comparison. Built once by the orchestrator and never
/// modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvDiff {
    pub schema_version: u32,
    pub comparison_id: String,
    pub left_probe_id: String,
    pub right_probe_id: String,
    pub probe: ProbeComparison,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusComparison>,
    pub findings: Vec<DiffFinding>,
    pub max_severity: Severity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_rules: Vec<RuleFailure>,
}

impl EnvDiff {
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == severity)
            .count()
    }

    pub fn is_compatible(&self) -> bool {
        self.schema_version == ENV_DIFF_SCHEMA_VERSION
    }
}
