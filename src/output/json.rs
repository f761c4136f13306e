use anyhow::Result;
use serde::Serialize;

use crate::alert::AlertEvent;
use crate::findings::{group_findings_by_category, CategoryGroup};
use crate::model::EnvDiff;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// What the CLI and API hand to consumers: the diff itself plus the
/// category grouping and any alerts it raised.
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub diff: EnvDiff,
    pub groups: Vec<CategoryGroup>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<AlertEvent>,
}

impl DiffReport {
    pub fn new(diff: EnvDiff, alerts: Vec<AlertEvent>) -> Self {
        let groups = group_findings_by_category(&diff.findings);
        Self {
            diff,
            groups,
            alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{render_json, DiffReport};
    use crate::engine::build_diff;
    use crate::model::{ComparisonMeta, SignalEnvelope};

    #[test]
    fn report_nests_diff_and_groups() {
        let left = SignalEnvelope::succeeded()
            .with_status(200)
            .with_header("vary", "accept");
        let right = SignalEnvelope::succeeded()
            .with_status(500)
            .with_header("vary", "cookie");
        let diff = build_diff(&left, &right, &ComparisonMeta::new("home"));
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&DiffReport::new(diff, Vec::new())).expect("json"))
                .expect("valid json");

        assert_eq!(value["diff"]["max_severity"], "critical");
        assert_eq!(value["groups"][0]["category"], "routing");
        assert_eq!(value["groups"][1]["category"], "cache");
        assert!(value.get("alerts").is_none());
    }
}
