use serde::{Deserialize, Serialize};

use crate::alert::rules::AlertEventKind;
use crate::config::AlertRulesConfig;
use crate::model::{EnvDiff, Severity};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertEvent {
    pub kind: AlertEventKind,
    pub comparison_id: String,
    pub title: String,
    pub body: String,
}

/// Derives alert events from the current diff and, when known, the previous
/// diff for the same comparison.
pub fn evaluate_alerts(previous: Option<&EnvDiff>, current: &EnvDiff) -> Vec<AlertEvent> {
    let mut events = Vec::new();

    if current.max_severity == Severity::Critical && current.has_findings() {
        let critical = current
            .findings
            .iter()
            .filter(|finding| finding.severity == Severity::Critical)
            .map(|finding| finding.code.as_str())
            .collect::<Vec<_>>();
        events.push(AlertEvent {
            kind: AlertEventKind::CriticalDrift,
            comparison_id: current.comparison_id.clone(),
            title: format!(
                "Critical drift between {} and {}",
                current.left_probe_id, current.right_probe_id
            ),
            body: format!(
                "{} critical finding(s): {}",
                critical.len(),
                critical.join(", ")
            ),
        });
    }

    if let Some(status) = current.status.filter(|status| status.changed) {
        events.push(AlertEvent {
            kind: AlertEventKind::StatusChanged,
            comparison_id: current.comparison_id.clone(),
            title: format!("Status differs in {}", current.comparison_id),
            body: format!(
                "{} returned {}, {} returned {}",
                current.left_probe_id, status.left, current.right_probe_id, status.right
            ),
        });
    }

    if let Some(previous) = previous {
        if previous.has_findings() && !current.has_findings() {
            events.push(AlertEvent {
                kind: AlertEventKind::DriftResolved,
                comparison_id: current.comparison_id.clone(),
                title: format!("Drift resolved in {}", current.comparison_id),
                body: format!(
                    "{} finding(s) from the previous run are gone.",
                    previous.findings.len()
                ),
            });
        }
    }

    events
}

pub fn apply_alert_rules(events: Vec<AlertEvent>, rules: &AlertRulesConfig) -> Vec<AlertEvent> {
    events
        .into_iter()
        .filter(|event| event.kind.is_enabled(rules))
        .collect()
}
