use serde::{Deserialize, Serialize};

use crate::config::AlertRulesConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertEventKind {
    CriticalDrift,
    DriftResolved,
    StatusChanged,
}

impl AlertEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CriticalDrift => "critical_drift",
            Self::DriftResolved => "drift_resolved",
            Self::StatusChanged => "status_changed",
        }
    }

    pub fn is_enabled(self, rules: &AlertRulesConfig) -> bool {
        match self {
            Self::CriticalDrift => rules.critical_drift,
            Self::DriftResolved => rules.drift_resolved,
            Self::StatusChanged => rules.status_changed,
        }
    }
}

impl std::fmt::Display for AlertEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
