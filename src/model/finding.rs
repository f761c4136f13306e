use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::model::category::FindingCategory;
use crate::model::codes;
use crate::model::severity::Severity;

/// Location in the compared payload where drift was detected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffEvidence {
    pub section: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DiffEvidence {
    pub fn section(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            keys: Vec::new(),
            note: None,
        }
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Opaque per-side comparison payload. The engine never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ComparedValue {
    Text(String),
    Status(u16),
    Chain(Vec<String>),
    DurationMs(u64),
    Flag(bool),
    Absent,
}

impl ComparedValue {
    pub fn text_or_absent(value: Option<&str>) -> Self {
        value
            .map(|v| Self::Text(v.to_string()))
            .unwrap_or(Self::Absent)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FindingError {
    #[error("finding code must not be empty")]
    EmptyCode,
    #[error("finding code {0} is not registered to a category")]
    UnregisteredCode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffFinding {
    pub id: String,
    pub code: String,
    pub category: FindingCategory,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<DiffEvidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_value: Option<ComparedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_value: Option<ComparedValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

impl DiffFinding {
    /// Builds a finding whose category is resolved from the code registry.
    /// Fails for empty or unregistered codes.
    pub fn new(
        code: &str,
        severity: Severity,
        message: impl Into<String>,
    ) -> Result<Self, FindingError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(FindingError::EmptyCode);
        }
        let entry =
            codes::lookup(code).ok_or_else(|| FindingError::UnregisteredCode(code.to_string()))?;
        let mut finding = Self {
            id: String::new(),
            code: entry.code.to_string(),
            category: entry.category,
            severity,
            message: message.into(),
            evidence: Vec::new(),
            left_value: None,
            right_value: None,
            recommendations: Vec::new(),
        };
        finding.assign_id();
        Ok(finding)
    }

    pub fn with_evidence(mut self, evidence: DiffEvidence) -> Self {
        self.evidence.push(evidence);
        self.assign_id();
        self
    }

    pub fn with_values(mut self, left: ComparedValue, right: ComparedValue) -> Self {
        self.left_value = Some(left);
        self.right_value = Some(right);
        self.assign_id();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }

    fn assign_id(&mut self) {
        let mut hasher = Sha256::new();
        hasher.update(self.code.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.message.as_bytes());
        for evidence in &self.evidence {
            hasher.update([0u8]);
            hasher.update(evidence.section.as_bytes());
            for key in &evidence.keys {
                hasher.update([1u8]);
                hasher.update(key.as_bytes());
            }
        }
        for value in [&self.left_value, &self.right_value] {
            hasher.update([2u8]);
            hasher.update(serde_json::to_string(value).unwrap_or_default().as_bytes());
        }
        let digest = format!("{:x}", hasher.finalize());
        self.id = digest[..16].to_string();
    }
}
