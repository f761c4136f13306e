use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One side's captured probe result. Every field except `ok` is optional;
/// absent fields make the rules that need them inapplicable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SignalEnvelope {
    #[serde(default)]
    pub probe_id: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub redirects: Option<Vec<String>>,
    #[serde(default)]
    pub final_url: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl SignalEnvelope {
    pub fn succeeded() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    pub fn failed(error_code: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(error_code.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_redirects<I, S>(mut self, hops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redirects = Some(hops.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_final_url(mut self, url: &str) -> Self {
        self.final_url = Some(url.to_string());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn has_headers(&self) -> bool {
        self.headers.is_some()
    }

    /// Case-insensitive header lookup, value trimmed.
    pub fn header(&self, name: &str) -> Option<&str> {
        let headers = self.headers.as_ref()?;
        headers
            .get(name)
            .or_else(|| {
                headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(|v| v.trim())
    }

    pub fn redirect_chain(&self) -> Option<&[String]> {
        self.redirects.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::SignalEnvelope;

    #[test]
    fn header_lookup_ignores_name_case() {
        let envelope = SignalEnvelope::succeeded().with_header("Cache-Control", " no-store ");
        assert_eq!(envelope.header("cache-control"), Some("no-store"));
        assert_eq!(envelope.header("vary"), None);
        assert_eq!(SignalEnvelope::succeeded().header("cache-control"), None);
    }

    #[test]
    fn deserializes_minimal_envelope() {
        let envelope: SignalEnvelope = serde_json::from_value(json!({
            "ok": true,
            "status": 200,
            "redirects": ["http://a.test", "https://a.test"]
        }))
        .expect("valid envelope");
        assert_eq!(envelope.status, Some(200));
        assert_eq!(envelope.redirect_chain().map(<[String]>::len), Some(2));
        assert!(!envelope.has_headers());
    }
}
