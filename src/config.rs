use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::classifiers::DiffSettings;
use crate::model::codes::is_registered;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_timing_warn_delta_ms")]
    pub timing_warn_delta_ms: u64,
    #[serde(default = "default_timing_critical_delta_ms")]
    pub timing_critical_delta_ms: u64,
    #[serde(default = "default_content_length_ratio")]
    pub content_length_ratio: f64,
    #[serde(default)]
    pub disabled_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub webhook: String,
    #[serde(default = "default_true")]
    pub enable_stdout: bool,
    #[serde(default)]
    pub rules: AlertRulesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRulesConfig {
    #[serde(default = "default_true")]
    pub critical_drift: bool,
    #[serde(default = "default_true")]
    pub drift_resolved: bool,
    #[serde(default = "default_true")]
    pub status_changed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub disabled_codes: Option<Vec<String>>,
    pub db_path: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/envdiff/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let mut parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        parsed
            .validate()
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(parsed)
    }

    /// Normalises disabled codes to upper case and rejects thresholds the
    /// rules cannot honour.
    pub fn validate(&mut self) -> Result<()> {
        let mut codes: Vec<String> = Vec::new();
        for raw in &self.engine.disabled_codes {
            let code = raw.trim().to_ascii_uppercase();
            if code.is_empty() {
                continue;
            }
            if !is_registered(&code) {
                bail!("unknown finding code in engine.disabled_codes: {raw}");
            }
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        self.engine.disabled_codes = codes;

        if self.engine.timing_warn_delta_ms > self.engine.timing_critical_delta_ms {
            bail!(
                "engine.timing_warn_delta_ms ({}) exceeds engine.timing_critical_delta_ms ({})",
                self.engine.timing_warn_delta_ms,
                self.engine.timing_critical_delta_ms
            );
        }
        let ratio = self.engine.content_length_ratio;
        if ratio.is_nan() || ratio <= 0.0 || ratio > 1.0 {
            bail!("engine.content_length_ratio must be in (0, 1], got {ratio}");
        }
        Ok(())
    }

    /// Disabled codes from the CLI are added to the configured ones.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(codes) = overrides.disabled_codes {
            for code in codes {
                let code = code.trim().to_ascii_uppercase();
                if !code.is_empty() && !self.engine.disabled_codes.contains(&code) {
                    self.engine.disabled_codes.push(code);
                }
            }
        }
        if let Some(db_path) = overrides.db_path {
            self.storage.db_path = db_path;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
    }

    pub fn diff_settings(&self) -> DiffSettings {
        DiffSettings {
            timing_warn_delta_ms: self.engine.timing_warn_delta_ms,
            timing_critical_delta_ms: self.engine.timing_critical_delta_ms,
            content_length_ratio: self.engine.content_length_ratio,
            disabled_codes: self
                .engine
                .disabled_codes
                .iter()
                .cloned()
                .collect::<BTreeSet<_>>(),
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn default_template() -> String {
        let template = r#"[engine]
timing_warn_delta_ms = 500
timing_critical_delta_ms = 2000
content_length_ratio = 0.25
disabled_codes = []

[storage]
db_path = "~/.local/share/envdiff/envdiff.db"

[server]
host = "127.0.0.1"
port = 3002

[alerts]
webhook = ""
enable_stdout = true

[alerts.rules]
critical_drift = true
drift_resolved = true
status_changed = true
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timing_warn_delta_ms: default_timing_warn_delta_ms(),
            timing_critical_delta_ms: default_timing_critical_delta_ms(),
            content_length_ratio: default_content_length_ratio(),
            disabled_codes: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            webhook: String::new(),
            enable_stdout: true,
            rules: AlertRulesConfig::default(),
        }
    }
}

impl Default for AlertRulesConfig {
    fn default() -> Self {
        Self {
            critical_drift: true,
            drift_resolved: true,
            status_changed: true,
        }
    }
}

fn default_timing_warn_delta_ms() -> u64 {
    500
}

fn default_timing_critical_delta_ms() -> u64 {
    2_000
}

fn default_content_length_ratio() -> f64 {
    0.25
}

fn default_db_path() -> String {
    "~/.local/share/envdiff/envdiff.db".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3002
}

fn default_true() -> bool {
    true
}
