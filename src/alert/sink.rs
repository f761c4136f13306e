use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use crate::alert::engine::AlertEvent;
use crate::config::AlertsConfig;

#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, event: &AlertEvent) -> Result<()>;
}

pub struct StdoutSink;

#[async_trait]
impl AlertSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn send(&self, event: &AlertEvent) -> Result<()> {
        println!("[{}] {} - {}", event.kind, event.title, event.body);
        Ok(())
    }
}

pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("envdiff/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, event: &AlertEvent) -> Result<()> {
        let req = if self.url.contains("discord.com/api/webhooks")
            || self.url.contains("discordapp.com/api/webhooks")
        {
            let content = format!("[{}] {}\n{}", event.kind, event.title, event.body);
            self.client
                .post(&self.url)
                .json(&serde_json::json!({ "content": content }))
        } else {
            self.client.post(&self.url).json(event)
        };

        req.send().await?.error_for_status()?;
        Ok(())
    }
}

pub fn sinks_from_config(config: &AlertsConfig) -> Result<Vec<Box<dyn AlertSink>>> {
    let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();
    if config.enable_stdout {
        sinks.push(Box::new(StdoutSink));
    }
    if !config.webhook.trim().is_empty() {
        sinks.push(Box::new(WebhookSink::new(config.webhook.trim())?));
    }
    Ok(sinks)
}

/// Sends every event to every sink. Delivery failures are logged and
/// skipped; returns the number of successful deliveries.
pub async fn dispatch_alerts(sinks: &[Box<dyn AlertSink>], events: &[AlertEvent]) -> usize {
    let mut delivered = 0;
    for event in events {
        for sink in sinks {
            match sink.send(event).await {
                Ok(()) => delivered += 1,
                Err(err) => warn!(
                    sink = sink.name(),
                    kind = %event.kind,
                    "alert delivery failed: {err:#}"
                ),
            }
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use async_trait::async_trait;

    use super::{dispatch_alerts, sinks_from_config, AlertSink, WebhookSink};
    use crate::alert::engine::AlertEvent;
    use crate::alert::rules::AlertEventKind;
    use crate::config::AlertsConfig;

    #[derive(Default, Clone)]
    struct MemorySink {
        events: Arc<Mutex<Vec<AlertEvent>>>,
    }

    impl MemorySink {
        fn events(&self) -> Vec<AlertEvent> {
            self.events
                .lock()
                .map(|events| events.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl AlertSink for MemorySink {
        fn name(&self) -> &str {
            "memory"
        }

        async fn send(&self, event: &AlertEvent) -> Result<()> {
            self.events
                .lock()
                .map_err(|_| anyhow::anyhow!("memory sink poisoned"))?
                .push(event.clone());
            Ok(())
        }
    }

    fn event() -> AlertEvent {
        AlertEvent {
            kind: AlertEventKind::CriticalDrift,
            comparison_id: "checkout".to_string(),
            title: "Critical drift".to_string(),
            body: "1 critical finding(s): STATUS_MISMATCH".to_string(),
        }
    }

    #[test]
    fn memory_sink_records_events() {
        let sink = MemorySink::default();
        let sinks: Vec<Box<dyn AlertSink>> = vec![Box::new(sink.clone())];
        let delivered = tokio_test::block_on(dispatch_alerts(&sinks, &[event(), event()]));
        assert_eq!(delivered, 2);
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn unreachable_webhook_is_logged_not_fatal() {
        let memory = MemorySink::default();
        let sinks: Vec<Box<dyn AlertSink>> = vec![
            Box::new(WebhookSink::new("http://127.0.0.1:9/hook").expect("client")),
            Box::new(memory.clone()),
        ];
        let delivered = tokio_test::block_on(dispatch_alerts(&sinks, &[event()]));
        assert_eq!(delivered, 1);
        assert_eq!(memory.events(), vec![event()]);
    }

    #[test]
    fn config_selects_sinks() {
        let config = AlertsConfig {
            webhook: "https://hooks.example.com/envdiff".to_string(),
            enable_stdout: false,
            ..AlertsConfig::default()
        };
        let sinks = sinks_from_config(&config).expect("sinks");
        let names = sinks.iter().map(|s| s.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["webhook"]);
    }
}
