pub mod engine;
pub mod rules;
pub mod sink;

pub use engine::{apply_alert_rules, evaluate_alerts, AlertEvent};
pub use rules::AlertEventKind;
pub use sink::{dispatch_alerts, sinks_from_config, AlertSink, StdoutSink, WebhookSink};
