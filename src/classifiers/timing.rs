use crate::classifiers::{CategoryClassifier, DiffSettings, Rule, RuleOutcome};
use crate::model::codes::TIMING_DRIFT;
use crate::model::{
    ComparedValue, DiffEvidence, DiffFinding, FindingCategory, Severity, SignalEnvelope,
};

#[derive(Debug, Clone, Copy)]
pub struct TimingClassifier;

const RULES: &[Rule] = &[Rule {
    code: TIMING_DRIFT,
    eval: duration,
}];

impl CategoryClassifier for TimingClassifier {
    fn category(&self) -> FindingCategory {
        FindingCategory::Timing
    }

    fn name(&self) -> &str {
        "timing"
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

fn duration(left: &SignalEnvelope, right: &SignalEnvelope, settings: &DiffSettings) -> RuleOutcome {
    let (Some(l), Some(r)) = (left.duration_ms, right.duration_ms) else {
        return Ok(None);
    };
    let delta = l.abs_diff(r);
    if delta == 0 {
        return Ok(None);
    }
    let severity = if delta >= settings.timing_critical_delta_ms {
        Severity::Critical
    } else if delta >= settings.timing_warn_delta_ms {
        Severity::Warn
    } else {
        return Ok(None);
    };
    let slower = if l > r { "left" } else { "right" };
    let finding = DiffFinding::new(
        TIMING_DRIFT,
        severity,
        format!("{slower} probe slower by {delta} ms ({l} ms vs {r} ms)"),
    )?
    .with_evidence(DiffEvidence::section("timing").with_keys(["duration_ms"]))
    .with_values(ComparedValue::DurationMs(l), ComparedValue::DurationMs(r));
    Ok(Some(finding))
}

#[cfg(test)]
mod tests {
    use super::duration;
    use crate::classifiers::DiffSettings;
    use crate::model::{Severity, SignalEnvelope};

    fn timed(ms: u64) -> SignalEnvelope {
        SignalEnvelope::succeeded().with_duration_ms(ms)
    }

    #[test]
    fn thresholds_pick_severity() {
        let settings = DiffSettings::default();
        assert!(duration(&timed(100), &timed(550), &settings)
            .expect("valid rule")
            .is_none());
        let warn = duration(&timed(100), &timed(600), &settings)
            .expect("valid rule")
            .expect("finding");
        assert_eq!(warn.severity, Severity::Warn);
        let critical = duration(&timed(2_500), &timed(100), &settings)
            .expect("valid rule")
            .expect("finding");
        assert_eq!(critical.severity, Severity::Critical);
        assert!(critical.message.starts_with("left"));
    }

    #[test]
    fn missing_duration_is_not_comparable() {
        let settings = DiffSettings::default();
        assert!(duration(&timed(100), &SignalEnvelope::succeeded(), &settings)
            .expect("valid rule")
            .is_none());
    }

    #[test]
    fn equal_durations_never_drift_even_with_zero_thresholds() {
        let settings = DiffSettings {
            timing_warn_delta_ms: 0,
            timing_critical_delta_ms: 0,
            ..DiffSettings::default()
        };
        assert!(duration(&timed(120), &timed(120), &settings)
            .expect("valid rule")
            .is_none());
    }
}
