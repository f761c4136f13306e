use anyhow::Result;

use crate::model::{ComparedValue, EnvDiff};
use crate::snapshot::DiffRecord;

pub fn findings_to_csv(diff: &EnvDiff) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "comparison_id",
        "code",
        "category",
        "severity",
        "message",
        "left",
        "right",
        "evidence",
    ])?;
    for finding in &diff.findings {
        let evidence = finding
            .evidence
            .iter()
            .map(|e| format!("{}:{}", e.section, e.keys.join("|")))
            .collect::<Vec<_>>()
            .join(";");
        writer.write_record([
            diff.comparison_id.clone(),
            finding.code.clone(),
            finding.category.display_key().to_string(),
            finding.severity.to_string(),
            finding.message.clone(),
            value_cell(finding.left_value.as_ref()),
            value_cell(finding.right_value.as_ref()),
            evidence,
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn history_to_csv(records: &[DiffRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "id",
        "comparison_id",
        "left_probe_id",
        "right_probe_id",
        "max_severity",
        "finding_count",
        "recorded_at",
    ])?;
    for rec in records {
        writer.write_record([
            rec.id.to_string(),
            rec.comparison_id.clone(),
            rec.left_probe_id.clone(),
            rec.right_probe_id.clone(),
            rec.max_severity.to_string(),
            rec.finding_count.to_string(),
            rec.recorded_at.to_rfc3339(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn value_cell(value: Option<&ComparedValue>) -> String {
    match value {
        None | Some(ComparedValue::Absent) => String::new(),
        Some(ComparedValue::Text(text)) => text.clone(),
        Some(ComparedValue::Status(status)) => status.to_string(),
        Some(ComparedValue::Chain(hops)) => hops.join(" -> "),
        Some(ComparedValue::DurationMs(ms)) => format!("{ms}ms"),
        Some(ComparedValue::Flag(flag)) => flag.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::findings_to_csv;
    use crate::engine::build_diff;
    use crate::model::{ComparisonMeta, SignalEnvelope};

    #[test]
    fn one_row_per_finding() {
        let left = SignalEnvelope::succeeded()
            .with_status(200)
            .with_duration_ms(100);
        let right = SignalEnvelope::succeeded()
            .with_status(404)
            .with_duration_ms(900);
        let diff = build_diff(&left, &right, &ComparisonMeta::new("pricing"));
        let csv = findings_to_csv(&diff).expect("csv");
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("comparison_id,code,category"));
        assert!(lines[1].starts_with("pricing,STATUS_MISMATCH,routing,critical"));
        assert!(lines[1].ends_with(",200,404,status:"));
        assert!(lines[2].contains(",100ms,900ms,"));
    }
}
