use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::classifiers::DiffSettings;
use crate::findings::group_findings_by_category;
use crate::model::codes::CODE_TABLE;
use crate::model::{EnvDiff, Severity};
use crate::output::csv::value_cell;
use crate::snapshot::DiffRecord;

fn severity_cell(severity: Severity) -> Cell {
    let cell = Cell::new(severity.as_str().to_uppercase());
    match severity {
        Severity::Critical => cell.fg(Color::Red),
        Severity::Warn => cell.fg(Color::Yellow),
        Severity::Info => cell.fg(Color::Blue),
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Findings grouped by category, followed by a one-line summary.
pub fn render_findings_table(diff: &EnvDiff) -> String {
    let mut out = format!(
        "{} ({} vs {})\n",
        diff.comparison_id, diff.left_probe_id, diff.right_probe_id
    );
    if !diff.has_findings() {
        out.push_str("No drift detected.\n");
        out.push_str(&render_degraded(diff));
        return out;
    }

    let mut table = new_table();
    table.set_header(vec!["Category", "Severity", "Code", "Message", "Left", "Right"]);
    for group in group_findings_by_category(&diff.findings) {
        for (idx, finding) in group.findings.iter().enumerate() {
            let label = if idx == 0 { group.label } else { "" };
            table.add_row(Row::from(vec![
                Cell::new(label),
                severity_cell(finding.severity),
                Cell::new(&finding.code),
                Cell::new(&finding.message),
                Cell::new(value_cell(finding.left_value.as_ref())),
                Cell::new(value_cell(finding.right_value.as_ref())),
            ]));
        }
    }
    out.push_str(&table.to_string());
    out.push_str(&format!(
        "\nMax severity: {} | critical {} | warn {} | info {}\n",
        diff.max_severity.as_str().to_uppercase(),
        diff.count_by_severity(Severity::Critical),
        diff.count_by_severity(Severity::Warn),
        diff.count_by_severity(Severity::Info),
    ));
    out.push_str(&render_degraded(diff));
    out
}

fn render_degraded(diff: &EnvDiff) -> String {
    diff.degraded_rules
        .iter()
        .map(|failure| format!("Rule {} skipped: {}\n", failure.code, failure.reason))
        .collect()
}

pub fn render_history_table(records: &[DiffRecord]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "ID",
        "Recorded At",
        "Comparison",
        "Left",
        "Right",
        "Max Severity",
        "Findings",
    ]);
    for rec in records {
        table.add_row(Row::from(vec![
            Cell::new(rec.id),
            Cell::new(rec.recorded_at.to_rfc3339()),
            Cell::new(&rec.comparison_id),
            Cell::new(&rec.left_probe_id),
            Cell::new(&rec.right_probe_id),
            severity_cell(rec.max_severity),
            Cell::new(rec.finding_count),
        ]));
    }
    table.to_string()
}

pub fn render_codes_table(settings: &DiffSettings) -> String {
    let mut table = new_table();
    table.set_header(vec!["Code", "Category", "Enabled", "Summary"]);
    for entry in CODE_TABLE {
        let enabled = if settings.is_enabled(entry.code) {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::Red)
        };
        table.add_row(Row::from(vec![
            Cell::new(entry.code),
            Cell::new(entry.category.label()),
            enabled,
            Cell::new(entry.summary),
        ]));
    }
    table.to_string()
}
