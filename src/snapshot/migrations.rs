pub const BASE_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS diff_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    comparison_id TEXT NOT NULL,
    left_probe_id TEXT NOT NULL,
    right_probe_id TEXT NOT NULL,
    max_severity TEXT NOT NULL,
    finding_count INTEGER NOT NULL,
    recorded_at TEXT NOT NULL,
    diff_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_diff_comparison_recorded
    ON diff_history(comparison_id, id DESC);
"#;
