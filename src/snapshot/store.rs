use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{EnvDiff, Severity};
use crate::snapshot::migrations::BASE_MIGRATION;

/// Summary row of a stored diff; the full payload stays in `diff_json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffRecord {
    pub id: i64,
    pub comparison_id: String,
    pub left_probe_id: String,
    pub right_probe_id: String,
    pub max_severity: Severity,
    pub finding_count: usize,
    pub recorded_at: DateTime<Utc>,
}

pub struct DiffStore {
    conn: Connection,
}

impl DiffStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed creating store directory: {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed opening diff store: {}", path.display()))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(BASE_MIGRATION)
            .context("failed applying diff store migration")?;
        Ok(())
    }

    pub fn insert_diff(&self, diff: &EnvDiff) -> Result<i64> {
        self.insert_diff_at(diff, Utc::now())
    }

    pub fn insert_diff_at(&self, diff: &EnvDiff, recorded_at: DateTime<Utc>) -> Result<i64> {
        self.conn.execute(
            r#"
INSERT INTO diff_history(
    comparison_id, left_probe_id, right_probe_id, max_severity, finding_count,
    recorded_at, diff_json
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#,
            params![
                diff.comparison_id,
                diff.left_probe_id,
                diff.right_probe_id,
                diff.max_severity.as_str(),
                diff.findings.len() as i64,
                recorded_at.to_rfc3339(),
                serde_json::to_string(diff)?
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Diffs stored under another schema version are skipped, so callers never
    /// compare against a payload they cannot interpret.
    pub fn latest_for_comparison(&self, comparison_id: &str) -> Result<Option<EnvDiff>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT diff_json
FROM diff_history
WHERE comparison_id = ?1
ORDER BY id DESC
LIMIT 1
"#,
        )?;
        let result = stmt.query_row(params![comparison_id], |row| row.get::<_, String>(0));
        let json = match result {
            Ok(json) => json,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let diff: EnvDiff = serde_json::from_str(&json)
            .with_context(|| format!("stored diff for {comparison_id} is not valid JSON"))?;
        if !diff.is_compatible() {
            warn!(
                comparison = comparison_id,
                schema_version = diff.schema_version,
                "ignoring stored diff with incompatible schema version"
            );
            return Ok(None);
        }
        Ok(Some(diff))
    }

    /// Most recent first, optionally restricted to one comparison.
    pub fn list_recent(
        &self,
        comparison_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<DiffRecord>> {
        let sql = if comparison_id.is_some() {
            r#"
SELECT id, comparison_id, left_probe_id, right_probe_id, max_severity, finding_count, recorded_at
FROM diff_history
WHERE comparison_id = ?1
ORDER BY id DESC
LIMIT ?2
"#
        } else {
            r#"
SELECT id, comparison_id, left_probe_id, right_probe_id, max_severity, finding_count, recorded_at
FROM diff_history
ORDER BY id DESC
LIMIT ?1
"#
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = if let Some(comparison_id) = comparison_id {
            stmt.query_map(params![comparison_id, limit as i64], row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit as i64], row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DiffRecord> {
    let severity_raw: String = row.get(4)?;
    let max_severity = severity_raw
        .parse::<Severity>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let recorded_at_raw: String = row.get(6)?;
    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
    Ok(DiffRecord {
        id: row.get(0)?,
        comparison_id: row.get(1)?,
        left_probe_id: row.get(2)?,
        right_probe_id: row.get(3)?,
        max_severity,
        finding_count: row.get::<_, i64>(5)? as usize,
        recorded_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::DiffStore;
    use crate::engine::build_diff;
    use crate::model::{ComparisonMeta, Severity, SignalEnvelope};

    fn diff(comparison: &str, right_status: u16) -> crate::model::EnvDiff {
        let left = SignalEnvelope::succeeded().with_status(200);
        let right = SignalEnvelope::succeeded().with_status(right_status);
        build_diff(&left, &right, &ComparisonMeta::new(comparison))
    }

    #[test]
    fn latest_returns_most_recent_payload() {
        let store = DiffStore::open_in_memory().expect("store");
        assert!(store.latest_for_comparison("checkout").expect("query").is_none());

        store.insert_diff(&diff("checkout", 503)).expect("insert");
        let second = diff("checkout", 200);
        store.insert_diff(&second).expect("insert");
        store.insert_diff(&diff("login", 404)).expect("insert");

        let latest = store
            .latest_for_comparison("checkout")
            .expect("query")
            .expect("stored diff");
        assert_eq!(latest, second);
    }

    #[test]
    fn list_recent_filters_and_limits() {
        let store = DiffStore::open_in_memory().expect("store");
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        store.insert_diff_at(&diff("checkout", 503), at).expect("insert");
        store.insert_diff_at(&diff("login", 201), at).expect("insert");
        store.insert_diff_at(&diff("checkout", 200), at).expect("insert");

        let all = store.list_recent(None, 10).expect("list");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].comparison_id, "checkout");
        assert_eq!(all[0].finding_count, 0);
        assert_eq!(all[1].max_severity, Severity::Warn);
        assert_eq!(all[2].max_severity, Severity::Critical);
        assert_eq!(all[2].recorded_at, at);

        let checkout = store.list_recent(Some("checkout"), 1).expect("list");
        assert_eq!(checkout.len(), 1);
        assert_eq!(checkout[0].id, all[0].id);
    }

    #[test]
    fn latest_skips_incompatible_schema() {
        let store = DiffStore::open_in_memory().expect("store");
        let mut stale = diff("checkout", 503);
        stale.schema_version += 1;
        store.insert_diff(&stale).expect("insert");
        assert!(store.latest_for_comparison("checkout").expect("query").is_none());

        let current = diff("checkout", 200);
        store.insert_diff(&current).expect("insert");
        assert_eq!(
            store.latest_for_comparison("checkout").expect("query"),
            Some(current)
        );
    }
}
