use serde::Serialize;

use crate::model::{DiffFinding, FindingCategory, CATEGORY_TABLE};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup {
    pub category: FindingCategory,
    pub label: &'static str,
    pub findings: Vec<DiffFinding>,
}

/// Groups findings in category-table order. Within a group findings are
/// ordered by severity, critical first, keeping input order for ties.
pub fn group_findings_by_category(findings: &[DiffFinding]) -> Vec<CategoryGroup> {
    CATEGORY_TABLE
        .iter()
        .filter_map(|meta| {
            let mut members = findings
                .iter()
                .filter(|finding| finding.category == meta.category)
                .cloned()
                .collect::<Vec<_>>();
            if members.is_empty() {
                return None;
            }
            members.sort_by(|a, b| b.severity.cmp(&a.severity));
            Some(CategoryGroup {
                category: meta.category,
                label: meta.label,
                findings: members,
            })
        })
        .collect()
}
