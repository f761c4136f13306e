pub mod dedup;
pub mod group;
pub mod order;
pub mod severity;

pub use dedup::{compute_dedup_key, deduplicate_findings};
pub use group::{group_findings_by_category, CategoryGroup};
pub use order::{compare_findings, sort_findings};
pub use severity::compute_max_severity;
