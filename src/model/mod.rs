pub mod category;
pub mod codes;
pub mod diff;
pub mod envelope;
pub mod finding;
pub mod severity;

pub use category::{CategoryMeta, FindingCategory, CATEGORY_TABLE};
pub use diff::{
    ComparisonMeta, EnvDiff, ProbeComparison, ProbeOutcome, RuleFailure, StatusComparison,
    ENV_DIFF_SCHEMA_VERSION,
};
pub use envelope::SignalEnvelope;
pub use finding::{ComparedValue, DiffEvidence, DiffFinding, FindingError};
pub use severity::{Severity, SeverityParseError};
