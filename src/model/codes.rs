//! Stable finding codes and the code to category registry.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::model::category::FindingCategory;

pub const PROBE_OUTCOME_MISMATCH: &str = "PROBE_OUTCOME_MISMATCH";
pub const STATUS_MISMATCH: &str = "STATUS_MISMATCH";
pub const REDIRECT_CHAIN_DRIFT: &str = "REDIRECT_CHAIN_DRIFT";
pub const FINAL_URL_MISMATCH: &str = "FINAL_URL_MISMATCH";

pub const HSTS_MISMATCH: &str = "HSTS_MISMATCH";
pub const CSP_MISMATCH: &str = "CSP_MISMATCH";
pub const CORS_MISMATCH: &str = "CORS_MISMATCH";
pub const SECURITY_HEADERS_DRIFT: &str = "SECURITY_HEADERS_DRIFT";

pub const CACHE_CONTROL_MISMATCH: &str = "CACHE_CONTROL_MISMATCH";
pub const VARY_MISMATCH: &str = "VARY_MISMATCH";
pub const CACHE_STATUS_MISMATCH: &str = "CACHE_STATUS_MISMATCH";

pub const CONTENT_TYPE_MISMATCH: &str = "CONTENT_TYPE_MISMATCH";
pub const CONTENT_ENCODING_MISMATCH: &str = "CONTENT_ENCODING_MISMATCH";
pub const CONTENT_LENGTH_DRIFT: &str = "CONTENT_LENGTH_DRIFT";

pub const TIMING_DRIFT: &str = "TIMING_DRIFT";

pub const SERVER_HEADER_MISMATCH: &str = "SERVER_HEADER_MISMATCH";
pub const POWERED_BY_MISMATCH: &str = "POWERED_BY_MISMATCH";
pub const EDGE_PROVIDER_MISMATCH: &str = "EDGE_PROVIDER_MISMATCH";

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CodeEntry {
    pub code: &'static str,
    pub category: FindingCategory,
    pub summary: &'static str,
}

pub const CODE_TABLE: &[CodeEntry] = &[
    CodeEntry {
        code: PROBE_OUTCOME_MISMATCH,
        category: FindingCategory::Routing,
        summary: "one probe succeeded while the other failed",
    },
    CodeEntry {
        code: STATUS_MISMATCH,
        category: FindingCategory::Routing,
        summary: "HTTP status codes differ",
    },
    CodeEntry {
        code: REDIRECT_CHAIN_DRIFT,
        category: FindingCategory::Routing,
        summary: "redirect hop sequences differ",
    },
    CodeEntry {
        code: FINAL_URL_MISMATCH,
        category: FindingCategory::Routing,
        summary: "requests settle on different final URLs",
    },
    CodeEntry {
        code: HSTS_MISMATCH,
        category: FindingCategory::Security,
        summary: "strict-transport-security differs",
    },
    CodeEntry {
        code: CSP_MISMATCH,
        category: FindingCategory::Security,
        summary: "content-security-policy differs",
    },
    CodeEntry {
        code: CORS_MISMATCH,
        category: FindingCategory::Security,
        summary: "access-control-allow-origin differs",
    },
    CodeEntry {
        code: SECURITY_HEADERS_DRIFT,
        category: FindingCategory::Security,
        summary: "hardening headers differ",
    },
    CodeEntry {
        code: CACHE_CONTROL_MISMATCH,
        category: FindingCategory::Cache,
        summary: "cache-control differs",
    },
    CodeEntry {
        code: VARY_MISMATCH,
        category: FindingCategory::Cache,
        summary: "vary differs",
    },
    CodeEntry {
        code: CACHE_STATUS_MISMATCH,
        category: FindingCategory::Cache,
        summary: "cache hit indicators differ",
    },
    CodeEntry {
        code: CONTENT_TYPE_MISMATCH,
        category: FindingCategory::Content,
        summary: "content-type differs",
    },
    CodeEntry {
        code: CONTENT_ENCODING_MISMATCH,
        category: FindingCategory::Content,
        summary: "content-encoding differs",
    },
    CodeEntry {
        code: CONTENT_LENGTH_DRIFT,
        category: FindingCategory::Content,
        summary: "content-length differs beyond the configured ratio",
    },
    CodeEntry {
        code: TIMING_DRIFT,
        category: FindingCategory::Timing,
        summary: "probe durations differ beyond the configured delta",
    },
    CodeEntry {
        code: SERVER_HEADER_MISMATCH,
        category: FindingCategory::Platform,
        summary: "server header differs",
    },
    CodeEntry {
        code: POWERED_BY_MISMATCH,
        category: FindingCategory::Platform,
        summary: "x-powered-by differs",
    },
    CodeEntry {
        code: EDGE_PROVIDER_MISMATCH,
        category: FindingCategory::Platform,
        summary: "responses were served by different edge providers",
    },
];

static CODE_INDEX: Lazy<BTreeMap<&'static str, &'static CodeEntry>> =
    Lazy::new(|| CODE_TABLE.iter().map(|entry| (entry.code, entry)).collect());

pub fn lookup(code: &str) -> Option<&'static CodeEntry> {
    CODE_INDEX.get(code).copied()
}

pub fn is_registered(code: &str) -> bool {
    CODE_INDEX.contains_key(code)
}

/// Category for `code`; `Unknown` when the code is not registered.
pub fn category_for_code(code: &str) -> FindingCategory {
    lookup(code)
        .map(|entry| entry.category)
        .unwrap_or(FindingCategory::Unknown)
}
