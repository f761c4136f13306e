use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Routing,
    Security,
    Cache,
    Content,
    Timing,
    Platform,
    #[serde(other)]
    Unknown,
}

/// Display metadata for a category, consumed by renderers.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CategoryMeta {
    pub category: FindingCategory,
    pub label: &'static str,
    pub display_key: &'static str,
}

/// Category metadata in display order.
pub const CATEGORY_TABLE: [CategoryMeta; 7] = [
    CategoryMeta {
        category: FindingCategory::Routing,
        label: "Routing",
        display_key: "routing",
    },
    CategoryMeta {
        category: FindingCategory::Security,
        label: "Security",
        display_key: "security",
    },
    CategoryMeta {
        category: FindingCategory::Cache,
        label: "Cache",
        display_key: "cache",
    },
    CategoryMeta {
        category: FindingCategory::Content,
        label: "Content",
        display_key: "content",
    },
    CategoryMeta {
        category: FindingCategory::Timing,
        label: "Timing",
        display_key: "timing",
    },
    CategoryMeta {
        category: FindingCategory::Platform,
        label: "Platform",
        display_key: "platform",
    },
    CategoryMeta {
        category: FindingCategory::Unknown,
        label: "Other",
        display_key: "unknown",
    },
];

impl FindingCategory {
    pub fn meta(self) -> &'static CategoryMeta {
        CATEGORY_TABLE
            .iter()
            .find(|meta| meta.category == self)
            .unwrap_or(&CATEGORY_TABLE[CATEGORY_TABLE.len() - 1])
    }

    pub fn label(self) -> &'static str {
        self.meta().label
    }

    pub fn display_key(self) -> &'static str {
        self.meta().display_key
    }
}

impl Display for FindingCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
