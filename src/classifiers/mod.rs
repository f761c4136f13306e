pub mod cache;
pub mod content;
pub mod headers;
pub mod platform;
pub mod redirect;
pub mod routing;
pub mod security;
pub mod timing;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::classifiers::cache::CacheClassifier;
use crate::classifiers::content::ContentClassifier;
use crate::classifiers::platform::PlatformClassifier;
use crate::classifiers::routing::RoutingClassifier;
use crate::classifiers::security::SecurityClassifier;
use crate::classifiers::timing::TimingClassifier;
use crate::model::{DiffFinding, FindingCategory, FindingError, SignalEnvelope};

pub use redirect::{
    chains_are_equal, classify_redirect_chain_drift, extract_final_host, RedirectChainDrift,
};

/// Tunables consulted by threshold-based rules.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffSettings {
    pub timing_warn_delta_ms: u64,
    pub timing_critical_delta_ms: u64,
    pub content_length_ratio: f64,
    pub disabled_codes: BTreeSet<String>,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            timing_warn_delta_ms: 500,
            timing_critical_delta_ms: 2_000,
            content_length_ratio: 0.25,
            disabled_codes: BTreeSet::new(),
        }
    }
}

impl DiffSettings {
    pub fn is_enabled(&self, code: &str) -> bool {
        !self.disabled_codes.contains(code)
    }
}

/// `Ok(None)` means the rule saw no drift or could not be evaluated.
pub type RuleOutcome = Result<Option<DiffFinding>, FindingError>;

pub type RuleFn = fn(&SignalEnvelope, &SignalEnvelope, &DiffSettings) -> RuleOutcome;

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub code: &'static str,
    pub eval: RuleFn,
}

pub trait CategoryClassifier: Send + Sync {
    fn category(&self) -> FindingCategory;
    fn name(&self) -> &str;
    fn rules(&self) -> &'static [Rule];
}

#[derive(Clone)]
pub struct ClassifierRegistry {
    classifiers: Vec<Arc<dyn CategoryClassifier>>,
}

impl ClassifierRegistry {
    pub fn with_defaults() -> Self {
        let classifiers: Vec<Arc<dyn CategoryClassifier>> = vec![
            Arc::new(RoutingClassifier),
            Arc::new(SecurityClassifier),
            Arc::new(CacheClassifier),
            Arc::new(ContentClassifier),
            Arc::new(TimingClassifier),
            Arc::new(PlatformClassifier),
        ];
        Self { classifiers }
    }

    pub fn register(&mut self, classifier: Arc<dyn CategoryClassifier>) {
        self.classifiers.push(classifier);
    }

    pub fn classifiers(&self) -> &[Arc<dyn CategoryClassifier>] {
        &self.classifiers
    }

    pub fn by_category(&self, category: FindingCategory) -> Option<Arc<dyn CategoryClassifier>> {
        self.classifiers
            .iter()
            .find(|c| c.category() == category)
            .cloned()
    }

    pub fn rule_codes(&self) -> Vec<&'static str> {
        self.classifiers
            .iter()
            .flat_map(|c| c.rules().iter().map(|rule| rule.code))
            .collect()
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::ClassifierRegistry;
    use crate::model::codes;
    use crate::model::FindingCategory;

    #[test]
    fn lookup_by_category() {
        let registry = ClassifierRegistry::with_defaults();
        let timing = registry
            .by_category(FindingCategory::Timing)
            .expect("timing classifier");
        assert_eq!(timing.name(), "timing");
        assert!(registry.by_category(FindingCategory::Unknown).is_none());
    }

    #[test]
    fn every_rule_code_belongs_to_its_classifier_category() {
        let registry = ClassifierRegistry::with_defaults();
        for classifier in registry.classifiers() {
            for rule in classifier.rules() {
                assert_eq!(
                    codes::category_for_code(rule.code),
                    classifier.category(),
                    "{} registered under {}",
                    rule.code,
                    classifier.name()
                );
            }
        }
    }

    #[test]
    fn every_registered_code_has_a_rule() {
        let rule_codes = ClassifierRegistry::with_defaults().rule_codes();
        for entry in codes::CODE_TABLE {
            assert!(rule_codes.contains(&entry.code), "no rule for {}", entry.code);
        }
    }
}
