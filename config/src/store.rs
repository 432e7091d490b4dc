//! Shared, swappable rule set
//!
//! Readers take a snapshot and query it without holding the lock. A reload
//! builds the new rule set first and only then swaps it in.

use crate::{ConfigLoader, MaskRuleSet};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Holds the currently active [`MaskRuleSet`]
#[derive(Debug, Default)]
pub struct RuleStore {
    current: RwLock<Arc<MaskRuleSet>>,
}

impl RuleStore {
    pub fn new(rules: MaskRuleSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(rules)),
        }
    }

    /// The active rule set
    pub fn snapshot(&self) -> Arc<MaskRuleSet> {
        Arc::clone(&self.current.read())
    }

    /// Publish `rules`, returning the set it replaced
    pub fn replace(&self, rules: MaskRuleSet) -> Arc<MaskRuleSet> {
        let rules = Arc::new(rules);
        std::mem::replace(&mut *self.current.write(), rules)
    }

    /// Load a fresh rule set with `loader` and publish it
    pub fn reload(&self, loader: &ConfigLoader) -> Arc<MaskRuleSet> {
        let rules = loader.load();
        info!("Reloaded rules: {} entries", rules.stats().total());
        self.replace(rules)
    }
}
