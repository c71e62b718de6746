//! Global rule catalogue (§4.3), populated from `RuleProvider`s.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::rules::{Rule, RuleProvider};

/// Thread-safe table of rules keyed by id. Last registration for a given id
/// wins, mirroring `crate::adapter::AdapterRegistry`'s registration idiom.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn Rule>>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect rules from every provider and register them.
    pub fn discover(providers: &[&dyn RuleProvider]) -> Self {
        let registry = Self::new();
        for provider in providers {
            for rule in provider.rules() {
                registry.register(rule);
            }
        }
        registry
    }

    pub fn register(&self, rule: Arc<dyn Rule>) {
        self.inner.write().insert(rule.meta().id.to_string(), rule);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Rule>> {
        self.inner.read().get(id).cloned()
    }

    pub fn all(&self) -> Vec<Arc<dyn Rule>> {
        self.inner.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
