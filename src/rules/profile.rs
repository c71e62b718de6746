//! Profiles select rule subsets for a run (§4.3).

use std::collections::{HashMap, HashSet};

use crate::finding::Severity;
use crate::rules::{RuleMeta, Tier};

#[derive(Debug, Clone)]
pub enum RuleSelection {
    /// Every registered rule whose `tier` is `<= max_tier`.
    UpToTier(Tier),
    /// An explicit rule-id allow-list.
    AllowList(HashSet<String>),
}

/// A named set of rule ids with per-rule severity overrides, applied after
/// rule execution and before deduplication (§4.6).
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub selection: RuleSelection,
    pub severity_overrides: HashMap<String, Severity>,
}

impl Profile {
    /// All tier-0 and tier-1 rules at their declared severities.
    pub fn default_profile() -> Self {
        Self {
            name: "default".to_string(),
            selection: RuleSelection::UpToTier(Tier::Scopes),
            severity_overrides: HashMap::new(),
        }
    }

    /// Curated explicit allow-list, with `complexity.long_parameter_list`
    /// downgraded to informational — a starter allow-list for teams easing
    /// into the ruleset one category at a time.
    pub fn alpha_default() -> Self {
        let allow: HashSet<String> = [
            "imports.unused",
            "ident.duplicate_definition",
            "imports.missing_file_target",
            "complexity.long_parameter_list",
            "naming.project_term_inconsistency",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let mut overrides = HashMap::new();
        overrides.insert("complexity.long_parameter_list".to_string(), Severity::Info);

        Self {
            name: "alpha_default".to_string(),
            selection: RuleSelection::AllowList(allow),
            severity_overrides: overrides,
        }
    }

    pub fn selects(&self, meta: &RuleMeta) -> bool {
        match &self.selection {
            RuleSelection::UpToTier(max_tier) => meta.tier <= *max_tier,
            RuleSelection::AllowList(ids) => ids.contains(meta.id),
        }
    }

    pub fn severity_for(&self, rule_id: &str, declared: Severity) -> Severity {
        self.severity_overrides
            .get(rule_id)
            .copied()
            .unwrap_or(declared)
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default_profile()),
            "alpha_default" => Some(Self::alpha_default()),
            _ => None,
        }
    }
}
