//! Rule contract (§4.3): metadata, capability requests, and the `Rule` trait
//! every built-in and user-supplied analysis rule implements.

pub mod builtin;
pub mod profile;
pub mod registry;

use std::collections::HashMap;

use crate::adapter::{LanguageAdapter, LanguageTag, TreeHandle};
use crate::config::ConfigValue;
use crate::finding::Finding;
use crate::project_graph::ProjectGraph;
use crate::scopes::ScopeGraph;

/// Engine capability a rule needs, per `RuleMeta.tier`: 0 = syntax only,
/// 1 = syntax + scopes, 2 = syntax + scopes + project graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Syntax = 0,
    Scopes = 1,
    ProjectGraph = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    P0,
    P1,
    P2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutofixSafety {
    Safe,
    SuggestOnly,
    /// Reserved; no built-in rule currently declares this.
    Unsafe,
}

/// Descriptive record for a rule, immutable after registration.
#[derive(Debug, Clone)]
pub struct RuleMeta {
    pub id: &'static str,
    pub category: &'static str,
    pub tier: Tier,
    pub priority: Priority,
    pub autofix_safety: AutofixSafety,
    pub description: &'static str,
    pub langs: &'static [LanguageTag],
}

/// A rule's capability request. Requesting `scopes` entails `syntax`;
/// requesting `project_graph` entails both lower tiers — callers build
/// `Requires` values with this implied, so the engine's capability-union
/// step (§4.5 step 3) doesn't need to re-derive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Requires {
    pub raw_text: bool,
    pub syntax: bool,
    pub scopes: bool,
    pub project_graph: bool,
}

impl Requires {
    pub const fn syntax_only() -> Self {
        Self {
            raw_text: false,
            syntax: true,
            scopes: false,
            project_graph: false,
        }
    }

    pub const fn scopes() -> Self {
        Self {
            raw_text: false,
            syntax: true,
            scopes: true,
            project_graph: false,
        }
    }

    pub const fn project_graph() -> Self {
        Self {
            raw_text: false,
            syntax: true,
            scopes: true,
            project_graph: true,
        }
    }
}

/// Everything a rule's `visit` receives. Constructed once per file per run.
///
/// `scopes`/`project_graph` are `Some` exactly when some selected rule for
/// this run declared `Requires{scopes: true, ..}` / `{project_graph: true,
/// ..}` (§4.2's degraded mode is "scopes is `Some` but empty", never `None`
/// for a rule that asked for it — a `None` here for a rule that requested it
/// is an engine bug, not a signal to handle).
pub struct RuleContext<'a> {
    pub file_path: &'a str,
    pub text: &'a str,
    pub tree: &'a TreeHandle,
    pub adapter: &'a dyn LanguageAdapter,
    pub scopes: Option<&'a ScopeGraph>,
    pub project_graph: Option<&'a ProjectGraph>,
    pub config: &'a HashMap<String, ConfigValue>,
    pub language: LanguageTag,
}

impl<'a> RuleContext<'a> {
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(ConfigValue::as_str)
    }

    pub fn config_int(&self, key: &str, default: i64) -> i64 {
        self.config
            .get(key)
            .and_then(ConfigValue::as_int)
            .unwrap_or(default)
    }

    pub fn config_bool(&self, key: &str, default: bool) -> bool {
        self.config
            .get(key)
            .and_then(ConfigValue::as_bool)
            .unwrap_or(default)
    }
}

/// A single analysis rule. `visit` must be pure with respect to `ctx` — no
/// mutation of inputs — though it may allocate and return freely.
pub trait Rule: Send + Sync {
    fn meta(&self) -> &RuleMeta;

    fn requires(&self) -> Requires;

    fn visit(&self, ctx: &RuleContext) -> Vec<Finding>;
}

/// Something that yields rule instances, in lieu of Python's module-import
/// `RULES` list side effect (§6 "Rule discovery contract"): there's no
/// import-time registration hook in a statically linked Rust binary, so
/// providers are collected explicitly by the registry instead.
pub trait RuleProvider {
    fn rules(&self) -> Vec<std::sync::Arc<dyn Rule>>;
}

/// Ergonomic provider for a fixed, already-constructed rule list.
impl RuleProvider for Vec<std::sync::Arc<dyn Rule>> {
    fn rules(&self) -> Vec<std::sync::Arc<dyn Rule>> {
        self.clone()
    }
}
