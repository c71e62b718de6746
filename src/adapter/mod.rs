//! Language adapter abstraction (§4.1).
//!
//! A `LanguageAdapter` presents a uniform view of one file in one language so
//! rules remain language-agnostic. Trait shape mirrors the teacher crate's
//! `parsing::LanguageParser`: materialized `Vec` returns rather than lending
//! iterators, because a tree-sitter `Node` borrows from its `Tree` with a
//! lifetime that makes returning `impl Iterator` across a `dyn Trait`
//! boundary impractical without boxing the closure anyway.

mod common;
pub mod python;
pub mod typescript;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::finding::Severity;

/// Stable language tag, e.g. `"python"`, `"typescript"`.
pub type LanguageTag = &'static str;

/// Opaque parsed syntax tree handed back to the engine and passed, unopened,
/// to every rule's `RuleContext::tree`. Adapters downcast it back to their
/// own concrete tree type (e.g. `tree_sitter::Tree`) internally.
pub struct TreeHandle {
    inner: Box<dyn std::any::Any + Send + Sync>,
}

impl TreeHandle {
    pub fn new<T: std::any::Any + Send + Sync>(tree: T) -> Self {
        Self {
            inner: Box::new(tree),
        }
    }

    pub fn downcast_ref<T: std::any::Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

/// Adapter cannot parse the file (§7 `ParseError`).
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to parse {language} source: {reason}")]
pub struct ParseError {
    pub language: String,
    pub reason: String,
}

/// A scope node yielded by `iter_scope_nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeKind(pub ScopeKindTag);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKindTag {
    Module,
    Function,
    Class,
    Method,
    Block,
    Comprehension,
    Except,
}

#[derive(Debug, Clone)]
pub struct ScopeNodeDesc {
    pub id: u32,
    pub kind: ScopeKindTag,
    pub parent_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKindTag {
    Import,
    Param,
    Local,
    Function,
    Class,
    Field,
    Const,
}

/// A binding site yielded by `iter_symbol_defs`.
#[derive(Debug, Clone)]
pub struct SymbolDefDesc {
    pub name: String,
    pub kind: SymbolKindTag,
    pub scope_id: Option<u32>,
    pub start_byte: u32,
    pub end_byte: u32,
    pub meta: HashMap<String, String>,
}

/// A use-site yielded by `iter_identifier_refs`.
#[derive(Debug, Clone)]
pub struct RefDesc {
    pub name: String,
    pub scope_id: Option<u32>,
    pub byte: u32,
    pub meta: HashMap<String, String>,
}

/// An import statement yielded by `iter_imports`.
#[derive(Debug, Clone)]
pub struct ImportDescriptor {
    /// Dotted/slashed module path as written, e.g. `"os"`, `"..pkg.mod"`, `"./util"`.
    pub module: String,
    /// Number of leading relative levels (0 for absolute).
    pub level: u32,
    /// Names imported from `module` (empty for a bare `import module`).
    pub names: Vec<String>,
    pub start_byte: u32,
    pub end_byte: u32,
}

/// Per-language capability flags an adapter can report. An adapter that does
/// not support scopes/symbols/imports for its language lets the engine
/// degrade gracefully (§4.1: "the engine detects non-support and degrades
/// gracefully").
#[derive(Debug, Clone, Copy, Default)]
pub struct AdapterCapabilities {
    pub scopes: bool,
    pub symbols: bool,
    pub refs: bool,
    pub imports: bool,
}

/// Uniform view of one file in one language.
pub trait LanguageAdapter: Send + Sync {
    fn language_id(&self) -> LanguageTag;

    fn capabilities(&self) -> AdapterCapabilities;

    fn parse(&self, text: &str) -> Result<TreeHandle, ParseError>;

    fn node_span(&self, tree: &TreeHandle, node_id: u32) -> Option<(u32, u32)>;

    fn iter_scope_nodes(&self, tree: &TreeHandle) -> Vec<ScopeNodeDesc>;

    fn iter_symbol_defs(&self, tree: &TreeHandle, text: &str) -> Vec<SymbolDefDesc>;

    fn iter_identifier_refs(&self, tree: &TreeHandle, text: &str) -> Vec<RefDesc>;

    fn iter_imports(&self, tree: &TreeHandle, text: &str) -> Vec<ImportDescriptor>;

    /// Default severity an `engine.*` finding about this language should carry;
    /// exposed so adapters can hint at dialect-specific conventions. Rules never
    /// call this directly — it only backs `engine.parse_error` findings.
    fn default_parse_error_severity(&self) -> Severity {
        Severity::Error
    }

    /// True when `tree` contains a syntax error node. Tree-sitter tolerates
    /// malformed input and still returns a tree (`parse` only fails on
    /// cancellation/OOM per its own docs), so this is the engine's signal
    /// for "this file has invalid syntax" (§7 `ParseError`), checked via
    /// `root_node().has_error()` on the concrete tree-sitter tree.
    fn has_syntax_error(&self, tree: &TreeHandle) -> bool {
        let _ = tree;
        false
    }
}

/// Global, thread-safe table of adapters keyed by language tag (§6 "Adapter
/// discovery contract": "adapters self-register against language tags at
/// engine initialization").
#[derive(Clone)]
pub struct AdapterRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn LanguageAdapter>>>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry pre-populated with the two reference adapters (§4.1.1).
    pub fn with_reference_adapters() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(python::PythonAdapter::new()));
        registry.register(Arc::new(typescript::TypeScriptAdapter::typescript()));
        registry.register(Arc::new(typescript::TypeScriptAdapter::javascript()));
        registry
    }

    pub fn register(&self, adapter: Arc<dyn LanguageAdapter>) {
        self.inner
            .write()
            .insert(adapter.language_id().to_string(), adapter);
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn LanguageAdapter>> {
        self.inner.read().get(language).cloned()
    }

    pub fn contains(&self, language: &str) -> bool {
        self.inner.read().contains_key(language)
    }

    /// Detect a language tag from a file extension. Unknown extensions
    /// return `None`; the caller (engine walker) skips such files silently
    /// per §6 "Unknown language tags cause files to be skipped silently".
    pub fn language_for_extension(ext: &str) -> Option<LanguageTag> {
        match ext {
            "py" | "pyi" => Some("python"),
            "ts" | "tsx" => Some("typescript"),
            "js" | "jsx" | "mjs" | "cjs" => Some("javascript"),
            _ => None,
        }
    }
}
