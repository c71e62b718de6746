//! `naming.project_term_inconsistency` — cross-file verb inconsistency
//! (`get_user` vs `fetch_user` vs `load_user`), grounded on
//! `examples/original_source/server/rules/naming_project_term_inconsistency.py`.
//!
//! Dropped from the original: the `term_aliases` config extension to the
//! default verb-synonym table (this rule uses the conservative built-in
//! table only) and path-exclusion (`DEFAULT_EXCLUDED_PATHS`), which belongs
//! to project-wide file discovery rather than a single rule's `visit`.

use std::collections::{HashMap, HashSet};

use crate::adapter::SymbolKindTag;
use crate::finding::{Edit, Finding, Severity};
use crate::project_graph::SymbolEntry;
use crate::rules::{AutofixSafety, Priority, Requires, Rule, RuleContext, RuleMeta, Tier};
use crate::span::Span;

const DEFAULT_MIN_CLUSTER_SIZE: i64 = 3;

fn verb_synonyms() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("get", &["fetch", "retrieve"]),
        ("create", &["make", "new"]),
        ("update", &["modify", "patch"]),
        ("delete", &["remove"]),
        ("save", &["persist", "store"]),
        ("send", &["dispatch"]),
    ]
}

fn canonical_verb(verb: &str) -> String {
    for (canonical, synonyms) in verb_synonyms() {
        if verb == *canonical || synonyms.contains(&verb) {
            return canonical.to_string();
        }
    }
    verb.to_string()
}

/// `fooBar`/`FooBar`/`foo_bar`/`get-user` -> `["foo", "bar"]`-style parts.
fn split_identifier(name: &str) -> Vec<String> {
    let mut spaced = String::with_capacity(name.len() * 2);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            // lower/digit -> Upper boundary ("fooBar")
            if (prev.is_ascii_lowercase() || prev.is_ascii_digit()) && c.is_ascii_uppercase() {
                spaced.push(' ');
            // run of uppercase followed by a lowercase letter ("HTTPServer" -> "HTTP Server")
            } else if prev.is_ascii_uppercase() && c.is_ascii_uppercase() && next.is_some_and(|n| n.is_ascii_lowercase())
            {
                spaced.push(' ');
            }
        }
        spaced.push(c);
    }

    spaced
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|part| part.to_lowercase())
        .collect()
}

fn stem_identifier(parts: &[String]) -> (String, String) {
    match parts.split_first() {
        Some((verb, rest)) => (verb.clone(), rest.join(" ")),
        None => (String::new(), String::new()),
    }
}

fn is_private_or_dunder(name: &str) -> bool {
    if name.starts_with("__") && name.ends_with("__") && name.len() > 4 {
        return true;
    }
    name.starts_with('_') && !name.starts_with("__")
}

struct ClusterItem<'a> {
    symbol: &'a SymbolEntry,
    original_verb: String,
    canonical_verb: String,
}

pub struct NamingProjectTermInconsistencyRule {
    meta: RuleMeta,
}

impl NamingProjectTermInconsistencyRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta {
                id: "naming.project_term_inconsistency",
                category: "naming",
                tier: Tier::ProjectGraph,
                priority: Priority::P2,
                autofix_safety: AutofixSafety::SuggestOnly,
                description: "Detect cross-file term inconsistencies (e.g. get/fetch/load the same entity) and suggest a canonical term.",
                langs: &["python", "typescript", "javascript"],
            },
        }
    }
}

impl Default for NamingProjectTermInconsistencyRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NamingProjectTermInconsistencyRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn requires(&self) -> Requires {
        Requires::project_graph()
    }

    fn visit(&self, ctx: &RuleContext) -> Vec<Finding> {
        let Some(graph) = ctx.project_graph else {
            return Vec::new();
        };
        let min_cluster_size = ctx.config_int("naming.project_term_inconsistency.min_cluster_size", DEFAULT_MIN_CLUSTER_SIZE) as usize;
        let preferred_verbs: Vec<String> = match ctx.config.get("naming.project_term_inconsistency.preferred_verbs") {
            Some(crate::config::ConfigValue::StrList(v)) => v.clone(),
            _ => Vec::new(),
        };

        let mut clusters: HashMap<(String, SymbolKindTag), Vec<ClusterItem>> = HashMap::new();
        for symbol in graph.symbols.by_kind(SymbolKindTag::Function) {
            if is_private_or_dunder(&symbol.name) {
                continue;
            }
            let parts = split_identifier(&symbol.name);
            if parts.len() < 2 {
                continue;
            }
            let (verb, noun_phrase) = stem_identifier(&parts);
            if verb.is_empty() || noun_phrase.len() < 3 {
                continue;
            }
            let canon = canonical_verb(&verb);
            clusters
                .entry((noun_phrase, symbol.kind))
                .or_default()
                .push(ClusterItem {
                    symbol,
                    original_verb: verb,
                    canonical_verb: canon,
                });
        }

        let mut keys: Vec<_> = clusters.keys().cloned().collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0));

        let mut findings = Vec::new();
        for key in keys {
            let items = clusters.remove(&key).unwrap();
            if items.len() < min_cluster_size {
                continue;
            }

            let original_verbs: HashSet<&str> = items.iter().map(|i| i.original_verb.as_str()).collect();
            if original_verbs.len() < 2 {
                continue;
            }
            let canonical_verbs: HashSet<&str> = items.iter().map(|i| i.canonical_verb.as_str()).collect();

            let target_verb = select_target_verb(&canonical_verbs, &preferred_verbs, &items);

            // Majority is judged by canonical verb (so "get" and its synonym
            // "fetch" count together), not the literal spelling used at each
            // call site.
            let target_count = items.iter().filter(|i| i.canonical_verb == target_verb).count();
            let other_count = items.len() - target_count;
            if target_count < other_count * 2 {
                continue;
            }

            let mut original_verbs_sorted: Vec<&str> = original_verbs.into_iter().collect();
            original_verbs_sorted.sort_unstable();
            let mut canonical_verbs_sorted: Vec<&str> = canonical_verbs.into_iter().collect();
            canonical_verbs_sorted.sort_unstable();

            for item in &items {
                if item.symbol.file_path != ctx.file_path || item.original_verb == target_verb {
                    continue;
                }
                let suggestion = generate_suggestion(&item.symbol.name, &item.original_verb, &target_verb);
                let autofix = suggestion.as_ref().map(|s| {
                    vec![Edit::new(item.symbol.start_byte, item.symbol.end_byte, s.clone())]
                });

                let mut finding = Finding::new(
                    self.meta.id,
                    format!(
                        "Inconsistent naming: use '{target_verb}' instead of '{}' to match the rest of the project.",
                        item.original_verb
                    ),
                    ctx.file_path,
                    Span::new(item.symbol.start_byte, item.symbol.end_byte),
                    Severity::Warning,
                )
                .with_meta("noun_phrase", key.0.clone())
                .with_meta("original_verb", item.original_verb.clone())
                .with_meta("target_verb", target_verb.clone())
                .with_meta(
                    "original_verbs",
                    serde_json::Value::Array(
                        original_verbs_sorted.iter().map(|v| serde_json::Value::String(v.to_string())).collect(),
                    ),
                )
                .with_meta(
                    "canonical_verbs",
                    serde_json::Value::Array(
                        canonical_verbs_sorted.iter().map(|v| serde_json::Value::String(v.to_string())).collect(),
                    ),
                )
                .with_meta("symbol_count", items.len() as i64);
                if let Some(autofix) = autofix {
                    finding = finding.with_autofix(autofix);
                }
                if let Some(suggestion) = suggestion {
                    finding = finding.with_meta("suggestion", suggestion);
                }
                findings.push(finding);
            }
        }

        findings.sort_by_key(|f| f.span.start_byte);
        findings
    }
}

fn select_target_verb(canonical_verbs: &HashSet<&str>, preferred_verbs: &[String], items: &[ClusterItem]) -> String {
    for pref in preferred_verbs {
        if canonical_verbs.contains(pref.as_str()) {
            return pref.clone();
        }
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.canonical_verb.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked[0].0.to_string()
}

/// Replace the leading verb while preserving the original's casing style.
fn generate_suggestion(original_name: &str, from_verb: &str, to_verb: &str) -> Option<String> {
    let parts = split_identifier(original_name);
    let first = parts.first()?;
    if first != from_verb {
        return None;
    }

    let mut parts = parts;
    parts[0] = to_verb.to_string();

    if original_name.contains('_') {
        return Some(parts.join("_"));
    }
    if original_name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return Some(parts.iter().map(|p| capitalize(p)).collect());
    }
    let mut out = parts[0].clone();
    for p in &parts[1..] {
        out.push_str(&capitalize(p));
    }
    Some(out)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::python::PythonAdapter;
    use crate::adapter::LanguageAdapter;
    use crate::config::ConfigValue;
    use crate::project_graph::{ProjectGraph, SymbolIndex};

    fn symbol_index_with(entries: Vec<(&str, &str, u32, u32)>) -> SymbolIndex {
        let mut index = SymbolIndex::new();
        for (file, name, start, end) in entries {
            index.insert(SymbolEntry {
                file_path: file.to_string(),
                name: name.to_string(),
                kind: SymbolKindTag::Function,
                start_byte: start,
                end_byte: end,
            });
        }
        index.freeze();
        index
    }

    #[test]
    fn flags_minority_verb_in_current_file() {
        let adapter = PythonAdapter::new();
        let text = "def fetch_user():\n    pass\n";
        let tree = adapter.parse(text).unwrap();

        let symbols = symbol_index_with(vec![
            ("a.py", "get_user", 0, 8),
            ("b.py", "load_user", 0, 9),
            ("c.py", "fetch_user", 0, 10),
        ]);
        let graph = ProjectGraph {
            symbols,
            imports: Default::default(),
        };

        let config: HashMap<String, ConfigValue> = HashMap::new();
        let ctx = RuleContext {
            file_path: "c.py",
            text,
            tree: &tree,
            adapter: &adapter,
            scopes: None,
            project_graph: Some(&graph),
            config: &config,
            language: "python",
        };

        let rule = NamingProjectTermInconsistencyRule::new();
        let findings = rule.visit(&ctx);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("use 'get'"));
    }

    #[test]
    fn consistent_naming_is_not_flagged() {
        let adapter = PythonAdapter::new();
        let text = "def get_user():\n    pass\n";
        let tree = adapter.parse(text).unwrap();

        let symbols = symbol_index_with(vec![
            ("a.py", "get_user", 0, 8),
            ("b.py", "get_user_by_id", 0, 14),
            ("c.py", "get_user_profile", 0, 16),
        ]);
        let graph = ProjectGraph {
            symbols,
            imports: Default::default(),
        };

        let config: HashMap<String, ConfigValue> = HashMap::new();
        let ctx = RuleContext {
            file_path: "a.py",
            text,
            tree: &tree,
            adapter: &adapter,
            scopes: None,
            project_graph: Some(&graph),
            config: &config,
            language: "python",
        };

        let rule = NamingProjectTermInconsistencyRule::new();
        assert!(rule.visit(&ctx).is_empty());
    }
}
