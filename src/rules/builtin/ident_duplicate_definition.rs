//! `ident.duplicate_definition` — duplicate top-level symbol definitions in
//! one file, grounded on
//! `examples/original_source/server/rules/ident_duplicate_definition.py`.
//!
//! Java/C# overload detection from the original is dropped along with those
//! two languages, which this crate's reference adapters don't cover.

use std::collections::HashMap;

use crate::adapter::SymbolKindTag;
use crate::finding::{Finding, Severity};
use crate::rules::{AutofixSafety, Priority, Requires, Rule, RuleContext, RuleMeta, Tier};
use crate::scopes::{Scope, ScopeGraph, ScopeId, Symbol};
use crate::span::{byte_to_line_col, Span};

pub struct IdentDuplicateDefinitionRule {
    meta: RuleMeta,
}

impl IdentDuplicateDefinitionRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta {
                id: "ident.duplicate_definition",
                category: "ident",
                tier: Tier::Scopes,
                priority: Priority::P1,
                autofix_safety: AutofixSafety::SuggestOnly,
                description: "Detect duplicate top-level symbol definitions (functions, classes) in the same file",
                langs: &["python", "typescript", "javascript"],
            },
        }
    }
}

impl Default for IdentDuplicateDefinitionRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse related kinds so a top-level method is grouped with a function
/// of the same name, matching the original's `_normalize_kind`.
fn normalized_kind(kind: SymbolKindTag) -> &'static str {
    match kind {
        SymbolKindTag::Function => "function",
        SymbolKindTag::Class => "class",
        _ => "other",
    }
}

/// The module scope always has id 0 by construction (`build_scopes`
/// assigns scope ids by pre-order position, and every adapter's root node
/// is classified `Module` first).
fn find_module_scope(scopes: &ScopeGraph) -> Option<ScopeId> {
    let scope: &Scope = scopes.get_scope(ScopeId(0))?;
    (scope.kind == crate::adapter::ScopeKindTag::Module).then_some(scope.id)
}

fn collect_top_level_symbols<'a>(scopes: &'a ScopeGraph, module_scope: ScopeId) -> Vec<&'a Symbol> {
    scopes
        .symbols_in_scope(module_scope)
        .filter(|s| matches!(s.kind, SymbolKindTag::Function | SymbolKindTag::Class))
        .collect()
}

impl Rule for IdentDuplicateDefinitionRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn requires(&self) -> Requires {
        Requires::scopes()
    }

    fn visit(&self, ctx: &RuleContext) -> Vec<Finding> {
        let Some(scopes) = ctx.scopes else {
            return Vec::new();
        };
        let Some(module_scope) = find_module_scope(scopes) else {
            return Vec::new();
        };

        let top_level = collect_top_level_symbols(scopes, module_scope);

        let mut groups: HashMap<(String, &'static str), Vec<&Symbol>> = HashMap::new();
        for symbol in top_level {
            groups
                .entry((symbol.name.clone(), normalized_kind(symbol.kind)))
                .or_default()
                .push(symbol);
        }

        let mut names: Vec<_> = groups.keys().cloned().collect();
        names.sort();

        let mut findings = Vec::new();
        for key in names {
            let mut symbols = groups.remove(&key).unwrap();
            if symbols.len() < 2 {
                continue;
            }
            symbols.sort_by_key(|s| s.start_byte);
            findings.extend(self.findings_for_group(&key.0, key.1, &symbols, ctx));
        }
        findings.sort_by_key(|f| f.span.start_byte);
        findings
    }
}

impl IdentDuplicateDefinitionRule {
    fn findings_for_group(
        &self,
        name: &str,
        kind: &str,
        symbols: &[&Symbol],
        ctx: &RuleContext,
    ) -> Vec<Finding> {
        let lines: Vec<u32> = symbols
            .iter()
            .map(|s| byte_to_line_col(ctx.text, s.start_byte).0)
            .collect();
        let first_line = lines[0];
        let duplicate_lines = &lines[1..];

        let mut out = Vec::with_capacity(symbols.len());

        let plural = if duplicate_lines.len() > 1 { "s" } else { "" };
        let duplicate_lines_str = duplicate_lines
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!(
            "'{name}' is defined multiple times in this file (also at line{plural} {duplicate_lines_str})\u{2014}keep one definition and remove the others."
        );
        out.push(
            Finding::new(
                self.meta.id,
                message,
                ctx.file_path,
                Span::new(symbols[0].start_byte, symbols[0].end_byte),
                Severity::Warning,
            )
            .with_meta("symbol_name", name)
            .with_meta("symbol_kind", kind)
            .with_meta("duplicate_count", symbols.len() as i64)
            .with_meta("is_first_occurrence", true),
        );

        for symbol in &symbols[1..] {
            let message =
                format!("'{name}' is already defined at line {first_line}\u{2014}remove this duplicate or rename it.");
            out.push(
                Finding::new(
                    self.meta.id,
                    message,
                    ctx.file_path,
                    Span::new(symbol.start_byte, symbol.end_byte),
                    Severity::Warning,
                )
                .with_meta("symbol_name", name)
                .with_meta("symbol_kind", kind)
                .with_meta("first_occurrence_line", first_line as i64)
                .with_meta("is_first_occurrence", false),
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::python::PythonAdapter;
    use crate::adapter::LanguageAdapter;
    use crate::config::ConfigValue;
    use crate::scopes::build_scopes;

    #[test]
    fn flags_duplicate_top_level_function() {
        let adapter = PythonAdapter::new();
        let text = "def process(x):\n    return x\n\ndef process(x):\n    return x + 1\n";
        let tree = adapter.parse(text).unwrap();
        let scopes = build_scopes(&adapter, &tree, text);
        let config: HashMap<String, ConfigValue> = HashMap::new();

        let ctx = RuleContext {
            file_path: "mod.py",
            text,
            tree: &tree,
            adapter: &adapter,
            scopes: Some(&scopes),
            project_graph: None,
            config: &config,
            language: "python",
        };

        let rule = IdentDuplicateDefinitionRule::new();
        let findings = rule.visit(&ctx);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("defined multiple times"));
        assert!(findings[1].message.contains("already defined"));
    }

    #[test]
    fn single_definition_is_not_flagged() {
        let adapter = PythonAdapter::new();
        let text = "def process(x):\n    return x\n";
        let tree = adapter.parse(text).unwrap();
        let scopes = build_scopes(&adapter, &tree, text);
        let config: HashMap<String, ConfigValue> = HashMap::new();

        let ctx = RuleContext {
            file_path: "mod.py",
            text,
            tree: &tree,
            adapter: &adapter,
            scopes: Some(&scopes),
            project_graph: None,
            config: &config,
            language: "python",
        };

        let rule = IdentDuplicateDefinitionRule::new();
        assert!(rule.visit(&ctx).is_empty());
    }
}
