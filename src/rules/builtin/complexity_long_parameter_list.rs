//! `complexity.long_parameter_list` — functions with too many parameters,
//! grounded on
//! `examples/original_source/server/rules/complexity_long_parameter_list.py`.
//!
//! The original's per-language suggestion text (dataclass vs options-object
//! vs builder, keyed off a dozen languages) is condensed to the three
//! languages this crate's adapters actually cover.

use std::collections::HashMap;

use crate::adapter::{ScopeKindTag, SymbolKindTag};
use crate::finding::{Finding, Severity};
use crate::rules::{AutofixSafety, Priority, Requires, Rule, RuleContext, RuleMeta, Tier};
use crate::span::Span;

const DEFAULT_MAX_PARAMS: i64 = 5;

pub struct ComplexityLongParameterListRule {
    meta: RuleMeta,
}

impl ComplexityLongParameterListRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta {
                id: "complexity.long_parameter_list",
                category: "complexity",
                tier: Tier::Syntax,
                priority: Priority::P2,
                autofix_safety: AutofixSafety::SuggestOnly,
                description: "Flag functions with too many parameters and suggest consolidating into an object/struct.",
                langs: &["python", "typescript", "javascript"],
            },
        }
    }
}

impl Default for ComplexityLongParameterListRule {
    fn default() -> Self {
        Self::new()
    }
}

fn suggestion_for(language: &str) -> &'static str {
    match language {
        "python" => "Consider a dataclass/TypedDict or **kwargs with a config object.",
        "typescript" => "Consider an `Options` interface and a single options parameter.",
        "javascript" => "Consider a single options object with named fields (and defaults).",
        _ => "Consider consolidating parameters into a configuration object.",
    }
}

impl Rule for ComplexityLongParameterListRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn requires(&self) -> Requires {
        Requires::syntax_only()
    }

    fn visit(&self, ctx: &RuleContext) -> Vec<Finding> {
        let max_params = ctx.config_int("complexity.long_parameter_list.max_params", DEFAULT_MAX_PARAMS);

        let scope_nodes = ctx.adapter.iter_scope_nodes(ctx.tree);
        let defs = ctx.adapter.iter_symbol_defs(ctx.tree, ctx.text);

        // Every function/method-kind scope's id, to bucket params by.
        let function_scopes: Vec<u32> = scope_nodes
            .iter()
            .filter(|s| matches!(s.kind, ScopeKindTag::Function | ScopeKindTag::Method))
            .map(|s| s.id)
            .collect();

        let mut params_by_scope: HashMap<u32, Vec<(u32, u32)>> = HashMap::new();
        for def in defs.iter().filter(|d| d.kind == SymbolKindTag::Param) {
            if let Some(scope_id) = def.scope_id {
                params_by_scope
                    .entry(scope_id)
                    .or_default()
                    .push((def.start_byte, def.end_byte));
            }
        }

        // A named function/class binding whose `own_scope_id` meta points
        // back at the scope it introduces (see `adapter::common`'s
        // `def_in_enclosing_scope`).
        let name_by_scope: HashMap<u32, (&str, u32, u32)> = defs
            .iter()
            .filter(|d| d.kind == SymbolKindTag::Function)
            .filter_map(|d| {
                let own = d.meta.get("own_scope_id")?.parse::<u32>().ok()?;
                Some((own, (d.name.as_str(), d.start_byte, d.end_byte)))
            })
            .collect();

        let mut findings: Vec<Finding> = function_scopes
            .into_iter()
            .filter_map(|scope_id| {
                let params = params_by_scope.get(&scope_id)?;
                let count = params.len() as i64;
                if count <= max_params {
                    return None;
                }

                let (name, span) = match name_by_scope.get(&scope_id) {
                    Some(&(name, start, end)) => (name.to_string(), Span::new(start, end)),
                    None => {
                        let start = params.iter().map(|p| p.0).min().unwrap_or(0);
                        let end = params.iter().map(|p| p.1).max().unwrap_or(0);
                        ("<function>".to_string(), Span::new(start, end))
                    }
                };

                let message = format!(
                    "Long parameter list in '{name}' ({count} > {max_params}). Consider consolidating parameters."
                );

                Some(
                    Finding::new(self.meta.id, message, ctx.file_path, span, Severity::Info)
                        .with_meta("function_name", name)
                        .with_meta("param_count", count)
                        .with_meta("max_params", max_params)
                        .with_meta("suggestion", suggestion_for(ctx.language)),
                )
            })
            .collect();

        findings.sort_by_key(|f| f.span.start_byte);
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::python::PythonAdapter;
    use crate::adapter::LanguageAdapter;
    use crate::config::ConfigValue;

    #[test]
    fn flags_function_with_too_many_params() {
        let adapter = PythonAdapter::new();
        let text = "def process(a, b, c, d, e, f):\n    return a\n";
        let tree = adapter.parse(text).unwrap();
        let config: HashMap<String, ConfigValue> = HashMap::new();

        let ctx = RuleContext {
            file_path: "mod.py",
            text,
            tree: &tree,
            adapter: &adapter,
            scopes: None,
            project_graph: None,
            config: &config,
            language: "python",
        };

        let rule = ComplexityLongParameterListRule::new();
        let findings = rule.visit(&ctx);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'process'"));
        assert!(findings[0].message.contains("6 > 5"));
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn short_parameter_list_is_not_flagged() {
        let adapter = PythonAdapter::new();
        let text = "def process(a, b):\n    return a\n";
        let tree = adapter.parse(text).unwrap();
        let config: HashMap<String, ConfigValue> = HashMap::new();

        let ctx = RuleContext {
            file_path: "mod.py",
            text,
            tree: &tree,
            adapter: &adapter,
            scopes: None,
            project_graph: None,
            config: &config,
            language: "python",
        };

        let rule = ComplexityLongParameterListRule::new();
        assert!(rule.visit(&ctx).is_empty());
    }
}
