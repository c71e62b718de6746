//! `imports.missing_file_target` — import that resolves to no file or
//! package, grounded on
//! `examples/original_source/server/rules/imports_missing_file_target.py`.
//!
//! Dropped from the original: similar-file suggestions (`Did you mean
//! '...'`, `_find_similar_files`) require directory listings this rule
//! doesn't have access to from `ProjectGraph` alone; the language-specific
//! "looks like a known third-party package" word lists are condensed to
//! `ImportEdgeKind::External`/`Package`, which the resolver already
//! produces from the namespace list passed to `ProjectGraphBuilder`.

use crate::finding::{Finding, Severity};
use crate::project_graph::ImportEdgeKind;
use crate::rules::{AutofixSafety, Priority, Requires, Rule, RuleContext, RuleMeta, Tier};
use crate::span::Span;

pub struct ImportsMissingFileTargetRule {
    meta: RuleMeta,
}

impl ImportsMissingFileTargetRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta {
                id: "imports.missing_file_target",
                category: "imports",
                tier: Tier::ProjectGraph,
                priority: Priority::P0,
                autofix_safety: AutofixSafety::SuggestOnly,
                description: "Import that cannot be resolved to a file or module",
                langs: &["python", "typescript", "javascript"],
            },
        }
    }
}

impl Default for ImportsMissingFileTargetRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ImportsMissingFileTargetRule {
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
        // `ignore_external` has no further effect beyond what the resolver
        // already encodes: a real third-party import resolves to
        // `External`/`Package`, not `Missing`, so only genuinely unresolved
        // imports reach this rule regardless of the flag's value. The
        // config key is still honored for compatibility with profiles that
        // set it explicitly.
        let _ignore_external = ctx.config_bool("imports.missing_file_target.ignore_external", true);

        graph
            .imports
            .edges_from(ctx.file_path)
            .filter(|edge| edge.is_missing())
            .map(|edge| {
                let tried_paths = match &edge.kind {
                    ImportEdgeKind::Missing { tried_paths } => tried_paths.clone(),
                    _ => Vec::new(),
                };
                let message = if edge.level > 0 {
                    format!("Unresolvable relative import target '{}'", edge.module)
                } else {
                    format!("Unresolvable import target '{}'", edge.module)
                };

                Finding::new(
                    self.meta.id,
                    message,
                    ctx.file_path,
                    Span::new(edge.start_byte, edge.end_byte),
                    Severity::Error,
                )
                .with_meta("module", edge.module.clone())
                .with_meta("level", edge.level as i64)
                .with_meta("is_relative", edge.level > 0)
                .with_meta(
                    "tried_paths",
                    serde_json::Value::Array(
                        tried_paths.into_iter().map(serde_json::Value::String).collect(),
                    ),
                )
                .with_meta("import_type", if edge.level > 0 { "from" } else { "import" })
                .with_meta("language", ctx.language)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::python::PythonAdapter;
    use crate::adapter::LanguageAdapter;
    use crate::config::ConfigValue;
    use crate::project_graph::{ImportEdge, ImportGraph, ProjectGraph, SymbolIndex};
    use std::collections::HashMap;

    #[test]
    fn flags_unresolvable_import() {
        let adapter = PythonAdapter::new();
        let text = "from nonexistent_module import func\n";
        let tree = adapter.parse(text).unwrap();

        let mut imports = ImportGraph::new();
        imports.push(ImportEdge {
            importing_file: "mod.py".to_string(),
            module: "nonexistent_module".to_string(),
            level: 0,
            names: vec!["func".to_string()],
            kind: ImportEdgeKind::Missing {
                tried_paths: vec!["nonexistent_module.py".to_string()],
            },
            start_byte: 0,
            end_byte: 36,
        });
        imports.freeze();
        let graph = ProjectGraph {
            symbols: SymbolIndex::new(),
            imports,
        };

        let config: HashMap<String, ConfigValue> = HashMap::new();
        let ctx = RuleContext {
            file_path: "mod.py",
            text,
            tree: &tree,
            adapter: &adapter,
            scopes: None,
            project_graph: Some(&graph),
            config: &config,
            language: "python",
        };

        let rule = ImportsMissingFileTargetRule::new();
        let findings = rule.visit(&ctx);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("nonexistent_module"));
    }

    #[test]
    fn resolved_import_is_not_flagged() {
        let adapter = PythonAdapter::new();
        let text = "import os\n";
        let tree = adapter.parse(text).unwrap();

        let mut imports = ImportGraph::new();
        imports.push(ImportEdge {
            importing_file: "mod.py".to_string(),
            module: "os".to_string(),
            level: 0,
            names: vec![],
            kind: ImportEdgeKind::External {
                namespace: "os".to_string(),
            },
            start_byte: 0,
            end_byte: 9,
        });
        imports.freeze();
        let graph = ProjectGraph {
            symbols: SymbolIndex::new(),
            imports,
        };

        let config: HashMap<String, ConfigValue> = HashMap::new();
        let ctx = RuleContext {
            file_path: "mod.py",
            text,
            tree: &tree,
            adapter: &adapter,
            scopes: None,
            project_graph: Some(&graph),
            config: &config,
            language: "python",
        };

        let rule = ImportsMissingFileTargetRule::new();
        assert!(rule.visit(&ctx).is_empty());
    }
}
