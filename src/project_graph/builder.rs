//! One-pass project graph construction (§4.4).

use std::collections::HashSet;

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::warn;

use crate::adapter::{AdapterRegistry, LanguageTag, SymbolKindTag};
use crate::project_graph::import_graph::ImportGraph;
use crate::project_graph::resolver::ImportResolver;
use crate::project_graph::symbol_index::{SymbolEntry, SymbolIndex};
use crate::project_graph::ProjectGraph;

/// Symbol kinds that count as "top-level" for the project symbol index —
/// local variables and unexported parameters stay file-local.
const TOP_LEVEL_KINDS: &[SymbolKindTag] = &[SymbolKindTag::Function, SymbolKindTag::Class];

pub struct ProjectGraphBuilder<'a> {
    adapters: &'a AdapterRegistry,
}

impl<'a> ProjectGraphBuilder<'a> {
    pub fn new(adapters: &'a AdapterRegistry) -> Self {
        Self { adapters }
    }

    /// Build a `ProjectGraph` over `files`, each `(file_path, language, text)`.
    /// `namespaces_for` supplies the external-namespace list for a language.
    pub fn build(
        &self,
        files: &[(String, LanguageTag, String)],
        namespaces_for: impl Fn(LanguageTag) -> Vec<String> + Sync,
    ) -> ProjectGraph {
        let known_files: HashSet<String> = files.iter().map(|(path, _, _)| path.clone()).collect();

        let symbols = Mutex::new(SymbolIndex::new());
        let imports = Mutex::new(ImportGraph::new());

        files.par_iter().for_each(|(path, language, text)| {
            let Some(adapter) = self.adapters.get(language) else {
                return;
            };
            let Ok(tree) = adapter.parse(text) else {
                warn!(file = %path, "project graph: parse failed, excluding from symbol/import accumulation");
                return;
            };

            for def in adapter.iter_symbol_defs(&tree, text) {
                if TOP_LEVEL_KINDS.contains(&def.kind) {
                    symbols.lock().insert(SymbolEntry {
                        file_path: path.clone(),
                        name: def.name,
                        kind: def.kind,
                        start_byte: def.start_byte,
                        end_byte: def.end_byte,
                    });
                }
            }

            let namespaces = namespaces_for(language);
            for imp in adapter.iter_imports(&tree, text) {
                let edge = ImportResolver::resolve(
                    path,
                    &imp.module,
                    imp.level,
                    &imp.names,
                    imp.start_byte,
                    imp.end_byte,
                    language,
                    &known_files,
                    &namespaces,
                );
                imports.lock().push(edge);
            }
        });

        let mut symbols = symbols.into_inner();
        let mut imports = imports.into_inner();
        symbols.freeze();
        imports.freeze();

        ProjectGraph { symbols, imports }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterRegistry;

    #[test]
    fn builds_symbol_index_and_resolves_internal_import() {
        let registry = AdapterRegistry::with_reference_adapters();
        let files = vec![
            ("pkg/util.py".to_string(), "python", "def helper():\n    pass\n".to_string()),
            (
                "pkg/main.py".to_string(),
                "python",
                "from . import util\nutil.helper()\n".to_string(),
            ),
        ];
        let builder = ProjectGraphBuilder::new(&registry);
        let graph = builder.build(&files, |_| Vec::new());

        assert!(!graph.symbols.by_name("helper").is_empty());
        assert!(graph
            .imports
            .edges_from("pkg/main.py")
            .any(|e| matches!(e.kind, crate::project_graph::ImportEdgeKind::ResolvedFile { .. })));
    }
}
