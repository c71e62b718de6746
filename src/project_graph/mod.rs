//! Project-wide symbol index and import graph (§4.4).

pub mod builder;
pub mod import_graph;
pub mod resolver;
pub mod symbol_index;

pub use builder::ProjectGraphBuilder;
pub use import_graph::{ImportEdge, ImportEdgeKind, ImportGraph};
pub use resolver::ImportResolver;
pub use symbol_index::{SymbolEntry, SymbolIndex};

/// The project-wide graph handed to tier-2 rules via `RuleContext::project_graph`.
#[derive(Debug, Clone, Default)]
pub struct ProjectGraph {
    pub symbols: SymbolIndex,
    pub imports: ImportGraph,
}
