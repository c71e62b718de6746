//! Python reference adapter (§4.1.1), backed by `tree-sitter-python`.
//!
//! Traversal follows the node-kind-matching style of the teacher crate's
//! `parsing::rust::RustParser` (recurse, `match node.kind()`, accumulate into
//! an out-vec) rather than tree-sitter's query API, generalized from one
//! fixed import kind to the full scope/symbol/ref/import surface §4.1.1 asks
//! reference adapters to cover.

use std::collections::HashMap;
use std::sync::Mutex;

use tree_sitter::{Node, Parser};

use super::common::{collect_scope_nodes, enclosing_scope_id, node_text, scope_id_map, walk};
use super::{
    AdapterCapabilities, ImportDescriptor, LanguageAdapter, LanguageTag, ParseError, RefDesc,
    ScopeKindTag, ScopeNodeDesc, SymbolDefDesc, SymbolKindTag, TreeHandle,
};

pub struct PythonAdapter {
    parser: Mutex<Parser>,
}

impl PythonAdapter {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("tree-sitter-python grammar is ABI-compatible with this tree-sitter version");
        Self {
            parser: Mutex::new(parser),
        }
    }
}

impl Default for PythonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_scope(node: &Node) -> Option<ScopeKindTag> {
    match node.kind() {
        "module" => Some(ScopeKindTag::Module),
        "function_definition" | "lambda" => Some(ScopeKindTag::Function),
        "class_definition" => Some(ScopeKindTag::Class),
        "list_comprehension" | "set_comprehension" | "dictionary_comprehension"
        | "generator_expression" => Some(ScopeKindTag::Comprehension),
        _ => None,
    }
}

/// True when `node` (an `identifier`) is the binding occurrence of a def,
/// parameter, import, or assignment target rather than a use-site.
fn is_binding_occurrence(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "function_definition" | "class_definition" => parent
            .child_by_field_name("name")
            .is_some_and(|n| n.id() == node.id()),
        "parameters" | "lambda_parameters" => true,
        "typed_parameter" | "default_parameter" | "typed_default_parameter" => parent
            .child(0)
            .is_some_and(|first| first.id() == node.id() || first.kind() == "identifier"),
        "assignment" | "augmented_assignment" => parent
            .child_by_field_name("left")
            .is_some_and(|left| node_contains(left, node)),
        "named_expression" => parent
            .child_by_field_name("name")
            .is_some_and(|n| n.id() == node.id()),
        "for_statement" | "for_in_clause" => parent
            .child_by_field_name("left")
            .is_some_and(|left| node_contains(left, node)),
        "as_pattern_target" => true,
        "aliased_import" => parent
            .child_by_field_name("alias")
            .is_some_and(|n| n.id() == node.id()),
        "import_from_statement" | "import_statement" => true,
        "keyword_argument" => parent
            .child_by_field_name("name")
            .is_some_and(|n| n.id() == node.id()),
        "attribute" => parent
            .child_by_field_name("attribute")
            .is_some_and(|n| n.id() == node.id()),
        _ => false,
    }
}

fn node_contains(ancestor: Node, target: Node) -> bool {
    if ancestor.id() == target.id() {
        return true;
    }
    let mut cursor = ancestor.walk();
    ancestor
        .children(&mut cursor)
        .any(|c| node_contains(c, target))
}

impl LanguageAdapter for PythonAdapter {
    fn language_id(&self) -> LanguageTag {
        "python"
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            scopes: true,
            symbols: true,
            refs: true,
            imports: true,
        }
    }

    fn parse(&self, text: &str) -> Result<TreeHandle, ParseError> {
        let mut parser = self.parser.lock().expect("parser mutex poisoned");
        let tree = parser.parse(text, None).ok_or_else(|| ParseError {
            language: self.language_id().to_string(),
            reason: "tree-sitter returned no tree (cancelled or OOM)".to_string(),
        })?;
        Ok(TreeHandle::new(tree))
    }

    fn has_syntax_error(&self, tree: &TreeHandle) -> bool {
        tree.downcast_ref::<tree_sitter::Tree>()
            .is_some_and(|t| t.root_node().has_error())
    }

    fn node_span(&self, tree: &TreeHandle, node_id: u32) -> Option<(u32, u32)> {
        let tree = tree.downcast_ref::<tree_sitter::Tree>()?;
        find_node_by_id(tree.root_node(), node_id as usize)
            .map(|n| (n.start_byte() as u32, n.end_byte() as u32))
    }

    fn iter_scope_nodes(&self, tree: &TreeHandle) -> Vec<ScopeNodeDesc> {
        let Some(tree) = tree.downcast_ref::<tree_sitter::Tree>() else {
            return Vec::new();
        };
        let nodes = collect_scope_nodes(tree.root_node(), classify_scope);
        let ids = scope_id_map(&nodes);
        nodes
            .iter()
            .map(|n| ScopeNodeDesc {
                id: ids[&n.id()],
                kind: classify_scope(n).expect("node came from collect_scope_nodes"),
                parent_id: n.parent().and_then(|p| enclosing_scope_id(p, &ids)),
            })
            .collect()
    }

    fn iter_symbol_defs(&self, tree: &TreeHandle, text: &str) -> Vec<SymbolDefDesc> {
        let Some(tree) = tree.downcast_ref::<tree_sitter::Tree>() else {
            return Vec::new();
        };
        let scope_nodes = collect_scope_nodes(tree.root_node(), classify_scope);
        let ids = scope_id_map(&scope_nodes);

        let mut out = Vec::new();
        walk(tree.root_node(), &mut |node| match node.kind() {
            "function_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    out.push(def_in_enclosing_scope(node, name, text, SymbolKindTag::Function, &ids));
                }
            }
            "class_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    out.push(def_in_enclosing_scope(node, name, text, SymbolKindTag::Class, &ids));
                }
            }
            "parameters" | "lambda_parameters" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    collect_param_names(child, text, &ids, &mut out);
                }
            }
            "assignment" | "augmented_assignment" | "named_expression" => {
                let field = if node.kind() == "named_expression" {
                    "name"
                } else {
                    "left"
                };
                if let Some(target) = node.child_by_field_name(field) {
                    collect_assignment_targets(target, text, &ids, &mut out);
                }
            }
            "for_statement" | "for_in_clause" => {
                if let Some(target) = node.child_by_field_name("left") {
                    collect_assignment_targets(target, text, &ids, &mut out);
                }
            }
            "as_pattern" => {
                if let Some(alias) = node.child_by_field_name("alias") {
                    out.push(def(alias, text, SymbolKindTag::Local, &ids));
                }
            }
            "import_statement" | "import_from_statement" => {
                collect_import_bindings(node, text, &ids, &mut out);
            }
            _ => {}
        });
        out
    }

    fn iter_identifier_refs(&self, tree: &TreeHandle, text: &str) -> Vec<RefDesc> {
        let Some(tree) = tree.downcast_ref::<tree_sitter::Tree>() else {
            return Vec::new();
        };
        let scope_nodes = collect_scope_nodes(tree.root_node(), classify_scope);
        let ids = scope_id_map(&scope_nodes);

        let mut out = Vec::new();
        walk(tree.root_node(), &mut |node| {
            if node.kind() == "identifier" && !is_binding_occurrence(node) {
                out.push(RefDesc {
                    name: node_text(node, text).to_string(),
                    scope_id: node.parent().and_then(|p| enclosing_scope_id(p, &ids)),
                    byte: node.start_byte() as u32,
                    meta: HashMap::new(),
                });
            }
        });
        out
    }

    fn iter_imports(&self, tree: &TreeHandle, text: &str) -> Vec<ImportDescriptor> {
        let Some(tree) = tree.downcast_ref::<tree_sitter::Tree>() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        walk(tree.root_node(), &mut |node| match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "dotted_name" => out.push(ImportDescriptor {
                            module: node_text(child, text).to_string(),
                            level: 0,
                            names: Vec::new(),
                            start_byte: node.start_byte() as u32,
                            end_byte: node.end_byte() as u32,
                        }),
                        "aliased_import" => {
                            if let Some(name) = child.child_by_field_name("name") {
                                out.push(ImportDescriptor {
                                    module: node_text(name, text).to_string(),
                                    level: 0,
                                    names: Vec::new(),
                                    start_byte: node.start_byte() as u32,
                                    end_byte: node.end_byte() as u32,
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
            "import_from_statement" => {
                let (module, level) = match node.child_by_field_name("module_name") {
                    Some(m) if m.kind() == "relative_import" => {
                        let level = node_text(m, text).chars().take_while(|c| *c == '.').count();
                        let rest = node_text(m, text).trim_start_matches('.');
                        (rest.to_string(), level as u32)
                    }
                    Some(m) => (node_text(m, text).to_string(), 0),
                    None => (String::new(), 0),
                };
                let mut names = Vec::new();
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "dotted_name" if child.id() != node.child_by_field_name("module_name").map(|m| m.id()).unwrap_or(0) => {
                            names.push(node_text(child, text).to_string());
                        }
                        "aliased_import" => {
                            if let Some(name) = child.child_by_field_name("name") {
                                names.push(node_text(name, text).to_string());
                            }
                        }
                        "wildcard_import" => names.push("*".to_string()),
                        _ => {}
                    }
                }
                out.push(ImportDescriptor {
                    module,
                    level,
                    names,
                    start_byte: node.start_byte() as u32,
                    end_byte: node.end_byte() as u32,
                });
            }
            _ => {}
        });
        out
    }
}

fn def(
    name_node: Node,
    text: &str,
    kind: SymbolKindTag,
    ids: &HashMap<usize, u32>,
) -> SymbolDefDesc {
    SymbolDefDesc {
        name: node_text(name_node, text).to_string(),
        kind,
        scope_id: name_node
            .parent()
            .and_then(|p| enclosing_scope_id(p, ids)),
        start_byte: name_node.start_byte() as u32,
        end_byte: name_node.end_byte() as u32,
        meta: HashMap::new(),
    }
}

/// Like `def`, but for a binding (function/class name) whose own `def_node`
/// introduces a new scope: the binding belongs to the scope *enclosing*
/// `def_node`, not the scope `def_node` itself creates.
fn def_in_enclosing_scope(
    def_node: Node,
    name_node: Node,
    text: &str,
    kind: SymbolKindTag,
    ids: &HashMap<usize, u32>,
) -> SymbolDefDesc {
    let mut meta = HashMap::new();
    // `def_node` is itself a scope boundary (function/class); record its own
    // scope id so rules can correlate e.g. a function's parameters (scoped
    // to `def_node`) back to its name (scoped to the enclosing scope).
    if let Some(own_id) = ids.get(&def_node.id()) {
        meta.insert("own_scope_id".to_string(), own_id.to_string());
    }
    SymbolDefDesc {
        name: node_text(name_node, text).to_string(),
        kind,
        scope_id: def_node
            .parent()
            .and_then(|p| enclosing_scope_id(p, ids)),
        start_byte: name_node.start_byte() as u32,
        end_byte: name_node.end_byte() as u32,
        meta,
    }
}

fn collect_param_names(
    node: Node,
    text: &str,
    ids: &HashMap<usize, u32>,
    out: &mut Vec<SymbolDefDesc>,
) {
    match node.kind() {
        "identifier" => out.push(def(node, text, SymbolKindTag::Param, ids)),
        "typed_parameter" | "default_parameter" | "typed_default_parameter" => {
            if let Some(first) = node.child(0) {
                if first.kind() == "identifier" {
                    out.push(def(first, text, SymbolKindTag::Param, ids));
                }
            }
        }
        "list_splat_pattern" | "dictionary_splat_pattern" => {
            if let Some(id) = node.named_child(0) {
                if id.kind() == "identifier" {
                    out.push(def(id, text, SymbolKindTag::Param, ids));
                }
            }
        }
        _ => {}
    }
}

fn collect_assignment_targets(
    node: Node,
    text: &str,
    ids: &HashMap<usize, u32>,
    out: &mut Vec<SymbolDefDesc>,
) {
    match node.kind() {
        "identifier" => out.push(def(node, text, SymbolKindTag::Local, ids)),
        "pattern_list" | "tuple_pattern" | "list_pattern" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_assignment_targets(child, text, ids, out);
            }
        }
        _ => {}
    }
}

fn collect_import_bindings(
    node: Node,
    text: &str,
    ids: &HashMap<usize, u32>,
    out: &mut Vec<SymbolDefDesc>,
) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "dotted_name" => {
                        // bind the first path segment, e.g. `import os.path` binds `os`
                        if let Some(first) = child.named_child(0) {
                            if first.kind() == "identifier" {
                                out.push(def(first, text, SymbolKindTag::Import, ids));
                                continue;
                            }
                        }
                        out.push(def(child, text, SymbolKindTag::Import, ids));
                    }
                    "aliased_import" => {
                        if let Some(alias) = child.child_by_field_name("alias") {
                            out.push(def(alias, text, SymbolKindTag::Import, ids));
                        }
                    }
                    _ => {}
                }
            }
        }
        "import_from_statement" => {
            let module_id = node
                .child_by_field_name("module_name")
                .map(|m| m.id())
                .unwrap_or(0);
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "dotted_name" if child.id() != module_id => {
                        out.push(def(child, text, SymbolKindTag::Import, ids));
                    }
                    "aliased_import" => {
                        if let Some(alias) = child.child_by_field_name("alias") {
                            out.push(def(alias, text, SymbolKindTag::Import, ids));
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn find_node_by_id(node: Node, id: usize) -> Option<Node> {
    if node.id() == id {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_node_by_id(child, id) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_module() {
        let adapter = PythonAdapter::new();
        let tree = adapter.parse("import os\n\ndef f(x):\n    return x + 1\n").unwrap();
        let scopes = adapter.iter_scope_nodes(&tree);
        assert!(scopes.iter().any(|s| s.kind == ScopeKindTag::Module));
        assert!(scopes.iter().any(|s| s.kind == ScopeKindTag::Function));
    }

    #[test]
    fn import_binds_and_is_used() {
        let adapter = PythonAdapter::new();
        let text = "import os\nprint(os.path)\n";
        let tree = adapter.parse(text).unwrap();
        let defs = adapter.iter_symbol_defs(&tree, text);
        assert!(defs.iter().any(|d| d.name == "os" && d.kind == SymbolKindTag::Import));
        let refs = adapter.iter_identifier_refs(&tree, text);
        assert!(refs.iter().any(|r| r.name == "os"));
    }

    #[test]
    fn unused_import_has_no_matching_ref() {
        let adapter = PythonAdapter::new();
        let text = "import os\nimport sys\nprint(sys.argv)\n";
        let tree = adapter.parse(text).unwrap();
        let refs = adapter.iter_identifier_refs(&tree, text);
        assert!(!refs.iter().any(|r| r.name == "os"));
        assert!(refs.iter().any(|r| r.name == "sys"));
    }

    #[test]
    fn relative_import_tracks_level() {
        let adapter = PythonAdapter::new();
        let text = "from ..pkg import mod\n";
        let tree = adapter.parse(text).unwrap();
        let imports = adapter.iter_imports(&tree, text);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].level, 2);
        assert_eq!(imports[0].module, "pkg");
        assert_eq!(imports[0].names, vec!["mod".to_string()]);
    }

    #[test]
    fn function_param_count() {
        let adapter = PythonAdapter::new();
        let text = "def f(a, b, c=1, *args, **kwargs):\n    pass\n";
        let tree = adapter.parse(text).unwrap();
        let defs = adapter.iter_symbol_defs(&tree, text);
        let params: Vec<_> = defs
            .iter()
            .filter(|d| d.kind == SymbolKindTag::Param)
            .collect();
        assert_eq!(params.len(), 5);
    }
}
