//! TypeScript/JavaScript reference adapter (§4.1.1), backed by
//! `tree-sitter-typescript` and `tree-sitter-javascript`.
//!
//! The two dialects share a traversal: TypeScript's grammar is a superset of
//! JavaScript's for every node kind this adapter cares about (functions,
//! classes, imports, identifiers), so one `Dialect`-parametrized
//! implementation covers both language tags rather than duplicating the walk.

use std::collections::HashMap;
use std::sync::Mutex;

use tree_sitter::{Node, Parser};

use super::common::{collect_scope_nodes, enclosing_scope_id, node_text, scope_id_map, walk};
use super::{
    AdapterCapabilities, ImportDescriptor, LanguageAdapter, LanguageTag, ParseError, RefDesc,
    ScopeKindTag, ScopeNodeDesc, SymbolDefDesc, SymbolKindTag, TreeHandle,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Dialect {
    TypeScript,
    JavaScript,
}

pub struct TypeScriptAdapter {
    dialect: Dialect,
    parser: Mutex<Parser>,
}

impl TypeScriptAdapter {
    pub fn typescript() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .expect("tree-sitter-typescript grammar is ABI-compatible with this tree-sitter version");
        Self {
            dialect: Dialect::TypeScript,
            parser: Mutex::new(parser),
        }
    }

    pub fn javascript() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .expect("tree-sitter-javascript grammar is ABI-compatible with this tree-sitter version");
        Self {
            dialect: Dialect::JavaScript,
            parser: Mutex::new(parser),
        }
    }
}

fn classify_scope(node: &Node) -> Option<ScopeKindTag> {
    match node.kind() {
        "program" => Some(ScopeKindTag::Module),
        "function_declaration" | "function_expression" | "arrow_function" | "generator_function_declaration" => {
            Some(ScopeKindTag::Function)
        }
        "method_definition" => Some(ScopeKindTag::Method),
        "class_declaration" | "class" => Some(ScopeKindTag::Class),
        "statement_block" => Some(ScopeKindTag::Block),
        "catch_clause" => Some(ScopeKindTag::Except),
        _ => None,
    }
}

fn is_binding_occurrence(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "function_declaration" | "function_expression" | "generator_function_declaration"
        | "class_declaration" | "class" => parent
            .child_by_field_name("name")
            .is_some_and(|n| n.id() == node.id()),
        "method_definition" | "property_identifier" => false,
        "required_parameter" | "optional_parameter" => parent
            .child_by_field_name("pattern")
            .is_some_and(|p| node_contains(p, node)),
        "rest_pattern" => true,
        "variable_declarator" => parent
            .child_by_field_name("name")
            .is_some_and(|n| node_contains(n, node)),
        "import_specifier" => parent
            .child_by_field_name("alias")
            .map(|a| a.id() == node.id())
            .unwrap_or_else(|| {
                parent
                    .child_by_field_name("name")
                    .is_some_and(|n| n.id() == node.id())
            }),
        "namespace_import" | "import_clause" => true,
        "member_expression" => parent
            .child_by_field_name("property")
            .is_some_and(|n| n.id() == node.id()),
        "shorthand_property_identifier_pattern" => true,
        "catch_clause" => parent
            .child_by_field_name("parameter")
            .is_some_and(|n| node_contains(n, node)),
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

impl LanguageAdapter for TypeScriptAdapter {
    fn language_id(&self) -> LanguageTag {
        match self.dialect {
            Dialect::TypeScript => "typescript",
            Dialect::JavaScript => "javascript",
        }
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
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    out.push(def_in_enclosing_scope(node, name, text, SymbolKindTag::Function, &ids));
                }
            }
            "class_declaration" | "class" => {
                if let Some(name) = node.child_by_field_name("name") {
                    out.push(def_in_enclosing_scope(node, name, text, SymbolKindTag::Class, &ids));
                }
            }
            "required_parameter" | "optional_parameter" => {
                if let Some(pattern) = node.child_by_field_name("pattern") {
                    collect_pattern_names(pattern, text, SymbolKindTag::Param, &ids, &mut out);
                }
            }
            "rest_pattern" => {
                if let Some(id) = node.named_child(0) {
                    collect_pattern_names(id, text, SymbolKindTag::Param, &ids, &mut out);
                }
            }
            "variable_declarator" => {
                if let Some(name) = node.child_by_field_name("name") {
                    collect_pattern_names(name, text, SymbolKindTag::Local, &ids, &mut out);
                }
            }
            "catch_clause" => {
                if let Some(param) = node.child_by_field_name("parameter") {
                    collect_pattern_names(param, text, SymbolKindTag::Local, &ids, &mut out);
                }
            }
            "import_clause" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "identifier" => out.push(def(child, text, SymbolKindTag::Import, &ids)),
                        "namespace_import" => {
                            if let Some(id) = child.named_child(0) {
                                out.push(def(id, text, SymbolKindTag::Import, &ids));
                            }
                        }
                        "named_imports" => {
                            let mut ic = child.walk();
                            for spec in child.children(&mut ic) {
                                if spec.kind() == "import_specifier" {
                                    let binding = spec
                                        .child_by_field_name("alias")
                                        .or_else(|| spec.child_by_field_name("name"));
                                    if let Some(binding) = binding {
                                        out.push(def(binding, text, SymbolKindTag::Import, &ids));
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
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
        walk(tree.root_node(), &mut |node| {
            if node.kind() != "import_statement" {
                return;
            }
            let module = node
                .child_by_field_name("source")
                .map(|s| node_text(s, text).trim_matches(|c| c == '\'' || c == '"').to_string())
                .unwrap_or_default();
            let (module, level) = relative_level(module);

            let mut names = Vec::new();
            let clause = {
                let mut cursor = node.walk();
                node.children(&mut cursor)
                    .find(|c| c.kind() == "import_clause")
            };
            if let Some(clause) = clause {
                let mut cursor = clause.walk();
                for child in clause.children(&mut cursor) {
                    match child.kind() {
                        "identifier" => names.push(node_text(child, text).to_string()),
                        "namespace_import" => {
                            if let Some(id) = child.named_child(0) {
                                names.push(format!("* as {}", node_text(id, text)));
                            }
                        }
                        "named_imports" => {
                            let mut ic = child.walk();
                            for spec in child.children(&mut ic) {
                                if spec.kind() == "import_specifier" {
                                    if let Some(name) = spec.child_by_field_name("name") {
                                        names.push(node_text(name, text).to_string());
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            out.push(ImportDescriptor {
                module,
                level,
                names,
                start_byte: node.start_byte() as u32,
                end_byte: node.end_byte() as u32,
            });
        });
        out
    }
}

/// `./foo` and `../../foo` are relative specifiers in the JS/TS module
/// convention; bare specifiers (`react`, `@scope/pkg`) are absolute (level 0).
fn relative_level(spec: String) -> (String, u32) {
    if let Some(rest) = spec.strip_prefix("./") {
        return (rest.to_string(), 1);
    }
    let mut level = 0u32;
    let mut rest = spec.as_str();
    while let Some(stripped) = rest.strip_prefix("../") {
        level += 1;
        rest = stripped;
    }
    if level > 0 {
        (rest.to_string(), level)
    } else {
        (spec, 0)
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

fn collect_pattern_names(
    node: Node,
    text: &str,
    kind: SymbolKindTag,
    ids: &HashMap<usize, u32>,
    out: &mut Vec<SymbolDefDesc>,
) {
    match node.kind() {
        "identifier" => out.push(def(node, text, kind, ids)),
        "object_pattern" | "array_pattern" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_pattern_names(child, text, kind, ids, out);
            }
        }
        "shorthand_property_identifier_pattern" => out.push(def(node, text, kind, ids)),
        "pair_pattern" => {
            if let Some(value) = node.child_by_field_name("value") {
                collect_pattern_names(value, text, kind, ids, out);
            }
        }
        "assignment_pattern" => {
            if let Some(left) = node.child_by_field_name("left") {
                collect_pattern_names(left, text, kind, ids, out);
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
    fn parses_simple_program() {
        let adapter = TypeScriptAdapter::typescript();
        let tree = adapter.parse("function f(x: number) { return x + 1; }\n").unwrap();
        let scopes = adapter.iter_scope_nodes(&tree);
        assert!(scopes.iter().any(|s| s.kind == ScopeKindTag::Module));
        assert!(scopes.iter().any(|s| s.kind == ScopeKindTag::Function));
    }

    #[test]
    fn long_parameter_list_counts_params() {
        let adapter = TypeScriptAdapter::typescript();
        let text = "function f(a: number, b: number, c: number, d: number, e: number, g: number) {}\n";
        let tree = adapter.parse(text).unwrap();
        let defs = adapter.iter_symbol_defs(&tree, text);
        let params: Vec<_> = defs.iter().filter(|d| d.kind == SymbolKindTag::Param).collect();
        assert_eq!(params.len(), 6);
    }

    #[test]
    fn import_binds_and_is_used() {
        let adapter = TypeScriptAdapter::typescript();
        let text = "import { readFile } from 'fs';\nreadFile('x');\n";
        let tree = adapter.parse(text).unwrap();
        let defs = adapter.iter_symbol_defs(&tree, text);
        assert!(defs.iter().any(|d| d.name == "readFile" && d.kind == SymbolKindTag::Import));
        let refs = adapter.iter_identifier_refs(&tree, text);
        assert!(refs.iter().any(|r| r.name == "readFile"));
    }

    #[test]
    fn javascript_dialect_parses() {
        let adapter = TypeScriptAdapter::javascript();
        assert_eq!(adapter.language_id(), "javascript");
        let tree = adapter.parse("const x = 1;\n").unwrap();
        let defs = adapter.iter_symbol_defs(&tree, "const x = 1;\n");
        assert!(defs.iter().any(|d| d.name == "x" && d.kind == SymbolKindTag::Local));
    }

    #[test]
    fn relative_import_level() {
        assert_eq!(relative_level("./util".to_string()), ("util".to_string(), 1));
        assert_eq!(relative_level("../../pkg".to_string()), ("pkg".to_string(), 2));
        assert_eq!(relative_level("react".to_string()), ("react".to_string(), 0));
    }
}
