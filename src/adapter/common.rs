//! Tree-sitter traversal helpers shared by the reference adapters.
//!
//! Scope ids are assigned by pre-order position among nodes a `classify`
//! predicate recognizes as scope boundaries. Because that pre-order walk is
//! a pure function of the tree, `iter_scope_nodes` and the def/ref/import
//! walkers agree on the same ids without passing state between calls.

use std::collections::HashMap;

use tree_sitter::Node;

use super::ScopeKindTag;

pub fn collect_scope_nodes<'a>(
    root: Node<'a>,
    classify: impl Fn(&Node) -> Option<ScopeKindTag> + Copy,
) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    collect_scope_nodes_rec(root, classify, &mut out);
    out
}

fn collect_scope_nodes_rec<'a>(
    node: Node<'a>,
    classify: impl Fn(&Node) -> Option<ScopeKindTag> + Copy,
    out: &mut Vec<Node<'a>>,
) {
    if classify(&node).is_some() {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_scope_nodes_rec(child, classify, out);
    }
}

pub fn scope_id_map(scope_nodes: &[Node]) -> HashMap<usize, u32> {
    scope_nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id(), i as u32))
        .collect()
}

/// Nearest enclosing scope id for `node`, walking up through `node` itself.
pub fn enclosing_scope_id(node: Node, scope_id_of: &HashMap<usize, u32>) -> Option<u32> {
    let mut cur = Some(node);
    while let Some(n) = cur {
        if let Some(id) = scope_id_of.get(&n.id()) {
            return Some(*id);
        }
        cur = n.parent();
    }
    None
}

pub fn node_text<'a>(node: Node, text: &'a str) -> &'a str {
    &text[node.byte_range()]
}

/// Walk the whole tree, invoking `visit` on every node. Order is pre-order,
/// matching `collect_scope_nodes`.
pub fn walk(root: Node, visit: &mut impl FnMut(Node)) {
    visit(root);
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        walk(child, visit);
    }
}
