//! Import resolution by filesystem convention (§4.4 "Resolution rules").
//!
//! Deliberately simplified from the teacher crate's
//! `project_resolver::providers::{python,javascript}` (pyproject.toml /
//! tsconfig parsing, on-disk persistence, content hashing): this spec
//! resolves purely from project-relative path conventions plus a namespace
//! list, so the richer provider machinery has no counterpart here.

use std::collections::HashSet;

use crate::adapter::LanguageTag;
use crate::project_graph::import_graph::{ImportEdge, ImportEdgeKind};

pub struct ImportResolver;

impl ImportResolver {
    pub fn resolve(
        importing_file: &str,
        module: &str,
        level: u32,
        names: &[String],
        start_byte: u32,
        end_byte: u32,
        language: LanguageTag,
        known_files: &HashSet<String>,
        namespaces: &[String],
    ) -> ImportEdge {
        let make = |kind: ImportEdgeKind| ImportEdge {
            importing_file: importing_file.to_string(),
            module: module.to_string(),
            level,
            names: names.to_vec(),
            kind,
            start_byte,
            end_byte,
        };

        if level > 0 {
            let base = climb(dir_of(importing_file), level.saturating_sub(1));
            let rel = module_to_relpath(module);

            // `from . import name` (bare dots, no module path): each
            // imported name is itself a sibling module of the package.
            let targets: Vec<String> = if rel.is_empty() && !names.is_empty() {
                names
                    .iter()
                    .map(|n| join(&base, n))
                    .collect()
            } else {
                vec![if rel.is_empty() { base.clone() } else { join(&base, &rel) }]
            };

            let mut tried = Vec::new();
            for target in &targets {
                for candidate in candidates_for(language, target) {
                    if known_files.contains(&candidate) {
                        return make(ImportEdgeKind::ResolvedFile {
                            target_file: candidate,
                        });
                    }
                    tried.push(candidate);
                }
            }
            return make(ImportEdgeKind::Missing { tried_paths: tried });
        }

        // Absolute: search from the importing file's directory upward.
        let rel = module_to_relpath(module);
        let mut tried = Vec::new();
        let mut dir = dir_of(importing_file);
        loop {
            let target = if dir.is_empty() {
                rel.clone()
            } else {
                format!("{dir}/{rel}")
            };
            for candidate in candidates_for(language, &target) {
                if known_files.contains(&candidate) {
                    return make(ImportEdgeKind::ResolvedFile {
                        target_file: candidate,
                    });
                }
                tried.push(candidate);
            }
            if dir.is_empty() {
                break;
            }
            dir = parent(&dir);
        }

        let top_level = module.split(|c| c == '.' || c == '/').next().unwrap_or(module);
        if namespaces.iter().any(|ns| ns == top_level || ns == module) {
            return make(ImportEdgeKind::External {
                namespace: top_level.to_string(),
            });
        }

        make(ImportEdgeKind::Missing { tried_paths: tried })
    }
}

fn dir_of(file_path: &str) -> String {
    match file_path.rfind('/') {
        Some(idx) => file_path[..idx].to_string(),
        None => String::new(),
    }
}

fn parent(dir: &str) -> String {
    dir_of(dir)
}

fn join(base: &str, rel: &str) -> String {
    if base.is_empty() {
        rel.to_string()
    } else if rel.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{rel}")
    }
}

fn climb(dir: String, levels: u32) -> String {
    let mut d = dir;
    for _ in 0..levels {
        d = parent(&d);
    }
    d
}

/// `"pkg.mod"` -> `"pkg/mod"` (Python dotted names); TS/JS module
/// descriptors already arrive slash-separated from the adapter.
fn module_to_relpath(module: &str) -> String {
    module.replace('.', "/")
}

fn candidates_for(language: LanguageTag, base: &str) -> Vec<String> {
    match language {
        "python" => vec![format!("{base}.py"), format!("{base}/__init__.py")],
        "typescript" => [".ts", ".tsx", ".js", ".jsx", ".mjs"]
            .iter()
            .map(|ext| format!("{base}{ext}"))
            .chain(
                ["index.ts", "index.tsx", "index.js", "index.jsx", "index.mjs"]
                    .iter()
                    .map(|f| format!("{base}/{f}")),
            )
            .collect(),
        "javascript" => [".js", ".jsx", ".mjs", ".cjs"]
            .iter()
            .map(|ext| format!("{base}{ext}"))
            .chain(
                ["index.js", "index.jsx", "index.mjs"]
                    .iter()
                    .map(|f| format!("{base}/{f}")),
            )
            .collect(),
        _ => vec![base.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_python_import() {
        let mut known = HashSet::new();
        known.insert("pkg/util.py".to_string());
        let edge = ImportResolver::resolve(
            "pkg/main.py",
            "util",
            1,
            &[],
            0,
            5,
            "python",
            &known,
            &[],
        );
        assert!(matches!(edge.kind, ImportEdgeKind::ResolvedFile { .. }));
    }

    #[test]
    fn missing_relative_import_carries_tried_paths() {
        let known = HashSet::new();
        let edge = ImportResolver::resolve(
            "pkg/main.py",
            "does_not_exist",
            1,
            &[],
            0,
            5,
            "python",
            &known,
            &[],
        );
        match edge.kind {
            ImportEdgeKind::Missing { tried_paths } => assert_eq!(tried_paths.len(), 2),
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn external_namespace_is_recognized() {
        let known = HashSet::new();
        let namespaces = vec!["os".to_string()];
        let edge = ImportResolver::resolve(
            "pkg/main.py",
            "os",
            0,
            &[],
            0,
            3,
            "python",
            &known,
            &namespaces,
        );
        assert!(edge.is_external());
    }
}
