//! `imports.unused` — unused import, grounded on
//! `examples/original_source/server/rules/imports_unused.py`.
//!
//! Simplified from the original's per-language destructured-import surgery
//! (partial removal from a multi-name `{ a, b }` import) to whole-line
//! removal; a multi-name import still gets flagged, just without a
//! finer-grained autofix.

use crate::adapter::SymbolKindTag;
use crate::finding::{Edit, Finding, Severity};
use crate::rules::{AutofixSafety, Priority, Requires, Rule, RuleContext, RuleMeta, Tier};

pub struct ImportsUnusedRule {
    meta: RuleMeta,
}

impl ImportsUnusedRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta {
                id: "imports.unused",
                category: "imports",
                tier: Tier::Scopes,
                priority: Priority::P2,
                autofix_safety: AutofixSafety::Safe,
                description: "Unused import; remove to clean up namespace",
                langs: &["python", "typescript", "javascript"],
            },
        }
    }
}

impl Default for ImportsUnusedRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ImportsUnusedRule {
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

        scopes
            .iter_symbols_of_kind(SymbolKindTag::Import)
            .filter(|symbol| !scopes.has_refs_to(symbol))
            .map(|symbol| {
                let autofix = whole_line_removal(ctx.text, symbol.start_byte);
                Finding::new(
                    self.meta.id,
                    format!("'{}' is imported but never used in this file", symbol.name),
                    ctx.file_path,
                    crate::span::Span::new(symbol.start_byte, symbol.end_byte),
                    Severity::Info,
                )
                .with_autofix(autofix)
                .with_meta("symbol_name", symbol.name.clone())
                .with_meta("language", ctx.language)
            })
            .collect()
    }
}

fn whole_line_removal(text: &str, byte: u32) -> Vec<Edit> {
    let byte = byte as usize;
    let line_start = text[..byte].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let mut line_end = text[byte..].find('\n').map(|i| byte + i).unwrap_or(text.len());
    if line_end < text.len() {
        line_end += 1; // consume the trailing newline too
    }
    vec![Edit::new(line_start as u32, line_end as u32, "")]
}
