//! The finding & edit data model: a single diagnostic and its optional fix.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Severity of a Finding. The source material this crate is grounded on
/// used both `warn` and `warning` in different rules; this crate
/// normalizes to exactly these three values everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

/// One atomic text replacement. An edit list on a Finding is disjoint and
/// sorted by `start_byte`; applying them left-to-right yields the fixed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub start_byte: u32,
    pub end_byte: u32,
    pub replacement: String,
}

impl Edit {
    pub fn new(start_byte: u32, end_byte: u32, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start_byte, self.end_byte)
    }
}

/// Apply a sorted, disjoint list of edits to `text`, producing the fixed buffer.
///
/// Edits are applied left to right; callers are expected to have already
/// sorted and deduplicated the list (the engine never reorders a rule's
/// own edit list).
pub fn apply_edits(text: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;

    for edit in edits {
        let start = edit.start_byte as usize;
        let end = edit.end_byte as usize;
        out.push_str(&text[cursor..start]);
        out.push_str(&edit.replacement);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Free-form extra metadata attached to a Finding (suggestions, diff
/// previews, counts). Kept as a `BTreeMap` over `serde_json::Value` so
/// iteration order is stable for the determinism property in the spec.
pub type FindingMeta = BTreeMap<String, serde_json::Value>;

/// A single diagnostic emitted by a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub message: String,
    pub file_path: String,
    pub span: Span,
    pub severity: Severity,
    pub autofix: Option<Vec<Edit>>,
    #[serde(default)]
    pub meta: FindingMeta,
}

impl Finding {
    pub fn new(
        rule_id: impl Into<String>,
        message: impl Into<String>,
        file_path: impl Into<String>,
        span: Span,
        severity: Severity,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            message: message.into(),
            file_path: file_path.into(),
            span,
            severity,
            autofix: None,
            meta: FindingMeta::new(),
        }
    }

    pub fn with_autofix(mut self, edits: Vec<Edit>) -> Self {
        self.autofix = Some(edits);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// `(rule_id, file_path, start_byte, end_byte, message)` — the dedup key from §4.6.
    pub fn dedup_key(&self) -> (String, String, u32, u32, String) {
        (
            self.rule_id.clone(),
            self.file_path.clone(),
            self.span.start_byte,
            self.span.end_byte,
            self.message.clone(),
        )
    }

    /// True when the engine's per-Finding invariant (§4.5) holds for a file of `len` bytes.
    pub fn is_well_formed_for(&self, file_path: &str, len: usize) -> bool {
        self.file_path == file_path && self.span.is_valid_for(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_edits_deletes_a_line() {
        let text = "import os\nprint(\"hi\")\n";
        let edits = vec![Edit::new(0, 10, "")];
        let fixed = apply_edits(text, &edits);
        assert_eq!(fixed, "print(\"hi\")\n");
    }

    #[test]
    fn apply_edits_preserves_length_delta() {
        let text = "aXXXb";
        let edits = vec![Edit::new(1, 4, "Y")];
        let fixed = apply_edits(text, &edits);
        let delta: i64 = edits
            .iter()
            .map(|e| e.replacement.len() as i64 - (e.end_byte - e.start_byte) as i64)
            .sum();
        assert_eq!(fixed.len() as i64, text.len() as i64 + delta);
        assert_eq!(fixed, "aYb");
    }

    #[test]
    fn dedup_key_distinguishes_span() {
        let a = Finding::new("r", "m", "f.py", Span::new(0, 1), Severity::Info);
        let b = Finding::new("r", "m", "f.py", Span::new(0, 2), Severity::Info);
        assert_ne!(a.dedup_key(), b.dedup_key());
    }
}
