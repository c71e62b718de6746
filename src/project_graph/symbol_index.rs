//! Cross-file symbol index (§4.4 step 2).

use indexmap::IndexMap;

use crate::adapter::SymbolKindTag;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    pub file_path: String,
    pub name: String,
    pub kind: SymbolKindTag,
    pub start_byte: u32,
    pub end_byte: u32,
}

/// Top-level symbols across every analyzed file, keyed by name.
///
/// `IndexMap` preserves insertion order, which after the builder's canonical
/// sort pass (file path, then byte offset) gives deterministic iteration
/// regardless of the thread that happened to finish parsing a file first.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    by_name: IndexMap<String, Vec<SymbolEntry>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: SymbolEntry) {
        self.by_name.entry(entry.name.clone()).or_default().push(entry);
    }

    /// Finalize insertion order: sort each name's entries, and the map
    /// itself, by `(file_path, start_byte)` so the result is independent of
    /// rayon scheduling.
    pub fn freeze(&mut self) {
        for entries in self.by_name.values_mut() {
            entries.sort_by(|a, b| (&a.file_path, a.start_byte).cmp(&(&b.file_path, b.start_byte)));
        }
        self.by_name
            .sort_by(|a_name, _, b_name, _| a_name.cmp(b_name));
    }

    pub fn by_name(&self, name: &str) -> &[SymbolEntry] {
        self.by_name.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn by_kind(&self, kind: SymbolKindTag) -> impl Iterator<Item = &SymbolEntry> {
        self.by_name
            .values()
            .flatten()
            .filter(move |e| e.kind == kind)
    }

    pub fn in_file<'a>(&'a self, file_path: &'a str) -> impl Iterator<Item = &'a SymbolEntry> {
        self.by_name
            .values()
            .flatten()
            .filter(move |e| e.file_path == file_path)
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_sorts_entries_deterministically() {
        let mut index = SymbolIndex::new();
        index.insert(SymbolEntry {
            file_path: "b.py".into(),
            name: "run".into(),
            kind: SymbolKindTag::Function,
            start_byte: 0,
            end_byte: 3,
        });
        index.insert(SymbolEntry {
            file_path: "a.py".into(),
            name: "run".into(),
            kind: SymbolKindTag::Function,
            start_byte: 0,
            end_byte: 3,
        });
        index.freeze();
        let entries = index.by_name("run");
        assert_eq!(entries[0].file_path, "a.py");
        assert_eq!(entries[1].file_path, "b.py");
    }
}
