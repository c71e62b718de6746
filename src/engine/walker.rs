//! File discovery for a run (§4.5 step 1), grounded on the teacher crate's
//! `indexing::walker::FileWalker`: same `ignore`-crate configuration
//! (gitignore/global-gitignore/`.git/info/exclude`, hidden entries skipped,
//! override-glob layering), generalized from a fixed `Language` enum to
//! `AdapterRegistry::language_for_extension` so new adapters need no walker
//! change.

use std::path::{Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::adapter::{AdapterRegistry, LanguageTag};

/// One discovered source file with its detected language.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub language: LanguageTag,
}

pub struct FileWalker<'a> {
    adapters: &'a AdapterRegistry,
    exclude_globs: Vec<String>,
}

impl<'a> FileWalker<'a> {
    pub fn new(adapters: &'a AdapterRegistry, exclude_globs: Vec<String>) -> Self {
        Self {
            adapters,
            exclude_globs,
        }
    }

    /// Walk `root`, returning every file whose extension resolves to a
    /// registered adapter. Unknown extensions are skipped silently (§6).
    pub fn walk(&self, root: &Path) -> Vec<DiscoveredFile> {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .max_depth(None)
            .require_git(false);

        let mut overrides = OverrideBuilder::new(root);
        for pattern in &self.exclude_globs {
            if let Err(e) = overrides.add(&format!("!{pattern}")) {
                tracing::warn!(target: "engine", pattern, error = %e, "invalid exclude glob, ignoring");
            }
        }
        if let Ok(overrides) = overrides.build() {
            builder.overrides(overrides);
        }

        builder
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(|entry| {
                let path = entry.path();
                let ext = path.extension()?.to_str()?;
                let language = AdapterRegistry::language_for_extension(ext)?;
                if !self.adapters.contains(language) {
                    return None;
                }
                Some(DiscoveredFile {
                    path: path.to_path_buf(),
                    language,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discovers_only_registered_languages() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.py"), "x = 1\n").unwrap();
        fs::write(root.join("b.ts"), "const x = 1;\n").unwrap();
        fs::write(root.join("README.md"), "# hi\n").unwrap();

        let adapters = AdapterRegistry::with_reference_adapters();
        let walker = FileWalker::new(&adapters, Vec::new());
        let files = walker.walk(root);

        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.path.ends_with("a.py") && f.language == "python"));
        assert!(files.iter().any(|f| f.path.ends_with("b.ts") && f.language == "typescript"));
    }

    #[test]
    fn hidden_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(".hidden.py"), "x = 1\n").unwrap();
        fs::write(root.join("visible.py"), "x = 1\n").unwrap();

        let adapters = AdapterRegistry::with_reference_adapters();
        let walker = FileWalker::new(&adapters, Vec::new());
        let files = walker.walk(root);

        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("visible.py"));
    }

    #[test]
    fn exclude_globs_are_honored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("vendor")).unwrap();
        fs::write(root.join("vendor/lib.py"), "x = 1\n").unwrap();
        fs::write(root.join("main.py"), "x = 1\n").unwrap();

        let adapters = AdapterRegistry::with_reference_adapters();
        let walker = FileWalker::new(&adapters, vec!["vendor/**".to_string()]);
        let files = walker.walk(root);

        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("main.py"));
    }
}
