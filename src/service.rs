//! The Validation Service (§4.7): the public entry point that ties
//! configuration loading, adapter/rule discovery, file walking, and the
//! rule execution engine together into `validate_paths`/`validate_project`.
//!
//! Shaped after the teacher crate's `indexing::facade::IndexFacade`: a
//! facade that owns the long-lived registries and settings, and exposes a
//! small number of entry points that do the full job in one call.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapter::AdapterRegistry;
use crate::config::{ConfigValue, RunConfig, Settings};
use crate::engine::walker::{DiscoveredFile, FileWalker};
use crate::engine::{EngineRunConfig, RuleExecutionEngine};
use crate::error::{EngineError, EngineResult};
use crate::finding::Finding;
use crate::logging;
use crate::rules::builtin::BuiltinRuleProvider;
use crate::rules::profile::Profile;
use crate::rules::registry::RuleRegistry;

/// One recoverable error recorded during a run (§7 propagation policy):
/// everything except `ConfigError`/`InvalidProfile`/explicit-`AdapterMissing`
/// is data here rather than a Rust `Result::Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunErrorEntry {
    pub kind: String,
    pub file_path: Option<String>,
    pub rule_id: Option<String>,
    pub message: String,
}

/// Per-run aggregate counts (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub per_rule_counts: HashMap<String, usize>,
    pub per_language_counts: HashMap<String, usize>,
}

/// The public output document (§6). Named `AnalysisResult` rather than
/// `Result` to avoid shadowing `std::result::Result` at every call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub findings: Vec<Finding>,
    pub files_analyzed: usize,
    pub errors: Vec<RunErrorEntry>,
    pub stats: RunStats,
    pub cancelled: bool,
}

/// Owns the long-lived adapter/rule registries and loaded settings; the
/// facade callers construct once and reuse across runs.
pub struct ValidationService {
    adapters: AdapterRegistry,
    rules: RuleRegistry,
    settings: Settings,
}

impl ValidationService {
    /// Build a service from `Settings::load()` (default→env layers, no
    /// config file) and the two built-in reference adapters/rules (§4.7.1).
    pub fn new() -> EngineResult<Self> {
        let settings = Settings::load()?;
        Self::from_settings(settings)
    }

    /// Build a service layering a TOML config file under the env overrides.
    pub fn with_config_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let settings = Settings::load_from(path)?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: Settings) -> EngineResult<Self> {
        logging::init_with_config(&settings.logging);

        let adapters = AdapterRegistry::with_reference_adapters();
        let provider = BuiltinRuleProvider;
        let rules = RuleRegistry::discover(&[&provider]);

        Ok(Self {
            adapters,
            rules,
            settings,
        })
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Analyze every file discovered under `root` (recursive walk, honoring
    /// gitignore and `run_config.exclude_globs`).
    pub fn validate_project(&self, root: &Path, run_config: &RunConfig) -> EngineResult<AnalysisResult> {
        let exclude_globs = run_config.resolved_exclude_globs(&self.settings);
        let walker = FileWalker::new(&self.adapters, exclude_globs);
        let mut files = walker.walk(root);
        self.apply_language_filter(&mut files, run_config)?;
        self.run(files, run_config, None)
    }

    /// Analyze an explicit list of paths (files and/or directories). A
    /// directory entry is walked the same way `validate_project` walks its
    /// root; a file entry is included directly if its extension resolves to
    /// a registered adapter, else skipped silently (§6).
    pub fn validate_paths(&self, paths: &[PathBuf], run_config: &RunConfig) -> EngineResult<AnalysisResult> {
        let exclude_globs = run_config.resolved_exclude_globs(&self.settings);
        let walker = FileWalker::new(&self.adapters, exclude_globs);

        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                files.extend(walker.walk(path));
            } else if let Some(language) = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(AdapterRegistry::language_for_extension)
            {
                if self.adapters.contains(language) {
                    files.push(DiscoveredFile {
                        path: path.clone(),
                        language,
                    });
                }
            }
        }

        self.apply_language_filter(&mut files, run_config)?;
        self.run(files, run_config, None)
    }

    /// Same as `validate_project`, but the run is checked against `cancel`
    /// between files (§5) and stops early — with `cancelled: true` in the
    /// result — the moment the flag is observed set.
    pub fn validate_project_cancellable(
        &self,
        root: &Path,
        run_config: &RunConfig,
        cancel: &AtomicBool,
    ) -> EngineResult<AnalysisResult> {
        let exclude_globs = run_config.resolved_exclude_globs(&self.settings);
        let walker = FileWalker::new(&self.adapters, exclude_globs);
        let mut files = walker.walk(root);
        self.apply_language_filter(&mut files, run_config)?;
        self.run(files, run_config, Some(cancel))
    }

    /// If `run_config.languages` names an explicit subset, every named
    /// language must have a registered adapter (§7 explicit `AdapterMissing`
    /// is raised synchronously here, not recorded as a data error) and the
    /// file list is filtered down to just those languages.
    fn apply_language_filter(&self, files: &mut Vec<DiscoveredFile>, run_config: &RunConfig) -> EngineResult<()> {
        let Some(languages) = &run_config.languages else {
            return Ok(());
        };

        for language in languages {
            if !self.adapters.contains(language) {
                return Err(EngineError::AdapterMissing {
                    language: language.clone(),
                });
            }
        }

        files.retain(|f| languages.iter().any(|l| l == f.language));
        Ok(())
    }

    fn run(
        &self,
        files: Vec<DiscoveredFile>,
        run_config: &RunConfig,
        cancel: Option<&AtomicBool>,
    ) -> EngineResult<AnalysisResult> {
        let profile_name = run_config.resolved_profile_name(&self.settings);
        let profile = Profile::by_name(&profile_name).ok_or_else(|| EngineError::InvalidProfile {
            name: profile_name.clone(),
        })?;
        let profile = self.apply_rule_overrides(profile, run_config);

        let rule_config = self.build_rule_config(run_config);
        let settings = &self.settings;
        let run_config_ref = run_config;
        let engine_run = EngineRunConfig {
            profile: &profile,
            parallelism: run_config.resolved_parallelism(settings),
            per_file_timeout_ms: run_config.resolved_timeout_ms(settings),
            enable_project_graph: run_config.resolved_enable_project_graph(settings),
            namespaces_for: Box::new(move |language| run_config_ref.resolved_namespaces_for(settings, language)),
            rule_config: &rule_config,
        };

        let owned_cancel = AtomicBool::new(false);
        let cancel = cancel.unwrap_or(&owned_cancel);

        let engine = RuleExecutionEngine::new(&self.adapters, &self.rules);
        let (findings, outcomes, cancelled) = engine.run(&files, &engine_run, cancel);

        let mut stats = RunStats::default();
        let mut errors = Vec::new();
        let mut files_analyzed = 0;

        for outcome in &outcomes {
            if outcome.analyzed {
                files_analyzed += 1;
            }
            for finding in &outcome.findings {
                if let Some(kind) = finding.rule_id.strip_prefix("engine.") {
                    errors.push(RunErrorEntry {
                        kind: kind.to_string(),
                        file_path: Some(finding.file_path.clone()),
                        rule_id: None,
                        message: finding.message.clone(),
                    });
                }
            }
        }

        for finding in &findings {
            *stats.per_rule_counts.entry(finding.rule_id.clone()).or_insert(0) += 1;
        }
        for file in &files {
            *stats.per_language_counts.entry(file.language.to_string()).or_insert(0) += 1;
        }

        Ok(AnalysisResult {
            findings,
            files_analyzed,
            errors,
            stats,
            cancelled,
        })
    }

    /// Layer `run_config.rule_overrides`' severity half on top of the
    /// resolved profile (the config half is applied per-rule in
    /// `build_rule_config`, read by each rule via `RuleContext::config_*`).
    fn apply_rule_overrides(&self, mut profile: Profile, run_config: &RunConfig) -> Profile {
        for (rule_id, rule_override) in &run_config.rule_overrides {
            if let Some(severity) = rule_override.severity {
                profile.severity_overrides.insert(rule_id.clone(), severity);
            }
        }
        profile
    }

    fn build_rule_config(&self, run_config: &RunConfig) -> HashMap<String, HashMap<String, ConfigValue>> {
        run_config
            .rule_overrides
            .iter()
            .map(|(rule_id, rule_override)| (rule_id.clone(), rule_override.config.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn validate_project_finds_unused_import() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "import os\nprint(\"hi\")\n").unwrap();

        let service = ValidationService::new().unwrap();
        let run_config = RunConfig::default();
        let result = service.validate_project(dir.path(), &run_config).unwrap();

        assert_eq!(result.files_analyzed, 1);
        assert!(result.findings.iter().any(|f| f.rule_id == "imports.unused"));
        assert!(!result.cancelled);
    }

    #[test]
    fn validate_paths_skips_unregistered_extensions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

        let service = ValidationService::new().unwrap();
        let run_config = RunConfig::default();
        let paths = vec![dir.path().join("a.py"), dir.path().join("notes.txt")];
        let result = service.validate_paths(&paths, &run_config).unwrap();

        assert_eq!(result.files_analyzed, 1);
    }

    #[test]
    fn unknown_profile_name_is_an_engine_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        let service = ValidationService::new().unwrap();
        let mut run_config = RunConfig::default();
        run_config.profile_name = Some("nonexistent".to_string());

        let result = service.validate_project(dir.path(), &run_config);
        assert!(matches!(result, Err(EngineError::InvalidProfile { .. })));
    }

    #[test]
    fn explicit_language_filter_rejects_unregistered_language() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        let service = ValidationService::new().unwrap();
        let mut run_config = RunConfig::default();
        run_config.languages = Some(vec!["rust".to_string()]);

        let result = service.validate_project(dir.path(), &run_config);
        assert!(matches!(result, Err(EngineError::AdapterMissing { .. })));
    }

    #[test]
    fn s3_missing_import_is_flagged_as_error_severity() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("c.py"), "from nowhere import x\n").unwrap();

        let service = ValidationService::new().unwrap();
        let mut run_config = RunConfig::default();
        run_config.profile_name = Some("alpha_default".to_string());
        let result = service.validate_project(dir.path(), &run_config).unwrap();

        let missing: Vec<&Finding> = result
            .findings
            .iter()
            .filter(|f| f.rule_id == "imports.missing_file_target")
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].severity, Severity::Error);
        assert!(missing[0].meta.get("tried_paths").is_some());
    }

    #[test]
    fn s4_long_parameter_list_is_flagged_in_typescript() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("d.ts"),
            "function f(a:number,b:number,c:number,d:number,e:number,f:number){}\n",
        )
        .unwrap();

        let service = ValidationService::new().unwrap();
        let run_config = RunConfig::default();
        let result = service.validate_project(dir.path(), &run_config).unwrap();

        let long_list: Vec<&Finding> = result
            .findings
            .iter()
            .filter(|f| f.rule_id == "complexity.long_parameter_list")
            .collect();
        assert_eq!(long_list.len(), 1);
        assert_eq!(long_list[0].meta.get("param_count").and_then(|v| v.as_i64()), Some(6));
        assert_eq!(long_list[0].severity, Severity::Info);
    }
}
