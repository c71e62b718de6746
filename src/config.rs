//! Configuration module for the analysis engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - Caller overrides (`RunConfig`, applied last, by the Validation Service)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `ANALYZER_` and use double
//! underscores to separate nested levels:
//! - `ANALYZER_ENGINE__PARALLELISM=8` sets `engine.parallelism`
//! - `ANALYZER_LOGGING__DEFAULT=debug` sets `logging.default`

use std::collections::HashMap;
use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::finding::Severity;

/// The engine's internal layered configuration tree. Distinct from the
/// caller-facing `RunConfig`: `Settings` is what the figment chain produces;
/// `RunConfig` (below) is what a `validate_paths`/`validate_project` caller
/// passes in for a single run and is merged on top.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub languages: HashMap<String, LanguageSettings>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineSettings {
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    #[serde(default = "default_timeout_ms")]
    pub per_file_timeout_ms: u64,

    #[serde(default)]
    pub exclude_globs: Vec<String>,

    #[serde(default = "default_true")]
    pub enable_project_graph: bool,

    #[serde(default = "default_profile")]
    pub profile_name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LanguageSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub external_namespaces: Vec<String>,
}

/// Logging configuration: default level plus per-module overrides, read by
/// `crate::logging::init_with_config`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_parallelism() -> usize {
    num_cpus::get()
}
fn default_timeout_ms() -> u64 {
    5_000
}
fn default_true() -> bool {
    true
}
fn default_profile() -> String {
    "default".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            logging: LoggingConfig::default(),
            languages: default_languages(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            per_file_timeout_ms: default_timeout_ms(),
            exclude_globs: vec![
                "target/**".to_string(),
                "node_modules/**".to_string(),
                ".git/**".to_string(),
                "dist/**".to_string(),
                "build/**".to_string(),
            ],
            enable_project_graph: true,
            profile_name: default_profile(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

fn default_languages() -> HashMap<String, LanguageSettings> {
    let mut langs = HashMap::new();
    langs.insert(
        "python".to_string(),
        LanguageSettings {
            enabled: true,
            external_namespaces: vec![
                "os", "sys", "re", "json", "typing", "collections", "itertools", "functools",
                "pathlib", "abc", "asyncio", "logging", "dataclasses", "requests", "numpy",
                "pandas", "pytest",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        },
    );
    langs.insert(
        "typescript".to_string(),
        LanguageSettings {
            enabled: true,
            external_namespaces: vec![
                "react", "react-dom", "lodash", "express", "fs", "path", "node:fs", "node:path",
                "vue", "rxjs",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        },
    );
    langs.insert(
        "javascript".to_string(),
        LanguageSettings {
            enabled: true,
            external_namespaces: vec!["react", "lodash", "express", "fs", "path"]
                .into_iter()
                .map(String::from)
                .collect(),
        },
    );
    langs
}

impl Settings {
    /// Load configuration with only the default→env layers (no file layer).
    pub fn load() -> Result<Self, EngineError> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed("ANALYZER_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(|e| EngineError::ConfigError {
                reason: e.to_string(),
            })
    }

    /// Load configuration from a specific TOML file, layered under env overrides.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, EngineError> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ANALYZER_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(|e| EngineError::ConfigError {
                reason: e.to_string(),
            })
    }
}

/// The public, caller-supplied configuration for one analysis run (§6).
///
/// Fields left as `None`/empty fall back to whatever `Settings` loaded;
/// fields set here win — this is the last layer merged, applied by
/// `crate::service::ValidationService` on top of the loaded `Settings`.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub profile_name: Option<String>,
    pub languages: Option<Vec<String>>,
    pub exclude_globs: Vec<String>,
    pub rule_overrides: HashMap<String, RuleOverride>,
    pub parallelism: Option<usize>,
    pub per_file_timeout_ms: Option<u64>,
    pub enable_project_graph: Option<bool>,
    pub external_namespace_lists: HashMap<String, Vec<String>>,
}

/// Per-rule override: a severity override and/or rule-specific config values.
#[derive(Debug, Clone, Default)]
pub struct RuleOverride {
    pub severity: Option<Severity>,
    pub config: HashMap<String, ConfigValue>,
}

/// A scalar configuration value passed to a rule via `RuleContext.config`.
/// Kept as a small closed enum (rather than `serde_json::Value`) so the
/// common per-rule config reads stay allocation-free on the hot path.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    StrList(Vec<String>),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl RunConfig {
    /// Resolved profile name: caller override, else the loaded Settings default.
    pub fn resolved_profile_name(&self, settings: &Settings) -> String {
        self.profile_name
            .clone()
            .unwrap_or_else(|| settings.engine.profile_name.clone())
    }

    pub fn resolved_parallelism(&self, settings: &Settings) -> usize {
        self.parallelism.unwrap_or(settings.engine.parallelism).max(1)
    }

    pub fn resolved_timeout_ms(&self, settings: &Settings) -> u64 {
        self.per_file_timeout_ms
            .unwrap_or(settings.engine.per_file_timeout_ms)
    }

    pub fn resolved_enable_project_graph(&self, settings: &Settings) -> bool {
        self.enable_project_graph
            .unwrap_or(settings.engine.enable_project_graph)
    }

    pub fn resolved_exclude_globs(&self, settings: &Settings) -> Vec<String> {
        let mut globs = settings.engine.exclude_globs.clone();
        globs.extend(self.exclude_globs.iter().cloned());
        globs
    }

    pub fn resolved_namespaces_for(&self, settings: &Settings, language: &str) -> Vec<String> {
        if let Some(list) = self.external_namespace_lists.get(language) {
            return list.clone();
        }
        settings
            .languages
            .get(language)
            .map(|l| l.external_namespaces.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_has_positive_parallelism() {
        let settings = Settings::default();
        assert!(settings.engine.parallelism > 0);
        assert!(settings.languages.contains_key("python"));
    }

    #[test]
    fn load_from_toml_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("analyzer.toml");

        let toml_content = r#"
[engine]
parallelism = 4
per_file_timeout_ms = 1000
profile_name = "alpha_default"

[logging]
default = "debug"
"#;
        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.engine.parallelism, 4);
        assert_eq!(settings.engine.per_file_timeout_ms, 1000);
        assert_eq!(settings.engine.profile_name, "alpha_default");
        assert_eq!(settings.logging.default, "debug");
        // Untouched defaults survive
        assert!(settings.engine.enable_project_graph);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("analyzer.toml");
        fs::write(&config_path, "engine = [this is not valid").unwrap();

        let result = Settings::load_from(&config_path);
        assert!(matches!(result, Err(EngineError::ConfigError { .. })));
    }

    #[test]
    fn run_config_overrides_win_over_settings() {
        let settings = Settings::default();
        let mut run_config = RunConfig::default();
        run_config.parallelism = Some(2);
        run_config.profile_name = Some("alpha_default".to_string());

        assert_eq!(run_config.resolved_parallelism(&settings), 2);
        assert_eq!(run_config.resolved_profile_name(&settings), "alpha_default");
    }
}
