//! Rule execution engine (§4.5): the orchestrator that turns a set of
//! discovered files, a rule registry, and a profile into a deduplicated
//! `Vec<Finding>`, tolerating per-file parse failures, per-rule crashes, and
//! per-file timeouts without losing the rest of the run.
//!
//! Concurrency shape is grounded on the teacher crate's
//! `indexing::pipeline` module: a `rayon` worker pool for per-file fan-out
//! (same idiom as `project_graph::builder::ProjectGraphBuilder`), and a
//! scoped thread plus `crossbeam_channel::recv_timeout` for the one place a
//! hard deadline is needed — bounding a single file's rule visits.

pub mod dedup;
pub mod walker;

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::warn;

use crate::adapter::AdapterRegistry;
use crate::config::ConfigValue;
use crate::engine::walker::DiscoveredFile;
use crate::finding::{Finding, Severity};
use crate::project_graph::{ProjectGraph, ProjectGraphBuilder};
use crate::rules::profile::Profile;
use crate::rules::registry::RuleRegistry;
use crate::rules::{Requires, Rule, RuleContext};
use crate::scopes::{build_scopes, ScopeGraph};
use crate::span::Span;

/// Per-file outcome: the findings a file produced plus whether it read
/// cleanly, parsed cleanly, and ran to completion within its timeout.
pub struct FileOutcome {
    pub file_path: String,
    pub findings: Vec<Finding>,
    pub analyzed: bool,
}

/// Everything one engine run needs beyond the discovered file list:
/// the selected profile, the languages' external-namespace lists (used only
/// when the project graph is built), per-rule config overrides, parallelism,
/// and the per-file timeout.
pub struct EngineRunConfig<'a> {
    pub profile: &'a Profile,
    pub parallelism: usize,
    pub per_file_timeout_ms: u64,
    pub enable_project_graph: bool,
    pub namespaces_for: Box<dyn Fn(&str) -> Vec<String> + Sync + 'a>,
    pub rule_config: &'a HashMap<String, HashMap<String, ConfigValue>>,
}

/// The rule execution engine (§4.5).
pub struct RuleExecutionEngine<'a> {
    adapters: &'a AdapterRegistry,
    rules: &'a RuleRegistry,
}

impl<'a> RuleExecutionEngine<'a> {
    pub fn new(adapters: &'a AdapterRegistry, rules: &'a RuleRegistry) -> Self {
        Self { adapters, rules }
    }

    /// Run the engine over `files`, honoring `cancel` between files (§5
    /// "cancellation is checked between files, never mid-rule"). Returns the
    /// deduplicated findings plus per-file outcomes for the caller
    /// (`crate::service::ValidationService`) to build its `Result` document
    /// from, plus whether the run was cancelled early.
    pub fn run(
        &self,
        files: &[DiscoveredFile],
        run: &EngineRunConfig,
        cancel: &AtomicBool,
    ) -> (Vec<Finding>, Vec<FileOutcome>, bool) {
        // Step 1: select rules whose profile membership and `meta.langs`
        // intersect the languages actually present in this run.
        let languages_present: std::collections::HashSet<&str> =
            files.iter().map(|f| f.language).collect();

        let selected: Vec<Arc<dyn Rule>> = self
            .rules
            .all()
            .into_iter()
            .filter(|r| run.profile.selects(r.meta()))
            .filter(|r| r.meta().langs.iter().any(|l| languages_present.contains(l)))
            .collect();

        // Step 2: capability union per language, and project graph
        // construction up front if any selected rule for a present language
        // needs it.
        let need_project_graph = run.enable_project_graph
            && selected.iter().any(|r| {
                r.requires().project_graph && r.meta().langs.iter().any(|l| languages_present.contains(l))
            });

        let project_graph = if need_project_graph {
            Some(self.build_project_graph(files, run))
        } else {
            None
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(run.parallelism.max(1))
            .build()
            .expect("building a bounded rayon pool should not fail");

        let outcomes: Mutex<Vec<FileOutcome>> = Mutex::new(Vec::with_capacity(files.len()));
        let cancelled_mid_run = AtomicBool::new(false);

        pool.install(|| {
            files.par_iter().for_each(|file| {
                if cancel.load(Ordering::SeqCst) {
                    cancelled_mid_run.store(true, Ordering::SeqCst);
                    return;
                }

                let file_rules: Vec<&Arc<dyn Rule>> = selected
                    .iter()
                    .filter(|r| r.meta().langs.contains(&file.language))
                    .collect();

                let outcome = self.analyze_file(file, &file_rules, project_graph.as_ref(), run);
                outcomes.lock().push(outcome);
            });
        });

        let outcomes = outcomes.into_inner();
        let cancelled = cancelled_mid_run.load(Ordering::SeqCst);

        let all_findings: Vec<Finding> = outcomes.iter().flat_map(|o| o.findings.clone()).collect();
        let finalized = dedup::finalize(all_findings, run.profile);

        (finalized, outcomes, cancelled)
    }

    fn build_project_graph(&self, files: &[DiscoveredFile], run: &EngineRunConfig) -> ProjectGraph {
        let file_texts: Vec<(String, crate::adapter::LanguageTag, String)> = files
            .iter()
            .filter_map(|f| {
                let text = fs::read_to_string(&f.path).ok()?;
                Some((f.path.to_string_lossy().into_owned(), f.language, text))
            })
            .collect();

        let builder = ProjectGraphBuilder::new(self.adapters);
        builder.build(&file_texts, |language| (run.namespaces_for)(language))
    }

    /// Analyze one file: parse, conditionally build scopes, run each
    /// applicable rule under a per-file timeout and crash isolation,
    /// validate the per-finding invariant, and return the result.
    fn analyze_file(
        &self,
        file: &DiscoveredFile,
        file_rules: &[&Arc<dyn Rule>],
        project_graph: Option<&ProjectGraph>,
        run: &EngineRunConfig,
    ) -> FileOutcome {
        let path_str = file.path.to_string_lossy().into_owned();

        let text = match fs::read_to_string(&file.path) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %path_str, error = %e, "engine: failed to read file, skipping");
                return FileOutcome {
                    file_path: path_str,
                    findings: Vec::new(),
                    analyzed: false,
                };
            }
        };

        let Some(adapter) = self.adapters.get(file.language) else {
            warn!(file = %path_str, language = file.language, "engine: no adapter registered, skipping");
            return FileOutcome {
                file_path: path_str,
                findings: Vec::new(),
                analyzed: false,
            };
        };

        let tree = match adapter.parse(&text) {
            Ok(tree) => tree,
            Err(e) => {
                let finding = Finding::new(
                    "engine.parse_error",
                    format!("failed to parse {}: {}", path_str, e.reason),
                    path_str.clone(),
                    Span::new(0, text.len() as u32),
                    adapter.default_parse_error_severity(),
                )
                .with_meta("language", file.language);
                return FileOutcome {
                    file_path: path_str,
                    findings: vec![finding],
                    analyzed: false,
                };
            }
        };

        // Tree-sitter tolerates malformed input and still hands back a
        // tree; a syntax error surfaces as an `engine.parse_error` finding
        // instead, with no rule visits for this file (S6).
        if adapter.has_syntax_error(&tree) {
            let finding = Finding::new(
                "engine.parse_error",
                format!("{path_str} contains a syntax error"),
                path_str.clone(),
                Span::new(0, text.len() as u32),
                adapter.default_parse_error_severity(),
            )
            .with_meta("language", file.language);
            return FileOutcome {
                file_path: path_str,
                findings: vec![finding],
                analyzed: false,
            };
        }

        let need_scopes = file_rules.iter().any(|r| r.requires().scopes);
        let scopes = if need_scopes {
            Some(build_scopes(adapter.as_ref(), &tree, &text))
        } else {
            None
        };

        let (findings, timed_out) = self.run_rules_with_timeout(
            file_rules,
            &path_str,
            &text,
            &tree,
            adapter.as_ref(),
            scopes.as_ref(),
            project_graph,
            run,
        );

        let mut findings = findings;
        if timed_out {
            findings = vec![Finding::new(
                "engine.file_timeout",
                format!(
                    "analysis of {} exceeded the per-file timeout ({} ms)",
                    path_str, run.per_file_timeout_ms
                ),
                path_str.clone(),
                Span::new(0, 0),
                Severity::Warning,
            )];
        }

        let file_len = text.len();
        let findings: Vec<Finding> = findings
            .into_iter()
            .filter(|f| {
                let ok = f.is_well_formed_for(&path_str, file_len);
                if !ok {
                    warn!(
                        rule_id = %f.rule_id,
                        file = %path_str,
                        "engine: dropping finding that violates the per-finding invariant"
                    );
                }
                ok
            })
            .collect();

        FileOutcome {
            file_path: path_str,
            findings,
            analyzed: !timed_out,
        }
    }

    /// Run every applicable rule for one file on a scoped worker thread,
    /// bounded by `per_file_timeout_ms`. Grounded on the teacher crate's
    /// `indexing::pipeline` channel-handoff idiom: a bounded
    /// `crossbeam_channel` plus `recv_timeout` rather than any async runtime.
    #[allow(clippy::too_many_arguments)]
    fn run_rules_with_timeout(
        &self,
        file_rules: &[&Arc<dyn Rule>],
        file_path: &str,
        text: &str,
        tree: &crate::adapter::TreeHandle,
        adapter: &dyn crate::adapter::LanguageAdapter,
        scopes: Option<&ScopeGraph>,
        project_graph: Option<&ProjectGraph>,
        run: &EngineRunConfig,
    ) -> (Vec<Finding>, bool) {
        let ctx_config: HashMap<String, ConfigValue> = HashMap::new();
        let (tx, rx) = crossbeam_channel::bounded(1);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let mut findings = Vec::new();
                for rule in file_rules {
                    let rule_config = run
                        .rule_config
                        .get(rule.meta().id)
                        .cloned()
                        .unwrap_or_default();

                    let ctx = RuleContext {
                        file_path,
                        text,
                        tree,
                        adapter,
                        scopes: resolve_scopes(rule.requires(), scopes),
                        project_graph: if rule.requires().project_graph {
                            project_graph
                        } else {
                            None
                        },
                        config: if rule_config.is_empty() { &ctx_config } else { &rule_config },
                        language: adapter.language_id(),
                    };

                    let rule_id = rule.meta().id;
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| rule.visit(&ctx)));
                    match result {
                        Ok(mut rule_findings) => findings.append(&mut rule_findings),
                        Err(_) => {
                            warn!(rule_id, file = %file_path, "engine: rule panicked, isolating and continuing");
                            findings.push(
                                Finding::new(
                                    "engine.rule_crashed",
                                    format!("rule '{rule_id}' crashed while analyzing {file_path}"),
                                    file_path,
                                    Span::new(0, 0),
                                    Severity::Warning,
                                )
                                .with_meta("crashed_rule_id", rule_id),
                            );
                        }
                    }
                }
                // Ignore a send failure: it only happens if the receiver
                // already timed out and stopped listening.
                let _ = tx.send(findings);
            });

            match rx.recv_timeout(Duration::from_millis(run.per_file_timeout_ms)) {
                Ok(findings) => (findings, false),
                Err(_) => (Vec::new(), true),
            }
        })
    }
}

/// A rule that didn't ask for scopes never sees them, even if another rule
/// for the same file forced `build_scopes` to run (§4.2 degraded-mode note:
/// `None` here is correct whenever `Requires.scopes` is false, not a bug).
fn resolve_scopes<'a>(requires: Requires, scopes: Option<&'a ScopeGraph>) -> Option<&'a ScopeGraph> {
    if requires.scopes {
        scopes
    } else {
        None
    }
}
