//! End-to-end scenarios S1-S6 and a handful of the round-trip properties
//! from the crate's testable-properties list, driven entirely through the
//! public `ValidationService` API.

use std::fs;

use lintgraph::config::RunConfig;
use lintgraph::finding::Severity;
use lintgraph::service::ValidationService;
use tempfile::TempDir;

#[test]
fn s1_unused_import() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "import os\nprint(\"hi\")\n").unwrap();

    let service = ValidationService::new().unwrap();
    let result = service.validate_project(dir.path(), &RunConfig::default()).unwrap();

    let hits: Vec<_> = result.findings.iter().filter(|f| f.rule_id == "imports.unused").collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].severity, Severity::Info);
    let autofix = hits[0].autofix.as_ref().unwrap();
    assert_eq!(autofix.len(), 1);
    assert_eq!(autofix[0].start_byte, 0);
}

#[test]
fn s2_duplicate_definition() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("b.py"), "def foo(): return 1\ndef foo(): return 2\n").unwrap();

    let service = ValidationService::new().unwrap();
    let result = service.validate_project(dir.path(), &RunConfig::default()).unwrap();

    let hits: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.rule_id == "ident.duplicate_definition")
        .collect();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].message.contains("also at line"));
    assert!(hits[1].message.contains("already defined at line 1"));
}

#[test]
fn s3_missing_import_target() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("c.py"), "from nowhere import x\n").unwrap();

    let service = ValidationService::new().unwrap();
    let mut run_config = RunConfig::default();
    run_config.profile_name = Some("alpha_default".to_string());
    let result = service.validate_project(dir.path(), &run_config).unwrap();

    let hits: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.rule_id == "imports.missing_file_target")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].severity, Severity::Error);
    let tried = hits[0].meta.get("tried_paths").and_then(|v| v.as_array()).unwrap();
    assert!(!tried.is_empty());
}

#[test]
fn s4_long_parameter_list() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("d.ts"),
        "function f(a:number,b:number,c:number,d:number,e:number,f:number){}\n",
    )
    .unwrap();

    let service = ValidationService::new().unwrap();
    let result = service.validate_project(dir.path(), &RunConfig::default()).unwrap();

    let hits: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.rule_id == "complexity.long_parameter_list")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].meta.get("param_count").and_then(|v| v.as_i64()), Some(6));
    assert_eq!(hits[0].severity, Severity::Info);
}

#[test]
fn s5_cross_file_term_consistency() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "def get_user(id):\n    return id\n").unwrap();
    fs::write(dir.path().join("b.py"), "def fetch_user(id):\n    return id\n").unwrap();
    fs::write(dir.path().join("c.py"), "def load_user(id):\n    return id\n").unwrap();

    let service = ValidationService::new().unwrap();
    let mut run_config = RunConfig::default();
    run_config.profile_name = Some("alpha_default".to_string());
    let result = service.validate_project(dir.path(), &run_config).unwrap();

    let hits: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.rule_id == "naming.project_term_inconsistency")
        .collect();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|f| f.message.contains("use 'get'")));
    assert!(!hits.iter().any(|f| f.file_path.ends_with("a.py")));
    assert!(hits.iter().any(|f| f.file_path.ends_with("b.py")));
    assert!(hits.iter().any(|f| f.file_path.ends_with("c.py")));
}

#[test]
fn s6_parse_failure_is_isolated() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("e.py"), "def broken(:\n").unwrap();
    fs::write(dir.path().join("ok.py"), "x = 1\n").unwrap();

    let service = ValidationService::new().unwrap();
    let result = service.validate_project(dir.path(), &RunConfig::default()).unwrap();

    assert!(result
        .findings
        .iter()
        .any(|f| f.rule_id == "engine.parse_error" && f.file_path.ends_with("e.py")));
    assert!(!result.findings.iter().any(|f| f.file_path.ends_with("ok.py")));
    assert_eq!(result.files_analyzed, 1);
    assert!(result.errors.iter().any(|e| e.kind == "parse_error"));
}

#[test]
fn determinism_across_repeated_runs() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "import os\nimport sys\nprint(sys.argv)\n").unwrap();
    fs::write(dir.path().join("b.py"), "def dup(): pass\ndef dup(): pass\n").unwrap();

    let service = ValidationService::new().unwrap();
    let run_config = RunConfig::default();

    let first = service.validate_project(dir.path(), &run_config).unwrap();
    let second = service.validate_project(dir.path(), &run_config).unwrap();

    let key = |f: &lintgraph::finding::Finding| (f.rule_id.clone(), f.file_path.clone(), f.span, f.message.clone());
    let first_keys: Vec<_> = first.findings.iter().map(key).collect();
    let second_keys: Vec<_> = second.findings.iter().map(key).collect();
    assert_eq!(first_keys, second_keys);
    assert_eq!(first.files_analyzed, second.files_analyzed);
}

#[test]
fn dedup_is_idempotent_when_a_rule_would_emit_the_same_finding_twice() {
    // imports.unused visiting the same unused import in the same run
    // cannot itself double-emit, but the dedup step is exercised directly
    // here against a hand-built duplicate pair through the public
    // re-export to confirm the property holds outside the engine's
    // internal unit tests too.
    use lintgraph::finding::Finding;
    use lintgraph::span::Span;

    let findings = vec![
        Finding::new("r", "m", "a.py", Span::new(0, 1), Severity::Warning),
        Finding::new("r", "m", "a.py", Span::new(0, 1), Severity::Warning),
    ];
    let profile = lintgraph::rules::profile::Profile::default_profile();
    let once = lintgraph::engine::dedup::finalize(findings, &profile);
    let once_keys: Vec<_> = once.iter().map(Finding::dedup_key).collect();

    let twice = lintgraph::engine::dedup::finalize(once, &profile);
    let twice_keys: Vec<_> = twice.iter().map(Finding::dedup_key).collect();

    assert_eq!(once_keys, twice_keys);
}
