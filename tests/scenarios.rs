//! End-to-end repair-loop scenarios.
//!
//! Each scenario lays out a small project in a temp directory, replays the
//! test engine, discovery, and oracle from cassettes, steps a fixed clock,
//! and logs git calls instead of running git.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use mend::adapters::fixed::SteppingClock;
use mend::cassette::config::CassetteConfig;
use mend::cassette::recorder::CassetteRecorder;
use mend::config::{IntegrityViolationPolicy, MendConfig};
use mend::context::ServiceContext;
use mend::error::{BoxError, MendError};
use mend::graph::policy::UpdatePolicy;
use mend::graph::{ExecutionOutcome, RemediationOutcome};
use mend::guard::IntegrityViolation;
use mend::orchestrator::Orchestrator;
use mend::ports::git::GitRepo;

const CALC: &str = "com.example.CalcTest";

const ORIGINAL: &str = "package com.example

import org.junit.jupiter.api.Test
import org.junit.jupiter.api.Assertions.assertEquals

class CalcTest {
    @Test
    fun adds() {
        assertEquals(5, 2 + 2)
    }

    @Test
    fun divides() {
        assertEquals(2, 4 / 2)
    }
}
";

/// Git stand-in that records every call.
#[derive(Clone, Default)]
struct LoggingGit {
    calls: Arc<Mutex<Vec<String>>>,
}

impl LoggingGit {
    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl GitRepo for LoggingGit {
    fn current_commit(&self) -> Result<String, BoxError> {
        Ok("0000000".to_string())
    }

    fn add_all(&self) -> Result<(), BoxError> {
        self.log("add -A".to_string());
        Ok(())
    }

    fn add(&self, path: &str) -> Result<(), BoxError> {
        self.log(format!("add {path}"));
        Ok(())
    }

    fn status_porcelain(&self) -> Result<String, BoxError> {
        Ok(" M src/main/kotlin/Calc.kt\n".to_string())
    }

    fn commit(&self, message: &str) -> Result<(), BoxError> {
        self.log(format!("commit {message}"));
        Ok(())
    }

    fn reset_hard(&self, target: &str) -> Result<(), BoxError> {
        self.log(format!("reset --hard {target}"));
        Ok(())
    }
}

struct Project {
    _dir: tempfile::TempDir,
    root: PathBuf,
    test_file: PathBuf,
}

fn project() -> Project {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    std::fs::write(root.join("pom.xml"), "<project/>").unwrap();
    std::fs::create_dir_all(root.join("app/src/test/kotlin/com/example")).unwrap();
    std::fs::write(root.join("app/pom.xml"), "<project/>").unwrap();
    let test_file = root.join("app/src/test/kotlin/com/example/CalcTest.kt");
    std::fs::write(&test_file, ORIGINAL).unwrap();
    Project { _dir: dir, root, test_file }
}

fn red() -> Value {
    json!({"ok": {"class_name": CALC, "failures": [{
        "method": "adds",
        "message": "expected: <5> but was: <4>",
        "stacktrace": "org.opentest4j.AssertionFailedError: expected: <5> but was: <4>\n\tat com.example.CalcTest.adds(CalcTest.kt:9)"
    }]}})
}

/// What the command runner reports when the engine exits non-zero without
/// a JSON report.
fn crashed() -> Value {
    json!({"ok": {"class_name": CALC, "failures": [{
        "method": "CalcTest",
        "message": "test command exited with status 1",
        "stacktrace": "[ERROR] Failed to execute goal maven-surefire-plugin"
    }]}})
}

fn green() -> Value {
    json!({"ok": {"class_name": CALC, "failures": []}})
}

fn candidate(expected: u32) -> Value {
    let source = ORIGINAL.replace("assertEquals(5, 2 + 2)", &format!("assertEquals({expected}, 2 + 2)"));
    json!({"ok": {"updated_source": source, "raw_output": format!("```kotlin\n{source}```")}})
}

fn cassette(dir: &Path, port: &str, method: &str, outputs: Vec<Value>) -> PathBuf {
    let path = dir.join(format!("{port}.cassette.yaml"));
    let mut recorder = CassetteRecorder::new(&path, format!("scenario-{port}"), "unknown");
    for output in outputs {
        recorder.record(port, method, json!({"class_name": CALC}), output);
    }
    recorder.finish().unwrap()
}

fn discovered() -> Value {
    json!([
        {"id": "[class:com.example.CalcTest]/[method:adds()]", "name": "adds", "display_name": "adds()"},
        {"id": "[class:com.example.CalcTest]/[method:divides()]", "name": "divides", "display_name": "divides()"}
    ])
}

/// Context replaying the given runner and oracle outputs.
fn context(project: &Project, runner: Vec<Value>, oracle: Vec<Value>, git: &LoggingGit) -> ServiceContext {
    let cassettes = project.root.join(".cassettes");
    let config = CassetteConfig {
        discovery: Some(cassette(&cassettes, "discovery", "discover_methods", vec![discovered()])),
        runner: Some(cassette(&cassettes, "runner", "execute", runner)),
        oracle: Some(cassette(&cassettes, "oracle", "repair", oracle)),
        ..CassetteConfig::default()
    };
    let mut ctx = ServiceContext::replaying_from(&config).unwrap();
    ctx.clock = Box::new(SteppingClock::starting_at("2025-03-01T12:00:00Z"));
    ctx.git = Box::new(git.clone());
    ctx
}

#[tokio::test]
async fn scenario_a_second_attempt_repairs() {
    let project = project();
    let git = LoggingGit::default();
    let ctx = context(
        &project,
        vec![red(), red(), green()],
        vec![candidate(6), candidate(4)],
        &git,
    );
    let config = MendConfig::default();
    let orchestrator = Orchestrator::new(&ctx, &config, &project.root).unwrap();

    let report = orchestrator.run(&[CALC.to_string()]).await.unwrap();

    assert!(report.all_passed());
    let class = &report.classes[0];
    assert_eq!(class.attempts, 2);
    assert!(class.repaired);
    assert!(!class.rolled_back);

    let methods = &report.tree.modules[0].test_classes[0].test_methods;
    let adds = methods.iter().find(|m| m.name == "adds").unwrap();
    assert_eq!(adds.remediation_history.len(), 2);
    assert_eq!(adds.execution_history.len(), 3);
    assert_eq!(adds.last_remediation.as_ref().unwrap().outcome, RemediationOutcome::Success);
    let divides = methods.iter().find(|m| m.name == "divides").unwrap();
    assert_eq!(divides.execution_history.len(), 3);
    assert!(divides.remediation_history.is_empty());

    assert!(!git.calls().iter().any(|c| c.starts_with("reset")));
    assert!(std::fs::read_to_string(&project.test_file).unwrap().contains("assertEquals(4, 2 + 2)"));
}

#[tokio::test]
async fn scenario_b_exhausted_budget_rolls_back() {
    let project = project();
    let git = LoggingGit::default();
    let ctx = context(
        &project,
        vec![red(), red(), red(), red()],
        vec![candidate(6), candidate(7), candidate(8)],
        &git,
    );
    let config = MendConfig::default();
    let orchestrator = Orchestrator::new(&ctx, &config, &project.root).unwrap();

    let report = orchestrator.run(&[CALC.to_string()]).await.unwrap();

    assert!(!report.all_passed());
    let class = &report.classes[0];
    assert_eq!(class.attempts, 3);
    assert!(class.rolled_back);
    assert_eq!(class.remaining_failures[0].method, "adds");

    let adds = report.tree.modules[0].test_classes[0]
        .test_methods
        .iter()
        .find(|m| m.name == "adds")
        .unwrap();
    assert_eq!(adds.remediation_history.len(), 3);
    assert_eq!(adds.execution_history.len(), 4);
    assert!(adds.remediation_history.iter().all(|r| r.outcome == RemediationOutcome::Failure));

    let calls = git.calls();
    assert!(calls.iter().any(|c| c.starts_with("commit mend: checkpoint before repairing")));
    assert_eq!(calls.last().map(String::as_str), Some("reset --hard 0000000~1"));
}

#[tokio::test]
async fn class_level_failure_counts_against_every_method() {
    let project = project();
    let git = LoggingGit::default();
    let ctx = context(
        &project,
        vec![crashed(), crashed(), crashed(), crashed()],
        vec![candidate(6), candidate(7), candidate(8)],
        &git,
    );
    let config = MendConfig::default();
    let orchestrator = Orchestrator::new(&ctx, &config, &project.root).unwrap();

    let report = orchestrator.run(&[CALC.to_string()]).await.unwrap();

    assert!(!report.all_passed());
    assert!(report.classes[0].rolled_back);
    for method in &report.tree.modules[0].test_classes[0].test_methods {
        assert_eq!(method.execution_history.len(), 4, "{}", method.name);
        assert!(method.execution_history.iter().all(|r| r.outcome == ExecutionOutcome::Failure));
        assert_eq!(method.remediation_history.len(), 3, "{}", method.name);
        assert!(mend::ledger::requires_remediation(method));
    }
    assert_eq!(git.calls().last().map(String::as_str), Some("reset --hard 0000000~1"));
}

#[tokio::test]
async fn scenario_c_weakened_candidate_aborts() {
    let project = project();
    let git = LoggingGit::default();
    let weakened = ORIGINAL.replace("        assertEquals(5, 2 + 2)\n", "");
    let ctx = context(
        &project,
        vec![red()],
        vec![json!({"ok": {"updated_source": weakened, "raw_output": weakened}})],
        &git,
    );
    let config = MendConfig::default();
    assert_eq!(config.integrity_violation, IntegrityViolationPolicy::Abort);
    let orchestrator = Orchestrator::new(&ctx, &config, &project.root).unwrap();

    let err = orchestrator.run(&[CALC.to_string()]).await.unwrap_err();

    assert!(matches!(
        err,
        MendError::Integrity(IntegrityViolation::AssertionsDropped { before: 2, after: 1 })
    ));
    assert_eq!(std::fs::read_to_string(&project.test_file).unwrap(), ORIGINAL);
    assert!(!git.calls().iter().any(|c| c.contains("CalcTest.kt")));

    // Partial results are saved, not archived.
    let saved = orchestrator.store().load().unwrap();
    let adds = &saved.modules[0].test_classes[0].test_methods[0];
    assert_eq!(adds.execution_history.len(), 1);
    assert!(orchestrator.store().list_archives().is_empty());
}

#[tokio::test]
async fn scenario_d_current_structure_is_reused() {
    let project = project();
    let git = LoggingGit::default();
    let config = MendConfig { rebuild: UpdatePolicy::Never, ..MendConfig::default() };

    // The discovery cassette holds a single answer; a second scan would exhaust it.
    let ctx = context(&project, vec![green(), green()], vec![], &git);
    let orchestrator = Orchestrator::new(&ctx, &config, &project.root).unwrap();

    let first = orchestrator.run(&[CALC.to_string()]).await.unwrap();
    let persisted = orchestrator.store().load().unwrap();
    assert_eq!(persisted, first.tree);

    let reloaded = orchestrator.load_or_build();
    assert_eq!(reloaded, persisted);

    let second = orchestrator.run(&[CALC.to_string()]).await.unwrap();
    let adds = &second.tree.modules[0].test_classes[0].test_methods[0];
    assert_eq!(adds.execution_history.len(), 2);
    assert_eq!(orchestrator.store().list_archives().len(), 2);
}

#[tokio::test]
async fn every_attempt_leaves_a_workspace() {
    let project = project();
    let git = LoggingGit::default();
    let ctx = context(&project, vec![red(), red(), green()], vec![candidate(6), candidate(4)], &git);
    let config = MendConfig::default();
    let orchestrator = Orchestrator::new(&ctx, &config, &project.root).unwrap();

    orchestrator.run(&[CALC.to_string()]).await.unwrap();

    let remediation = project.root.join(".mend/remediation");
    let mut dirs: Vec<_> = std::fs::read_dir(&remediation)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    dirs.sort();
    assert_eq!(dirs.len(), 2);
    assert!(dirs.iter().all(|d| d.starts_with("CalcTest_adds_2025-03-01T12-")));

    let last = remediation.join(&dirs[1]);
    let report = std::fs::read_to_string(last.join("diagnostic-report.md")).unwrap();
    assert!(report.contains("- Outcome: success"));
    let log = std::fs::read_to_string(last.join("logs/activity.log")).unwrap();
    assert!(log.contains("attempt 2: requesting repair"));
}
