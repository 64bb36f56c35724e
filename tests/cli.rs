//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::Command;

use serde_json::{json, Value};

use mend::cassette::recorder::CassetteRecorder;

fn run_mend(root: &Path, args: &[&str], env: &[(&str, &Path)]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_mend");
    let mut command = Command::new(bin);
    command
        .arg("--project-root")
        .arg(root)
        .args(args)
        .env_remove("MEND_RECORD")
        .env_remove("MEND_REPLAY")
        .env_remove("RUST_LOG");
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().expect("failed to run mend binary")
}

fn write_cassette(dir: &Path, port: &str, method: &str, outputs: &[Value]) {
    let mut recorder = CassetteRecorder::new(
        dir.join(format!("{port}.cassette.yaml")),
        format!("cli-{port}"),
        "unknown",
    );
    for output in outputs {
        recorder.record(port, method, json!({}), output.clone());
    }
    recorder.finish().unwrap();
}

/// A one-module project with a single test class.
fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let tests = dir.path().join("core/src/test/kotlin/com/example");
    std::fs::create_dir_all(&tests).unwrap();
    std::fs::write(dir.path().join("core/pom.xml"), "<project/>").unwrap();
    std::fs::write(
        tests.join("CalcTest.kt"),
        "package com.example\n\nclass CalcTest {\n    @Test\n    fun adds() {\n        assertEquals(4, 2 + 2)\n    }\n}\n",
    )
    .unwrap();
    dir
}

fn cassettes(root: &Path, runner: &[Value], oracle: &[Value]) -> std::path::PathBuf {
    let dir = root.join("cassettes");
    let clock: Vec<Value> = (0..20).map(|s| json!(format!("2025-03-01T12:00:{s:02}Z"))).collect();
    write_cassette(&dir, "clock", "now", &clock);
    write_cassette(
        &dir,
        "discovery",
        "discover_methods",
        &[json!([{"id": "adds", "name": "adds", "display_name": "adds()"}])],
    );
    write_cassette(&dir, "runner", "execute", runner);
    write_cassette(&dir, "oracle", "repair", oracle);
    dir
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_mend(dir.path(), &["--help"], &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for command in ["run", "status", "rebuild"] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
}

#[test]
fn run_without_class_shows_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_mend(dir.path(), &["run"], &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("CLASS"));
}

#[test]
fn status_on_empty_project() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_mend(dir.path(), &["status"], &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("No test structure stored"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_mend(dir.path(), &["nonsense"], &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("mend.yaml");
    std::fs::write(&config, "max_retry_per_class: 0\n").unwrap();
    let output = run_mend(dir.path(), &["--config", config.to_str().unwrap(), "status"], &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("max_retry_per_class must be at least 1"));
}

#[test]
fn replayed_passing_run_exits_zero_and_persists() {
    let project = project();
    let dir = cassettes(project.path(), &[json!({"ok": {"class_name": "com.example.CalcTest"}})], &[]);

    let output = run_mend(project.path(), &["run", "com.example.CalcTest"], &[("MEND_REPLAY", &dir)]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("com.example.CalcTest: PASSED"));
    assert!(project.path().join(".mend/test-graph.json").is_file());

    let status = run_mend(project.path(), &["status"], &[]);
    let stdout = String::from_utf8_lossy(&status.stdout);
    assert!(stdout.contains("com.example.CalcTest#adds"));
    assert!(stdout.contains("1 archive(s), 0 remediation workspace(s)."));
}

#[test]
fn replayed_oracle_failure_exits_nonzero() {
    let project = project();
    let red = json!({"ok": {"class_name": "com.example.CalcTest",
                           "failures": [{"method": "adds", "message": "boom"}]}});
    let dir = cassettes(
        project.path(),
        &[red],
        &[json!({"err": "oracle command exited with status 1: quota exceeded"})],
    );
    let mut git = CassetteRecorder::new(dir.join("git.cassette.yaml"), "cli-git", "unknown");
    git.record("git", "add_all", json!({}), json!({"ok": null}));
    git.record("git", "status_porcelain", json!({}), json!({"ok": ""}));
    git.finish().unwrap();

    let output = run_mend(project.path(), &["run", "com.example.CalcTest"], &[("MEND_REPLAY", &dir)]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("repair oracle failed: oracle command exited with status 1"));
    assert!(project.path().join(".mend/test-graph.json").is_file());
}
