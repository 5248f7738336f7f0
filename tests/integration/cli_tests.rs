//! CLI integration tests
//!
//! These tests run the binary against a generated JAR and mapping file.

mod common;

use assert_cmd::Command;
use common::{sample_jar, SAMPLE_TINY_V2};
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temp directory holding `client.jar` and `mappings.tiny`
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    sample_jar(&dir.path().join("client.jar"));
    std::fs::write(dir.path().join("mappings.tiny"), SAMPLE_TINY_V2).unwrap();
    dir
}

fn mappingstats(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mappingstats").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn inputs(dir: &Path) -> [PathBuf; 2] {
    [dir.join("client.jar"), dir.join("mappings.tiny")]
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    mappingstats(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mappingstats"))
        .stdout(predicate::str::contains("--treemap"))
        .stdout(predicate::str::contains("--statistic"));
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    mappingstats(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mappingstats"));
}

#[test]
fn test_cli_requires_inputs() {
    let dir = tempfile::tempdir().unwrap();
    mappingstats(dir.path()).assert().failure();
}

// ============================================================================
// Summary
// ============================================================================

#[test]
fn test_summary_lines() {
    let dir = workspace();
    mappingstats(dir.path())
        .args(inputs(dir.path()))
        .assert()
        .success()
        .stdout(
            "1 / 2 (50.00%) top-level classes are mapped\n\
             1 / 2 (50.00%) classes are mapped\n\
             1 / 3 (33.33%) methods are mapped\n\
             1 / 1 (100.00%) fields are mapped\n",
        );
}

#[test]
fn test_empty_categories_do_not_fail() {
    let dir = workspace();
    mappingstats(dir.path())
        .args(inputs(dir.path()))
        .args(["--root-package", "com/mojang"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 / 0 (n/a) methods are mapped"))
        .stdout(predicate::str::contains("0 / 0 (n/a) fields are mapped"));
}

#[test]
fn test_json_summary() {
    let dir = workspace();
    let output = mappingstats(dir.path())
        .args(inputs(dir.path()))
        .args(["--format", "json", "--quiet"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["methods"]["mapped"], 1);
    assert_eq!(value["methods"]["total"], 3);
    assert_eq!(value["fields"]["percent"], 100.0);
}

#[test]
fn test_json_summary_to_file() {
    let dir = workspace();
    let report = dir.path().join("summary.json");
    mappingstats(dir.path())
        .args(inputs(dir.path()))
        .args(["-f", "json", "-o"])
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let value: Value = serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["classes"]["total"], 2);
}

// ============================================================================
// Treemap
// ============================================================================

#[test]
fn test_treemap_default_output() {
    let dir = workspace();
    mappingstats(dir.path())
        .args(inputs(dir.path()))
        .args(["--treemap", "--no-summary"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let html = std::fs::read_to_string(dir.path().join("treemap.html")).unwrap();
    assert!(html.contains("Unmapped methods"));
    assert!(html.contains(
        r#"[{"name":"util","value":1,"children":[{"name":"Foo","value":1}]},{"name":"class_2","value":1}]"#
    ));
}

#[test]
fn test_treemap_mapped_statistic() {
    let dir = workspace();
    let output = dir.path().join("mapped.html");
    mappingstats(dir.path())
        .args(inputs(dir.path()))
        .args(["--treemap", "--statistic", "mapped", "--treemap-output"])
        .arg(&output)
        .assert()
        .success();

    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("Mapped methods"));
    assert!(html.contains(
        r#"[{"name":"util","value":1,"children":[{"name":"Foo","value":1}]}]"#
    ));
}

#[test]
fn test_treemap_from_config_file() {
    let dir = workspace();
    std::fs::write(dir.path().join("page.html"), "{{LABEL}}|{{DATA}}").unwrap();
    std::fs::write(
        dir.path().join(".mappingstats.yml"),
        "report:\n  output: custom.html\n  template: page.html\n",
    )
    .unwrap();

    mappingstats(dir.path())
        .args(inputs(dir.path()))
        .arg("--treemap")
        .assert()
        .success();

    let html = std::fs::read_to_string(dir.path().join("custom.html")).unwrap();
    assert!(html.starts_with("Unmapped methods|["));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_artifact_fails() {
    let dir = workspace();
    mappingstats(dir.path())
        .args(["missing.jar", "mappings.tiny"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.jar"));
}

#[test]
fn test_missing_mappings_fails() {
    let dir = workspace();
    mappingstats(dir.path())
        .args(["client.jar", "missing.tiny"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.tiny"));
}

#[test]
fn test_malformed_mappings_fail() {
    let dir = workspace();
    std::fs::write(dir.path().join("bad.tiny"), "v1\tofficial\tintermediary\n").unwrap();
    mappingstats(dir.path())
        .args(["client.jar", "bad.tiny"])
        .assert()
        .failure();
}

#[test]
fn test_corrupt_jar_fails() {
    let dir = workspace();
    std::fs::write(dir.path().join("broken.jar"), b"not a zip").unwrap();
    mappingstats(dir.path())
        .args(["broken.jar", "mappings.tiny"])
        .assert()
        .failure();
}
