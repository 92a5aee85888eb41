use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;

fn run_analyze(path: &std::path::Path, expect_success: bool) -> Value {
    let assert = Command::cargo_bin("codemap")
        .expect("binary")
        .arg("--quiet")
        .arg("analyze")
        .arg(path)
        .assert();
    let assert = if expect_success {
        assert.success()
    } else {
        assert.failure()
    };
    let output = assert.get_output();
    serde_json::from_slice(&output.stdout).expect("valid json on stdout")
}

#[test]
fn analyze_prints_the_outline() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("app.py");
    fs::write(
        &path,
        "class A:\n    def m(self):\n        f()\n\ndef f():\n    return A()\n",
    )
    .unwrap();

    let outline = run_analyze(&path, true);
    assert_eq!(outline["id"], "module");
    assert_eq!(outline["children"][0]["id"], "A");
    assert_eq!(outline["children"][0]["kind"], "class");
    assert_eq!(outline["children"][0]["children"][0]["calls"][0], "f");
    assert_eq!(outline["children"][1]["called_by"][0], "A.m");
    assert_eq!(outline["children"][1]["instantiates"][0], "A");
}

#[test]
fn analyze_reports_syntax_failures_as_an_envelope() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.py");
    fs::write(&path, "def broken(:\n    pass\n").unwrap();

    let envelope = run_analyze(&path, false);
    assert_eq!(envelope["kind"], "syntax_failure");
    assert!(envelope["error"].as_str().unwrap().contains("Syntax error"));
}

#[test]
fn analyze_rejects_non_python_files() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("notes.txt");
    fs::write(&path, "just text\n").unwrap();

    let envelope = run_analyze(&path, false);
    assert_eq!(envelope["kind"], "invalid_request");
}

#[test]
fn analyze_fails_cleanly_on_a_missing_file() {
    Command::cargo_bin("codemap")
        .expect("binary")
        .arg("--quiet")
        .arg("analyze")
        .arg("no-such-file.py")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}
