//! Integration tests running the `sqlguard` binary against fixture manifests

use std::fs;
use std::process::Command;

/// Path to the compiled sqlguard binary
fn sqlguard_bin() -> String {
    env!("CARGO_BIN_EXE_sqlguard").to_string()
}

/// Run a `sqlguard` command and return (stdout, stderr, exit code).
fn run_sqlguard(args: &[&str]) -> (String, String, Option<i32>) {
    let output = Command::new(sqlguard_bin())
        .args(args)
        .env_remove("SQLGUARD_PROJECT_DIR")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute sqlguard with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code(),
    )
}

const BROKEN_MANIFESTS: &str = "tests/fixtures/broken_project/sqlguard";

#[test]
fn test_check_clean_project() {
    let (stdout, stderr, code) = run_sqlguard(&["check", "-p", "tests/fixtures/clean_project"]);
    assert_eq!(code, Some(0), "stdout: {stdout}\nstderr: {stderr}");
    assert!(stdout.contains("Validated 2 queries against 1 table schemas. All fine!"));
}

#[test]
fn test_check_reports_diagnostics() {
    let (stdout, _, code) = run_sqlguard(&["check", BROKEN_MANIFESTS]);
    assert_eq!(code, Some(1));
    assert!(stdout.contains(
        "src/app.ts:5:18 error[SG003]: No table in the query's scope has a column \"nam\"."
    ));
    assert!(stdout.contains(
        "src/app.ts:8:11 error[SG007]: Column \"email\" is missing from INSERT statement."
    ));
    assert!(stdout.contains(
        "src/app.ts:11:31 warning[SG010]: Cannot infer properties of spread expression in SQL template."
    ));
    assert!(stdout.contains("Validated 3 queries against 1 table schemas: 2 errors, 1 warnings"));
}

#[test]
fn test_check_json_output() {
    let (stdout, _, code) = run_sqlguard(&["check", BROKEN_MANIFESTS, "--output", "json"]);
    assert_eq!(code, Some(1));

    let output: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(output["query_count"], 3);
    assert_eq!(output["table_count"], 1);
    assert_eq!(output["error_count"], 2);
    assert_eq!(output["warning_count"], 1);

    let codes: Vec<&str> = output["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["SG003", "SG007", "SG010"]);
    assert_eq!(output["diagnostics"][0]["source_file"], "src/app.ts");
    assert_eq!(output["diagnostics"][0]["location"]["start"]["line"], 5);
}

#[test]
fn test_check_severity_filter() {
    let (stdout, _, code) = run_sqlguard(&["check", BROKEN_MANIFESTS, "--severity", "error"]);
    assert_eq!(code, Some(1));
    assert!(stdout.contains("error[SG003]"));
    assert!(!stdout.contains("warning[SG010]"));
}

#[test]
fn test_check_severity_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("sqlguard.yml");
    fs::write(
        &config_path,
        "analysis:\n  severity_overrides:\n    SG003: off\n    SG007: warning\n",
    )
    .unwrap();

    let (stdout, stderr, code) = run_sqlguard(&[
        "check",
        BROKEN_MANIFESTS,
        "--config",
        config_path.to_str().unwrap(),
    ]);
    assert_eq!(code, Some(0), "stdout: {stdout}\nstderr: {stderr}");
    assert!(!stdout.contains("SG003"));
    assert!(stdout.contains("warning[SG007]"));
}

#[test]
fn test_check_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("sqlguard.yml"),
        "analysis:\n  severity_overrides:\n    SG999: error\n",
    )
    .unwrap();

    let (_, stderr, code) = run_sqlguard(&["check", "-p", dir.path().to_str().unwrap()]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("Failed to load project config"), "stderr: {stderr}");
}

#[test]
fn test_check_missing_path() {
    let (_, stderr, code) = run_sqlguard(&["check", "tests/fixtures/does_not_exist"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("No such manifest file or directory"), "stderr: {stderr}");
}

#[test]
fn test_check_verbose() {
    let (_, stderr, _) = run_sqlguard(&["check", "-p", "tests/fixtures/clean_project", "-v"]);
    assert!(stderr.contains("[verbose] Loading manifest"));
    assert!(stderr.contains("[verbose] Checking src/users.ts (2 templates, 1 tables)"));
}

#[test]
fn test_tables_text_output() {
    let (stdout, _, code) = run_sqlguard(&["tables", "-p", "tests/fixtures/clean_project"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("TABLE"));
    assert!(stdout.contains("number (default value)"));
    assert!(stdout.contains("string (nullable)"));
    assert!(stdout.contains("src/users.ts:3"));
    assert!(stdout.contains("1 tables"));
}

#[test]
fn test_tables_json_output() {
    let (stdout, _, code) = run_sqlguard(&[
        "tables",
        "tests/fixtures/clean_project/sqlguard/users.json",
        "-o",
        "json",
    ]);
    assert_eq!(code, Some(0));

    let tables: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(tables[0]["table_name"], "users");
    assert_eq!(tables[0]["columns"][0]["name"], "id");
    assert_eq!(tables[0]["columns"][0]["has_default"], true);
}
