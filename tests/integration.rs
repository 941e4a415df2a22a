//! Integration tests for suitelint

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use suitelint::{
    ConfigManager, ConfigManagerOptions, ConfigOverlay, Diagnostic, LintError, Linter,
    LinterOptions, LinterOverlay, RunSummary,
};
use tempfile::TempDir;

const DUPLICATED_TESTS: &str = "\
*** Test Cases ***
Login
    Log    first
Login
    Log    second
";

fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn options(dir: &TempDir, linter: LinterOverlay) -> ConfigManagerOptions {
    ConfigManagerOptions {
        sources: vec![dir.path().to_path_buf()],
        root: Some(dir.path().to_path_buf()),
        skip_gitignore: true,
        overlay: ConfigOverlay {
            linter,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn run(dir: &TempDir, linter: LinterOverlay) -> (Result<RunSummary, LintError>, String) {
    let mut manager = ConfigManager::new(options(dir, linter)).unwrap();
    let mut out = Vec::new();
    let result = Linter::with_builtin()
        .unwrap()
        .with_options(LinterOptions {
            results_cache: Some(dir.path().join("results.json")),
            ..Default::default()
        })
        .run(&mut manager, &mut out);
    (result, String::from_utf8(out).unwrap())
}

fn ids_for<'a>(diagnostics: &'a [Diagnostic], file: &'a Path) -> Vec<&'a str> {
    diagnostics
        .iter()
        .filter(|d| d.source.ends_with(file))
        .map(|d| d.rule.id.as_str())
        .collect()
}

fn suitelint(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_suitelint"))
        .current_dir(dir)
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

#[test]
fn test_closest_config_excludes_rule_per_directory() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "api/suitelint.toml", "[linter]\nignore = [\"DUP01\"]\n");
    write(dir.path(), "api/login.robot", DUPLICATED_TESTS);
    write(dir.path(), "ui/login.robot", DUPLICATED_TESTS);

    let (result, _) = run(&dir, LinterOverlay::default());
    let summary = result.unwrap();

    assert!(ids_for(&summary.diagnostics, Path::new("api/login.robot")).is_empty());
    assert_eq!(
        ids_for(&summary.diagnostics, Path::new("ui/login.robot")),
        vec!["DUP01"]
    );
}

#[test]
fn test_file_level_disable_reports_nothing() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "suite.robot",
        &format!("# suitelint: off\n{}*** Tasks ***\nTask\n    Log    x\n", DUPLICATED_TESTS),
    );

    let (result, output) = run(
        &dir,
        LinterOverlay {
            select: Some(vec!["*".to_string()]),
            ..Default::default()
        },
    );
    let summary = result.unwrap();

    assert_eq!(summary.files_scanned, 1);
    assert!(summary.diagnostics.is_empty());
    assert_eq!(summary.exit_code, 0);
    assert!(output.is_empty());
}

#[test]
fn test_exit_zero_with_issues() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "suite.robot",
        "*** Test Cases ***\nA\n    Log    1\nA\n    Log    2\nA\n    Log    3\nA\n    Log    4\n",
    );

    let output = suitelint(
        dir.path(),
        &["check", ".", "--root", ".", "--skip-gitignore", "--exit-zero"],
    );

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("DUP01").count(), 3);
}

#[test]
fn test_issues_exit_with_one() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "suite.robot", DUPLICATED_TESTS);

    let output = suitelint(dir.path(), &["check", ".", "--root", "."]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_unknown_configure_target_aborts() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "suite.robot", DUPLICATED_TESTS);

    let (result, output) = run(
        &dir,
        LinterOverlay {
            configure: Some(vec!["not-a-rule.param=1".to_string()]),
            ..Default::default()
        },
    );
    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("not-a-rule"));
    assert!(output.is_empty());

    let output = suitelint(
        dir.path(),
        &["check", ".", "--root", ".", "--configure", "not-a-rule.param=1"],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not-a-rule"));
}

#[test]
fn test_sibling_files_share_config() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "suites/suitelint.toml", "[linter]\nthreshold = \"W\"\n");
    let first = write(dir.path(), "suites/nested/a.robot", DUPLICATED_TESTS);
    let second = write(dir.path(), "suites/nested/b.robot", DUPLICATED_TESTS);

    let mut manager = ConfigManager::new(options(&dir, LinterOverlay::default())).unwrap();
    let a = manager.config_for(&second).unwrap();
    let probes = manager.probe_count();
    let b = manager.config_for(&first).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(manager.probe_count(), probes);
}

#[test]
fn test_malformed_config_is_fatal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sub/suitelint.toml", "[linter]\nunknown_key = 1\n");
    write(dir.path(), "sub/a.robot", DUPLICATED_TESTS);

    let (result, output) = run(&dir, LinterOverlay::default());
    let err = result.unwrap_err();
    assert!(matches!(err, LintError::Config(_)));
    assert!(err.to_string().contains("unknown_key"));
    assert!(output.is_empty());
}

#[test]
fn test_missing_source_is_fatal() {
    let dir = TempDir::new().unwrap();
    let output = suitelint(dir.path(), &["check", "missing.robot", "--root", "."]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_describe_and_list() {
    let dir = TempDir::new().unwrap();

    let output = suitelint(dir.path(), &["describe", "duplicated-test-case"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("DUP01"));

    let output = suitelint(dir.path(), &["describe", "no-such-rule"]);
    assert_eq!(output.status.code(), Some(2));

    let output = suitelint(dir.path(), &["list", "rules", "LEN*"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("LEN01"));
    assert!(!stdout.contains("DUP01"));

    let output = suitelint(dir.path(), &["list", "reports"]);
    assert!(String::from_utf8_lossy(&output.stdout).contains("sarif"));
}
