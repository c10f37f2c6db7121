//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn run_gitward(config: &Path, cwd: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_gitward");
    Command::new(bin)
        .arg("--config")
        .arg(config)
        .args(args)
        .current_dir(cwd)
        .env_remove("GITWARD_CONFIG")
        .output()
        .expect("failed to run gitward binary")
}

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("repos.conf");
    std::fs::write(&path, contents).unwrap();
    path
}

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok_and(|o| o.status.success())
}

#[test]
fn list_shows_configured_repositories() {
    let dir = tempfile::tempdir().unwrap();
    let config =
        write_config(&dir, "[etc]\npath = /etc\n\n[www]\npath = /srv/www\nuser = www-data\n");

    let output = run_gitward(&config, dir.path(), &["list"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("etc"));
    assert!(stdout.contains("/srv/www"));
    assert!(stdout.contains("www-data"));
}

#[test]
fn unknown_repository_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "[etc]\npath = /etc\n");

    let output = run_gitward(&config, dir.path(), &["status", "etc", "nope"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unknown repository: nope"));
    assert!(output.stdout.is_empty());
}

#[test]
fn dot_outside_configured_repositories_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "[etc]\npath = /etc\n");

    let output = run_gitward(&config, dir.path(), &["update", "."]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unknown repository: ."));
}

#[test]
fn reserved_dot_section_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "[.]\npath = /etc\n");

    let output = run_gitward(&config, dir.path(), &["list"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("reserved"));
}

#[test]
fn section_without_path_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "[etc]\nuser = root\n");

    let output = run_gitward(&config, dir.path(), &["list"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("has no path"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_gitward(&dir.path().join("absent.conf"), dir.path(), &["list"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read configuration"));
}

#[test]
fn failing_repository_is_shown_and_batch_completes() {
    let dir = tempfile::tempdir().unwrap();
    let not_a_repo = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        &format!(
            "[missing]\npath = /nonexistent/gitward/repo\n\n[plain]\npath = {}\n",
            not_a_repo.path().display()
        ),
    );

    let output = run_gitward(&config, dir.path(), &["status", "--no-fetch"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("missing"));
    assert!(stdout.contains("plain"));
    assert_eq!(stdout.matches("error:").count(), 2);

    let strict = run_gitward(&config, dir.path(), &["status", "--no-fetch", "--strict"]);
    assert_eq!(strict.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&strict.stderr).contains("2 repositories failed"));
}

#[test]
fn status_reports_fresh_repository_as_json() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    let init = Command::new("git").arg("init").arg("-q").arg(repo.path()).status().unwrap();
    assert!(init.success());
    std::fs::write(repo.path().join("new.txt"), "hello\n").unwrap();
    let config = write_config(&dir, &format!("[scratch]\npath = {}\n", repo.path().display()));

    let output = run_gitward(&config, dir.path(), &["status", "--json"]);
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["name"], "scratch");
    assert_eq!(rows[0]["cleanliness"], "1 untracked");
    assert_eq!(rows[0]["remote"], "no remote");
}

#[test]
fn invalid_subcommand_exits_with_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "");
    let output = run_gitward(&config, dir.path(), &["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("unrecognized subcommand"));
}
