//! End-to-end tests for the `treesmith` binary.
//!
//! The binary runs with a scrubbed environment: configuration comes only
//! from a temp config file or `TREESMITH_*` variables, so a developer's
//! own settings never leak in.

use std::path::Path;

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO: &str = "/repos/octocat/hello";
const C1: &str = "1111111111111111111111111111111111111c01";
const C2: &str = "2222222222222222222222222222222222222c02";
const T1: &str = "1111111111111111111111111111111111111e01";
const T2: &str = "2222222222222222222222222222222222222e02";
const B1: &str = "1111111111111111111111111111111111111b01";
const B3: &str = "3333333333333333333333333333333333333b03";

/// A `treesmith` command isolated from the caller's config and env.
fn treesmith(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("treesmith").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("xdg"))
        .env_remove("TREESMITH_CONFIG")
        .env_remove("TREESMITH_USERNAME")
        .env_remove("TREESMITH_TOKEN")
        .env_remove("TREESMITH_REPO_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, server: &MockServer) -> std::path::PathBuf {
    let file = dir.join("config.toml");
    let contents = format!(
        r#"
username = "user"
token = "token"
repo_url = "{}{REPO}"

[commit]
concurrency = 2
author_name = "Release Bot"
author_email = "bot@example.com"
"#,
        server.uri()
    );
    std::fs::write(&file, contents).unwrap();
    file
}

fn endpoint(suffix: &str) -> String {
    format!("{REPO}/{suffix}")
}

fn ok(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

// =============================================================================
// Offline behaviour
// =============================================================================

#[test]
fn help_lists_commands() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    treesmith(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("substitute"))
        .stdout(predicate::str::contains("cat-blob"));
    Ok(())
}

#[test]
fn completion_script_for_bash() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    treesmith(home.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("treesmith"));
    Ok(())
}

#[test]
fn debug_and_quiet_conflict() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    treesmith(home.path())
        .args(["--debug", "-q", "branches"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
    Ok(())
}

#[test]
fn missing_config_fails_with_named_value() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    treesmith(home.path())
        .arg("branches")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required config value 'username'"));
    Ok(())
}

#[test]
fn failure_is_reported_whatever_the_log_filter() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    treesmith(home.path())
        .env("RUST_LOG", "hyper=debug")
        .arg("branches")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "error: failed to load configuration",
        ))
        .stderr(predicate::str::contains("missing required config value 'username'"));
    Ok(())
}

#[test]
fn invalid_sha_is_rejected_before_config() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    treesmith(home.path())
        .args(["cat-blob", "not-a-sha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid sha 'not-a-sha'"));
    Ok(())
}

#[test]
fn invalid_branch_name_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    treesmith(home.path())
        .args(["branch", "bad..name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid branch name"));
    Ok(())
}

// =============================================================================
// Against a mock GitHub
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn branches_from_environment_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint("branches")))
        .respond_with(ok(json!([
            {"name": "main", "commit": {"sha": C1, "url": "u"}, "protected": true},
            {"name": "dev", "commit": {"sha": C2, "url": "u"}, "protected": false},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let mut cmd = treesmith(home.path());
    cmd.env("TREESMITH_USERNAME", "user")
        .env("TREESMITH_TOKEN", "token")
        .env("TREESMITH_REPO_URL", format!("{}{REPO}", server.uri()))
        .arg("branches");

    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .unwrap()
        .unwrap();
    output
        .assert()
        .success()
        .stdout(predicate::str::contains("1111111  main (protected)"))
        .stdout(predicate::str::contains("2222222  dev"));
}

#[tokio::test(flavor = "multi_thread")]
async fn substitute_commits_through_config_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint("branches/main")))
        .respond_with(ok(json!({
            "name": "main",
            "commit": {"sha": C1, "url": "u"},
            "protected": false,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(endpoint(&format!("git/commits/{C1}"))))
        .respond_with(ok(json!({
            "sha": C1,
            "tree": {"sha": T1},
            "parents": [],
            "author": {"name": "A", "email": "a@example.com", "date": "2024-01-02T03:04:05Z"},
            "committer": {"name": "A", "email": "a@example.com", "date": "2024-01-02T03:04:05Z"},
            "message": "init",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(endpoint(&format!("git/trees/{T1}"))))
        .respond_with(ok(json!({
            "sha": T1,
            "tree": [{"path": "docs/a.md", "mode": "100644", "type": "blob", "sha": B1}],
            "truncated": false,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(endpoint(&format!("git/blobs/{B1}"))))
        // "see http://x"
        .respond_with(ok(json!({"sha": B1, "content": "c2VlIGh0dHA6Ly94", "encoding": "base64"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("git/blobs")))
        // "see https://x"
        .and(body_json(json!({"content": "c2VlIGh0dHBzOi8veA==", "encoding": "base64"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sha": B3})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("git/trees")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sha": T2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("git/commits")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sha": C2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(endpoint("git/refs/heads/main")))
        .and(body_json(json!({"sha": C2, "force": false})))
        .respond_with(ok(json!({"ref": "refs/heads/main", "object": {"sha": C2}})))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), &server);
    let mut cmd = treesmith(home.path());
    cmd.env("TREESMITH_CONFIG", &config).args([
        "substitute",
        "-b",
        "main",
        "-g",
        "docs/*.md",
        "--find",
        "http://",
        "--replace",
        "https://",
        "-m",
        "Use https",
    ]);

    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .unwrap()
        .unwrap();
    output
        .assert()
        .success()
        .stdout(predicate::str::contains("Committed 2222222 on main (parent 1111111)"))
        .stdout(predicate::str::contains("  M docs/a.md"));
}
