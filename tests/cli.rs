//
//  bitbucket-ingest
//  tests/cli.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn bb_ingest() -> Command {
    let mut cmd = Command::cargo_bin("bb-ingest").unwrap();
    cmd.env_remove("BB_OAUTH_KEY")
        .env_remove("BB_OAUTH_SECRET")
        .env_remove("BB_WORKSPACE")
        .env_remove("BB_INGEST_CONFIG")
        .env_remove("BB_INGEST_DEBUG");
    cmd
}

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

fn server_config(root: &str, workspace: &str) -> String {
    format!(
        r#"
oauth_key = "key1"
oauth_secret = "secret1"
workspaces = ["{workspace}"]

[api]
base_url = "{root}/api/2.0/"
legacy_base_url = "{root}/api/1.0/"
token_url = "{root}/site/oauth2/access_token"
"#
    )
}

fn mock_token(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/site/oauth2/access_token")
        .with_status(200)
        .with_body(r#"{"access_token": "tok-1", "scopes": "account project"}"#)
        .create()
}

#[test]
fn test_help_lists_commands() {
    bb_ingest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_version() {
    bb_ingest()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("bb-ingest version"));
}

#[test]
fn test_missing_config_file() {
    bb_ingest()
        .args(["verify", "--config"])
        .arg(Path::new("/nonexistent/bb-ingest/config.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_config_without_credentials() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"workspaces = ["acme"]"#);

    bb_ingest()
        .arg("verify")
        .arg("--config")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("OAuth key and secret are required"));
}

#[test]
fn test_verify_emits_workspaces() {
    let mut server = mockito::Server::new();
    let token = mock_token(&mut server);
    let workspace = server
        .mock("GET", "/api/2.0/workspaces/acme")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_body(r#"{"uuid": "{ws-1}", "slug": "acme", "name": "Acme"}"#)
        .create();

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &server_config(&server.url(), "acme"));

    bb_ingest()
        .arg("verify")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind":"workspace""#))
        .stdout(predicate::str::contains(r#""slug":"acme""#))
        .stderr(predicate::str::contains(
            "Verified 1 credential(s) and 1 workspace(s)",
        ));

    token.assert();
    workspace.assert();
}

#[test]
fn test_workspace_flag_overrides_config() {
    let mut server = mockito::Server::new();
    let _token = mock_token(&mut server);
    let other = server
        .mock("GET", "/api/2.0/workspaces/other")
        .with_status(200)
        .with_body(r#"{"uuid": "{ws-2}", "slug": "other", "name": "Other"}"#)
        .create();

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &server_config(&server.url(), "acme"));

    bb_ingest()
        .args(["verify", "--workspace", "other", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""slug":"other""#));

    other.assert();
}

#[test]
fn test_unknown_workspace_exit_code() {
    let mut server = mockito::Server::new();
    let _token = mock_token(&mut server);
    let _mock = server
        .mock("GET", "/api/2.0/workspaces/ghost")
        .with_status(404)
        .create();

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &server_config(&server.url(), "ghost"));

    bb_ingest()
        .arg("verify")
        .arg("--config")
        .arg(&path)
        .assert()
        .code(8)
        .stderr(predicate::str::contains("Workspace 'ghost' was not found"));
}

#[test]
fn test_missing_scope_exit_code() {
    let mut server = mockito::Server::new();
    let _token = mock_token(&mut server);

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &server_config(&server.url(), "acme"));

    bb_ingest()
        .args(["verify", "--pull-requests", "--config"])
        .arg(&path)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Pull requests"));
}

fn mock_empty_workspace(server: &mut mockito::ServerGuard, slug: &str, members: &[&str]) -> Vec<mockito::Mock> {
    let empty = r#"{"values": []}"#;
    let members: Vec<String> = members
        .iter()
        .map(|id| format!(r#"{{"user": {{"uuid": "{}", "display_name": "{}"}}}}"#, id, id))
        .collect();

    vec![
        server
            .mock("GET", format!("/api/2.0/workspaces/{}", slug).as_str())
            .with_status(200)
            .with_body(format!(r#"{{"uuid": "{{{}}}", "slug": "{}"}}"#, slug, slug))
            .create(),
        server
            .mock("GET", format!("/api/2.0/workspaces/{}/members", slug).as_str())
            .with_status(200)
            .with_body(format!(r#"{{"values": [{}]}}"#, members.join(",")))
            .create(),
        server
            .mock("GET", format!("/api/1.0/groups/{}", slug).as_str())
            .with_status(200)
            .with_body("[]")
            .create(),
        server
            .mock("GET", format!("/api/2.0/workspaces/{}/projects/", slug).as_str())
            .with_status(200)
            .with_body(empty)
            .create(),
        server
            .mock("GET", format!("/api/2.0/repositories/{}", slug).as_str())
            .with_status(200)
            .with_body(empty)
            .create(),
    ]
}

#[test]
fn test_run_writes_shared_users_once() {
    let mut server = mockito::Server::new();
    let _token = mock_token(&mut server);
    let _acme = mock_empty_workspace(&mut server, "acme", &["{shared}", "{jane}"]);
    let _labs = mock_empty_workspace(&mut server, "labs", &["{shared}", "{tom}"]);

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &server_config(&server.url(), "acme"));

    let output = bb_ingest()
        .args(["run", "--workspace", "acme,labs", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let users: Vec<&str> = stdout
        .lines()
        .filter(|line| line.contains(r#""kind":"user""#))
        .collect();

    assert_eq!(users.len(), 3);
    assert_eq!(users.iter().filter(|line| line.contains("{shared}")).count(), 1);
    assert!(stdout.lines().last().unwrap().contains(r#""kind":"api_calls""#));
}
