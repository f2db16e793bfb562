#![allow(deprecated)]
use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn config_path(dir: &TempDir) -> PathBuf {
    dir.path().join(".tick/config.yaml")
}

fn tick(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tick").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("TICK_CONFIG", config_path(dir))
        .env_remove("VISUAL")
        .env_remove("EDITOR");
    cmd
}

fn write_config(dir: &TempDir, url: &str, extra: &str) {
    let path = config_path(dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body = format!(
        "config:\n  url: {url}\n  username: dev\n  password: secret\n  bitbucket_url: {url}\n{extra}"
    );
    std::fs::write(path, body).unwrap();
}

fn read_config(dir: &TempDir) -> serde_yaml::Value {
    let data = std::fs::read_to_string(config_path(dir)).unwrap();
    serde_yaml::from_str(&data).unwrap()
}

const ISSUE_SEARCH: &str = r#"{"issues": [
    {"key": "PROJ-1", "fields": {"summary": "Fix login", "status": {"name": "In Progress"},
     "issuetype": {"name": "Bug"}, "aggregatetimespent": 120}},
    {"key": "PROJ-2", "fields": {"summary": "Add search", "status": {"name": "To Do"},
     "issuetype": {"name": "Story"}, "aggregatetimespent": null}}
]}"#;

// ---------------------------------------------------------------------------
// tick config
// ---------------------------------------------------------------------------

#[test]
fn config_init_writes_credentials() {
    let dir = TempDir::new().unwrap();
    tick(&dir)
        .args([
            "config",
            "init",
            "--url",
            "https://jira.example.com",
            "--username",
            "dev",
            "--password",
            "secret",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("tick config edit"));

    let cfg = read_config(&dir);
    assert_eq!(cfg["config"]["url"].as_str(), Some("https://jira.example.com"));
    assert_eq!(cfg["config"]["username"].as_str(), Some("dev"));
    assert_eq!(cfg["config"]["target_branch"].as_str(), Some("develop"));
}

#[test]
fn config_init_keeps_rules_and_current_task() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "https://old.example.com",
        "rules:\n  branch:\n    default: feature/\ncurrent_task:\n  key: PROJ-1\n  start_time: 1700000000\n",
    );

    tick(&dir)
        .args(["config", "init", "--url", "https://jira.example.com"])
        .args(["--username", "dev2", "--password", "pw"])
        .assert()
        .success();

    let cfg = read_config(&dir);
    assert_eq!(cfg["config"]["username"].as_str(), Some("dev2"));
    assert_eq!(cfg["rules"]["branch"]["default"].as_str(), Some("feature/"));
    assert_eq!(cfg["current_task"]["key"].as_str(), Some("PROJ-1"));
}

#[test]
fn config_init_without_answers_fails() {
    let dir = TempDir::new().unwrap();
    tick(&dir)
        .args(["config", "init"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("a value for url is required"));
}

#[test]
fn config_init_reads_missing_values_from_stdin() {
    let dir = TempDir::new().unwrap();
    tick(&dir)
        .args(["config", "init", "--url", "https://jira.example.com"])
        .write_stdin("dev\nsecret\n")
        .assert()
        .success();

    let cfg = read_config(&dir);
    assert_eq!(cfg["config"]["username"].as_str(), Some("dev"));
    assert_eq!(cfg["config"]["password"].as_str(), Some("secret"));
}

#[test]
fn config_show_hides_password() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "https://jira.example.com", "");

    tick(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("username:      dev"))
        .stdout(predicate::str::contains("secret").not());
}

#[test]
fn config_show_json_unconfigured() {
    let dir = TempDir::new().unwrap();
    let out = tick(&dir)
        .args(["--json", "config", "show"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["configured"], false);
}

#[test]
fn explicit_config_flag_wins_over_env() {
    let dir = TempDir::new().unwrap();
    let other = dir.path().join("elsewhere.yaml");
    tick(&dir)
        .arg("--config")
        .arg(&other)
        .args(["config", "init", "--url", "u", "--username", "n", "--password", "p"])
        .assert()
        .success();
    assert!(other.exists());
    assert!(!config_path(&dir).exists());
}

// ---------------------------------------------------------------------------
// Unconfigured / argument errors
// ---------------------------------------------------------------------------

#[test]
fn status_without_config_fails() {
    let dir = TempDir::new().unwrap();
    tick(&dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn task_without_key_or_current_task_fails() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "http://127.0.0.1:9", "");
    tick(&dir)
        .args(["task", "--workon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no key provided and no current task"));
}

#[test]
fn task_rejects_zero_minutes() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "http://127.0.0.1:9", "");
    tick(&dir)
        .args(["task", "PROJ-1", "-l", "0"])
        .assert()
        .failure();
}

#[test]
fn task_rejects_unknown_status() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "http://127.0.0.1:9", "");
    tick(&dir)
        .args(["task", "PROJ-1", "--move", "Blocked"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("In Progress"));
}

#[test]
fn stop_without_current_task() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "http://127.0.0.1:9", "");
    tick(&dir)
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("No task currently being worked on."));
}

// ---------------------------------------------------------------------------
// Against a mock server
// ---------------------------------------------------------------------------

#[test]
fn status_lists_tasks_and_marks_current() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/rest/api/2/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ISSUE_SEARCH)
        .create();

    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        &server.url(),
        "current_task:\n  key: PROJ-2\n  summary: Add search\n  status: In Progress\n  time_spent: 0\n  start_time: 1700000000\n",
    );

    let out = tick(&dir).args(["status", "--json"]).output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let tasks = value.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["key"], "PROJ-1");
    assert_eq!(tasks[0]["minutes"], 2);
    assert_eq!(tasks[0]["current"], false);
    assert_eq!(tasks[1]["key"], "PROJ-2");
    assert_eq!(tasks[1]["status"], "In Progress");
    assert_eq!(tasks[1]["current"], true);
}

#[test]
fn status_table_output() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/rest/api/2/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ISSUE_SEARCH)
        .create();

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server.url(), "");

    tick(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("KEY"))
        .stdout(predicate::str::contains("Fix login"))
        .stdout(predicate::str::contains("Add search"));
}

#[test]
fn task_log_time_posts_worklog() {
    let mut server = mockito::Server::new();
    let worklog = server
        .mock("POST", "/rest/api/2/issue/PROJ-5/worklog")
        .match_body(Matcher::PartialJson(serde_json::json!({"timeSpentSeconds": 900})))
        .with_status(201)
        .with_body("{}")
        .create();

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server.url(), "");

    tick(&dir)
        .args(["task", "PROJ-5", "--log-time", "15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logging 15 minutes on PROJ-5"));
    worklog.assert();
}

#[test]
fn stop_moves_back_logs_and_clears() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/rest/api/2/issue/PROJ-1/transitions")
        .with_status(200)
        .with_body(r#"{"transitions": [{"id": "21", "name": "Stop", "to": {"name": "To Do"}}]}"#)
        .create();
    let transition = server
        .mock("POST", "/rest/api/2/issue/PROJ-1/transitions")
        .match_body(Matcher::Json(serde_json::json!({"transition": {"id": "21"}})))
        .with_status(204)
        .create();
    let worklog = server
        .mock("POST", "/rest/api/2/issue/PROJ-1/worklog")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "started": "2023-11-14T22:13:20.000+0000"
        })))
        .with_status(201)
        .with_body("{}")
        .create();

    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        &server.url(),
        "current_task:\n  key: PROJ-1\n  status: In Progress\n  time_spent: 0\n  start_time: 1700000000\n",
    );

    tick(&dir)
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped PROJ-1"));

    transition.assert();
    worklog.assert();
    let cfg = read_config(&dir);
    assert!(cfg["current_task"].is_null());
    assert_eq!(cfg["config"]["username"].as_str(), Some("dev"));
}

#[test]
fn workon_saves_current_task() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/rest/api/2/issue/PROJ-2")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"key": "PROJ-2", "fields": {"summary": "Add search", "status": {"name": "To Do"},
               "issuetype": {"name": "Story"}, "aggregatetimespent": null}}"#,
        )
        .create();
    server
        .mock("GET", "/rest/api/2/issue/PROJ-2/transitions")
        .with_status(200)
        .with_body(r#"{"transitions": [{"id": "11", "name": "Start", "to": {"name": "In Progress"}}]}"#)
        .create();
    let transition = server
        .mock("POST", "/rest/api/2/issue/PROJ-2/transitions")
        .with_status(204)
        .create();

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server.url(), "");

    tick(&dir)
        .args(["task", "PROJ-2", "-w"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Working on PROJ-2 (In Progress)"));

    transition.assert();
    let cfg = read_config(&dir);
    assert_eq!(cfg["current_task"]["key"].as_str(), Some("PROJ-2"));
    assert_eq!(cfg["current_task"]["status"].as_str(), Some("In Progress"));
    assert!(cfg["current_task"]["start_time"].as_i64().unwrap() > 1_700_000_000);
}

#[test]
fn request_opens_pull_request() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/rest/api/2/issue/PROJ-42")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"key": "PROJ-42", "fields": {"summary": "Add login", "status": {"name": "In Progress"}}}"#)
        .create();
    let pr = server
        .mock("POST", "/rest/api/1.0/projects/proj/repos/proj/pull-requests")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "title": "PROJ-42 Add login",
            "fromRef": {"id": "refs/heads/feature/PROJ-42"},
            "toRef": {"id": "refs/heads/develop"},
        })))
        .with_status(201)
        .with_body(r#"{"links": {"self": [{"href": "https://host/pull-requests/3"}]}}"#)
        .create();

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server.url(), "rules:\n  branch:\n    default: feature/\n");

    tick(&dir)
        .args(["task", "PROJ-42", "-r"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://host/pull-requests/3"));
    pr.assert();
}
