//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str], stdin: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_studytimer"))
        .args(args)
        .env("STUDYTIMER_HOME", home.path())
        .env_remove("STUDYTIMER_LOG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait for CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("event line is JSON"))
        .collect()
}

#[test]
fn test_config_list_shows_defaults() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["config", "list"], "");
    assert_eq!(code, 0);

    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["timer"]["study_duration_minutes"], 25);
    assert_eq!(config["timer"]["long_break_interval"], 4);
    assert_eq!(config["recorder"]["local"], true);
    assert!(home.path().join("config.toml").exists());
}

#[test]
fn test_config_set_then_get() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "set", "timer.study_duration_minutes", "30"], "");
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(&home, &["config", "get", "timer.study_duration_minutes"], "");
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30");
}

#[test]
fn test_config_set_rejects_out_of_range() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["config", "set", "timer.short_break_minutes", "0"], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (stdout, _, _) = run_cli(&home, &["config", "get", "timer.short_break_minutes"], "");
    assert_eq!(stdout.trim(), "5");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["config", "get", "timer.nope"], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("timer.nope"));
}

#[test]
fn test_stats_on_empty_database() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["stats", "--recent", "5"], "");
    assert_eq!(code, 0);

    let output: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(output["stats"]["total_sessions"], 0);
    assert_eq!(output["recent"], serde_json::json!([]));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["completions", "bash"], "");
    assert_eq!(code, 0);
    assert!(stdout.contains("studytimer"));
}

#[test]
fn test_run_status_then_quit() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["run"], "status\nquit\n");
    assert_eq!(code, 0);

    let events = json_lines(&stdout);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "StateSnapshot");
    assert_eq!(events[0]["phase"], "work");
    assert_eq!(events[0]["remaining_secs"], 1500);
    assert_eq!(events[0]["running"], false);
}

#[test]
fn test_run_start_adjust_stop() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["run"], "+5\nstart\nstop\nq\n");
    assert_eq!(code, 0);

    let types: Vec<_> = json_lines(&stdout)
        .iter()
        .map(|event| event["type"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(types, ["TimeAdjusted", "TimerStarted", "TimerStopped"]);
}

#[test]
fn test_run_reports_unknown_commands() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["run"], "lap\n");
    assert_eq!(code, 0);
    assert!(stderr.contains("unknown command: lap"));
}
