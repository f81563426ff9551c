use std::process::Command;

use tempfile::TempDir;

fn run_classfetch(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_classfetch"))
        .args(args)
        .output()
        .expect("run classfetch")
}

fn single_json_error_line(stdout: &[u8]) -> serde_json::Value {
    let text = String::from_utf8(stdout.to_vec()).expect("utf8 stdout");
    let mut lines = text.lines();
    let line = lines.next().expect("one stdout line");
    assert!(lines.next().is_none(), "expected exactly one stdout line");
    let value: serde_json::Value = serde_json::from_str(line).expect("stdout line is JSON");
    assert!(
        value.get("error").is_some_and(|e| e.is_string()),
        "expected an error body, got: {line}"
    );
    value
}

#[test]
fn missing_number_fails_with_json_error() {
    let output = run_classfetch(&[]);
    assert_eq!(output.status.code(), Some(1));
    let value = single_json_error_line(&output.stdout);
    assert!(value["error"]
        .as_str()
        .unwrap()
        .contains("missing class number"));
}

#[test]
fn blank_number_fails_with_json_error() {
    let output = run_classfetch(&["   "]);
    assert_eq!(output.status.code(), Some(1));
    single_json_error_line(&output.stdout);
}

#[test]
fn unreadable_config_path_fails_before_any_browser_work() {
    let output = run_classfetch(&["12345", "--config", "/no/such/fetch.toml"]);
    assert_eq!(output.status.code(), Some(1));
    let value = single_json_error_line(&output.stdout);
    assert!(value["error"].as_str().unwrap().contains("config"));
}

#[test]
fn malformed_config_fails_before_any_browser_work() {
    let dir = TempDir::new().expect("tempdir");
    let cfg_path = dir.path().join("fetch.toml");
    std::fs::write(&cfg_path, "deadline = [not toml").expect("write config");

    let output = run_classfetch(&["12345", "--config", cfg_path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    single_json_error_line(&output.stdout);
}

#[test]
fn invalid_timeout_combination_is_rejected() {
    // Nav timeout at or over the deadline cannot fit inside the watchdog.
    let output = run_classfetch(&["12345", "--deadline", "5", "--nav-timeout", "5"]);
    assert_eq!(output.status.code(), Some(1));
    let value = single_json_error_line(&output.stdout);
    assert!(value["error"].as_str().unwrap().contains("deadline"));
}
