//! Basic CLI E2E tests.
//!
//! Each test runs the built `lass` binary against its own data directory.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_lass"))
        .env("LASS_DATA_DIR", data_dir)
        .env_remove("LASS_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is JSON")
}

#[test]
fn test_reminder_add_and_list() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["reminder", "add", "Revise chapter 3"]);
    run_json(dir.path(), &["reminder", "add", "Finish mock exam", "--goal"]);

    let list = run_json(dir.path(), &["reminder", "list"]);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["title"], "Finish mock exam");
    assert_eq!(list[0]["is_goal"], true);
}

#[test]
fn test_reminder_toggle_hides_completed() {
    let dir = TempDir::new().unwrap();
    let added = run_json(dir.path(), &["reminder", "add", "Flashcards"]);
    let id = added["id"].to_string();

    let (code, stdout, _) = run_cli(dir.path(), &["reminder", "toggle", &id]);
    assert_eq!(code, 0);
    assert!(stdout.contains("completed"));

    let open = run_json(dir.path(), &["reminder", "list"]);
    assert!(open.as_array().unwrap().is_empty());
    let all = run_json(dir.path(), &["reminder", "list", "--all"]);
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[test]
fn test_reminder_blank_title_rejected() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["reminder", "add", "   "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_question_add_and_list() {
    let dir = TempDir::new().unwrap();
    run_json(
        dir.path(),
        &["question", "add", "Derivative of sin x", "cos x", "--subject", "maths"],
    );
    run_json(dir.path(), &["question", "add", "Capital of Peru", "Lima"]);

    let list = run_json(dir.path(), &["question", "list"]);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["question"], "Capital of Peru");
    assert_eq!(list[1]["subject"], "maths");
}

#[test]
fn test_config_get_defaults() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "countdown.default_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30");

    let (code, _, _) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_set_persists() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "countdown.presets", "25,50"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "countdown.presets"]);
    assert_eq!(stdout.trim(), "[25,50]");
}

#[test]
fn test_countdown_custom_then_status() {
    let dir = TempDir::new().unwrap();
    let selected = run_json(dir.path(), &["countdown", "custom", "45"]);
    assert_eq!(selected["events"][0]["type"], "CountdownDurationSelected");

    let status = run_json(dir.path(), &["countdown", "status"]);
    assert_eq!(status["snapshot"]["state"], "idle");
    assert_eq!(status["snapshot"]["selected_minutes"], 45);
    assert_eq!(status["display"], "45:00");
}

#[test]
fn test_countdown_invalid_custom_fails() {
    let dir = TempDir::new().unwrap();
    for bad in ["0", "300001", "abc"] {
        let (code, _, stderr) = run_cli(dir.path(), &["countdown", "custom", bad]);
        assert_eq!(code, 1, "custom {bad} should fail");
        assert!(stderr.contains("error:"));
    }
    let status = run_json(dir.path(), &["countdown", "status"]);
    assert_eq!(status["snapshot"]["selected_minutes"], 30);
}

#[test]
fn test_countdown_pause_records_nothing() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["countdown", "start"]);
    let paused = run_json(dir.path(), &["countdown", "pause"]);
    assert_eq!(paused["snapshot"]["state"], "paused");

    let records = run_json(dir.path(), &["records", "list"]);
    assert!(records.as_array().unwrap().is_empty());
}

#[test]
fn test_stopwatch_stop_creates_record() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["stopwatch", "start"]);
    run_json(dir.path(), &["stopwatch", "lap"]);
    let stopped = run_json(dir.path(), &["stopwatch", "stop"]);
    assert_eq!(stopped["snapshot"]["running"], false);
    assert_eq!(stopped["snapshot"]["laps"].as_array().unwrap().len(), 1);

    let records = run_json(dir.path(), &["records", "list", "--kind", "stopwatch"]);
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["kind"], "stopwatch");

    let today = run_json(dir.path(), &["records", "today"]);
    assert_eq!(today["stats"]["sessions"], 1);
}

/// Start `lass <args>`, let it draw for a moment, then send Ctrl-C.
#[cfg(unix)]
fn interrupt_after_draw(data_dir: &Path, args: &[&str]) -> (i32, String) {
    use std::process::Stdio;
    use std::thread::sleep;
    use std::time::Duration;

    let child = Command::new(env!("CARGO_BIN_EXE_lass"))
        .env("LASS_DATA_DIR", data_dir)
        .args(args)
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");
    sleep(Duration::from_millis(1500));
    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("Failed to send SIGINT");
    assert!(status.success());

    let output = child.wait_with_output().expect("CLI did not exit");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    (output.status.code().unwrap_or(-1), stdout)
}

#[cfg(unix)]
#[test]
fn test_countdown_watch_detaches_on_interrupt() {
    let dir = TempDir::new().unwrap();
    let (code, stdout) = interrupt_after_draw(dir.path(), &["countdown", "watch"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("29:5") || stdout.contains("30:00"), "{stdout}");
    assert!(stdout.contains("detached"));

    let status = run_json(dir.path(), &["countdown", "status"]);
    assert_eq!(status["snapshot"]["state"], "running");
    let records = run_json(dir.path(), &["records", "list"]);
    assert!(records.as_array().unwrap().is_empty());
}

#[cfg(unix)]
#[test]
fn test_stopwatch_watch_detaches_on_interrupt() {
    let dir = TempDir::new().unwrap();
    let (code, stdout) = interrupt_after_draw(dir.path(), &["stopwatch", "watch"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("00:0"), "{stdout}");
    assert!(stdout.contains("detached"));

    let status = run_json(dir.path(), &["stopwatch", "status"]);
    assert_eq!(status["snapshot"]["running"], true);
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("lass"));
}
