//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_mindful"))
        .args(args)
        .env("MINDFUL_DATA_DIR", data_dir)
        .env_remove("MINDFUL_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_status_of_fresh_timer_is_idle() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0, "timer status failed");
    let json = parse_json(&stdout);
    assert_eq!(json["type"], "StateSnapshot");
    assert_eq!(json["state"], "idle");
    assert_eq!(json["total_secs"], 120);
    assert_eq!(json["phase_name"], "inhale");
}

#[test]
fn test_start_pause_resume_reset() {
    let dir = tempfile::tempdir().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "start", "--minutes", "5"]);
    assert_eq!(code, 0, "timer start failed");
    let started = parse_json(&stdout);
    assert_eq!(started["type"], "TimerStarted");
    assert_eq!(started["total_secs"], 300);

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 0, "timer pause failed");
    assert_eq!(parse_json(&stdout)["type"], "TimerPaused");

    // Pausing twice is a no-op that reports the current state.
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 0);
    assert_eq!(parse_json(&stdout)["state"], "paused");

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "resume"]);
    assert_eq!(code, 0, "timer resume failed");
    assert_eq!(parse_json(&stdout)["type"], "TimerResumed");

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "reset"]);
    assert_eq!(code, 0, "timer reset failed");
    assert_eq!(parse_json(&stdout)["type"], "TimerReset");

    let (_, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    let status = parse_json(&stdout);
    assert_eq!(status["state"], "idle");
    assert_eq!(status["elapsed_secs"], 0);
    assert_eq!(status["total_secs"], 300);
}

#[test]
fn test_resume_does_not_start_an_idle_timer() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "resume"]);
    assert_eq!(code, 0, "timer resume failed");
    let status = parse_json(&stdout);
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["state"], "idle");
}

#[test]
fn test_focus_session_uses_single_phase() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["timer", "reset", "--kind", "focus"]);
    assert_eq!(code, 0);

    let (_, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    let status = parse_json(&stdout);
    assert_eq!(status["total_secs"], 25 * 60);
    assert_eq!(status["phase_name"], "focus");
}

#[test]
fn test_zero_minutes_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["timer", "start", "--minutes", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Invalid timer configuration"));
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "set", "focus.default_minutes", "45"]);
    assert_eq!(code, 0, "config set failed");
    assert_eq!(stdout.trim(), "ok");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "focus.default_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "45");

    let (code, _, _) = run_cli(dir.path(), &["config", "get", "focus.nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_stats_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["stats", "all"]);
    assert_eq!(code, 0, "stats all failed");
    let stats = parse_json(&stdout);
    assert_eq!(stats["total_sessions"], 0);
    assert_eq!(stats["breath_cycles"], 0);
}

#[test]
fn test_presets_lists_box_breathing() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["presets"]);
    assert_eq!(code, 0, "presets failed");
    let presets = parse_json(&stdout);
    assert_eq!(presets["breathing"]["cycle_secs"], 14);
    assert_eq!(presets["breathing"]["pattern"][0]["name"], "inhale");
    assert_eq!(presets["focus"]["presets"][2]["clock"], "25:00");
}
