use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[engine]
warmup_reps = 1

[simulator]
rep_ms = 1000
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_lines(bytes: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(bytes)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad JSON line {l:?}: {e}")))
        .collect()
}

/// Every stdout line of a JSON run is one named engine event.
#[rstest]
fn jsonl_event_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = Command::cargo_bin("trainer_cli")
        .unwrap()
        .env("TRAINER_SIM_FAST", "1")
        .env_remove("RUST_LOG")
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("--history")
        .arg(dir.path().join("h.jsonl"))
        .args(["lift", "--kg", "10", "--reps", "2", "--name", "Curl"])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let events = json_lines(&out.stdout);
    assert!(events.iter().all(|e| e["event"].is_string()));
    let names: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();
    assert_eq!(names.first(), Some(&"block_started"));
    assert_eq!(names.last(), Some(&"plan_finished"));

    let started = &events[0];
    assert_eq!(started["identity"], "set:curl");
    assert_eq!(started["target_reps"], 2);
    assert_eq!(started["warmup_target"], 1);

    let reps = names.iter().filter(|n| **n == "rep_counted").count();
    assert_eq!(reps, 3);

    let done = events
        .iter()
        .find(|e| e["event"] == "workout_completed")
        .expect("workout_completed");
    assert_eq!(done["reason"], "target_reached");
    assert_eq!(done["working_reps"], 2);
    assert_eq!(done["warmup_reps"], 1);
    assert!(done["peak_kg"].as_f64().unwrap() > 0.0);
    assert!(done["record_id"].as_u64().is_some());

    let banner = events
        .iter()
        .find(|e| e["event"] == "pr_banner_status")
        .expect("pr_banner_status");
    assert_eq!(banner["status"], "new");
}

/// With --json, failures are a single JSON object on stderr.
#[rstest]
#[case::disconnected(&["lift", "--kg", "10"], Some("TRAINER_SIM_DISCONNECTED"), 2, "NotConnected")]
#[case::bad_mode(&["lift", "--kg", "10", "--mode", "zumba"], None, 1, "Config")]
fn jsonl_error_schema(
    #[case] args: &[&str],
    #[case] env: Option<&str>,
    #[case] code: i32,
    #[case] reason: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = Command::cargo_bin("trainer_cli").unwrap();
    cmd.env("TRAINER_SIM_FAST", "1")
        .env_remove("RUST_LOG")
        .arg("--json")
        .arg("--log-level")
        .arg("off")
        .arg("--config")
        .arg(&cfg)
        .arg("--history")
        .arg(dir.path().join("h.jsonl"))
        .args(args);
    if let Some(var) = env {
        cmd.env(var, "1");
    }
    let out = cmd.output().unwrap();
    assert_eq!(out.status.code(), Some(code));
    assert!(out.stdout.is_empty(), "{}", String::from_utf8_lossy(&out.stdout));

    let errs = json_lines(&out.stderr);
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert_eq!(errs[0]["reason"], reason);
    assert_eq!(errs[0]["exit_code"], code);
    assert!(errs[0]["message"].as_str().unwrap().contains("What happened:"));
}
