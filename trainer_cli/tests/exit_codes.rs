use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[rstest]
#[case::empty_plan("name = \"nothing\"\n", 3, "The plan has no items")]
#[case::bad_sets("[[items]]\ntype = \"exercise\"\nmode = \"pump\"\nper_cable_kg = 5.0\nreps = 5\nsets = 0\n", 1, "sets must be in")]
#[case::syntax("[[items]\n", 1, "plan file could not be used")]
fn plan_errors_map_to_exit_codes(#[case] plan: &str, #[case] code: i32, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.toml");
    fs::write(&path, plan).unwrap();
    Command::cargo_bin("trainer_cli")
        .unwrap()
        .env("TRAINER_SIM_FAST", "1")
        .arg("--history")
        .arg(dir.path().join("h.jsonl"))
        .arg("run")
        .arg("--plan")
        .arg(&path)
        .assert()
        .code(code)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn disconnected_machine_exits_with_two() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("trainer_cli")
        .unwrap()
        .env("TRAINER_SIM_FAST", "1")
        .env("TRAINER_SIM_DISCONNECTED", "1")
        .arg("--history")
        .arg(dir.path().join("h.jsonl"))
        .args(["lift", "--kg", "10", "--reps", "5"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not connected"));
    // Nothing ran, so nothing was recorded.
    assert!(!dir.path().join("h.jsonl").exists());
}

#[test]
fn self_check_fails_without_machine() {
    Command::cargo_bin("trainer_cli")
        .unwrap()
        .env("TRAINER_SIM_DISCONNECTED", "1")
        .arg("self-check")
        .assert()
        .code(2);
}

#[test]
fn invalid_config_is_explained() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, "[feed]\nsample_rate_hz = 0\n").unwrap();
    Command::cargo_bin("trainer_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid"))
        .stderr(predicate::str::contains("sample_rate_hz"));
}
