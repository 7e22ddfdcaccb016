use std::fs::File;
use std::io::Write;

use rstest::rstest;
use tempfile::tempdir;
use trainer_config::{PlanItemCfg, load_plan, parse_plan_json, parse_plan_toml};

const TOML_PLAN: &str = r#"
name = "Push day"

[[items]]
type = "exercise"
name = "Bench"
mode = "old school"
per_cable_kg = 20.0
reps = 8
sets = 3
rest_sec = 90

[[items]]
type = "echo"
level = "harder"
eccentric_pct = 120
target_reps = 10
stop_at_top = true
"#;

#[test]
fn toml_plan_parses_tagged_items_with_defaults() {
    let plan = parse_plan_toml(TOML_PLAN).expect("parse plan");
    plan.validate().expect("valid plan");
    assert_eq!(plan.name.as_deref(), Some("Push day"));
    assert_eq!(plan.items.len(), 2);
    match &plan.items[0] {
        PlanItemCfg::Exercise(e) => {
            assert_eq!(e.sets, 3);
            assert_eq!(e.cables, 2);
            assert!(!e.just_lift);
            assert_eq!(e.progression_kg, 0.0);
        }
        other => panic!("expected exercise, got {other:?}"),
    }
    match &plan.items[1] {
        PlanItemCfg::Echo(e) => {
            assert_eq!(e.sets, 1);
            assert_eq!(e.rest_sec, 0);
            assert!(e.stop_at_top);
        }
        other => panic!("expected echo, got {other:?}"),
    }
}

#[test]
fn json_plan_parses_same_schema() {
    let json = r#"{
        "items": [
            {"type": "exercise", "mode": "pump", "per_cable_kg": 12.5, "reps": 12, "sets": 2, "rest_sec": 60},
            {"type": "echo", "level": "epic", "target_reps": 0, "just_lift": true}
        ]
    }"#;
    let plan = parse_plan_json(json).expect("parse json plan");
    plan.validate().expect("valid plan");
    assert_eq!(plan.items[0].sets(), 2);
}

#[test]
fn unknown_item_type_is_rejected() {
    let toml = "[[items]]\ntype = \"cardio\"\n";
    assert!(parse_plan_toml(toml).is_err());
}

#[rstest]
#[case("sets = 0", "sets must be in [1, 20]")]
#[case("per_cable_kg = -1.0", "per_cable_kg must be >= 0")]
#[case("per_cable_kg = 250.0", "per_cable_kg must be <= 100")]
#[case("reps = 0", "reps must be >= 1 unless just_lift is set")]
#[case("cables = 3", "cables must be 1 or 2")]
#[case("rest_sec = 99999", "rest_sec must be <= 3600")]
fn exercise_bounds_are_enforced(#[case] field: &str, #[case] needle: &str) {
    let mut body = String::from("[[items]]\ntype = \"exercise\"\nmode = \"pump\"\n");
    for (key, default) in [("per_cable_kg", "10.0"), ("reps", "8"), ("sets", "1")] {
        if !field.starts_with(key) {
            body.push_str(&format!("{key} = {default}\n"));
        }
    }
    body.push_str(field);
    body.push('\n');
    let plan = parse_plan_toml(&body).expect("parse plan");
    let err = plan.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(needle), "expected '{needle}' in '{err}'");
}

#[test]
fn load_plan_dispatches_on_extension() {
    let dir = tempdir().unwrap();
    let toml_path = dir.path().join("plan.toml");
    File::create(&toml_path)
        .unwrap()
        .write_all(TOML_PLAN.as_bytes())
        .unwrap();
    assert_eq!(load_plan(&toml_path).unwrap().items.len(), 2);

    let json_path = dir.path().join("plan.JSON");
    File::create(&json_path)
        .unwrap()
        .write_all(br#"{"items":[{"type":"echo","level":"hard","target_reps":5}]}"#)
        .unwrap();
    assert_eq!(load_plan(&json_path).unwrap().items.len(), 1);
}

#[test]
fn load_plan_reports_path_on_missing_file() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = load_plan(&missing).expect_err("missing file");
    assert!(format!("{err}").contains("nope.toml"));
}
