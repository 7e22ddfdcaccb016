//! Human-readable error descriptions and structured JSON error formatting.

use trainer_core::error::{BuildError, TrainerError};

fn trainer_error(err: &eyre::Report) -> Option<&TrainerError> {
    err.chain().find_map(|e| e.downcast_ref::<TrainerError>())
}

/// Stable name of the error kind for JSON output.
fn reason_name(err: &eyre::Report) -> &'static str {
    match trainer_error(err) {
        Some(TrainerError::Transport(_)) => "Transport",
        Some(TrainerError::Timeout) => "Timeout",
        Some(TrainerError::StopFailed(_)) => "StopFailed",
        Some(TrainerError::NotConnected) => "NotConnected",
        Some(TrainerError::EmptyPlan) => "EmptyPlan",
        Some(TrainerError::State(_)) => "State",
        Some(TrainerError::Config(_)) => "Config",
        Some(TrainerError::Storage(_)) => "Storage",
        None if err.downcast_ref::<BuildError>().is_some() => "Build",
        None => "Error",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingMachine => {
                "What happened: No machine was provided to the workout engine.\nLikely causes: The machine connection failed or was not wired into the builder.\nHow to fix: Connect the machine and pass it via with_machine(...).".to_string()
            }
            BuildError::MissingHistory => {
                "What happened: No history store was provided to the workout engine.\nLikely causes: The history file could not be opened.\nHow to fix: Check --history points to a writable location.".to_string()
            }
            BuildError::MissingArchive => {
                "What happened: No sample archive was provided to the workout engine.\nLikely causes: The engine was built without with_archive(...).\nHow to fix: Provide an archive; the in-memory one is fine for most uses.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid engine configuration ({msg}).\nLikely causes: Out-of-range values in the [range], [auto_stop] or [personal_best] sections.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(te) = trainer_error(err) {
        return match te {
            TrainerError::NotConnected => "What happened: The machine is not connected.\nLikely causes: The trainer is off, out of range, or paired to another device.\nHow to fix: Power on and reconnect the trainer, then start again.".to_string(),
            TrainerError::EmptyPlan => "What happened: The plan has no items.\nLikely causes: The plan file has no [[items]] entries.\nHow to fix: Add at least one exercise or echo item to the plan.".to_string(),
            TrainerError::StopFailed(msg) => format!(
                "What happened: The machine did not accept the stop command ({msg}).\nLikely causes: Link dropped mid-set or the machine is busy.\nHow to fix: Release the handles, stop the machine from its panel, then reconnect."
            ),
            TrainerError::Timeout => "What happened: Telemetry from the machine stopped arriving.\nLikely causes: Weak link, machine powered off mid-set, or feed.stall_ms set too low.\nHow to fix: Move closer to the trainer, check power, and consider raising feed.stall_ms in the config.".to_string(),
            TrainerError::Config(msg) => format!(
                "What happened: Invalid workout settings ({msg}).\nLikely causes: Unknown mode or echo level, or a value out of range.\nHow to fix: Modes are old-school, pump, tut, tut-beast, eccentric-only; echo levels are hard, harder, hardest, epic."
            ),
            TrainerError::Storage(msg) => format!(
                "What happened: The workout history file could not be read ({msg}).\nLikely causes: The file was edited by hand or truncated.\nHow to fix: Restore the file from backup or point --history elsewhere."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or plan files
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("parse plan") || lower.contains("invalid plan") || lower.contains("read plan")
    {
        return format!(
            "What happened: The plan file could not be used.\nLikely causes: Missing file, syntax error, or an item with out-of-range sets/reps/kg.\nHow to fix: Fix the plan file and try again. Details: {msg}"
        );
    }

    if lower.contains("config") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: Out-of-range values or a typo in a section name.\nHow to fix: Edit the TOML config and try again. Details: {msg}"
        );
    }

    if lower.contains("history") {
        return format!(
            "What happened: The workout history file could not be read.\nLikely causes: The file was edited by hand or truncated.\nHow to fix: Restore the file from backup or point --history elsewhere. Details: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes for the error kinds scripts care about; everything else is 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match trainer_error(err) {
        Some(TrainerError::NotConnected) => 2,
        Some(TrainerError::EmptyPlan) => 3,
        Some(TrainerError::StopFailed(_)) => 4,
        Some(TrainerError::Timeout) => 5,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;
    use rstest::rstest;

    #[rstest]
    #[case(TrainerError::NotConnected, 2)]
    #[case(TrainerError::EmptyPlan, 3)]
    #[case(TrainerError::StopFailed("link lost".into()), 4)]
    #[case(TrainerError::Timeout, 5)]
    #[case(TrainerError::State("busy".into()), 1)]
    fn exit_codes_survive_context(#[case] e: TrainerError, #[case] code: i32) {
        let wrapped: eyre::Result<()> = Err(eyre::Report::new(e)).wrap_err("start program 'Pump'");
        let err = wrapped.unwrap_err();
        assert_eq!(exit_code_for_error(&err), code);
    }

    #[test]
    fn json_error_names_the_kind() {
        let err = eyre::Report::new(TrainerError::EmptyPlan);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "EmptyPlan");
        assert_eq!(v["exit_code"], 3);
        assert!(v["message"].as_str().unwrap().starts_with("What happened:"));
    }

    #[test]
    fn storage_errors_point_at_the_history_file() {
        let wrapped: eyre::Result<()> =
            Err(eyre::Report::new(TrainerError::Storage("history h.jsonl line 3".into())))
                .wrap_err("open history");
        let err = wrapped.unwrap_err();
        assert_eq!(exit_code_for_error(&err), 1);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Storage");
        assert!(v["message"].as_str().unwrap().contains("line 3"));
    }

    #[test]
    fn plain_errors_fall_back_to_generic_text() {
        let err = eyre::eyre!("disk on fire");
        let text = humanize(&err);
        assert!(text.starts_with("Something went wrong."));
        assert!(text.contains("disk on fire"));
    }
}
