//! CSV summary of stored workouts.

use eyre::{Result, WrapErr};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use trainer_core::WorkoutRecord;

#[derive(Debug, Serialize)]
struct Row<'a> {
    timestamp_ms: u64,
    identity: &'a str,
    mode: &'a str,
    set_name: &'a str,
    set: String,
    weight_kg: f32,
    warmup_reps: u32,
    working_reps: u32,
    target_reps: u32,
    reason: &'static str,
    duration_ms: u64,
    peak_kg: String,
}

fn row(r: &WorkoutRecord) -> Row<'_> {
    Row {
        timestamp_ms: r.record_id(),
        identity: r.identity_key.as_deref().unwrap_or(""),
        mode: &r.mode,
        set_name: r.set_name.as_deref().unwrap_or(""),
        set: match (r.set_number, r.set_total) {
            (Some(n), Some(t)) => format!("{n}/{t}"),
            _ => String::new(),
        },
        weight_kg: r.weight_kg,
        warmup_reps: r.warmup_reps,
        working_reps: r.working_reps,
        target_reps: r.target_reps,
        reason: r.reason.as_str(),
        duration_ms: r.end_ms.saturating_sub(r.start_ms),
        peak_kg: format!("{:.2}", r.peak_total_load_kg()),
    }
}

const COLUMNS: [&str; 12] = [
    "timestamp_ms",
    "identity",
    "mode",
    "set_name",
    "set",
    "weight_kg",
    "warmup_reps",
    "working_reps",
    "target_reps",
    "reason",
    "duration_ms",
    "peak_kg",
];

/// Write one CSV row per record, in the order given. Returns rows written.
pub fn write_csv<W: Write>(records: &[WorkoutRecord], out: W) -> Result<usize> {
    let mut w = csv::Writer::from_writer(out);
    // Serialized rows bring their own header; an empty export still gets one.
    if records.is_empty() {
        w.write_record(COLUMNS).wrap_err("write CSV header")?;
    }
    for r in records {
        w.serialize(row(r)).wrap_err("write CSV row")?;
    }
    w.flush().wrap_err("flush CSV")?;
    Ok(records.len())
}

pub fn export_file(records: &[WorkoutRecord], path: &Path) -> Result<usize> {
    let f = std::fs::File::create(path)
        .wrap_err_with(|| format!("create export file {}", path.display()))?;
    write_csv(records, f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainer_core::{CompletionReason, ItemKind};

    #[test]
    fn empty_history_still_has_a_header() {
        let mut buf = Vec::new();
        assert_eq!(write_csv(&[], &mut buf).unwrap(), 0);
        assert_eq!(String::from_utf8(buf).unwrap().trim_end(), COLUMNS.join(","));
    }

    #[test]
    fn header_and_rows_follow_record_order() {
        let rec = WorkoutRecord {
            timestamp_ms: Some(1_700_000_000_000),
            mode: "Old School".into(),
            weight_kg: 20.0,
            target_reps: 10,
            warmup_target: 3,
            warmup_reps: 3,
            working_reps: 10,
            start_ms: 1_000,
            warmup_end_ms: None,
            end_ms: 31_000,
            identity_key: Some("set:squat".into()),
            identity_label: Some("Squat".into()),
            set_name: Some("Squat".into()),
            set_number: Some(2),
            set_total: Some(4),
            item_type: Some(ItemKind::Exercise),
            total_load_peak_kg: 41.256,
            reason: CompletionReason::TargetReached,
            movement_data: Vec::new(),
        };
        let mut buf = Vec::new();
        assert_eq!(write_csv(&[rec], &mut buf).unwrap(), 1);
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp_ms,identity,mode,set_name,set,weight_kg,warmup_reps,working_reps,target_reps,reason,duration_ms,peak_kg"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1700000000000,set:squat,Old School,Squat,2/4,20.0,3,10,10,target_reached,30000,41.26"
        );
    }
}
