//! Workout history persisted as JSON lines, one record per line, oldest first
//! on disk and newest first in memory.

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use trainer_core::{CompletionReason, HistoryStore, ItemKind, TrainerError, WorkoutRecord};
use trainer_traits::{BoxError, Sample};

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
struct StoredSample {
    t: u64,
    a_kg: f32,
    b_kg: f32,
    a_pos: i32,
    b_pos: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    timestamp_ms: Option<u64>,
    mode: String,
    weight_kg: f32,
    target_reps: u32,
    warmup_target: u32,
    warmup_reps: u32,
    working_reps: u32,
    start_ms: u64,
    #[serde(default)]
    warmup_end_ms: Option<u64>,
    end_ms: u64,
    #[serde(default)]
    identity_key: Option<String>,
    #[serde(default)]
    identity_label: Option<String>,
    #[serde(default)]
    set_name: Option<String>,
    #[serde(default)]
    set_number: Option<u32>,
    #[serde(default)]
    set_total: Option<u32>,
    #[serde(default)]
    item_type: Option<String>,
    #[serde(default)]
    total_load_peak_kg: f64,
    reason: String,
    #[serde(default)]
    movement_data: Vec<StoredSample>,
}

fn reason_from_str(s: &str) -> Option<CompletionReason> {
    Some(match s {
        "target_reached" => CompletionReason::TargetReached,
        "stopped_at_top" => CompletionReason::StoppedAtTop,
        "auto_stop" => CompletionReason::AutoStop,
        "user_stop" => CompletionReason::UserStop,
        _ => return None,
    })
}

fn kind_from_str(s: &str) -> Option<ItemKind> {
    match s {
        "exercise" => Some(ItemKind::Exercise),
        "echo" => Some(ItemKind::Echo),
        _ => None,
    }
}

impl From<&WorkoutRecord> for StoredRecord {
    fn from(r: &WorkoutRecord) -> Self {
        Self {
            timestamp_ms: r.timestamp_ms,
            mode: r.mode.clone(),
            weight_kg: r.weight_kg,
            target_reps: r.target_reps,
            warmup_target: r.warmup_target,
            warmup_reps: r.warmup_reps,
            working_reps: r.working_reps,
            start_ms: r.start_ms,
            warmup_end_ms: r.warmup_end_ms,
            end_ms: r.end_ms,
            identity_key: r.identity_key.clone(),
            identity_label: r.identity_label.clone(),
            set_name: r.set_name.clone(),
            set_number: r.set_number,
            set_total: r.set_total,
            item_type: r.item_type.map(|k| k.as_str().to_string()),
            total_load_peak_kg: r.total_load_peak_kg,
            reason: r.reason.as_str().to_string(),
            movement_data: r
                .movement_data
                .iter()
                .map(|s| StoredSample {
                    t: s.timestamp_ms,
                    a_kg: s.load_a_kg,
                    b_kg: s.load_b_kg,
                    a_pos: s.pos_a,
                    b_pos: s.pos_b,
                })
                .collect(),
        }
    }
}

impl TryFrom<StoredRecord> for WorkoutRecord {
    type Error = eyre::Report;
    fn try_from(s: StoredRecord) -> Result<Self> {
        let reason = reason_from_str(&s.reason).ok_or_else(|| {
            TrainerError::Storage(format!("unknown completion reason '{}'", s.reason))
        })?;
        Ok(Self {
            timestamp_ms: s.timestamp_ms,
            mode: s.mode,
            weight_kg: s.weight_kg,
            target_reps: s.target_reps,
            warmup_target: s.warmup_target,
            warmup_reps: s.warmup_reps,
            working_reps: s.working_reps,
            start_ms: s.start_ms,
            warmup_end_ms: s.warmup_end_ms,
            end_ms: s.end_ms,
            identity_key: s.identity_key,
            identity_label: s.identity_label,
            set_name: s.set_name,
            set_number: s.set_number,
            set_total: s.set_total,
            item_type: s.item_type.as_deref().and_then(kind_from_str),
            total_load_peak_kg: s.total_load_peak_kg,
            reason,
            movement_data: s
                .movement_data
                .into_iter()
                .map(|m| Sample {
                    load_a_kg: m.a_kg,
                    load_b_kg: m.b_kg,
                    pos_a: m.a_pos,
                    pos_b: m.b_pos,
                    timestamp_ms: m.t,
                })
                .collect(),
        })
    }
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// History backed by a JSON-lines file.
#[derive(Debug)]
pub struct JsonlHistory {
    path: PathBuf,
    records: Vec<WorkoutRecord>,
}

impl JsonlHistory {
    /// Load `path`; a missing file is an empty history.
    pub fn open(path: &Path) -> Result<Self> {
        let mut records = Vec::new();
        if path.exists() {
            let f = File::open(path)
                .wrap_err_with(|| format!("open history {}", path.display()))?;
            for (i, line) in BufReader::new(f).lines().enumerate() {
                let line = line.wrap_err("read history line")?;
                if line.trim().is_empty() {
                    continue;
                }
                let at = || format!("history {} line {}", path.display(), i + 1);
                let stored: StoredRecord = serde_json::from_str(&line)
                    .map_err(|e| TrainerError::Storage(format!("{}: {e}", at())))?;
                records.push(WorkoutRecord::try_from(stored).wrap_err_with(at)?);
            }
        }
        records.reverse();
        tracing::debug!(path = %path.display(), records = records.len(), "history loaded");
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next unused timestamp; ids stay unique when two blocks end in the same ms.
    fn next_stamp(&self) -> u64 {
        let newest = self.records.first().map_or(0, WorkoutRecord::record_id);
        unix_ms().max(newest.saturating_add(1))
    }
}

impl HistoryStore for JsonlHistory {
    fn all_records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    fn append(&mut self, mut record: WorkoutRecord) -> std::result::Result<u64, BoxError> {
        let stamp = self.next_stamp();
        record.timestamp_ms = Some(stamp);
        let line = serde_json::to_string(&StoredRecord::from(&record))?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(f, "{line}")?;
        self.records.insert(0, record);
        Ok(stamp)
    }
}
