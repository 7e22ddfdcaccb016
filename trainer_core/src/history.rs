//! Finished workouts, identity scoping and personal-best lookups.
use trainer_traits::{BoxError, Sample};

use crate::session::{CompletionReason, ItemKind};

/// Immutable record of a finished block.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRecord {
    /// Wall-clock stamp assigned by the store, when it has one.
    pub timestamp_ms: Option<u64>,
    pub mode: String,
    pub weight_kg: f32,
    pub target_reps: u32,
    pub warmup_target: u32,
    pub warmup_reps: u32,
    pub working_reps: u32,
    pub start_ms: u64,
    pub warmup_end_ms: Option<u64>,
    pub end_ms: u64,
    pub identity_key: Option<String>,
    pub identity_label: Option<String>,
    pub set_name: Option<String>,
    pub set_number: Option<u32>,
    pub set_total: Option<u32>,
    pub item_type: Option<ItemKind>,
    /// Cached peak of combined load; zero means "not cached".
    pub total_load_peak_kg: f64,
    pub reason: CompletionReason,
    pub movement_data: Vec<Sample>,
}

impl WorkoutRecord {
    /// History identity: the store timestamp, else the end time.
    #[inline]
    pub fn record_id(&self) -> u64 {
        self.timestamp_ms.unwrap_or(self.end_ms)
    }

    pub fn peak_total_load_kg(&self) -> f64 {
        if self.total_load_peak_kg > 0.0 {
            return self.total_load_peak_kg;
        }
        self.movement_data
            .iter()
            .map(Sample::total_load_kg)
            .fold(0.0, f64::max)
    }

    /// Stored key, or the key derived from set name / mode for older records.
    pub fn identity_key(&self) -> Option<String> {
        self.identity_key.clone().or_else(|| {
            identity_for(self.set_name.as_deref(), Some(self.mode.as_str())).map(|i| i.key)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// `set:<name>` or `mode:<mode>`, lowercased.
    pub key: String,
    /// Display form of the name the key was built from.
    pub label: String,
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Identity for personal-best scoping; the set name wins over the mode.
pub fn identity_for(set_name: Option<&str>, mode: Option<&str>) -> Option<Identity> {
    if let Some(name) = non_blank(set_name) {
        return Some(Identity {
            key: format!("set:{}", name.to_lowercase()),
            label: name.to_string(),
        });
    }
    non_blank(mode).map(|m| Identity {
        key: format!("mode:{}", m.to_lowercase()),
        label: m.to_string(),
    })
}

/// Best peak among records with `key`.
pub fn prior_best(records: &[WorkoutRecord], key: &str) -> f64 {
    records
        .iter()
        .filter(|r| r.identity_key().as_deref() == Some(key))
        .map(WorkoutRecord::peak_total_load_kg)
        .fold(0.0, f64::max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrStatus {
    New,
    Matched,
    Behind,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Matched => "matched",
            Self::Behind => "behind",
        }
    }
}

pub fn classify_pr(current_peak: f64, prior_best: f64, epsilon: f64) -> PrStatus {
    if current_peak > prior_best + epsilon {
        PrStatus::New
    } else if (current_peak - prior_best).abs() <= epsilon && prior_best > 0.0 {
        PrStatus::Matched
    } else {
        PrStatus::Behind
    }
}

/// Persisted workout history, newest record first.
pub trait HistoryStore {
    fn all_records(&self) -> &[WorkoutRecord];
    /// Store `record` and return its id as stored.
    fn append(&mut self, record: WorkoutRecord) -> Result<u64, BoxError>;
}

/// Recent live samples, used to attach movement data to records.
pub trait SampleArchive {
    fn record(&mut self, sample: &Sample);
    /// Samples with `start_ms <= timestamp_ms <= end_ms`, oldest first.
    fn samples_between(&self, start_ms: u64, end_ms: u64) -> Vec<Sample>;
}

impl<T: HistoryStore + ?Sized> HistoryStore for Box<T> {
    fn all_records(&self) -> &[WorkoutRecord] {
        (**self).all_records()
    }
    fn append(&mut self, record: WorkoutRecord) -> Result<u64, BoxError> {
        (**self).append(record)
    }
}

impl<T: SampleArchive + ?Sized> SampleArchive for Box<T> {
    fn record(&mut self, sample: &Sample) {
        (**self).record(sample);
    }
    fn samples_between(&self, start_ms: u64, end_ms: u64) -> Vec<Sample> {
        (**self).samples_between(start_ms, end_ms)
    }
}
