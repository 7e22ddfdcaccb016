//! Events emitted for the presentation layer.
//!
//! The engine queues these and the caller drains them after each input; the
//! engine itself never renders anything.
use crate::history::PrStatus;
use crate::session::{CompletionReason, Phase};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    BlockStarted {
        label: String,
        identity: Option<String>,
        target_reps: u32,
        warmup_target: u32,
        just_lift: bool,
        stop_at_top: bool,
        set_number: Option<u32>,
        set_total: Option<u32>,
    },
    RepCounted {
        phase: Phase,
        warmup_reps: u32,
        warmup_target: u32,
        working_reps: u32,
        target_reps: u32,
    },
    /// One-shot celebration for a new live peak.
    PersonalBestAchieved {
        identity: String,
        peak_kg: f64,
        prior_best_kg: f64,
    },
    AutoStopProgress {
        in_danger_zone: bool,
        progress: f32,
    },
    WorkoutCompleted {
        reason: CompletionReason,
        record_id: u64,
        warmup_reps: u32,
        working_reps: u32,
        peak_kg: f64,
        duration_ms: u64,
    },
    PrBannerStatus {
        identity: String,
        status: PrStatus,
        peak_kg: f64,
        prior_best_kg: f64,
    },
    RestStarted {
        duration_secs: u64,
        next_label: String,
    },
    RestTick {
        remaining_secs: u64,
        progress: f32,
    },
    RestFinished {
        skipped: bool,
    },
    PlanFinished {
        blocks: u32,
    },
    PlanAborted {
        reason: String,
    },
}

impl EngineEvent {
    /// Stable snake_case name, used for structured output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BlockStarted { .. } => "block_started",
            Self::RepCounted { .. } => "rep_counted",
            Self::PersonalBestAchieved { .. } => "personal_best_achieved",
            Self::AutoStopProgress { .. } => "auto_stop_progress",
            Self::WorkoutCompleted { .. } => "workout_completed",
            Self::PrBannerStatus { .. } => "pr_banner_status",
            Self::RestStarted { .. } => "rest_started",
            Self::RestTick { .. } => "rest_tick",
            Self::RestFinished { .. } => "rest_finished",
            Self::PlanFinished { .. } => "plan_finished",
            Self::PlanAborted { .. } => "plan_aborted",
        }
    }
}
