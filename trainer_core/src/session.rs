//! Block parameters and the mutable record of the block in progress.
use trainer_traits::{Program, Sample};

use crate::history::{Identity, WorkoutRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Warmup,
    Working,
    Completing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Warmup => "warmup",
            Self::Working => "working",
            Self::Completing => "completing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Exercise,
    Echo,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exercise => "exercise",
            Self::Echo => "echo",
        }
    }
}

/// Why a block ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// Bottom of the last target rep.
    TargetReached,
    /// Top of the last target rep, after a stop command.
    StoppedAtTop,
    /// Just Lift danger-zone dwell elapsed.
    AutoStop,
    /// Explicit stop.
    UserStop,
}

impl CompletionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TargetReached => "target_reached",
            Self::StoppedAtTop => "stopped_at_top",
            Self::AutoStop => "auto_stop",
            Self::UserStop => "user_stop",
        }
    }
}

/// Position of a block inside a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLink {
    pub set_number: u32,
    pub set_total: u32,
    pub item_type: ItemKind,
}

/// What to run for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockConfig {
    /// Program label; also the fallback identity.
    pub mode: String,
    /// Per-cable resistance; zero for adaptive programs.
    pub weight_kg: f32,
    pub target_reps: u32,
    /// None uses the engine default.
    pub warmup_target: Option<u32>,
    pub just_lift: bool,
    pub progression_kg: f32,
    pub cables: u8,
    /// Eccentric load in percent of concentric.
    pub eccentric_pct: u32,
    /// Echo level index for adaptive programs.
    pub echo_level: Option<u8>,
    /// Exercise name; preferred identity when present.
    pub set_name: Option<String>,
    pub plan: Option<PlanLink>,
}

impl BlockConfig {
    pub fn new(mode: impl Into<String>, weight_kg: f32, target_reps: u32) -> Self {
        Self {
            mode: mode.into(),
            weight_kg,
            target_reps,
            warmup_target: None,
            just_lift: false,
            progression_kg: 0.0,
            cables: 2,
            eccentric_pct: 100,
            echo_level: None,
            set_name: None,
            plan: None,
        }
    }

    pub fn program(&self) -> Program {
        Program {
            label: self.mode.clone(),
            per_cable_kg: self.weight_kg,
            target_reps: self.target_reps,
            progression_kg: self.progression_kg,
            just_lift: self.just_lift,
            cables: self.cables,
            eccentric_pct: self.eccentric_pct,
            echo_level: self.echo_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    pub mode: String,
    pub weight_kg: f32,
    pub target_reps: u32,
    pub warmup_target: u32,
    pub just_lift: bool,
    /// Global stop-at-top flag captured when the block launched.
    pub stop_at_top: bool,
    pub start_ms: u64,
    pub warmup_end_ms: Option<u64>,
    pub end_ms: Option<u64>,
    pub identity: Option<Identity>,
    pub prior_best_total_load_kg: f64,
    pub live_peak_total_load_kg: f64,
    pub current_personal_best_kg: f64,
    pub celebrated_personal_best_kg: f64,
    pub has_new_personal_best: bool,
    pub warmup_reps: u32,
    pub working_reps: u32,
    pub set_name: Option<String>,
    pub plan: Option<PlanLink>,
}

impl WorkoutSession {
    pub(crate) fn start(
        cfg: &BlockConfig,
        warmup_target: u32,
        stop_at_top: bool,
        start_ms: u64,
        identity: Option<Identity>,
        prior_best: f64,
    ) -> Self {
        Self {
            mode: cfg.mode.clone(),
            weight_kg: cfg.weight_kg,
            target_reps: cfg.target_reps,
            warmup_target,
            just_lift: cfg.just_lift,
            stop_at_top,
            start_ms,
            warmup_end_ms: (warmup_target == 0).then_some(start_ms),
            end_ms: None,
            identity,
            prior_best_total_load_kg: prior_best,
            live_peak_total_load_kg: 0.0,
            current_personal_best_kg: prior_best,
            celebrated_personal_best_kg: prior_best,
            has_new_personal_best: false,
            warmup_reps: 0,
            working_reps: 0,
            set_name: cfg.set_name.clone(),
            plan: cfg.plan.clone(),
        }
    }

    #[inline]
    pub fn total_reps(&self) -> u32 {
        self.warmup_reps.saturating_add(self.working_reps)
    }

    #[inline]
    pub fn warmup_done(&self) -> bool {
        self.warmup_reps >= self.warmup_target
    }

    pub(crate) fn into_record(
        self,
        end_ms: u64,
        reason: CompletionReason,
        movement_data: Vec<Sample>,
    ) -> WorkoutRecord {
        WorkoutRecord {
            timestamp_ms: None,
            mode: self.mode,
            weight_kg: self.weight_kg,
            target_reps: self.target_reps,
            warmup_target: self.warmup_target,
            warmup_reps: self.warmup_reps,
            working_reps: self.working_reps,
            start_ms: self.start_ms,
            warmup_end_ms: self.warmup_end_ms,
            end_ms,
            identity_key: self.identity.as_ref().map(|i| i.key.clone()),
            identity_label: self.identity.map(|i| i.label),
            set_name: self.set_name,
            set_number: self.plan.as_ref().map(|p| p.set_number),
            set_total: self.plan.as_ref().map(|p| p.set_total),
            item_type: self.plan.map(|p| p.item_type),
            total_load_peak_kg: self.live_peak_total_load_kg,
            reason,
            movement_data,
        }
    }
}
