//! `From`/`TryFrom` implementations bridging `trainer_config` types to `trainer_core` types.

use crate::config::{AutoStopCfg, EngineCfg, FeedCfg, PersonalBestCfg, RangeCfg, RestCfg};
use crate::error::TrainerError;
use crate::plan::{EchoItem, EchoLevel, ExerciseItem, PlanItem, ProgramMode};
use crate::util::secs_to_ms;

// ── Engine sections ──────────────────────────────────────────────────────────

impl From<&trainer_config::RangeCfg> for RangeCfg {
    fn from(c: &trainer_config::RangeCfg) -> Self {
        Self {
            warmup_window: c.warmup_window,
            working_window: c.working_window,
            log_threshold: c.log_threshold,
        }
    }
}

impl From<&trainer_config::AutoStopCfg> for AutoStopCfg {
    fn from(c: &trainer_config::AutoStopCfg) -> Self {
        Self {
            dwell_ms: c.dwell_ms,
            min_range: c.min_range,
            zone_fraction: c.zone_fraction,
        }
    }
}

impl From<&trainer_config::PersonalBestCfg> for PersonalBestCfg {
    fn from(c: &trainer_config::PersonalBestCfg) -> Self {
        Self {
            epsilon_kg: c.epsilon_kg,
        }
    }
}

impl From<&trainer_config::RestCfg> for RestCfg {
    fn from(c: &trainer_config::RestCfg) -> Self {
        Self {
            extend_ms: secs_to_ms(c.extend_sec),
        }
    }
}

impl From<&trainer_config::FeedCfg> for FeedCfg {
    fn from(c: &trainer_config::FeedCfg) -> Self {
        Self {
            sample_rate_hz: c.sample_rate_hz,
            read_timeout_ms: c.read_timeout_ms,
            stall_ms: c.stall_ms,
        }
    }
}

impl From<&trainer_config::Config> for EngineCfg {
    fn from(c: &trainer_config::Config) -> Self {
        Self {
            warmup_reps: c.engine.warmup_reps,
            stop_at_top: c.engine.stop_at_top,
            range: (&c.range).into(),
            auto_stop: (&c.auto_stop).into(),
            personal_best: (&c.personal_best).into(),
        }
    }
}

// ── Plan items ───────────────────────────────────────────────────────────────

fn blank_to_none(name: Option<&String>) -> Option<String> {
    name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl TryFrom<&trainer_config::ExerciseCfg> for ExerciseItem {
    type Error = TrainerError;
    fn try_from(c: &trainer_config::ExerciseCfg) -> Result<Self, Self::Error> {
        let mode: ProgramMode = c.mode.parse()?;
        Ok(Self {
            name: blank_to_none(c.name.as_ref()),
            mode,
            per_cable_kg: c.per_cable_kg,
            reps: c.reps,
            sets: c.sets.max(1),
            rest_sec: c.rest_sec,
            cables: c.cables,
            just_lift: c.just_lift,
            stop_at_top: c.stop_at_top,
            progression_kg: c.progression_kg,
        })
    }
}

impl TryFrom<&trainer_config::EchoCfg> for EchoItem {
    type Error = TrainerError;
    fn try_from(c: &trainer_config::EchoCfg) -> Result<Self, Self::Error> {
        let level: EchoLevel = c.level.parse()?;
        Ok(Self {
            name: blank_to_none(c.name.as_ref()),
            level,
            eccentric_pct: c.eccentric_pct,
            target_reps: c.target_reps,
            sets: c.sets.max(1),
            rest_sec: c.rest_sec,
            just_lift: c.just_lift,
            stop_at_top: c.stop_at_top,
        })
    }
}

impl TryFrom<&trainer_config::PlanItemCfg> for PlanItem {
    type Error = TrainerError;
    fn try_from(c: &trainer_config::PlanItemCfg) -> Result<Self, Self::Error> {
        Ok(match c {
            trainer_config::PlanItemCfg::Exercise(e) => Self::Exercise(e.try_into()?),
            trainer_config::PlanItemCfg::Echo(e) => Self::Echo(e.try_into()?),
        })
    }
}

/// Convert every item of a plan file, failing on the first unknown mode/level.
pub fn plan_items(plan: &trainer_config::Plan) -> Result<Vec<PlanItem>, TrainerError> {
    plan.items.iter().map(PlanItem::try_from).collect()
}
