#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config and plan-file schemas for the cable trainer.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section is optional; missing fields take the documented defaults.
//! - `Plan` files (TOML or JSON) describe an ordered list of exercise/echo
//!   items. `Plan::validate` range-checks each item; mode and level names are
//!   resolved by the engine when converting to its own types.
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineCfg {
    /// Reps counted as warmup before working reps start.
    pub warmup_reps: u32,
    /// Global stop-at-top preference; plan items override it per block.
    pub stop_at_top: bool,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            warmup_reps: 3,
            stop_at_top: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RangeCfg {
    /// Rolling window length while warmup reps are still being counted.
    pub warmup_window: usize,
    /// Rolling window length once warmup is done.
    pub working_window: usize,
    /// Minimum change of any range average (position units) that gets logged.
    pub log_threshold: i32,
}

impl Default for RangeCfg {
    fn default() -> Self {
        Self {
            warmup_window: 2,
            working_window: 3,
            log_threshold: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AutoStopCfg {
    /// Time spent in the danger zone before a Just Lift block ends.
    pub dwell_ms: u64,
    /// Cables whose discovered range is at or below this are ignored.
    pub min_range: i32,
    /// Danger zone height as a fraction of the discovered range.
    pub zone_fraction: f32,
}

impl Default for AutoStopCfg {
    fn default() -> Self {
        Self {
            dwell_ms: 5_000,
            min_range: 50,
            zone_fraction: 0.05,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PersonalBestCfg {
    /// Tolerance for PR comparisons (kg).
    pub epsilon_kg: f64,
}

impl Default for PersonalBestCfg {
    fn default() -> Self {
        Self { epsilon_kg: 1e-4 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RestCfg {
    /// Seconds added by one "extend rest" action.
    pub extend_sec: u64,
}

impl Default for RestCfg {
    fn default() -> Self {
        Self { extend_sec: 30 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedCfg {
    pub sample_rate_hz: u32,
    /// Max wait per telemetry read (ms).
    pub read_timeout_ms: u64,
    /// Abort the active block when telemetry has been silent this long.
    pub stall_ms: u64,
}

impl Default for FeedCfg {
    fn default() -> Self {
        Self {
            sample_rate_hz: 50,
            read_timeout_ms: 150,
            stall_ms: 2_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulatorCfg {
    /// Duration of one rep of the simulated athlete.
    pub rep_ms: u64,
    pub bottom: i32,
    pub top: i32,
    /// Stop moving after this many reps (lets Just Lift blocks auto-stop).
    pub hold_after_reps: Option<u32>,
    pub connected: bool,
    /// Per-cable load reported for adaptive (echo) programs.
    pub echo_load_kg: f32,
}

impl Default for SimulatorCfg {
    fn default() -> Self {
        Self {
            rep_ms: 2_000,
            bottom: 50,
            top: 650,
            hold_after_reps: None,
            connected: true,
            echo_load_kg: 20.0,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub engine: EngineCfg,
    pub range: RangeCfg,
    pub auto_stop: AutoStopCfg,
    pub personal_best: PersonalBestCfg,
    pub rest: RestCfg,
    pub feed: FeedCfg,
    pub simulator: SimulatorCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Engine
        if self.engine.warmup_reps > 20 {
            eyre::bail!("engine.warmup_reps must be <= 20");
        }

        // Range
        if self.range.warmup_window == 0 {
            eyre::bail!("range.warmup_window must be >= 1");
        }
        if self.range.working_window == 0 {
            eyre::bail!("range.working_window must be >= 1");
        }
        if self.range.warmup_window > 16 || self.range.working_window > 16 {
            eyre::bail!("range windows must be <= 16");
        }
        if self.range.log_threshold < 0 {
            eyre::bail!("range.log_threshold must be >= 0");
        }

        // Auto-stop
        if self.auto_stop.dwell_ms == 0 {
            eyre::bail!("auto_stop.dwell_ms must be >= 1");
        }
        if self.auto_stop.dwell_ms > 60_000 {
            eyre::bail!("auto_stop.dwell_ms is unreasonably large (>60s)");
        }
        if self.auto_stop.min_range < 0 {
            eyre::bail!("auto_stop.min_range must be >= 0");
        }
        if !(self.auto_stop.zone_fraction > 0.0 && self.auto_stop.zone_fraction < 1.0) {
            eyre::bail!("auto_stop.zone_fraction must be in (0.0, 1.0)");
        }

        // Personal best
        if !(self.personal_best.epsilon_kg >= 0.0 && self.personal_best.epsilon_kg <= 1.0) {
            eyre::bail!("personal_best.epsilon_kg must be in [0.0, 1.0]");
        }

        // Rest
        if self.rest.extend_sec == 0 || self.rest.extend_sec > 600 {
            eyre::bail!("rest.extend_sec must be in [1, 600]");
        }

        // Feed
        if self.feed.sample_rate_hz == 0 {
            eyre::bail!("feed.sample_rate_hz must be > 0");
        }
        if self.feed.sample_rate_hz > 1_000 {
            eyre::bail!("feed.sample_rate_hz must be <= 1000");
        }
        if self.feed.read_timeout_ms == 0 {
            eyre::bail!("feed.read_timeout_ms must be >= 1");
        }
        if self.feed.stall_ms < self.feed.read_timeout_ms {
            eyre::bail!("feed.stall_ms must be >= feed.read_timeout_ms");
        }

        // Simulator
        if self.simulator.rep_ms < 100 {
            eyre::bail!("simulator.rep_ms must be >= 100");
        }
        if self.simulator.top <= self.simulator.bottom {
            eyre::bail!("simulator.top must be above simulator.bottom");
        }
        if !(0.0..=100.0).contains(&self.simulator.echo_load_kg) {
            eyre::bail!("simulator.echo_load_kg must be in [0, 100]");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

// ── Plans ────────────────────────────────────────────────────────────────────

fn one() -> u32 {
    1
}

fn two() -> u8 {
    2
}

fn default_eccentric() -> u32 {
    100
}

/// A fixed-weight block on one of the machine's programs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExerciseCfg {
    #[serde(default)]
    pub name: Option<String>,
    /// Program name, e.g. "old school", "pump", "tut", "tut beast", "eccentric".
    pub mode: String,
    pub per_cable_kg: f32,
    #[serde(default)]
    pub reps: u32,
    #[serde(default = "one")]
    pub sets: u32,
    #[serde(default)]
    pub rest_sec: u64,
    #[serde(default = "two")]
    pub cables: u8,
    #[serde(default)]
    pub just_lift: bool,
    #[serde(default)]
    pub stop_at_top: bool,
    #[serde(default)]
    pub progression_kg: f32,
}

/// An adaptive (echo) block.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EchoCfg {
    #[serde(default)]
    pub name: Option<String>,
    /// "hard" | "harder" | "hardest" | "epic"
    pub level: String,
    #[serde(default = "default_eccentric")]
    pub eccentric_pct: u32,
    #[serde(default)]
    pub target_reps: u32,
    #[serde(default = "one")]
    pub sets: u32,
    #[serde(default)]
    pub rest_sec: u64,
    #[serde(default)]
    pub just_lift: bool,
    #[serde(default)]
    pub stop_at_top: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlanItemCfg {
    Exercise(ExerciseCfg),
    Echo(EchoCfg),
}

impl PlanItemCfg {
    pub fn sets(&self) -> u32 {
        match self {
            Self::Exercise(e) => e.sets,
            Self::Echo(e) => e.sets,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Plan {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<PlanItemCfg>,
}

pub fn parse_plan_toml(s: &str) -> Result<Plan, toml::de::Error> {
    toml::from_str::<Plan>(s)
}

pub fn parse_plan_json(s: &str) -> Result<Plan, serde_json::Error> {
    serde_json::from_str::<Plan>(s)
}

/// Load a plan file; `.json` files are parsed as JSON, everything else as TOML.
pub fn load_plan(path: &Path) -> eyre::Result<Plan> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read plan {:?}: {}", path, e))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let plan = if is_json {
        parse_plan_json(&text).map_err(|e| eyre::eyre!("parse plan {:?}: {}", path, e))?
    } else {
        parse_plan_toml(&text).map_err(|e| eyre::eyre!("parse plan {:?}: {}", path, e))?
    };
    Ok(plan)
}

const MAX_REPS: u32 = 100;
const MAX_SETS: u32 = 20;
const MAX_PER_CABLE_KG: f32 = 100.0;
const MAX_REST_SEC: u64 = 3_600;

impl Plan {
    pub fn validate(&self) -> eyre::Result<()> {
        for (idx, item) in self.items.iter().enumerate() {
            let n = idx + 1;
            if item.sets() == 0 || item.sets() > MAX_SETS {
                eyre::bail!("item {n}: sets must be in [1, {MAX_SETS}]");
            }
            match item {
                PlanItemCfg::Exercise(e) => {
                    if !e.per_cable_kg.is_finite() || e.per_cable_kg < 0.0 {
                        eyre::bail!("item {n}: per_cable_kg must be >= 0");
                    }
                    if e.per_cable_kg > MAX_PER_CABLE_KG {
                        eyre::bail!("item {n}: per_cable_kg must be <= {MAX_PER_CABLE_KG}");
                    }
                    if e.reps > MAX_REPS {
                        eyre::bail!("item {n}: reps must be <= {MAX_REPS}");
                    }
                    if e.reps == 0 && !e.just_lift {
                        eyre::bail!("item {n}: reps must be >= 1 unless just_lift is set");
                    }
                    if !(1..=2).contains(&e.cables) {
                        eyre::bail!("item {n}: cables must be 1 or 2");
                    }
                    if !e.progression_kg.is_finite() || e.progression_kg.abs() > 10.0 {
                        eyre::bail!("item {n}: progression_kg must be in [-10, 10]");
                    }
                    if e.rest_sec > MAX_REST_SEC {
                        eyre::bail!("item {n}: rest_sec must be <= {MAX_REST_SEC}");
                    }
                }
                PlanItemCfg::Echo(e) => {
                    if e.target_reps > MAX_REPS {
                        eyre::bail!("item {n}: target_reps must be <= {MAX_REPS}");
                    }
                    if e.target_reps == 0 && !e.just_lift {
                        eyre::bail!("item {n}: target_reps must be >= 1 unless just_lift is set");
                    }
                    if !(0..=150).contains(&e.eccentric_pct) {
                        eyre::bail!("item {n}: eccentric_pct must be in [0, 150]");
                    }
                    if e.rest_sec > MAX_REST_SEC {
                        eyre::bail!("item {n}: rest_sec must be <= {MAX_REST_SEC}");
                    }
                }
            }
        }
        Ok(())
    }
}
