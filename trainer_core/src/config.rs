//! Configuration types for the workout engine.
//!
//! These are the runtime configuration structs used by the controller, the
//! plan runner and the live feed. They are separate from the
//! TOML-deserialized config in `trainer_config`.

/// Rolling window sizing for range discovery.
#[derive(Debug, Clone)]
pub struct RangeCfg {
    /// Window length while `warmup + working < warmup_target`.
    pub warmup_window: usize,
    /// Window length once warmup is done.
    pub working_window: usize,
    /// Log a range summary when any average moves by more than this.
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

/// Danger-zone detection for Just Lift blocks.
#[derive(Debug, Clone)]
pub struct AutoStopCfg {
    /// Dwell time in the zone before auto-stop fires.
    pub dwell_ms: u64,
    /// A cable is checked only when its discovered range exceeds this.
    pub min_range: i32,
    /// Zone height as a fraction of the discovered range, measured from the bottom.
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

#[derive(Debug, Clone)]
pub struct PersonalBestCfg {
    /// Tolerance used for celebration hysteresis and banner ties.
    pub epsilon_kg: f64,
}

impl Default for PersonalBestCfg {
    fn default() -> Self {
        Self { epsilon_kg: 1e-4 }
    }
}

#[derive(Debug, Clone)]
pub struct RestCfg {
    /// Added to the remaining rest by `extend_rest`.
    pub extend_ms: u64,
}

impl Default for RestCfg {
    fn default() -> Self {
        Self { extend_ms: 30_000 }
    }
}

/// Live feed pacing and watchdog.
#[derive(Debug, Clone)]
pub struct FeedCfg {
    pub sample_rate_hz: u32,
    pub read_timeout_ms: u64,
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

/// Everything the session controller needs.
#[derive(Debug, Clone)]
pub struct EngineCfg {
    /// Default warmup target for blocks that do not set one.
    pub warmup_reps: u32,
    /// Initial value of the global stop-at-top flag.
    pub stop_at_top: bool,
    pub range: RangeCfg,
    pub auto_stop: AutoStopCfg,
    pub personal_best: PersonalBestCfg,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            warmup_reps: 3,
            stop_at_top: false,
            range: RangeCfg::default(),
            auto_stop: AutoStopCfg::default(),
            personal_best: PersonalBestCfg::default(),
        }
    }
}
