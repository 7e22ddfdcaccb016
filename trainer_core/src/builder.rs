//! Type-state builder for `WorkoutController`.
//!
//! The builder enforces at compile time that a machine, a history store and a
//! sample archive are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use trainer_traits::Machine;
use trainer_traits::clock::{Clock, MonotonicClock};

use crate::auto_stop::AutoStopMonitor;
use crate::config::EngineCfg;
use crate::controller::WorkoutController;
use crate::counters::CounterTracker;
use crate::error::{BuildError, Result};
use crate::history::{HistoryStore, SampleArchive};
use crate::range::RangeEstimator;
use crate::session::Phase;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

struct Parts {
    machine: Option<Box<dyn Machine>>,
    history: Option<Box<dyn HistoryStore>>,
    archive: Option<Box<dyn SampleArchive>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    epoch: Option<Instant>,
    cfg: Option<EngineCfg>,
}

/// Builder for `WorkoutController`. Config is validated on `build()`.
pub struct ControllerBuilder<M, H, A> {
    parts: Parts,
    _m: PhantomData<M>,
    _h: PhantomData<H>,
    _a: PhantomData<A>,
}

impl Default for ControllerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerBuilder<Missing, Missing, Missing> {
    pub fn new() -> Self {
        Self {
            parts: Parts {
                machine: None,
                history: None,
                archive: None,
                clock: None,
                epoch: None,
                cfg: None,
            },
            _m: PhantomData,
            _h: PhantomData,
            _a: PhantomData,
        }
    }
}

fn validate(cfg: &EngineCfg) -> std::result::Result<(), BuildError> {
    if cfg.range.warmup_window == 0 || cfg.range.working_window == 0 {
        return Err(BuildError::InvalidConfig("range windows must be >= 1"));
    }
    if cfg.range.log_threshold < 0 {
        return Err(BuildError::InvalidConfig("range log threshold must be >= 0"));
    }
    if cfg.auto_stop.dwell_ms == 0 {
        return Err(BuildError::InvalidConfig("auto-stop dwell must be > 0"));
    }
    if !(cfg.auto_stop.zone_fraction > 0.0 && cfg.auto_stop.zone_fraction < 1.0) {
        return Err(BuildError::InvalidConfig(
            "auto-stop zone fraction must be in (0, 1)",
        ));
    }
    if cfg.auto_stop.min_range < 0 {
        return Err(BuildError::InvalidConfig("auto-stop min range must be >= 0"));
    }
    if !cfg.personal_best.epsilon_kg.is_finite() || cfg.personal_best.epsilon_kg < 0.0 {
        return Err(BuildError::InvalidConfig("personal-best epsilon must be >= 0"));
    }
    Ok(())
}

impl<M, H, A> ControllerBuilder<M, H, A> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<WorkoutController> {
        let Parts {
            machine,
            history,
            archive,
            clock,
            epoch,
            cfg,
        } = self.parts;
        let machine = machine.ok_or_else(|| eyre::Report::new(BuildError::MissingMachine))?;
        let history = history.ok_or_else(|| eyre::Report::new(BuildError::MissingHistory))?;
        let archive = archive.ok_or_else(|| eyre::Report::new(BuildError::MissingArchive))?;
        let cfg = cfg.unwrap_or_default();
        validate(&cfg).map_err(eyre::Report::new)?;

        let clock: Arc<dyn Clock + Send + Sync> =
            clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let epoch = epoch.unwrap_or_else(|| clock.now());

        Ok(WorkoutController {
            machine,
            history,
            archive,
            clock,
            epoch,
            stop_at_top: cfg.stop_at_top,
            counters: CounterTracker::new(),
            ranges: RangeEstimator::new(cfg.range.clone()),
            auto_stop: AutoStopMonitor::new(cfg.auto_stop.clone()),
            phase: Phase::Idle,
            session: None,
            last_sample: None,
            last_target: 0,
            last_auto_stop: (false, 0),
            events: Vec::new(),
            cfg,
        })
    }

    pub fn with_config(mut self, cfg: EngineCfg) -> Self {
        self.parts.cfg = Some(cfg);
        self
    }

    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.parts.clock = Some(clock);
        self
    }

    /// Zero point of the engine timeline. Must match the epoch sample
    /// timestamps are taken against; defaults to the clock's `now()` at build.
    pub fn with_epoch(mut self, epoch: Instant) -> Self {
        self.parts.epoch = Some(epoch);
        self
    }
}

// Setters that advance type-state
impl<H, A> ControllerBuilder<Missing, H, A> {
    pub fn with_machine(mut self, machine: impl Machine + 'static) -> ControllerBuilder<Set, H, A> {
        self.parts.machine = Some(Box::new(machine));
        ControllerBuilder {
            parts: self.parts,
            _m: PhantomData,
            _h: PhantomData,
            _a: PhantomData,
        }
    }
}

impl<M, A> ControllerBuilder<M, Missing, A> {
    pub fn with_history(
        mut self,
        history: impl HistoryStore + 'static,
    ) -> ControllerBuilder<M, Set, A> {
        self.parts.history = Some(Box::new(history));
        ControllerBuilder {
            parts: self.parts,
            _m: PhantomData,
            _h: PhantomData,
            _a: PhantomData,
        }
    }
}

impl<M, H> ControllerBuilder<M, H, Missing> {
    pub fn with_archive(
        mut self,
        archive: impl SampleArchive + 'static,
    ) -> ControllerBuilder<M, H, Set> {
        self.parts.archive = Some(Box::new(archive));
        ControllerBuilder {
            parts: self.parts,
            _m: PhantomData,
            _h: PhantomData,
            _a: PhantomData,
        }
    }
}

impl ControllerBuilder<Set, Set, Set> {
    /// Validate and build. Only available when machine, history and archive are set.
    pub fn build(self) -> Result<WorkoutController> {
        self.try_build()
    }
}

impl WorkoutController {
    /// Start building a controller.
    pub fn builder() -> ControllerBuilder<Missing, Missing, Missing> {
        ControllerBuilder::new()
    }
}
