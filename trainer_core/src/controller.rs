//! Workout session controller.
//!
//! Consumes raw rep notifications and live samples for one block at a time:
//! warmup and working rep counting, range discovery, stop-at-top and
//! stop-at-bottom completion, personal-best tracking and Just Lift
//! auto-stop. Every input is handled synchronously; results are queued as
//! [`EngineEvent`]s for the caller to drain.
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use eyre::WrapErr;
use trainer_traits::{Clock, Machine, Sample};

use crate::auto_stop::AutoStopMonitor;
use crate::config::EngineCfg;
use crate::counters::{CounterTracker, CounterUpdate};
use crate::error::{Report, Result, TrainerError};
use crate::events::EngineEvent;
use crate::history::{HistoryStore, SampleArchive, classify_pr, identity_for, prior_best};
use crate::hw_error::map_hw_error;
use crate::range::RangeEstimator;
use crate::session::{BlockConfig, CompletionReason, Phase, WorkoutSession};

/// Outcome of a finished block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub reason: CompletionReason,
    pub record_id: u64,
    pub warmup_reps: u32,
    pub working_reps: u32,
}

/// Rep counter as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepReadout {
    pub phase: Phase,
    pub warmup_reps: u32,
    pub warmup_target: u32,
    pub working_reps: u32,
    pub target_reps: u32,
}

impl fmt::Display for RepReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Phase::Idle => write!(f, "\u{2013}/{}", self.target_reps),
            Phase::Warmup => write!(f, "warmup {}/{}", self.warmup_reps, self.warmup_target),
            Phase::Working | Phase::Completing if self.target_reps == 0 => {
                write!(f, "{}", self.working_reps)
            }
            Phase::Working | Phase::Completing => {
                write!(f, "{}/{}", self.working_reps, self.target_reps)
            }
        }
    }
}

pub struct WorkoutController {
    pub(crate) machine: Box<dyn Machine>,
    pub(crate) history: Box<dyn HistoryStore>,
    pub(crate) archive: Box<dyn SampleArchive>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) cfg: EngineCfg,
    pub(crate) stop_at_top: bool,
    pub(crate) counters: CounterTracker,
    pub(crate) ranges: RangeEstimator,
    pub(crate) auto_stop: AutoStopMonitor,
    pub(crate) phase: Phase,
    pub(crate) session: Option<WorkoutSession>,
    pub(crate) last_sample: Option<Sample>,
    pub(crate) last_target: u32,
    pub(crate) last_auto_stop: (bool, u32),
    pub(crate) events: Vec<EngineEvent>,
}

impl fmt::Debug for WorkoutController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkoutController")
            .field("phase", &self.phase)
            .field("stop_at_top", &self.stop_at_top)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl WorkoutController {
    /// Milliseconds on the engine timeline.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&WorkoutSession> {
        self.session.as_ref()
    }

    pub fn ranges(&self) -> &RangeEstimator {
        &self.ranges
    }

    pub fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    pub fn config(&self) -> &EngineCfg {
        &self.cfg
    }

    pub fn machine_connected(&self) -> bool {
        self.machine.is_connected()
    }

    /// Global stop-at-top preference, captured by each block at launch.
    pub fn stop_at_top(&self) -> bool {
        self.stop_at_top
    }

    pub fn set_stop_at_top(&mut self, on: bool) {
        self.stop_at_top = on;
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn rep_readout(&self) -> RepReadout {
        match &self.session {
            Some(s) => RepReadout {
                phase: self.phase,
                warmup_reps: s.warmup_reps,
                warmup_target: s.warmup_target,
                working_reps: s.working_reps,
                target_reps: s.target_reps,
            },
            None => RepReadout {
                phase: Phase::Idle,
                warmup_reps: 0,
                warmup_target: 0,
                working_reps: 0,
                target_reps: self.last_target,
            },
        }
    }

    /// Launch a block: reset per-block state, look up the personal best for
    /// the block's identity and send the program to the machine.
    pub fn start_block(&mut self, cfg: BlockConfig) -> Result<()> {
        if self.session.is_some() {
            return Err(Report::new(TrainerError::State(
                "a block is already active".into(),
            )));
        }
        if !self.machine.is_connected() {
            tracing::warn!(mode = %cfg.mode, "block start rejected: machine not connected");
            return Err(Report::new(TrainerError::NotConnected));
        }

        let program = cfg.program();
        self.machine
            .start(&program)
            .map_err(|e| Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("start program '{}'", program.label))?;

        let identity = identity_for(cfg.set_name.as_deref(), Some(cfg.mode.as_str()));
        let prior = identity
            .as_ref()
            .map_or(0.0, |id| prior_best(self.history.all_records(), &id.key));
        let warmup_target = cfg.warmup_target.unwrap_or(self.cfg.warmup_reps);
        let start_ms = self.now_ms();

        self.counters.reset();
        self.ranges.reset();
        self.auto_stop.reset();
        self.last_auto_stop = (false, 0);

        let session = WorkoutSession::start(
            &cfg,
            warmup_target,
            self.stop_at_top,
            start_ms,
            identity,
            prior,
        );
        self.phase = if session.warmup_done() {
            Phase::Working
        } else {
            Phase::Warmup
        };
        tracing::info!(
            mode = %session.mode,
            weight_kg = session.weight_kg,
            target_reps = session.target_reps,
            warmup_target,
            just_lift = session.just_lift,
            stop_at_top = session.stop_at_top,
            prior_best_kg = prior,
            "block started"
        );
        self.events.push(EngineEvent::BlockStarted {
            label: session.mode.clone(),
            identity: session.identity.as_ref().map(|i| i.key.clone()),
            target_reps: session.target_reps,
            warmup_target,
            just_lift: session.just_lift,
            stop_at_top: session.stop_at_top,
            set_number: session.plan.as_ref().map(|p| p.set_number),
            set_total: session.plan.as_ref().map(|p| p.set_total),
        });
        self.session = Some(session);
        Ok(())
    }

    /// Feed one raw rep notification. Ignored while idle.
    pub fn on_notification(&mut self, bytes: &[u8]) -> Result<Option<Completion>> {
        if self.session.is_none() {
            return Ok(None);
        }
        let CounterUpdate::Deltas { top, complete } = self.counters.on_notification(bytes) else {
            return Ok(None);
        };
        if top > 0
            && let Some(done) = self.on_top_reached()?
        {
            return Ok(Some(done));
        }
        if complete > 0 {
            return self.on_rep_complete();
        }
        Ok(None)
    }

    fn on_top_reached(&mut self) -> Result<Option<Completion>> {
        let Some(sample) = self.last_sample else {
            tracing::warn!("top event without a live sample dropped");
            return Ok(None);
        };
        let Some(session) = self.session.as_ref() else {
            return Ok(None);
        };
        let window = self
            .ranges
            .window_for(session.total_reps(), session.warmup_target);
        self.ranges.record_top(sample.pos_a, sample.pos_b, window);

        let final_top = session.stop_at_top
            && !session.just_lift
            && session.target_reps > 0
            && session.warmup_done()
            && session.working_reps == session.target_reps - 1;
        if !final_top {
            return Ok(None);
        }

        self.send_stop()?;
        if let Some(s) = self.session.as_mut() {
            s.working_reps = s.target_reps;
        }
        self.push_rep_event();
        self.finalize(CompletionReason::StoppedAtTop).map(Some)
    }

    fn on_rep_complete(&mut self) -> Result<Option<Completion>> {
        let Some(sample) = self.last_sample else {
            tracing::warn!("rep-complete event without a live sample dropped");
            return Ok(None);
        };
        let now = self.now_ms();
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        let window = self
            .ranges
            .window_for(session.total_reps(), session.warmup_target);
        self.ranges.record_bottom(sample.pos_a, sample.pos_b, window);

        if session.total_reps() < session.warmup_target {
            session.warmup_reps += 1;
            if session.warmup_done() && session.warmup_end_ms.is_none() {
                session.warmup_end_ms = Some(now);
                self.phase = Phase::Working;
                tracing::info!(warmup_reps = session.warmup_reps, "warmup complete");
            }
        } else {
            session.working_reps += 1;
            self.phase = Phase::Working;
        }
        let stop_at_bottom = !session.stop_at_top
            && !session.just_lift
            && session.target_reps > 0
            && session.working_reps >= session.target_reps;
        self.push_rep_event();

        if stop_at_bottom {
            return self.finalize(CompletionReason::TargetReached).map(Some);
        }
        Ok(None)
    }

    /// Feed one live sample: archive it, track the personal best and, for
    /// Just Lift blocks, run the auto-stop monitor.
    pub fn on_sample(&mut self, sample: Sample) -> Result<Option<Completion>> {
        self.archive.record(&sample);
        self.last_sample = Some(sample);
        let eps = self.cfg.personal_best.epsilon_kg;
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };

        let total = sample.total_load_kg();
        if total > session.live_peak_total_load_kg {
            session.live_peak_total_load_kg = total;
        }
        session.current_personal_best_kg = session
            .current_personal_best_kg
            .max(session.prior_best_total_load_kg.max(session.live_peak_total_load_kg));
        if let Some(identity) = &session.identity
            && session.live_peak_total_load_kg > session.celebrated_personal_best_kg + eps
        {
            session.celebrated_personal_best_kg = session.live_peak_total_load_kg;
            session.has_new_personal_best = true;
            tracing::debug!(
                identity = %identity.key,
                peak_kg = session.live_peak_total_load_kg,
                "personal best"
            );
            self.events.push(EngineEvent::PersonalBestAchieved {
                identity: identity.key.clone(),
                peak_kg: session.live_peak_total_load_kg,
                prior_best_kg: session.prior_best_total_load_kg,
            });
        }

        if !session.just_lift {
            return Ok(None);
        }
        let status = self.auto_stop.check(&sample, &self.ranges);
        let pct = (status.progress * 100.0).floor() as u32;
        if (status.in_danger_zone, pct) != self.last_auto_stop {
            self.last_auto_stop = (status.in_danger_zone, pct);
            self.events.push(EngineEvent::AutoStopProgress {
                in_danger_zone: status.in_danger_zone,
                progress: status.progress,
            });
        }
        if status.triggered {
            self.send_stop()?;
            return self.finalize(CompletionReason::AutoStop).map(Some);
        }
        Ok(None)
    }

    /// End the active block on request. No-op while idle.
    pub fn stop(&mut self) -> Result<Option<Completion>> {
        if self.session.is_none() {
            return Ok(None);
        }
        self.send_stop()?;
        self.finalize(CompletionReason::UserStop).map(Some)
    }

    fn send_stop(&mut self) -> Result<()> {
        self.machine.stop().map_err(|e| {
            let mapped = map_hw_error(&*e);
            tracing::warn!(error = %mapped, "stop command failed; block stays active");
            let msg = match mapped {
                TrainerError::StopFailed(m) => m,
                other => other.to_string(),
            };
            Report::new(TrainerError::StopFailed(msg))
        })
    }

    fn push_rep_event(&mut self) {
        if let Some(s) = &self.session {
            self.events.push(EngineEvent::RepCounted {
                phase: self.phase,
                warmup_reps: s.warmup_reps,
                warmup_target: s.warmup_target,
                working_reps: s.working_reps,
                target_reps: s.target_reps,
            });
        }
    }

    fn finalize(&mut self, reason: CompletionReason) -> Result<Completion> {
        let Some(session) = self.session.take() else {
            return Err(Report::new(TrainerError::State("no active block".into())));
        };
        self.phase = Phase::Completing;
        let end_ms = self.now_ms().max(session.start_ms);
        let movement = self.archive.samples_between(session.start_ms, end_ms);
        let peak = session.live_peak_total_load_kg;
        let prior = session.prior_best_total_load_kg;
        let identity = session.identity.clone();
        let (warmup_reps, working_reps) = (session.warmup_reps, session.working_reps);
        let duration_ms = end_ms - session.start_ms;
        self.last_target = session.target_reps;

        let record = session.into_record(end_ms, reason, movement);
        let local_id = record.record_id();
        let record_id = match self.history.append(record) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist workout record");
                local_id
            }
        };

        // Classified against the best captured at block start, so the record
        // just appended never competes with itself.
        if let Some(identity) = identity {
            let status = classify_pr(peak, prior, self.cfg.personal_best.epsilon_kg);
            self.events.push(EngineEvent::PrBannerStatus {
                identity: identity.key,
                status,
                peak_kg: peak,
                prior_best_kg: prior,
            });
        }
        self.events.push(EngineEvent::WorkoutCompleted {
            reason,
            record_id,
            warmup_reps,
            working_reps,
            peak_kg: peak,
            duration_ms,
        });
        tracing::info!(
            reason = reason.as_str(),
            warmup_reps,
            working_reps,
            peak_kg = peak,
            duration_ms,
            "block complete"
        );
        self.phase = Phase::Idle;
        Ok(Completion {
            reason,
            record_id,
            warmup_reps,
            working_reps,
        })
    }
}
