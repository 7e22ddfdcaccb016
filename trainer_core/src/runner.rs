//! Plan sequencing: sets, rest intervals and the live drive loop.
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use trainer_traits::{Reading, Sample};

use crate::controller::{Completion, WorkoutController};
use crate::error::{Report, Result, TrainerError};
use crate::events::EngineEvent;
use crate::feed::DeviceFeed;
use crate::plan::{PlanCursor, PlanItem};
use crate::timer::Countdown;
use crate::util::secs_to_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerStatus {
    Idle,
    /// A block is active on the controller.
    Running,
    Resting,
    Finished,
    Aborted,
}

pub struct PlanRunner {
    controller: WorkoutController,
    items: Vec<PlanItem>,
    cursor: Option<PlanCursor>,
    rest: Option<Countdown>,
    rest_last_secs: u64,
    status: RunnerStatus,
    extend_ms: u64,
    blocks_run: u32,
    events: Vec<EngineEvent>,
}

impl std::fmt::Debug for PlanRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanRunner")
            .field("status", &self.status)
            .field("cursor", &self.cursor)
            .field("items", &self.items.len())
            .field("blocks_run", &self.blocks_run)
            .finish_non_exhaustive()
    }
}

impl PlanRunner {
    pub fn new(controller: WorkoutController) -> Self {
        Self::with_rest_extension(controller, secs_to_ms(30))
    }

    /// `extend_ms` is what `extend_rest` adds to the remaining rest.
    pub fn with_rest_extension(controller: WorkoutController, extend_ms: u64) -> Self {
        Self {
            controller,
            items: Vec::new(),
            cursor: None,
            rest: None,
            rest_last_secs: 0,
            status: RunnerStatus::Idle,
            extend_ms,
            blocks_run: 0,
            events: Vec::new(),
        }
    }

    pub fn controller(&self) -> &WorkoutController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut WorkoutController {
        &mut self.controller
    }

    pub fn status(&self) -> RunnerStatus {
        self.status
    }

    pub fn cursor(&self) -> Option<PlanCursor> {
        self.cursor
    }

    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    pub fn blocks_run(&self) -> u32 {
        self.blocks_run
    }

    pub fn is_resting(&self) -> bool {
        self.rest.is_some()
    }

    pub fn is_done(&self) -> bool {
        matches!(self.status, RunnerStatus::Finished | RunnerStatus::Aborted)
    }

    pub fn rest_remaining_secs(&self) -> Option<u64> {
        let now = self.controller.now_ms();
        self.rest.as_ref().map(|r| r.remaining_secs(now))
    }

    pub fn rest_progress(&self) -> Option<f32> {
        let now = self.controller.now_ms();
        self.rest.as_ref().map(|r| r.progress(now))
    }

    /// Controller events and runner events, in the order they happened.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.pull_controller_events();
        std::mem::take(&mut self.events)
    }

    fn pull_controller_events(&mut self) {
        let evs = self.controller.drain_events();
        self.events.extend(evs);
    }

    /// Begin a plan at its first item. Rejected without side effects when
    /// the plan is empty or the machine is not connected.
    pub fn start(&mut self, items: Vec<PlanItem>) -> Result<()> {
        if items.is_empty() {
            tracing::warn!("plan start rejected: no items");
            return Err(Report::new(TrainerError::EmptyPlan));
        }
        if !self.controller.machine_connected() {
            tracing::warn!("plan start rejected: machine not connected");
            return Err(Report::new(TrainerError::NotConnected));
        }
        if matches!(self.status, RunnerStatus::Running | RunnerStatus::Resting)
            || self.controller.is_active()
        {
            return Err(Report::new(TrainerError::State(
                "a plan or block is already running".into(),
            )));
        }

        tracing::info!(items = items.len(), "plan start");
        self.items = items;
        self.cursor = Some(PlanCursor::START);
        self.rest = None;
        self.blocks_run = 0;
        if let Err(e) = self.launch_current() {
            self.items.clear();
            self.cursor = None;
            self.status = RunnerStatus::Idle;
            return Err(e);
        }
        Ok(())
    }

    fn launch_current(&mut self) -> Result<()> {
        let cursor = self
            .cursor
            .ok_or_else(|| Report::new(TrainerError::State("no plan cursor".into())))?;
        let item = self
            .items
            .get(cursor.index)
            .ok_or_else(|| Report::new(TrainerError::State("plan cursor out of range".into())))?;
        let cfg = item.block_config(cursor.set);

        let saved = self.controller.stop_at_top();
        self.controller.set_stop_at_top(item.stop_at_top());
        let launched = self.controller.start_block(cfg);
        self.controller.set_stop_at_top(saved);
        self.pull_controller_events();
        launched?;

        tracing::info!(index = cursor.index, set = cursor.set, "plan block launched");
        self.status = RunnerStatus::Running;
        Ok(())
    }

    /// Feed a live sample to the active block.
    pub fn on_sample(&mut self, sample: Sample) -> Result<Option<Completion>> {
        let done = self.controller.on_sample(sample);
        self.after_controller(done)
    }

    /// Feed a raw rep notification to the active block.
    pub fn on_notification(&mut self, bytes: &[u8]) -> Result<Option<Completion>> {
        let done = self.controller.on_notification(bytes);
        self.after_controller(done)
    }

    fn after_controller(
        &mut self,
        done: Result<Option<Completion>>,
    ) -> Result<Option<Completion>> {
        self.pull_controller_events();
        let done = done?;
        if let Some(c) = done
            && self.status == RunnerStatus::Running
        {
            self.on_block_complete()?;
            return Ok(Some(c));
        }
        Ok(done)
    }

    fn on_block_complete(&mut self) -> Result<()> {
        self.blocks_run = self.blocks_run.saturating_add(1);
        let Some(cursor) = self.cursor else {
            return Ok(());
        };
        let Some(item) = self.items.get(cursor.index) else {
            return Ok(());
        };
        let rest_sec = item.rest_sec();

        let next = if cursor.set < item.sets() {
            PlanCursor {
                index: cursor.index,
                set: cursor.set + 1,
            }
        } else {
            PlanCursor {
                index: cursor.index + 1,
                set: 1,
            }
        };
        self.cursor = Some(next);

        let Some(next_item) = self.items.get(next.index) else {
            self.status = RunnerStatus::Finished;
            tracing::info!(blocks = self.blocks_run, "plan finished");
            self.events.push(EngineEvent::PlanFinished {
                blocks: self.blocks_run,
            });
            return Ok(());
        };

        if rest_sec == 0 {
            return self.launch_or_abort();
        }
        let next_label = next_item.label();
        let now = self.controller.now_ms();
        let rest = Countdown::new(now, secs_to_ms(rest_sec));
        self.rest_last_secs = rest.remaining_secs(now);
        self.rest = Some(rest);
        self.status = RunnerStatus::Resting;
        tracing::info!(rest_sec, next = %next_label, "rest started");
        self.events.push(EngineEvent::RestStarted {
            duration_secs: rest_sec,
            next_label,
        });
        Ok(())
    }

    fn launch_or_abort(&mut self) -> Result<()> {
        match self.launch_current() {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "plan aborted: next block failed to launch");
                self.status = RunnerStatus::Aborted;
                self.events.push(EngineEvent::PlanAborted {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Poll the rest countdown; launches the next block once it expires.
    pub fn tick(&mut self) -> Result<()> {
        let now = self.controller.now_ms();
        let Some(rest) = self.rest.as_ref() else {
            return Ok(());
        };
        if rest.is_expired(now) {
            return self.finish_rest(false);
        }
        let secs = rest.remaining_secs(now);
        if secs != self.rest_last_secs {
            self.rest_last_secs = secs;
            self.events.push(EngineEvent::RestTick {
                remaining_secs: secs,
                progress: rest.progress(now),
            });
        }
        Ok(())
    }

    /// End the rest early. No-op when not resting.
    pub fn skip_rest(&mut self) -> Result<()> {
        if self.rest.is_none() {
            return Ok(());
        }
        self.finish_rest(true)
    }

    /// Push the end of the rest out by the configured extension.
    pub fn extend_rest(&mut self) {
        let now = self.controller.now_ms();
        if let Some(rest) = self.rest.as_mut() {
            rest.extend(now, self.extend_ms);
            self.rest_last_secs = rest.remaining_secs(now);
            tracing::debug!(remaining_secs = self.rest_last_secs, "rest extended");
            self.events.push(EngineEvent::RestTick {
                remaining_secs: self.rest_last_secs,
                progress: rest.progress(now),
            });
        }
    }

    fn finish_rest(&mut self, skipped: bool) -> Result<()> {
        // Taking the countdown makes rest end exactly once.
        let Some(mut rest) = self.rest.take() else {
            return Ok(());
        };
        rest.cancel();
        self.events.push(EngineEvent::RestFinished { skipped });
        self.launch_or_abort()
    }

    /// Stop the active block (if any) and abandon the plan.
    pub fn stop(&mut self) -> Result<()> {
        if self.is_done() || self.status == RunnerStatus::Idle {
            return self.controller.stop().map(|_| ());
        }
        if self.controller.is_active() {
            let stopped = self.controller.stop();
            self.pull_controller_events();
            stopped?;
        }
        self.rest = None;
        self.status = RunnerStatus::Aborted;
        tracing::info!(blocks = self.blocks_run, "plan stopped");
        self.events.push(EngineEvent::PlanAborted {
            reason: "stopped".into(),
        });
        Ok(())
    }
}

/// How a driven plan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub blocks_completed: u32,
    pub finished: bool,
    pub stopped: bool,
}

/// Pump readings from `feed` into `runner` until the plan finishes, is
/// stopped via `stop`, or the feed stalls. `on_event` sees every event in
/// order. With `skip_rest` set, rests end as soon as they start.
pub fn drive<F>(
    runner: &mut PlanRunner,
    feed: &DeviceFeed,
    stop: &AtomicBool,
    skip_rest: bool,
    mut on_event: F,
) -> Result<RunSummary>
where
    F: FnMut(&EngineEvent),
{
    let poll = Duration::from_millis(20);
    let mut flush = |runner: &mut PlanRunner| {
        for ev in runner.drain_events() {
            on_event(&ev);
        }
    };
    flush(runner);

    loop {
        if stop.load(Ordering::Relaxed) {
            let stopped = runner.stop();
            flush(runner);
            stopped?;
            return Ok(RunSummary {
                blocks_completed: runner.blocks_run(),
                finished: false,
                stopped: true,
            });
        }

        if feed.is_stalled() {
            tracing::warn!(threshold_ms = feed.stall_threshold(), "telemetry stalled");
            if let Err(e) = runner.stop() {
                tracing::warn!(error = %e, "stop after stall failed");
            }
            flush(runner);
            return Err(Report::new(TrainerError::Timeout));
        }

        let step = match feed.recv_timeout(poll) {
            Some(Reading::Sample(s)) => runner.on_sample(s).map(|_| ()),
            Some(Reading::Notification(bytes)) => runner.on_notification(&bytes).map(|_| ()),
            None => Ok(()),
        };
        let step = step.and_then(|()| {
            if skip_rest && runner.is_resting() {
                runner.skip_rest()
            } else {
                runner.tick()
            }
        });
        flush(runner);
        step?;

        match runner.status() {
            RunnerStatus::Finished => {
                return Ok(RunSummary {
                    blocks_completed: runner.blocks_run(),
                    finished: true,
                    stopped: false,
                });
            }
            RunnerStatus::Aborted => {
                return Err(Report::new(TrainerError::State("plan aborted".into())));
            }
            RunnerStatus::Idle | RunnerStatus::Running | RunnerStatus::Resting => {}
        }
    }
}
