//! Workout commands: wire the simulated machine, the live feed and the plan
//! runner together, then render engine events.

use eyre::{Result, WrapErr};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use trainer_config::{Config, EchoCfg, ExerciseCfg, Plan, PlanItemCfg};
use trainer_core::mocks::InMemoryArchive;
use trainer_core::{
    DeviceFeed, EngineCfg, EngineEvent, FeedCfg, PlanItem, PlanRunner, RestCfg, RunSummary,
    WorkoutController, drive, plan_items,
};
use trainer_hardware::{SimMachine, SimProfile, SimTelemetry, SimulatedTrainer};
use trainer_traits::{Clock, ManualClock, MonotonicClock, Telemetry};

use crate::history::JsonlHistory;

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| !v.is_empty() && v != "0")
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Simulator settings from `[simulator]`, with environment overrides:
/// `TRAINER_SIM_REP_MS` and `TRAINER_SIM_DISCONNECTED`.
pub fn sim_profile(cfg: &Config) -> SimProfile {
    let s = &cfg.simulator;
    let mut p = SimProfile {
        rep_ms: s.rep_ms,
        bottom: s.bottom,
        top: s.top,
        sample_rate_hz: cfg.feed.sample_rate_hz,
        hold_after_reps: s.hold_after_reps,
        connected: s.connected,
        echo_load_kg: s.echo_load_kg,
        ..SimProfile::default()
    };
    if let Some(ms) = env_u64("TRAINER_SIM_REP_MS") {
        p.rep_ms = ms.max(1);
    }
    if env_flag("TRAINER_SIM_DISCONNECTED") {
        p.connected = false;
    }
    p
}

/// Wall clock, or with `TRAINER_SIM_FAST` a manual clock the simulator
/// advances itself (a whole plan runs in well under a second).
fn clock() -> (Arc<dyn Clock + Send + Sync>, Instant) {
    if env_flag("TRAINER_SIM_FAST") {
        let c = ManualClock::new();
        let epoch = c.origin();
        (Arc::new(c), epoch)
    } else {
        let c = MonotonicClock::new();
        let epoch = c.now();
        (Arc::new(c), epoch)
    }
}

fn simulator(cfg: &Config) -> (SimTelemetry, SimMachine, Arc<dyn Clock + Send + Sync>, Instant) {
    let (clock, epoch) = clock();
    let (telemetry, machine) = SimulatedTrainer::split(sim_profile(cfg), clock.clone(), epoch);
    (telemetry, machine, clock, epoch)
}

/// Validate and convert a single command-line block the same way plan files are.
fn single_item(item: PlanItemCfg) -> Result<Vec<PlanItem>> {
    let plan = Plan {
        name: None,
        items: vec![item],
    };
    plan.validate()?;
    Ok(plan_items(&plan)?)
}

pub fn lift_items(
    mode: &str,
    kg: f32,
    reps: u32,
    stop_at_top: bool,
    just_lift: bool,
    name: Option<String>,
) -> Result<Vec<PlanItem>> {
    single_item(PlanItemCfg::Exercise(ExerciseCfg {
        name,
        mode: mode.to_string(),
        per_cable_kg: kg,
        reps,
        sets: 1,
        rest_sec: 0,
        cables: 2,
        just_lift,
        stop_at_top,
        progression_kg: 0.0,
    }))
}

pub fn echo_items(
    level: &str,
    reps: u32,
    eccentric_pct: u32,
    stop_at_top: bool,
    name: Option<String>,
) -> Result<Vec<PlanItem>> {
    single_item(PlanItemCfg::Echo(EchoCfg {
        name,
        level: level.to_string(),
        eccentric_pct,
        target_reps: reps,
        sets: 1,
        rest_sec: 0,
        just_lift: false,
        stop_at_top,
    }))
}

pub fn plan_file_items(path: &std::path::Path) -> Result<Vec<PlanItem>> {
    let plan = trainer_config::load_plan(path)?;
    plan.validate()
        .wrap_err_with(|| format!("invalid plan {}", path.display()))?;
    if let Some(name) = plan.name.as_deref() {
        tracing::info!(plan = name, items = plan.items.len(), "plan loaded");
    }
    Ok(plan_items(&plan)?)
}

/// Run `items` to completion (or until `stop` is raised), appending finished
/// blocks to `history` and printing every event.
pub fn run_items(
    cfg: &Config,
    engine: EngineCfg,
    history: JsonlHistory,
    items: Vec<PlanItem>,
    skip_rest: bool,
    stop: &AtomicBool,
    json: bool,
) -> Result<RunSummary> {
    let (telemetry, machine, clock, epoch) = simulator(cfg);
    let controller = WorkoutController::builder()
        .with_machine(machine)
        .with_history(history)
        .with_archive(InMemoryArchive::default())
        .with_clock(clock.clone())
        .with_epoch(epoch)
        .with_config(engine)
        .build()?;
    let rest = RestCfg::from(&cfg.rest);
    let mut runner = PlanRunner::with_rest_extension(controller, rest.extend_ms);
    runner.start(items)?;

    let feed = DeviceFeed::spawn(telemetry, &FeedCfg::from(&cfg.feed), clock, epoch);
    let mut printer = EventPrinter::new(json);
    let summary = drive(&mut runner, &feed, stop, skip_rest, |e| printer.print(e))?;
    if summary.stopped && !json {
        println!("Stopped after {} block(s).", summary.blocks_completed);
    }
    Ok(summary)
}

/// Config sanity plus one round trip to the simulated machine.
pub fn self_check(cfg: &Config) -> Result<()> {
    let profile = sim_profile(cfg);
    let (mut telemetry, machine, _, _) = simulator(cfg);
    if !trainer_traits::Machine::is_connected(&machine) {
        return Err(trainer_core::TrainerError::NotConnected.into());
    }
    let timeout = Duration::from_millis(cfg.feed.read_timeout_ms);
    telemetry
        .read(timeout)
        .map_err(|e| eyre::eyre!("telemetry read failed: {e}"))?;
    tracing::info!(
        rep_ms = profile.rep_ms,
        sample_rate_hz = profile.sample_rate_hz,
        "self-check ok"
    );
    Ok(())
}

/// Structured form of an event, tagged with its stable name.
pub fn event_json(e: &EngineEvent) -> Value {
    let mut v = match e {
        EngineEvent::BlockStarted {
            label,
            identity,
            target_reps,
            warmup_target,
            just_lift,
            stop_at_top,
            set_number,
            set_total,
        } => json!({
            "label": label,
            "identity": identity,
            "target_reps": target_reps,
            "warmup_target": warmup_target,
            "just_lift": just_lift,
            "stop_at_top": stop_at_top,
            "set_number": set_number,
            "set_total": set_total,
        }),
        EngineEvent::RepCounted {
            phase,
            warmup_reps,
            warmup_target,
            working_reps,
            target_reps,
        } => json!({
            "phase": phase.as_str(),
            "warmup_reps": warmup_reps,
            "warmup_target": warmup_target,
            "working_reps": working_reps,
            "target_reps": target_reps,
        }),
        EngineEvent::PersonalBestAchieved {
            identity,
            peak_kg,
            prior_best_kg,
        } => json!({
            "identity": identity,
            "peak_kg": peak_kg,
            "prior_best_kg": prior_best_kg,
        }),
        EngineEvent::AutoStopProgress {
            in_danger_zone,
            progress,
        } => json!({ "in_danger_zone": in_danger_zone, "progress": progress }),
        EngineEvent::WorkoutCompleted {
            reason,
            record_id,
            warmup_reps,
            working_reps,
            peak_kg,
            duration_ms,
        } => json!({
            "reason": reason.as_str(),
            "record_id": record_id,
            "warmup_reps": warmup_reps,
            "working_reps": working_reps,
            "peak_kg": peak_kg,
            "duration_ms": duration_ms,
        }),
        EngineEvent::PrBannerStatus {
            identity,
            status,
            peak_kg,
            prior_best_kg,
        } => json!({
            "identity": identity,
            "status": status.as_str(),
            "peak_kg": peak_kg,
            "prior_best_kg": prior_best_kg,
        }),
        EngineEvent::RestStarted {
            duration_secs,
            next_label,
        } => json!({ "duration_secs": duration_secs, "next_label": next_label }),
        EngineEvent::RestTick {
            remaining_secs,
            progress,
        } => json!({ "remaining_secs": remaining_secs, "progress": progress }),
        EngineEvent::RestFinished { skipped } => json!({ "skipped": skipped }),
        EngineEvent::PlanFinished { blocks } => json!({ "blocks": blocks }),
        EngineEvent::PlanAborted { reason } => json!({ "reason": reason }),
    };
    v["event"] = json!(e.name());
    v
}

/// Renders events to stdout; text mode shows one celebration per block and
/// only auto-stop zone changes.
struct EventPrinter {
    json: bool,
    celebrated: bool,
    in_zone: bool,
}

impl EventPrinter {
    fn new(json: bool) -> Self {
        Self {
            json,
            celebrated: false,
            in_zone: false,
        }
    }

    fn print(&mut self, e: &EngineEvent) {
        if self.json {
            println!("{}", event_json(e));
            return;
        }
        match e {
            EngineEvent::BlockStarted {
                label,
                target_reps,
                just_lift,
                set_number,
                set_total,
                ..
            } => {
                self.celebrated = false;
                self.in_zone = false;
                let set = match (set_number, set_total) {
                    (Some(n), Some(t)) if *t > 1 => format!(" (set {n}/{t})"),
                    _ => String::new(),
                };
                if *just_lift {
                    println!("Start: {label}{set}, just lift");
                } else {
                    println!("Start: {label}{set}, {target_reps} reps");
                }
            }
            EngineEvent::RepCounted {
                phase,
                warmup_reps,
                warmup_target,
                working_reps,
                target_reps,
            } => {
                let readout = trainer_core::RepReadout {
                    phase: *phase,
                    warmup_reps: *warmup_reps,
                    warmup_target: *warmup_target,
                    working_reps: *working_reps,
                    target_reps: *target_reps,
                };
                println!("  rep {readout}");
            }
            EngineEvent::PersonalBestAchieved {
                identity, peak_kg, ..
            } => {
                if !self.celebrated {
                    self.celebrated = true;
                    println!("  new personal best for {identity}: {peak_kg:.1} kg");
                }
            }
            EngineEvent::AutoStopProgress { in_danger_zone, .. } => {
                if *in_danger_zone != self.in_zone {
                    self.in_zone = *in_danger_zone;
                    if self.in_zone {
                        println!("  holding at the bottom, auto-stop armed");
                    }
                }
            }
            EngineEvent::WorkoutCompleted {
                reason,
                warmup_reps,
                working_reps,
                peak_kg,
                duration_ms,
                ..
            } => {
                println!(
                    "Complete ({}): {working_reps} working + {warmup_reps} warmup reps, peak {peak_kg:.1} kg, {:.1} s",
                    reason.as_str(),
                    *duration_ms as f64 / 1_000.0
                );
            }
            EngineEvent::PrBannerStatus {
                identity,
                status,
                peak_kg,
                prior_best_kg,
            } => {
                println!(
                    "  PR {}: {identity} {peak_kg:.1} kg (best {prior_best_kg:.1} kg)",
                    status.as_str()
                );
            }
            EngineEvent::RestStarted {
                duration_secs,
                next_label,
            } => println!("Rest {duration_secs} s, next: {next_label}"),
            EngineEvent::RestTick { .. } => {}
            EngineEvent::RestFinished { skipped } => {
                if *skipped {
                    println!("Rest skipped");
                }
            }
            EngineEvent::PlanFinished { blocks } => println!("Plan complete: {blocks} block(s)"),
            EngineEvent::PlanAborted { reason } => eprintln!("Plan aborted: {reason}"),
        }
    }
}
