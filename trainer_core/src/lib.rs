#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Workout session engine (transport-agnostic).
//!
//! This crate turns raw cable-machine telemetry into workout semantics. All
//! device interaction goes through `trainer_traits::Telemetry` and
//! `trainer_traits::Machine`.
//!
//! ## Architecture
//!
//! - **Counters**: 16-bit wraparound rep counters decoded from notifications (`counters`)
//! - **Ranges**: rolling top/bottom windows per cable (`range`)
//! - **Auto-stop**: Just Lift danger-zone dwell monitor (`auto_stop`)
//! - **Controller**: per-block state machine, personal bests, completion (`controller`)
//! - **Runner**: plan sequencing with sets and rest countdowns (`runner`)
//! - **Feed**: background thread pumping telemetry into the engine (`feed`)
//!
//! The engine is single-threaded and cooperative: every state change happens
//! inside one `on_sample`, `on_notification` or `tick` call, and results are
//! queued as [`EngineEvent`]s for the caller to drain.

pub mod auto_stop;
pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod counters;
pub mod error;
pub mod events;
pub mod feed;
pub mod history;
pub mod hw_error;
pub mod mocks;
pub mod plan;
pub mod range;
pub mod runner;
pub mod session;
pub mod timer;
pub mod util;

pub use auto_stop::{AutoStopMonitor, AutoStopStatus};
pub use builder::{ControllerBuilder, Missing, Set};
pub use config::{AutoStopCfg, EngineCfg, FeedCfg, PersonalBestCfg, RangeCfg, RestCfg};
pub use controller::{Completion, RepReadout, WorkoutController};
pub use conversions::plan_items;
pub use counters::{CounterTracker, CounterUpdate, counter_delta};
pub use error::{BuildError, Report, Result, TrainerError};
pub use events::EngineEvent;
pub use feed::DeviceFeed;
pub use history::{
    HistoryStore, Identity, PrStatus, SampleArchive, WorkoutRecord, classify_pr, identity_for,
    prior_best,
};
pub use plan::{EchoItem, EchoLevel, ExerciseItem, PlanCursor, PlanItem, ProgramMode};
pub use range::{Band, Cable, Extremum, RangeEstimate, RangeEstimator, RollingWindow};
pub use runner::{PlanRunner, RunSummary, RunnerStatus, drive};
pub use session::{BlockConfig, CompletionReason, ItemKind, Phase, PlanLink, WorkoutSession};
pub use timer::Countdown;
