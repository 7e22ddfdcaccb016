//! Shared harness: a controller wired to mocks and a manual clock, plus
//! helpers that play the machine's side of a rep.
#![allow(dead_code)]

use std::sync::Arc;

use trainer_core::mocks::{InMemoryArchive, InMemoryHistory, MockMachine};
use trainer_core::{EngineCfg, WorkoutController, WorkoutRecord};
use trainer_core::{CompletionReason, Completion};
use trainer_traits::{ManualClock, Sample};

pub const TOP: i32 = 600;
pub const BOTTOM: i32 = 60;

pub struct Rig {
    pub machine: MockMachine,
    pub clock: ManualClock,
    top: u16,
    complete: u16,
}

pub fn encode(top: u16, complete: u16) -> Vec<u8> {
    let mut b = Vec::with_capacity(6);
    b.extend_from_slice(&top.to_le_bytes());
    b.extend_from_slice(&[0, 0]);
    b.extend_from_slice(&complete.to_le_bytes());
    b
}

impl Rig {
    pub fn new() -> Self {
        Self {
            machine: MockMachine::new(),
            clock: ManualClock::new(),
            // Close to wraparound so every test crosses it.
            top: 65_530,
            complete: 65_530,
        }
    }

    pub fn controller(&self, cfg: EngineCfg, history: InMemoryHistory) -> WorkoutController {
        WorkoutController::builder()
            .with_machine(self.machine.clone())
            .with_history(history)
            .with_archive(InMemoryArchive::default())
            .with_clock(Arc::new(self.clock.clone()))
            .with_epoch(self.clock.origin())
            .with_config(cfg)
            .build()
            .unwrap()
    }

    pub fn now(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    pub fn sample(&self, pos: i32, per_cable_kg: f32) -> Sample {
        self.clock.advance_ms(20);
        Sample {
            load_a_kg: per_cable_kg,
            load_b_kg: per_cable_kg,
            pos_a: pos,
            pos_b: pos,
            timestamp_ms: self.now(),
        }
    }

    /// Current counters, as a freshly started program announces them.
    pub fn seed(&self) -> Vec<u8> {
        encode(self.top, self.complete)
    }

    pub fn top_note(&mut self) -> Vec<u8> {
        self.top = self.top.wrapping_add(1);
        encode(self.top, self.complete)
    }

    pub fn bottom_note(&mut self) -> Vec<u8> {
        self.complete = self.complete.wrapping_add(1);
        encode(self.top, self.complete)
    }

    /// One full rep on a controller: rise, top event, descend, bottom event.
    /// Returns the first completion seen.
    pub fn rep(&mut self, ctl: &mut WorkoutController, kg: f32) -> Option<Completion> {
        let s = self.sample(TOP, kg);
        ctl.on_sample(s).unwrap();
        let n = self.top_note();
        if let Some(c) = ctl.on_notification(&n).unwrap() {
            return Some(c);
        }
        let s = self.sample(BOTTOM, kg);
        ctl.on_sample(s).unwrap();
        let n = self.bottom_note();
        ctl.on_notification(&n).unwrap()
    }
}

pub fn record(mode: &str, set_name: Option<&str>, peak: f64, end_ms: u64) -> WorkoutRecord {
    WorkoutRecord {
        timestamp_ms: None,
        mode: mode.into(),
        weight_kg: 20.0,
        target_reps: 8,
        warmup_target: 3,
        warmup_reps: 3,
        working_reps: 8,
        start_ms: 0,
        warmup_end_ms: None,
        end_ms,
        identity_key: None,
        identity_label: None,
        set_name: set_name.map(str::to_string),
        set_number: None,
        set_total: None,
        item_type: None,
        total_load_peak_kg: peak,
        reason: CompletionReason::TargetReached,
        movement_data: Vec::new(),
    }
}
