//! Simulated cable machine.
//!
//! `SimulatedTrainer::split` returns the two transport halves over shared
//! state: `SimTelemetry` (moved into the live feed thread) and `SimMachine`
//! (owned by the session controller, cheaply cloneable so callers can keep a
//! handle for fault injection).
pub mod error;
pub mod motion;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use trainer_traits::{BoxError, Clock, Machine, Program, Reading, Sample, Telemetry};

use crate::error::{HwError, Result};
use crate::motion::{
    bottoms_crossed, descending, encode_counters, height_at, position_at, tops_crossed,
};

/// Behaviour of the simulated athlete and machine.
#[derive(Debug, Clone)]
pub struct SimProfile {
    /// Duration of one full rep (bottom, top, bottom) in milliseconds.
    pub rep_ms: u64,
    /// Cable position at full stretch.
    pub bottom: i32,
    /// Cable position at full contraction.
    pub top: i32,
    /// Telemetry rate.
    pub sample_rate_hz: u32,
    /// Stop moving (resting at the bottom) after this many reps.
    pub hold_after_reps: Option<u32>,
    pub connected: bool,
    /// Initial value of both counters; close to `u16::MAX` to exercise wraparound.
    pub counter_seed: u16,
    /// Load per cable used for adaptive (echo) programs.
    pub echo_load_kg: f32,
}

impl Default for SimProfile {
    fn default() -> Self {
        Self {
            rep_ms: 2_000,
            bottom: 50,
            top: 650,
            sample_rate_hz: 50,
            hold_after_reps: None,
            connected: true,
            counter_seed: 65_533,
            echo_load_kg: 20.0,
        }
    }
}

#[derive(Debug)]
struct SimState {
    connected: bool,
    running: bool,
    // Telemetry re-anchors the rep clock on its next read.
    restart: bool,
    program: Option<Program>,
    reject_stop: Option<String>,
    starts: u32,
    stops: u32,
}

fn lock(state: &Arc<Mutex<SimState>>) -> Result<MutexGuard<'_, SimState>> {
    state.lock().map_err(|_| HwError::Poisoned)
}

pub struct SimulatedTrainer;

impl SimulatedTrainer {
    pub fn split(
        profile: SimProfile,
        clock: Arc<dyn Clock + Send + Sync>,
        epoch: Instant,
    ) -> (SimTelemetry, SimMachine) {
        let state = Arc::new(Mutex::new(SimState {
            connected: profile.connected,
            running: false,
            restart: false,
            program: None,
            reject_stop: None,
            starts: 0,
            stops: 0,
        }));
        let hz = u64::from(profile.sample_rate_hz.max(1));
        let period = Duration::from_micros((1_000_000 / hz).max(1));
        let telemetry = SimTelemetry {
            state: state.clone(),
            clock,
            epoch,
            period,
            pending: VecDeque::new(),
            rep_anchor_ms: 0,
            last_cycles: 0.0,
            top_counter: profile.counter_seed,
            complete_counter: profile.counter_seed,
            profile,
        };
        (telemetry, SimMachine { state })
    }
}

/// Streaming half: samples every period, notifications after counter changes.
pub struct SimTelemetry {
    state: Arc<Mutex<SimState>>,
    profile: SimProfile,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    period: Duration,
    pending: VecDeque<Reading>,
    rep_anchor_ms: u64,
    last_cycles: f64,
    top_counter: u16,
    complete_counter: u16,
}

impl SimTelemetry {
    fn cycles_at(&self, now_ms: u64) -> f64 {
        let rep_ms = self.profile.rep_ms.max(1) as f64;
        let raw = now_ms.saturating_sub(self.rep_anchor_ms) as f64 / rep_ms;
        match self.profile.hold_after_reps {
            Some(n) => raw.min(f64::from(n)),
            None => raw,
        }
    }

    fn next_reading(&mut self) -> Result<Reading> {
        let (connected, running, restart, program) = {
            let mut st = lock(&self.state)?;
            let restart = std::mem::replace(&mut st.restart, false);
            (st.connected, st.running, restart, st.program.clone())
        };
        if !connected {
            self.clock.sleep(self.period);
            return Err(HwError::Disconnected);
        }
        self.clock.sleep(self.period);
        let now = self.clock.ms_since(self.epoch);

        if restart {
            self.rep_anchor_ms = now;
            self.last_cycles = 0.0;
            // A freshly started program reports its counters once so the
            // engine can seed before the first real event.
            self.pending.push_back(Reading::Notification(encode_counters(
                self.top_counter,
                self.complete_counter,
            )));
        }

        let cycles = if running {
            self.cycles_at(now)
        } else {
            self.last_cycles
        };

        let tops = tops_crossed(self.last_cycles, cycles);
        let bottoms = bottoms_crossed(self.last_cycles, cycles);
        if tops > 0 || bottoms > 0 {
            self.top_counter = self.top_counter.wrapping_add(tops as u16);
            self.complete_counter = self.complete_counter.wrapping_add(bottoms as u16);
            self.pending.push_back(Reading::Notification(encode_counters(
                self.top_counter,
                self.complete_counter,
            )));
        }
        self.last_cycles = cycles;

        let base_kg = match &program {
            Some(p) if p.per_cable_kg > 0.0 => p.per_cable_kg,
            Some(_) => self.profile.echo_load_kg,
            None => 0.0,
        };
        let progression = program.as_ref().map_or(0.0, |p| p.progression_kg);
        let per_cable = if running {
            let reps_done = cycles.floor() as f32;
            let height = height_at(cycles) as f32;
            let load = (base_kg + progression * reps_done).max(0.0) * (0.8 + 0.2 * height);
            match &program {
                Some(p) if descending(cycles) => load * p.eccentric_pct as f32 / 100.0,
                _ => load,
            }
        } else {
            0.0
        };
        let single_cable = program.as_ref().is_some_and(|p| p.cables == 1);
        let pos = position_at(cycles, self.profile.bottom, self.profile.top);
        Ok(Reading::Sample(Sample {
            load_a_kg: per_cable,
            load_b_kg: if single_cable { 0.0 } else { per_cable },
            pos_a: pos,
            pos_b: pos,
            timestamp_ms: now,
        }))
    }
}

impl Telemetry for SimTelemetry {
    fn read(&mut self, _timeout: Duration) -> std::result::Result<Reading, BoxError> {
        if let Some(r) = self.pending.pop_front() {
            return Ok(r);
        }
        let reading = self.next_reading()?;
        // Samples go out before the notification they caused.
        Ok(reading)
    }
}

/// Control half. Clones share state with the telemetry half.
#[derive(Debug, Clone)]
pub struct SimMachine {
    state: Arc<Mutex<SimState>>,
}

impl SimMachine {
    pub fn set_connected(&self, connected: bool) {
        if let Ok(mut st) = self.state.lock() {
            st.connected = connected;
            if !connected {
                st.running = false;
            }
        }
    }

    /// Make every subsequent stop command fail with `msg` (None clears).
    pub fn reject_stops(&self, msg: Option<&str>) {
        if let Ok(mut st) = self.state.lock() {
            st.reject_stop = msg.map(str::to_string);
        }
    }

    pub fn start_count(&self) -> u32 {
        self.state.lock().map(|s| s.starts).unwrap_or(0)
    }

    pub fn stop_count(&self) -> u32 {
        self.state.lock().map(|s| s.stops).unwrap_or(0)
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().map(|s| s.running).unwrap_or(false)
    }

    pub fn last_program(&self) -> Option<Program> {
        self.state.lock().ok().and_then(|s| s.program.clone())
    }
}

impl Machine for SimMachine {
    fn start(&mut self, program: &Program) -> std::result::Result<(), BoxError> {
        let mut st = lock(&self.state)?;
        if !st.connected {
            return Err(Box::new(HwError::Disconnected));
        }
        st.running = true;
        st.restart = true;
        st.program = Some(program.clone());
        st.starts = st.starts.saturating_add(1);
        tracing::debug!(label = %program.label, kg = program.per_cable_kg, "sim program started");
        Ok(())
    }

    fn stop(&mut self) -> std::result::Result<(), BoxError> {
        let mut st = lock(&self.state)?;
        if !st.connected {
            return Err(Box::new(HwError::Disconnected));
        }
        if let Some(msg) = st.reject_stop.clone() {
            return Err(Box::new(HwError::StopRejected(msg)));
        }
        st.running = false;
        st.stops = st.stops.saturating_add(1);
        tracing::debug!("sim program stopped");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().map(|s| s.connected).unwrap_or(false)
    }
}
