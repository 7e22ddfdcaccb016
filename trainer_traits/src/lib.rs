//! Transport seams between the workout engine and a cable machine.
//!
//! The engine never talks to a radio or a GPIO line directly. A machine is
//! split into two halves:
//!
//! - [`Telemetry`]: the streaming side, yielding [`Reading`]s (live samples and
//!   raw notification buffers) in delivery order.
//! - [`Machine`]: the control side, starting a [`Program`], stopping it, and
//!   reporting connection state.
//!
//! The halves are usually owned by different parties: the live feed thread
//! owns telemetry, the session controller owns the machine.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Boxed error type used at every trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One live reading from both cables.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// Load on cable A in kilograms.
    pub load_a_kg: f32,
    /// Load on cable B in kilograms.
    pub load_b_kg: f32,
    /// Cable A position in device units.
    pub pos_a: i32,
    /// Cable B position in device units.
    pub pos_b: i32,
    /// Milliseconds on the engine timeline.
    pub timestamp_ms: u64,
}

impl Sample {
    /// Combined load of both cables.
    #[inline]
    pub fn total_load_kg(&self) -> f64 {
        f64::from(self.load_a_kg) + f64::from(self.load_b_kg)
    }
}

/// Anything the telemetry stream can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Sample(Sample),
    /// Raw rep-notification payload, decoded by the engine.
    Notification(Vec<u8>),
}

/// Parameters the machine needs to run one block.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Human label of the program (mode or echo level).
    pub label: String,
    /// Resistance per cable in kilograms; zero for adaptive programs.
    pub per_cable_kg: f32,
    /// Rep target; zero means open-ended.
    pub target_reps: u32,
    /// Load added per rep in kilograms (may be negative).
    pub progression_kg: f32,
    /// Open-ended lifting ended by the auto-stop monitor.
    pub just_lift: bool,
    /// Cables under load (1 or 2).
    pub cables: u8,
    /// Load on the way down, in percent of the load on the way up.
    pub eccentric_pct: u32,
    /// Adaptive level, 0 (hard) to 3 (epic); `None` for fixed-weight programs.
    pub echo_level: Option<u8>,
}

impl Default for Program {
    fn default() -> Self {
        Self {
            label: String::new(),
            per_cable_kg: 0.0,
            target_reps: 0,
            progression_kg: 0.0,
            just_lift: false,
            cables: 2,
            eccentric_pct: 100,
            echo_level: None,
        }
    }
}

pub trait Telemetry {
    /// Block up to `timeout` for the next reading.
    fn read(&mut self, timeout: std::time::Duration) -> Result<Reading, BoxError>;
}

pub trait Machine {
    fn start(&mut self, program: &Program) -> Result<(), BoxError>;
    fn stop(&mut self) -> Result<(), BoxError>;
    fn is_connected(&self) -> bool;
}

impl<T: Machine + ?Sized> Machine for Box<T> {
    fn start(&mut self, program: &Program) -> Result<(), BoxError> {
        (**self).start(program)
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        (**self).stop()
    }
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

impl<T: Telemetry + ?Sized> Telemetry for Box<T> {
    fn read(&mut self, timeout: std::time::Duration) -> Result<Reading, BoxError> {
        (**self).read(timeout)
    }
}
