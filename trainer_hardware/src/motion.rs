//! Rep kinematics for the simulated athlete.
//!
//! One rep is one cycle: bottom at cycle 0.0, top at 0.5, bottom again at 1.0.

use std::f64::consts::TAU;

/// Position along a cosine rep profile for a fractional cycle count.
pub fn position_at(cycles: f64, bottom: i32, top: i32) -> i32 {
    let frac = cycles.fract();
    let height = (1.0 - (TAU * frac).cos()) / 2.0;
    let span = f64::from(top) - f64::from(bottom);
    (f64::from(bottom) + span * height).round() as i32
}

/// Fraction of the way up the rep (0.0 at bottom, 1.0 at top).
pub fn height_at(cycles: f64) -> f64 {
    (1.0 - (TAU * cycles.fract()).cos()) / 2.0
}

/// True on the way down (second half of the cycle).
pub fn descending(cycles: f64) -> bool {
    cycles.fract() > 0.5
}

/// Number of top crossings (cycle k + 0.5) in `(prev, now]`.
pub fn tops_crossed(prev: f64, now: f64) -> u32 {
    if now <= prev {
        return 0;
    }
    let before = (prev + 0.5).floor();
    let after = (now + 0.5).floor();
    (after - before).max(0.0) as u32
}

/// Number of completed reps (cycle boundaries) in `(prev, now]`.
pub fn bottoms_crossed(prev: f64, now: f64) -> u32 {
    if now <= prev {
        return 0;
    }
    (now.floor() - prev.floor()).max(0.0) as u32
}

/// Encode a rep notification: top counter, reserved, complete counter (LE).
pub fn encode_counters(top: u16, complete: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(6);
    out.extend_from_slice(&top.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&complete.to_le_bytes());
    out
}
