//! Rep range discovery.
//!
//! Each cable keeps two rolling windows of observed positions: one for the
//! tops of reps and one for the bottoms. The window length grows from the
//! warmup size to the working size once warmup is over, so early reps adapt
//! quickly and later reps smooth out noise.
use std::collections::VecDeque;

use crate::config::RangeCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cable {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extremum {
    Top,
    Bottom,
}

/// Spread of the values currently in a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEstimate {
    /// Mean of the window, rounded to the nearest position unit.
    pub average: i32,
    pub band: Band,
}

/// FIFO of the most recent positions, never longer than the capacity given
/// on the latest push.
#[derive(Debug, Clone, Default)]
pub struct RollingWindow {
    values: VecDeque<i32>,
}

impl RollingWindow {
    pub fn push(&mut self, value: i32, capacity: usize) {
        let cap = capacity.max(1);
        self.values.push_back(value);
        while self.values.len() > cap {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.iter().copied()
    }

    pub fn estimate(&self) -> Option<RangeEstimate> {
        let min = self.values.iter().copied().min()?;
        let max = self.values.iter().copied().max()?;
        let sum: i64 = self.values.iter().map(|&v| i64::from(v)).sum();
        let mean = sum as f64 / self.values.len() as f64;
        Some(RangeEstimate {
            average: mean.round() as i32,
            band: Band { min, max },
        })
    }
}

#[derive(Debug, Clone)]
pub struct RangeEstimator {
    cfg: RangeCfg,
    top_a: RollingWindow,
    top_b: RollingWindow,
    bottom_a: RollingWindow,
    bottom_b: RollingWindow,
    // Averages (top A, bottom A, top B, bottom B) at the last summary.
    logged: Option<[Option<i32>; 4]>,
}

impl RangeEstimator {
    pub fn new(cfg: RangeCfg) -> Self {
        Self {
            cfg,
            top_a: RollingWindow::default(),
            top_b: RollingWindow::default(),
            bottom_a: RollingWindow::default(),
            bottom_b: RollingWindow::default(),
            logged: None,
        }
    }

    /// Window length for an insertion made when `reps_so_far` reps have
    /// already been counted in a block with `warmup_target` warmup reps.
    #[inline]
    pub fn window_for(&self, reps_so_far: u32, warmup_target: u32) -> usize {
        if reps_so_far < warmup_target {
            self.cfg.warmup_window
        } else {
            self.cfg.working_window
        }
    }

    pub fn record_top(&mut self, pos_a: i32, pos_b: i32, window: usize) {
        self.top_a.push(pos_a, window);
        self.top_b.push(pos_b, window);
        self.log_if_changed();
    }

    pub fn record_bottom(&mut self, pos_a: i32, pos_b: i32, window: usize) {
        self.bottom_a.push(pos_a, window);
        self.bottom_b.push(pos_b, window);
        self.log_if_changed();
    }

    pub fn window(&self, cable: Cable, extremum: Extremum) -> &RollingWindow {
        match (cable, extremum) {
            (Cable::A, Extremum::Top) => &self.top_a,
            (Cable::A, Extremum::Bottom) => &self.bottom_a,
            (Cable::B, Extremum::Top) => &self.top_b,
            (Cable::B, Extremum::Bottom) => &self.bottom_b,
        }
    }

    pub fn estimate(&self, cable: Cable, extremum: Extremum) -> Option<RangeEstimate> {
        self.window(cable, extremum).estimate()
    }

    /// Top average minus bottom average, when both are known.
    pub fn span(&self, cable: Cable) -> Option<i32> {
        let top = self.estimate(cable, Extremum::Top)?;
        let bottom = self.estimate(cable, Extremum::Bottom)?;
        Some(top.average.saturating_sub(bottom.average))
    }

    pub fn reset(&mut self) {
        self.top_a.clear();
        self.top_b.clear();
        self.bottom_a.clear();
        self.bottom_b.clear();
        self.logged = None;
    }

    fn averages(&self) -> [Option<i32>; 4] {
        let avg = |w: &RollingWindow| w.estimate().map(|e| e.average);
        [
            avg(&self.top_a),
            avg(&self.bottom_a),
            avg(&self.top_b),
            avg(&self.bottom_b),
        ]
    }

    fn log_if_changed(&mut self) {
        let now = self.averages();
        let threshold = self.cfg.log_threshold;
        let changed = match &self.logged {
            None => now.iter().any(Option::is_some),
            Some(prev) => prev.iter().zip(now.iter()).any(|pair| match pair {
                (Some(p), Some(n)) => n.abs_diff(*p) > threshold.unsigned_abs(),
                (None, Some(_)) => true,
                _ => false,
            }),
        };
        if changed {
            tracing::debug!(
                top_a = ?now[0],
                bottom_a = ?now[1],
                top_b = ?now[2],
                bottom_b = ?now[3],
                "rep range updated"
            );
            self.logged = Some(now);
        }
    }
}
