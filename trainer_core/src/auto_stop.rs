//! Danger-zone monitor for Just Lift blocks.
//!
//! A cable is in the danger zone when its live position sits within
//! `zone_fraction` of the bottom of its discovered range. Staying there for
//! `dwell_ms` of sample time ends the block. Only cables whose discovered
//! range exceeds `min_range` take part.
use trainer_traits::Sample;

use crate::config::AutoStopCfg;
use crate::range::{Cable, Extremum, RangeEstimator};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AutoStopStatus {
    pub in_danger_zone: bool,
    /// Fraction of the dwell already spent in the zone, 0.0..=1.0.
    pub progress: f32,
    /// Set on exactly one check per zone visit.
    pub triggered: bool,
}

#[derive(Debug, Clone)]
pub struct AutoStopMonitor {
    cfg: AutoStopCfg,
    zone_entered_ms: Option<u64>,
    fired: bool,
}

impl AutoStopMonitor {
    pub fn new(cfg: AutoStopCfg) -> Self {
        Self {
            cfg,
            zone_entered_ms: None,
            fired: false,
        }
    }

    pub fn check(&mut self, sample: &Sample, ranges: &RangeEstimator) -> AutoStopStatus {
        let any_bottom = [Cable::A, Cable::B]
            .iter()
            .any(|&c| ranges.estimate(c, Extremum::Bottom).is_some());
        if !any_bottom {
            return AutoStopStatus::default();
        }

        let mut qualifying = false;
        let mut in_zone = false;
        for (cable, pos) in [(Cable::A, sample.pos_a), (Cable::B, sample.pos_b)] {
            let (Some(bottom), Some(span)) =
                (ranges.estimate(cable, Extremum::Bottom), ranges.span(cable))
            else {
                continue;
            };
            if span <= self.cfg.min_range {
                continue;
            }
            qualifying = true;
            let limit = f64::from(bottom.average)
                + f64::from(span) * f64::from(self.cfg.zone_fraction);
            if f64::from(pos) <= limit {
                in_zone = true;
            }
        }
        if !qualifying {
            return AutoStopStatus::default();
        }

        if !in_zone {
            if self.zone_entered_ms.take().is_some() {
                tracing::debug!("left auto-stop zone");
            }
            self.fired = false;
            return AutoStopStatus::default();
        }

        let entered = *self.zone_entered_ms.get_or_insert(sample.timestamp_ms);
        let elapsed = sample.timestamp_ms.saturating_sub(entered);
        let dwell = self.cfg.dwell_ms.max(1);
        let progress = (elapsed as f64 / dwell as f64).min(1.0) as f32;
        let triggered = elapsed >= dwell && !self.fired;
        if triggered {
            self.fired = true;
            tracing::info!(elapsed_ms = elapsed, "auto-stop triggered");
        }
        AutoStopStatus {
            in_danger_zone: true,
            progress,
            triggered,
        }
    }

    pub fn zone_entered_ms(&self) -> Option<u64> {
        self.zone_entered_ms
    }

    pub fn reset(&mut self) {
        self.zone_entered_ms = None;
        self.fired = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RangeCfg;
    use rstest::rstest;

    fn ranges(bottom: i32, top: i32) -> RangeEstimator {
        let mut r = RangeEstimator::new(RangeCfg::default());
        r.record_bottom(bottom, bottom, 3);
        r.record_top(top, top, 3);
        r
    }

    fn at(pos: i32, ms: u64) -> Sample {
        Sample {
            pos_a: pos,
            pos_b: pos,
            timestamp_ms: ms,
            ..Sample::default()
        }
    }

    #[test]
    fn sustained_dwell_triggers_at_five_seconds() {
        let r = ranges(0, 100);
        let mut m = AutoStopMonitor::new(AutoStopCfg::default());
        let s = m.check(&at(3, 10_000), &r);
        assert!(s.in_danger_zone && !s.triggered);
        assert_eq!(s.progress, 0.0);

        let s = m.check(&at(3, 14_900), &r);
        assert!(!s.triggered);
        assert!((s.progress - 0.98).abs() < 1e-6);

        let s = m.check(&at(3, 15_000), &r);
        assert!(s.triggered);
        assert_eq!(s.progress, 1.0);

        // One-shot until the zone is left.
        let s = m.check(&at(3, 16_000), &r);
        assert!(!s.triggered && s.in_danger_zone);
    }

    #[rstest]
    #[case(0, 50)]
    #[case(0, 20)]
    #[case(100, 150)]
    fn narrow_ranges_never_count(#[case] bottom: i32, #[case] top: i32) {
        let r = ranges(bottom, top);
        let mut m = AutoStopMonitor::new(AutoStopCfg::default());
        for ms in (0..20_000).step_by(500) {
            let s = m.check(&at(0, ms), &r);
            assert_eq!(s, AutoStopStatus::default());
        }
        assert!(m.zone_entered_ms().is_none());
    }

    #[test]
    fn no_bottom_estimate_reports_idle() {
        let mut r = RangeEstimator::new(RangeCfg::default());
        r.record_top(600, 600, 3);
        let mut m = AutoStopMonitor::new(AutoStopCfg::default());
        assert_eq!(m.check(&at(0, 0), &r), AutoStopStatus::default());
    }

    #[test]
    fn leaving_zone_resets_timer_and_rearms() {
        let r = ranges(0, 100);
        let mut m = AutoStopMonitor::new(AutoStopCfg::default());
        m.check(&at(2, 0), &r);
        assert!(m.check(&at(2, 5_000), &r).triggered);

        let s = m.check(&at(50, 5_100), &r);
        assert!(!s.in_danger_zone);
        assert_eq!(s.progress, 0.0);
        assert!(m.zone_entered_ms().is_none());

        m.check(&at(1, 6_000), &r);
        assert!(!m.check(&at(1, 10_999), &r).triggered);
        assert!(m.check(&at(1, 11_000), &r).triggered);
    }

    #[test]
    fn either_cable_can_hold_the_zone() {
        let mut r = RangeEstimator::new(RangeCfg::default());
        r.record_bottom(0, 0, 3);
        r.record_top(100, 400, 3);
        let mut m = AutoStopMonitor::new(AutoStopCfg::default());
        let s = m.check(
            &Sample {
                pos_a: 90,
                pos_b: 10,
                ..Sample::default()
            },
            &r,
        );
        assert!(s.in_danger_zone);
    }
}
