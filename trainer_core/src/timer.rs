//! Cooperative countdown, polled with the current engine time.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    started_ms: u64,
    duration_ms: u64,
    cancelled: bool,
}

impl Countdown {
    pub fn new(now_ms: u64, duration_ms: u64) -> Self {
        Self {
            started_ms: now_ms,
            duration_ms,
            cancelled: false,
        }
    }

    pub fn deadline_ms(&self) -> u64 {
        self.started_ms.saturating_add(self.duration_ms)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms
            .saturating_sub(self.started_ms)
            .min(self.duration_ms)
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        if self.cancelled {
            return 0;
        }
        self.deadline_ms().saturating_sub(now_ms)
    }

    /// Remaining whole seconds, rounded up (1 ms left shows as 1 s).
    pub fn remaining_secs(&self, now_ms: u64) -> u64 {
        self.remaining_ms(now_ms).div_ceil(1_000)
    }

    /// Elapsed fraction of the (possibly extended) duration.
    pub fn progress(&self, now_ms: u64) -> f32 {
        if self.cancelled || self.duration_ms == 0 {
            return 1.0;
        }
        (self.elapsed_ms(now_ms) as f64 / self.duration_ms as f64) as f32
    }

    /// Push the deadline out; elapsed time is kept. Once the deadline has
    /// passed, the extension counts from `now_ms`.
    pub fn extend(&mut self, now_ms: u64, by_ms: u64) {
        let base = self.deadline_ms().max(now_ms);
        self.duration_ms = base
            .saturating_add(by_ms)
            .saturating_sub(self.started_ms);
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.remaining_ms(now_ms) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 10)]
    #[case(1, 10)]
    #[case(999, 10)]
    #[case(1_000, 9)]
    #[case(9_001, 1)]
    #[case(10_000, 0)]
    #[case(50_000, 0)]
    fn remaining_secs_round_up(#[case] elapsed: u64, #[case] secs: u64) {
        let c = Countdown::new(1_000, 10_000);
        assert_eq!(c.remaining_secs(1_000 + elapsed), secs);
    }

    #[test]
    fn extend_keeps_elapsed() {
        let mut c = Countdown::new(0, 10_000);
        assert_eq!(c.remaining_secs(5_000), 5);
        c.extend(5_000, 30_000);
        assert_eq!(c.remaining_secs(5_000), 35);
        assert_eq!(c.elapsed_ms(5_000), 5_000);
        assert!((c.progress(5_000) - 0.125).abs() < 1e-6);
    }

    #[test]
    fn extend_after_deadline_counts_from_now() {
        let mut c = Countdown::new(0, 10_000);
        assert!(c.is_expired(12_000));
        c.extend(12_000, 30_000);
        assert_eq!(c.remaining_secs(12_000), 30);
        assert!(!c.is_expired(12_000));
        assert_eq!(c.deadline_ms(), 42_000);
    }

    #[test]
    fn cancel_expires_immediately() {
        let mut c = Countdown::new(0, 10_000);
        assert!(!c.is_expired(1));
        c.cancel();
        assert!(c.is_expired(1));
        assert_eq!(c.progress(1), 1.0);
    }

    #[test]
    fn zero_duration_is_already_expired() {
        let c = Countdown::new(42, 0);
        assert!(c.is_expired(42));
        assert_eq!(c.progress(42), 1.0);
    }
}
