//! Background telemetry reader.
//!
//! Spawns a thread that owns the `Telemetry` half of a machine, forwards every
//! reading in delivery order over a bounded channel, and tracks the last-ok
//! timestamp for watchdog logic.
//!
//! Each `DeviceFeed` spawns exactly one thread that is shut down and joined
//! when the feed is dropped.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use trainer_traits::clock::Clock;
use trainer_traits::{Reading, Telemetry};

use crate::config::FeedCfg;

/// Readings buffered between the reader thread and the engine.
const CHANNEL_DEPTH: usize = 64;

pub struct DeviceFeed {
    rx: xch::Receiver<Reading>,
    last_ok: Arc<AtomicU64>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    stall_threshold_ms: u64,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

/// Derive a quick stall threshold from per-read timeout.
#[inline]
fn fast_threshold_ms(read_timeout_ms: u64) -> u64 {
    read_timeout_ms.saturating_mul(4)
}

/// The stall threshold spans at least two periods to tolerate one miss.
#[inline]
fn two_periods_ms(period_ms: u64) -> u64 {
    period_ms.saturating_mul(2)
}

/// Stall watchdog threshold: the configured stall time, but never shorter
/// than four read timeouts or two sample periods.
pub fn stall_threshold_ms(cfg: &FeedCfg) -> u64 {
    let period_ms = crate::util::period_ms(cfg.sample_rate_hz);
    cfg.stall_ms
        .max(fast_threshold_ms(cfg.read_timeout_ms))
        .max(two_periods_ms(period_ms))
        .max(1)
}

impl DeviceFeed {
    /// Event-driven reader: the telemetry paces itself by blocking in
    /// `read(timeout)`; the thread only sleeps one period after a failed read.
    pub fn spawn<T: Telemetry + Send + 'static>(
        mut telemetry: T,
        cfg: &FeedCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        epoch: Instant,
    ) -> Self {
        let (tx, rx) = xch::bounded(CHANNEL_DEPTH);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(clock.ms_since(epoch)));
        let last_ok_clone = last_ok.clone();
        let timeout = Duration::from_millis(cfg.read_timeout_ms.max(1));
        let period = Duration::from_micros(crate::util::period_us(cfg.sample_rate_hz));
        let thread_clock = clock.clone();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("feed thread received shutdown signal");
                    break;
                }

                match telemetry.read(timeout) {
                    Ok(reading) => {
                        let now = thread_clock.ms_since(epoch);
                        last_ok_clone.store(now, Ordering::Relaxed);
                        // Consumer gone; exit.
                        if tx.send(reading).is_err() {
                            tracing::debug!("feed consumer disconnected, exiting thread");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "telemetry read failed");
                        if shutdown_clone.load(Ordering::Relaxed) {
                            break;
                        }
                        thread_clock.sleep(period);
                    }
                }
            }
            tracing::trace!("feed thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            clock,
            epoch,
            stall_threshold_ms: stall_threshold_ms(cfg),
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Wait up to `timeout` for the next reading.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Reading> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drain whatever is already queued, in order.
    pub fn try_iter(&self) -> impl Iterator<Item = Reading> + '_ {
        self.rx.try_iter()
    }

    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    pub fn stall_threshold(&self) -> u64 {
        self.stall_threshold_ms
    }

    /// True once no reading has arrived for longer than the stall threshold.
    pub fn is_stalled(&self) -> bool {
        self.stalled_for(self.clock.ms_since(self.epoch)) > self.stall_threshold_ms
    }
}

impl Drop for DeviceFeed {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Unblock a pending send.
        while self.rx.try_recv().is_ok() {}
        if let Some(handle) = self.join_handle.take() {
            // The thread may be parked in a full-channel send or blocked in
            // `read`; drain with a short wait until it observes the flag.
            while !handle.is_finished() {
                let _ = self.rx.recv_timeout(Duration::from_millis(5));
            }
            match handle.join() {
                Ok(()) => tracing::trace!("feed thread joined"),
                Err(e) => tracing::warn!(?e, "feed thread panicked during shutdown"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use trainer_traits::{BoxError, ManualClock, Sample};

    #[rstest]
    #[case(50, 150, 2_000, 2_000)]
    #[case(50, 800, 2_000, 3_200)]
    #[case(1, 100, 500, 2_000)]
    fn threshold_takes_the_largest_floor(
        #[case] hz: u32,
        #[case] timeout: u64,
        #[case] stall: u64,
        #[case] want: u64,
    ) {
        let cfg = FeedCfg {
            sample_rate_hz: hz,
            read_timeout_ms: timeout,
            stall_ms: stall,
        };
        assert_eq!(stall_threshold_ms(&cfg), want);
    }

    struct Counting {
        next: u64,
        clock: ManualClock,
    }

    impl Telemetry for Counting {
        fn read(&mut self, _timeout: Duration) -> Result<Reading, BoxError> {
            self.clock.advance_ms(20);
            self.next += 1;
            Ok(Reading::Sample(Sample {
                timestamp_ms: self.next,
                ..Sample::default()
            }))
        }
    }

    #[test]
    fn forwards_readings_in_order() {
        let clock = ManualClock::new();
        let epoch = clock.origin();
        let feed = DeviceFeed::spawn(
            Counting {
                next: 0,
                clock: clock.clone(),
            },
            &FeedCfg::default(),
            Arc::new(clock),
            epoch,
        );
        let mut seen = Vec::new();
        while seen.len() < 10 {
            if let Some(Reading::Sample(s)) = feed.recv_timeout(Duration::from_secs(1)) {
                seen.push(s.timestamp_ms);
            }
        }
        assert_eq!(seen, (1..=10).collect::<Vec<_>>());
        assert!(!feed.is_stalled());
    }

    struct Dead;

    impl Telemetry for Dead {
        fn read(&mut self, _timeout: Duration) -> Result<Reading, BoxError> {
            Err("link lost".into())
        }
    }

    #[test]
    fn dead_link_reports_stall() {
        let clock = trainer_traits::MonotonicClock::new();
        let epoch = clock.now();
        let cfg = FeedCfg {
            sample_rate_hz: 1_000,
            read_timeout_ms: 1,
            stall_ms: 5,
        };
        let feed = DeviceFeed::spawn(Dead, &cfg, Arc::new(clock), epoch);
        assert_eq!(feed.stall_threshold(), 5);
        std::thread::sleep(Duration::from_millis(50));
        assert!(feed.is_stalled());
        assert!(feed.recv_timeout(Duration::from_millis(5)).is_none());
    }
}
