//! Rep-notification decoding.
//!
//! A notification carries three little-endian `u16` fields: the "top reached"
//! counter, a reserved word and the "rep complete" counter. Both counters
//! increase by one per event and wrap at 65536. The tracker turns successive
//! counter values into deltas; the first value seen for a counter only seeds
//! it.

/// Minimum notification length: three `u16` fields.
pub const COUNTER_FRAME_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterUpdate {
    /// Accepted notification. A non-zero delta is one logical event.
    Deltas { top: u16, complete: u16 },
    /// Short buffer; tracker state unchanged.
    Ignored,
}

impl CounterUpdate {
    #[inline]
    pub fn top_reached(&self) -> bool {
        matches!(self, Self::Deltas { top, .. } if *top > 0)
    }

    #[inline]
    pub fn rep_completed(&self) -> bool {
        matches!(self, Self::Deltas { complete, .. } if *complete > 0)
    }
}

/// Forward distance from `last` to `current` modulo 65536.
///
/// Equivalent to `current - last` when `current >= last`, otherwise
/// `0xFFFF - last + current + 1`.
#[inline]
pub fn counter_delta(last: u16, current: u16) -> u16 {
    current.wrapping_sub(last)
}

#[derive(Debug, Default, Clone)]
pub struct CounterTracker {
    last_top: Option<u16>,
    last_complete: Option<u16>,
}

impl CounterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_notification(&mut self, bytes: &[u8]) -> CounterUpdate {
        let &[t0, t1, _, _, c0, c1, ..] = bytes else {
            tracing::debug!(len = bytes.len(), "ignoring short counter notification");
            return CounterUpdate::Ignored;
        };
        let top = u16::from_le_bytes([t0, t1]);
        let complete = u16::from_le_bytes([c0, c1]);

        let top_delta = self.last_top.map_or(0, |last| counter_delta(last, top));
        let complete_delta = self
            .last_complete
            .map_or(0, |last| counter_delta(last, complete));
        self.last_top = Some(top);
        self.last_complete = Some(complete);

        if top_delta > 1 || complete_delta > 1 {
            // Counted as a single event each.
            tracing::debug!(top_delta, complete_delta, "counter jumped by more than one");
        }
        CounterUpdate::Deltas {
            top: top_delta,
            complete: complete_delta,
        }
    }

    /// Forget both seeds; the next notification seeds again.
    pub fn reset(&mut self) {
        self.last_top = None;
        self.last_complete = None;
    }

    pub fn last_top(&self) -> Option<u16> {
        self.last_top
    }

    pub fn last_complete(&self) -> Option<u16> {
        self.last_complete
    }
}
