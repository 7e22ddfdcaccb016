//! In-memory collaborators for tests and for callers without persistence.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use trainer_traits::{BoxError, Machine, Program, Sample};

use crate::history::{HistoryStore, SampleArchive, WorkoutRecord};

/// History kept in a Vec, newest first.
#[derive(Debug, Default, Clone)]
pub struct InMemoryHistory {
    records: Vec<WorkoutRecord>,
    fail_appends: bool,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records in any order; they are sorted newest first by id.
    pub fn with_records(mut records: Vec<WorkoutRecord>) -> Self {
        records.sort_by(|a, b| b.record_id().cmp(&a.record_id()));
        Self {
            records,
            fail_appends: false,
        }
    }

    /// Make every append fail (exercises the non-fatal persistence path).
    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            fail_appends: true,
        }
    }
}

impl HistoryStore for InMemoryHistory {
    fn all_records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    fn append(&mut self, mut record: WorkoutRecord) -> Result<u64, BoxError> {
        if self.fail_appends {
            return Err(Box::new(std::io::Error::other("history store unavailable")));
        }
        // Ids stay unique and newest first, even when two blocks end together
        // or seeded records carry later stamps.
        let next = self
            .records
            .iter()
            .map(WorkoutRecord::record_id)
            .max()
            .map_or(0, |newest| newest.saturating_add(1));
        if record.record_id() < next {
            record.timestamp_ms = Some(next);
        }
        let id = record.record_id();
        self.records.insert(0, record);
        Ok(id)
    }
}

/// Ring buffer of recent samples.
#[derive(Debug, Clone)]
pub struct InMemoryArchive {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl InMemoryArchive {
    /// Roughly ten minutes at 50 Hz.
    pub const DEFAULT_CAPACITY: usize = 30_000;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for InMemoryArchive {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl SampleArchive for InMemoryArchive {
    fn record(&mut self, sample: &Sample) {
        self.samples.push_back(*sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    fn samples_between(&self, start_ms: u64, end_ms: u64) -> Vec<Sample> {
        self.samples
            .iter()
            .filter(|s| (start_ms..=end_ms).contains(&s.timestamp_ms))
            .copied()
            .collect()
    }
}

#[derive(Debug, Default)]
struct MockState {
    connected: bool,
    starts: Vec<Program>,
    stops: u32,
    fail_stop: Option<String>,
}

/// Machine that records commands; clones share state so a test can keep a handle.
#[derive(Debug, Clone)]
pub struct MockMachine {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMachine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                connected: true,
                ..MockState::default()
            })),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        if let Ok(mut st) = self.state.lock() {
            st.connected = connected;
        }
    }

    pub fn fail_stops(&self, msg: Option<&str>) {
        if let Ok(mut st) = self.state.lock() {
            st.fail_stop = msg.map(str::to_string);
        }
    }

    pub fn starts(&self) -> Vec<Program> {
        self.state
            .lock()
            .map(|s| s.starts.clone())
            .unwrap_or_default()
    }

    pub fn stop_count(&self) -> u32 {
        self.state.lock().map(|s| s.stops).unwrap_or(0)
    }
}

impl Machine for MockMachine {
    fn start(&mut self, program: &Program) -> Result<(), BoxError> {
        let mut st = self
            .state
            .lock()
            .map_err(|_| std::io::Error::other("mock state poisoned"))?;
        if !st.connected {
            return Err(Box::new(std::io::Error::other("machine disconnected")));
        }
        st.starts.push(program.clone());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        let mut st = self
            .state
            .lock()
            .map_err(|_| std::io::Error::other("mock state poisoned"))?;
        if let Some(msg) = st.fail_stop.clone() {
            return Err(Box::new(std::io::Error::other(msg)));
        }
        st.stops += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().map(|s| s.connected).unwrap_or(false)
    }
}
