#![no_main]
use libfuzzer_sys::fuzz_target;
use trainer_core::{CounterTracker, CounterUpdate};

fuzz_target!(|frames: Vec<Vec<u8>>| {
    let mut tracker = CounterTracker::new();
    for bytes in &frames {
        let update = tracker.on_notification(bytes);
        if bytes.len() < 6 {
            assert_eq!(update, CounterUpdate::Ignored);
        }
    }
});
