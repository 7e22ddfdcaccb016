use std::sync::Arc;

use proptest::prelude::*;
use trainer_core::mocks::{InMemoryArchive, InMemoryHistory, MockMachine};
use trainer_core::{BlockConfig, EngineCfg, WorkoutController};
use trainer_traits::{ManualClock, Sample};

fn frame(top: u16, complete: u16) -> Vec<u8> {
    let mut b = top.to_le_bytes().to_vec();
    b.extend_from_slice(&[0, 0]);
    b.extend_from_slice(&complete.to_le_bytes());
    b
}

fn controller() -> WorkoutController {
    WorkoutController::builder()
        .with_machine(MockMachine::new())
        .with_history(InMemoryHistory::new())
        .with_archive(InMemoryArchive::default())
        .with_clock(Arc::new(ManualClock::new()))
        .with_config(EngineCfg::default())
        .build()
        .unwrap()
}

fn sample(pos: i32, kg: f32, ts: u64) -> Sample {
    Sample {
        load_a_kg: kg,
        load_b_kg: kg,
        pos_a: pos,
        pos_b: pos,
        timestamp_ms: ts,
    }
}

proptest! {
    // Whatever the counter jumps, one notification is at most one rep and the
    // block never credits more than its target.
    #[test]
    fn reps_never_exceed_target(
        seed in any::<u16>(),
        jumps in prop::collection::vec(0u16..4, 1..60),
        target in 1u32..8,
    ) {
        let mut ctl = controller();
        ctl.start_block(BlockConfig::new("Pump", 10.0, target)).unwrap();
        ctl.on_sample(sample(100, 10.0, 1)).unwrap();
        ctl.on_notification(&frame(seed, seed)).unwrap();

        let mut complete = seed;
        let mut events = 0u32;
        let mut done = None;
        for (i, j) in jumps.iter().enumerate() {
            complete = complete.wrapping_add(*j);
            if *j > 0 {
                events += 1;
            }
            ctl.on_sample(sample(100, 10.0, 2 + i as u64)).unwrap();
            if let Some(c) = ctl.on_notification(&frame(seed, complete)).unwrap() {
                done = Some(c);
                break;
            }
            let s = ctl.session().unwrap();
            prop_assert_eq!(s.total_reps(), events);
        }
        match done {
            Some(c) => prop_assert_eq!(c.working_reps, target),
            None => prop_assert!(ctl.session().unwrap().working_reps < target),
        }
    }

    #[test]
    fn personal_best_never_decreases(loads in prop::collection::vec(0.0f32..100.0, 1..200)) {
        let mut ctl = controller();
        ctl.start_block(BlockConfig::new("Tut", 10.0, 10)).unwrap();
        let mut last = 0.0f64;
        for (i, kg) in loads.iter().enumerate() {
            ctl.on_sample(sample(200, *kg, i as u64)).unwrap();
            let s = ctl.session().unwrap();
            prop_assert!(s.current_personal_best_kg >= last);
            prop_assert!(s.current_personal_best_kg >= s.live_peak_total_load_kg);
            last = s.current_personal_best_kg;
        }
    }
}
