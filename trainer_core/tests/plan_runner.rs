mod rig;

use rig::Rig;
use trainer_core::mocks::InMemoryHistory;
use trainer_core::{
    EchoItem, EchoLevel, EngineCfg, EngineEvent, ExerciseItem, ItemKind, PlanCursor, PlanItem,
    PlanRunner, ProgramMode, RunnerStatus, TrainerError,
};

fn cfg() -> EngineCfg {
    EngineCfg {
        warmup_reps: 0,
        ..EngineCfg::default()
    }
}

fn exercise(reps: u32, sets: u32, rest_sec: u64) -> PlanItem {
    let mut e = ExerciseItem::new(ProgramMode::Pump, 15.0, reps);
    e.sets = sets;
    e.rest_sec = rest_sec;
    PlanItem::Exercise(e)
}

/// Play reps until the runner reports a finished block.
fn finish_block(rig: &mut Rig, runner: &mut PlanRunner) {
    runner.on_notification(&rig.seed()).unwrap();
    for _ in 0..20 {
        let s = rig.sample(rig::TOP, 15.0);
        runner.on_sample(s).unwrap();
        let n = rig.top_note();
        if runner.on_notification(&n).unwrap().is_some() {
            return;
        }
        let s = rig.sample(rig::BOTTOM, 15.0);
        runner.on_sample(s).unwrap();
        let n = rig.bottom_note();
        if runner.on_notification(&n).unwrap().is_some() {
            return;
        }
    }
    panic!("block did not complete");
}

#[test]
fn sets_rest_then_advance_to_next_item() {
    let mut rig = Rig::new();
    let mut runner = PlanRunner::new(rig.controller(cfg(), InMemoryHistory::new()));
    runner
        .start(vec![exercise(2, 3, 10), exercise(2, 1, 0)])
        .unwrap();
    assert_eq!(runner.cursor(), Some(PlanCursor::START));

    finish_block(&mut rig, &mut runner);
    assert_eq!(runner.cursor(), Some(PlanCursor { index: 0, set: 2 }));
    assert_eq!(runner.status(), RunnerStatus::Resting);
    assert_eq!(runner.rest_remaining_secs(), Some(10));

    rig.clock.advance_ms(9_999);
    runner.tick().unwrap();
    assert!(runner.is_resting());
    rig.clock.advance_ms(1);
    runner.tick().unwrap();
    assert_eq!(runner.status(), RunnerStatus::Running);
    let s = runner.controller().session().unwrap();
    assert_eq!(s.plan.as_ref().map(|p| (p.set_number, p.set_total)), Some((2, 3)));

    finish_block(&mut rig, &mut runner);
    runner.skip_rest().unwrap();
    finish_block(&mut rig, &mut runner);
    assert_eq!(runner.cursor(), Some(PlanCursor { index: 1, set: 1 }));
    // Rest after the last set uses the finished item's rest.
    assert_eq!(runner.rest_remaining_secs(), Some(10));

    runner.skip_rest().unwrap();
    finish_block(&mut rig, &mut runner);
    assert_eq!(runner.status(), RunnerStatus::Finished);
    assert!(!runner.controller().is_active());
    assert_eq!(rig.machine.starts().len(), 4);
    let evs = runner.drain_events();
    assert!(matches!(
        evs.last(),
        Some(EngineEvent::PlanFinished { blocks: 4 })
    ));
}

#[test]
fn zero_rest_launches_next_set_immediately() {
    let mut rig = Rig::new();
    let mut runner = PlanRunner::new(rig.controller(cfg(), InMemoryHistory::new()));
    runner.start(vec![exercise(1, 2, 0)]).unwrap();
    finish_block(&mut rig, &mut runner);
    assert_eq!(runner.status(), RunnerStatus::Running);
    assert!(!runner.is_resting());
    assert_eq!(runner.cursor(), Some(PlanCursor { index: 0, set: 2 }));
    assert_eq!(rig.machine.starts().len(), 2);
}

#[test]
fn extend_adds_to_remaining_and_keeps_elapsed() {
    let mut rig = Rig::new();
    let mut runner = PlanRunner::new(rig.controller(cfg(), InMemoryHistory::new()));
    runner.start(vec![exercise(1, 2, 10)]).unwrap();
    finish_block(&mut rig, &mut runner);

    rig.clock.advance_ms(5_000);
    runner.tick().unwrap();
    assert_eq!(runner.rest_remaining_secs(), Some(5));
    runner.extend_rest();
    assert_eq!(runner.rest_remaining_secs(), Some(35));
    let progress = runner.rest_progress().unwrap();
    assert!((progress - 5.0 / 40.0).abs() < 1e-6);
}

#[test]
fn extend_after_overdue_rest_counts_from_now() {
    let mut rig = Rig::new();
    let mut runner = PlanRunner::new(rig.controller(cfg(), InMemoryHistory::new()));
    runner.start(vec![exercise(1, 2, 10)]).unwrap();
    finish_block(&mut rig, &mut runner);

    // Deadline passes with no tick in between.
    rig.clock.advance_ms(12_000);
    runner.extend_rest();
    assert_eq!(runner.rest_remaining_secs(), Some(30));
    runner.tick().unwrap();
    assert!(runner.is_resting());
    assert_eq!(rig.machine.starts().len(), 1);
}

#[test]
fn skip_launches_next_block_exactly_once() {
    let mut rig = Rig::new();
    let mut runner = PlanRunner::new(rig.controller(cfg(), InMemoryHistory::new()));
    runner.start(vec![exercise(1, 2, 10)]).unwrap();
    finish_block(&mut rig, &mut runner);
    runner.drain_events();

    runner.skip_rest().unwrap();
    runner.skip_rest().unwrap();
    rig.clock.advance_ms(20_000);
    runner.tick().unwrap();

    assert_eq!(rig.machine.starts().len(), 2);
    let evs = runner.drain_events();
    let finished = evs
        .iter()
        .filter(|e| matches!(e, EngineEvent::RestFinished { skipped: true }))
        .count();
    let started = evs
        .iter()
        .filter(|e| matches!(e, EngineEvent::BlockStarted { .. }))
        .count();
    assert_eq!((finished, started), (1, 1));
}

#[test]
fn rest_ticks_once_per_whole_second() {
    let mut rig = Rig::new();
    let mut runner = PlanRunner::new(rig.controller(cfg(), InMemoryHistory::new()));
    runner.start(vec![exercise(1, 2, 3)]).unwrap();
    finish_block(&mut rig, &mut runner);
    runner.drain_events();

    for _ in 0..12 {
        rig.clock.advance_ms(250);
        runner.tick().unwrap();
    }
    let ticks: Vec<u64> = runner
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::RestTick { remaining_secs, .. } => Some(remaining_secs),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![2, 1]);
    assert_eq!(runner.status(), RunnerStatus::Running);
}

#[test]
fn disconnected_machine_rejects_plan() {
    let rig = Rig::new();
    let mut runner = PlanRunner::new(rig.controller(cfg(), InMemoryHistory::new()));
    rig.machine.set_connected(false);
    let err = runner.start(vec![exercise(5, 1, 0)]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<TrainerError>(),
        Some(&TrainerError::NotConnected)
    );
    assert!(runner.cursor().is_none());
    assert!(runner.drain_events().is_empty());
}

#[test]
fn launch_failure_mid_plan_aborts() {
    let mut rig = Rig::new();
    let mut runner = PlanRunner::new(rig.controller(cfg(), InMemoryHistory::new()));
    runner.start(vec![exercise(1, 2, 5)]).unwrap();
    finish_block(&mut rig, &mut runner);

    rig.machine.set_connected(false);
    let err = runner.skip_rest().unwrap_err();
    assert_eq!(
        err.downcast_ref::<TrainerError>(),
        Some(&TrainerError::NotConnected)
    );
    assert_eq!(runner.status(), RunnerStatus::Aborted);
    assert!(matches!(
        runner.drain_events().last(),
        Some(EngineEvent::PlanAborted { .. })
    ));
}

#[test]
fn echo_items_carry_their_kind_and_label() {
    let mut rig = Rig::new();
    let mut runner = PlanRunner::new(rig.controller(cfg(), InMemoryHistory::new()));
    let mut echo = EchoItem::new(EchoLevel::Harder, 1);
    echo.name = Some("Squat".into());
    runner.start(vec![PlanItem::Echo(echo)]).unwrap();
    let program = rig.machine.starts().pop().unwrap();
    assert_eq!(program.label, "Echo Harder");
    assert_eq!(program.per_cable_kg, 0.0);

    finish_block(&mut rig, &mut runner);
    let rec = &runner.controller().history().all_records()[0];
    assert_eq!(rec.item_type, Some(ItemKind::Echo));
    assert_eq!(rec.identity_key.as_deref(), Some("set:squat"));
    assert_eq!(runner.status(), RunnerStatus::Finished);
}
