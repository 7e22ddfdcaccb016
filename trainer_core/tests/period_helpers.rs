// Focused tests for period helpers.
use trainer_core::util::{period_ms, period_us, secs_to_ms};

#[test]
fn period_us_clamps_and_floors() {
    // hz=1 → 1s
    assert_eq!(period_us(1), 1_000_000);
    assert_eq!(period_us(50), 20_000);
    // Very high hz floors to 1µs minimum
    assert_eq!(period_us(1_000_000), 1);
    assert_eq!(period_us(u32::MAX), 1);
    // hz=0 is treated as 1
    assert_eq!(period_us(0), 1_000_000);
}

#[test]
fn period_ms_minimum_and_resolution_note() {
    assert_eq!(period_ms(1), 1000);
    assert_eq!(period_ms(50), 20);
    // hz>=1000 floors to 0ms but we cap to >=1ms
    assert_eq!(period_ms(1000), 1);
    assert_eq!(period_ms(u32::MAX), 1);
    assert_eq!(period_ms(0), 1000);
}

#[test]
fn rest_seconds_saturate() {
    assert_eq!(secs_to_ms(30), 30_000);
    assert_eq!(secs_to_ms(u64::MAX), u64::MAX);
}
