// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_by_explicit_amount() {
    let clock = FakeClock::new(1_000);
    assert_eq!(clock.now_ms(), 1_000);
    clock.advance(Duration::from_millis(500));
    assert_eq!(clock.now_ms(), 1_500);
}

#[test]
fn elapsed_ms_is_difference_from_now() {
    let clock = FakeClock::new(1_000);
    clock.advance(Duration::from_millis(250));
    assert_eq!(clock.elapsed_ms(1_000), 250);
}

#[test]
fn system_clock_now_is_plausible() {
    let clock = SystemClock;
    // Any time after this spec was written.
    assert!(clock.now_ms() > 1_700_000_000_000);
}

#[test]
fn iso8601_epoch_zero() {
    assert_eq!(iso8601_ms(0), "1970-01-01T00:00:00.000Z");
}

#[test]
fn iso8601_known_date() {
    // 2026-07-28T00:00:00.000Z
    let epoch_secs: i64 = 1_785_196_800;
    assert_eq!(iso8601_ms(epoch_secs * 1000), "2026-07-28T00:00:00.000Z");
}

#[test]
fn iso8601_includes_millis_and_time_of_day() {
    let epoch_secs: i64 = 1_785_196_800;
    let stamped = iso8601_ms(epoch_secs * 1000 + 3 * 3_600_000 + 61_000 + 234);
    assert_eq!(stamped, "2026-07-28T03:01:01.234Z");
}
