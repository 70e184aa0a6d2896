// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_duration_recognizes_each_unit() {
    assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
    assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
    assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(172_800));
    assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
}

#[test]
fn parse_duration_bare_number_is_seconds() {
    assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
}

#[test]
fn parse_duration_rejects_empty_and_unknown_suffix() {
    assert!(parse_duration("").is_err());
    assert!(parse_duration("30x").is_err());
    assert!(parse_duration("abcs").is_err());
}

#[test]
fn seconds_under_a_minute() {
    assert_eq!(format_elapsed(5), "5s");
}

#[test]
fn minutes_under_an_hour() {
    assert_eq!(format_elapsed(125), "2m");
}

#[test]
fn hours_with_and_without_remainder_minutes() {
    assert_eq!(format_elapsed(3600), "1h");
    assert_eq!(format_elapsed(5400), "1h30m");
}

#[test]
fn days() {
    assert_eq!(format_elapsed(3 * 86_400), "3d");
}

#[test]
fn millis_wrapper_rounds_down_to_seconds() {
    assert_eq!(format_elapsed_ms(1_999), "1s");
}
