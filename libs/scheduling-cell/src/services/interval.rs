// libs/scheduling-cell/src/services/interval.rs
use chrono::{NaiveTime, Timelike};

use crate::models::Interval;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Half-open overlap: touching intervals (`a.end == b.start`) do not overlap,
/// which is what lets sessions run back to back.
pub fn overlaps(a: Interval, b: Interval) -> bool {
    a.start < b.end && b.start < a.end
}

pub fn contains(window: Interval, interval: Interval) -> bool {
    window.start <= interval.start && interval.end <= window.end
}

pub fn minutes_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight() / 60)
}

/// `None` when `minutes` falls outside the calendar day.
pub fn time_from_minutes(minutes: i64) -> Option<NaiveTime> {
    if !(0..MINUTES_PER_DAY).contains(&minutes) {
        return None;
    }
    NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0)
}

/// Widens `interval` by `buffer_minutes` on both sides, clamped to the day.
pub fn padded(interval: Interval, buffer_minutes: u32) -> Interval {
    if buffer_minutes == 0 {
        return interval;
    }
    let buffer = i64::from(buffer_minutes);
    let start = time_from_minutes(minutes_of_day(interval.start) - buffer).unwrap_or(NaiveTime::MIN);
    let end = time_from_minutes(minutes_of_day(interval.end) + buffer)
        .unwrap_or_else(end_of_day);
    Interval::new(start, end)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}
