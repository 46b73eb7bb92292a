// src/common/clock.rs
//! 时间工具：统一使用本地民用时间（墙钟）。

use jiff::civil::DateTime;
use jiff::{Span, Zoned};

/// Current wall-clock time in the system timezone, as a civil datetime.
pub fn now_local() -> DateTime {
    Zoned::now().datetime()
}

/// Current unix timestamp in seconds.
pub fn unix_now() -> i64 {
    jiff::Timestamp::now().as_second()
}

pub fn add_minutes(dt: DateTime, minutes: i64) -> DateTime {
    dt.checked_add(Span::new().minutes(minutes)).unwrap_or(dt)
}

pub fn add_seconds(dt: DateTime, seconds: i64) -> DateTime {
    dt.checked_add(Span::new().seconds(seconds)).unwrap_or(dt)
}

/// Seconds from `from` until `until`, clamped at zero when `until` is not in
/// the future.
pub fn seconds_until(from: DateTime, until: DateTime) -> u64 {
    let d = from.duration_until(until);
    if d.is_negative() {
        0
    } else {
        u64::try_from(d.as_secs()).unwrap_or(0)
    }
}

/// "HH:MM" rendering used by the header and the task rectangles.
pub fn fmt_hm(dt: DateTime) -> String {
    format!("{:02}:{:02}", dt.hour(), dt.minute())
}

pub fn fmt_hms(dt: DateTime) -> String {
    format!("{:02}:{:02}:{:02}", dt.hour(), dt.minute(), dt.second())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn add_minutes_crosses_midnight() {
        let dt = date(2026, 8, 5).at(23, 50, 0, 0);
        let later = add_minutes(dt, 20);
        assert_eq!(later, date(2026, 8, 6).at(0, 10, 0, 0));
    }

    #[test]
    fn seconds_until_clamps_past() {
        let a = date(2026, 8, 5).at(10, 0, 0, 0);
        let b = date(2026, 8, 5).at(10, 0, 30, 0);
        assert_eq!(seconds_until(a, b), 30);
        assert_eq!(seconds_until(b, a), 0);
    }

    #[test]
    fn hm_formatting_pads() {
        let dt = date(2026, 8, 5).at(6, 5, 0, 0);
        assert_eq!(fmt_hm(dt), "06:05");
    }
}
