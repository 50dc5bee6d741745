//! Relative "time ago" formatting for record timestamps.

use crate::types::Timestamp;

/// Unit names and their length in seconds, largest first.
///
/// Months and years use fixed 30- and 365-day lengths.
const INTERVALS: &[(&str, i64)] = &[
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
];

/// Format the distance between `then` and `now`, e.g. `"3 days ago"`.
///
/// Anything under a minute in either direction is `"just now"`; timestamps
/// after `now` read `"... from now"`.
pub fn format_age(then: Timestamp, now: Timestamp) -> String {
    let diff = now.signed_duration_since(then).num_seconds();
    let suffix = if diff < 0 { "from now" } else { "ago" };
    let abs = diff.abs();

    if abs < 60 {
        return "just now".to_string();
    }

    for &(unit, secs) in INTERVALS {
        let count = abs / secs;
        if count >= 1 {
            let plural = if count > 1 { "s" } else { "" };
            return format!("{count} {unit}{plural} {suffix}");
        }
    }

    "just now".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn under_a_minute_is_just_now() {
        assert_eq!(format_age(now() - Duration::seconds(59), now()), "just now");
        assert_eq!(format_age(now() + Duration::seconds(30), now()), "just now");
    }

    #[test]
    fn singular_and_plural_units() {
        assert_eq!(format_age(now() - Duration::minutes(1), now()), "1 minute ago");
        assert_eq!(format_age(now() - Duration::hours(5), now()), "5 hours ago");
        assert_eq!(format_age(now() - Duration::days(3), now()), "3 days ago");
    }

    #[test]
    fn picks_largest_whole_unit() {
        assert_eq!(format_age(now() - Duration::days(14), now()), "2 weeks ago");
        assert_eq!(format_age(now() - Duration::days(45), now()), "1 month ago");
        assert_eq!(format_age(now() - Duration::days(800), now()), "2 years ago");
    }

    #[test]
    fn future_timestamps_read_from_now() {
        assert_eq!(format_age(now() + Duration::hours(2), now()), "2 hours from now");
    }
}
