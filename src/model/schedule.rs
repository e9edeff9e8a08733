use crate::model::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Accepted form of every instant in the hackathon configuration.
pub const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Event start/end and the length of one activity window.
///
/// Window arithmetic runs on whole milliseconds so fractional window
/// lengths put every boundary exactly where it belongs.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub window_hours: f64,
    window_millis: i64,
}

// Create
impl Schedule {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, window_hours: f64) -> Result<Self> {
        if start >= end {
            return Err(Error::config(format!(
                "hackathon start {} must be before end {}",
                start.format(UTC_FORMAT),
                end.format(UTC_FORMAT)
            )));
        }
        if !window_hours.is_finite() || window_hours <= 0.0 {
            return Err(Error::config(format!(
                "window_hours must be positive, got {window_hours}"
            )));
        }
        let window_millis = (window_hours * MILLIS_PER_HOUR).round();
        if window_millis < 1.0 || window_millis > i64::MAX as f64 {
            return Err(Error::config(format!(
                "window_hours {window_hours} is out of range"
            )));
        }
        Ok(Self {
            start,
            end,
            window_hours,
            window_millis: window_millis as i64,
        })
    }
}

// Queries
impl Schedule {
    /// Length of one window in milliseconds, always at least 1.
    pub fn window_millis(&self) -> i64 {
        self.window_millis
    }

    /// Milliseconds from `start` to `instant`; negative before the event.
    pub fn millis_since_start(&self, instant: DateTime<Utc>) -> i64 {
        (instant - self.start).num_milliseconds()
    }

    /// Windows elapsed at `now`, rounded up and clamped to the event end.
    pub fn total_windows(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = self.millis_since_start(now.min(self.end));
        if elapsed <= 0 {
            return 0;
        }
        let windows = (elapsed - 1) / self.window_millis + 1;
        u32::try_from(windows).unwrap_or(u32::MAX)
    }

    /// Number of windows in the whole event.
    pub fn window_count(&self) -> u32 {
        self.total_windows(self.end)
    }
}

pub fn parse_utc(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, UTC_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::config(format!("Not a valid UTC date time: {value}")))
}

pub fn format_utc(instant: &DateTime<Utc>) -> String {
    instant.format(UTC_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two_day_schedule() -> Schedule {
        Schedule::new(
            parse_utc("2024-01-01T00:00:00Z").unwrap(),
            parse_utc("2024-01-03T00:00:00Z").unwrap(),
            12.0,
        )
        .unwrap()
    }

    #[test]
    fn rejects_inverted_or_empty_schedule() {
        let start = parse_utc("2024-01-01T00:00:00Z").unwrap();
        assert!(Schedule::new(start, start, 12.0).is_err());
        let end = parse_utc("2024-01-02T00:00:00Z").unwrap();
        assert!(Schedule::new(end, start, 12.0).is_err());
        assert!(Schedule::new(start, end, 0.0).is_err());
        assert!(Schedule::new(start, end, -1.5).is_err());
        assert!(Schedule::new(start, end, 0.5).is_ok());
    }

    #[test]
    fn parse_utc_requires_zulu_format() {
        assert!(parse_utc("2024-01-01T00:00:00Z").is_ok());
        assert!(parse_utc("2024-01-01 00:00:00").is_err());
        assert!(parse_utc("yesterday").is_err());
        let instant = parse_utc("2024-05-06T07:08:09Z").unwrap();
        assert_eq!(format_utc(&instant), "2024-05-06T07:08:09Z");
    }

    #[test]
    fn total_windows_rounds_up_elapsed_time() {
        let schedule = two_day_schedule();
        assert_eq!(schedule.total_windows(parse_utc("2023-12-31T00:00:00Z").unwrap()), 0);
        assert_eq!(schedule.total_windows(schedule.start), 0);
        assert_eq!(schedule.total_windows(parse_utc("2024-01-01T00:00:01Z").unwrap()), 1);
        assert_eq!(schedule.total_windows(parse_utc("2024-01-01T12:00:00Z").unwrap()), 1);
        assert_eq!(schedule.total_windows(parse_utc("2024-01-01T13:00:00Z").unwrap()), 2);
        assert_eq!(schedule.total_windows(parse_utc("2024-02-01T00:00:00Z").unwrap()), 4);
        assert_eq!(schedule.window_count(), 4);
    }

    #[test]
    fn fractional_windows_cover_the_tail_of_the_event() {
        let schedule = Schedule::new(
            parse_utc("2024-01-01T00:00:00Z").unwrap(),
            parse_utc("2024-01-01T10:00:00Z").unwrap(),
            4.0,
        )
        .unwrap();
        assert_eq!(schedule.window_count(), 3);
    }

    #[test]
    fn tenth_of_an_hour_windows_end_on_exact_minutes() {
        let schedule = Schedule::new(
            parse_utc("2024-01-01T00:00:00Z").unwrap(),
            parse_utc("2024-01-01T01:00:00Z").unwrap(),
            0.1,
        )
        .unwrap();
        assert_eq!(schedule.window_millis(), 360_000);
        assert_eq!(schedule.total_windows(parse_utc("2024-01-01T00:18:00Z").unwrap()), 3);
        assert_eq!(schedule.total_windows(parse_utc("2024-01-01T00:18:01Z").unwrap()), 4);
        assert_eq!(schedule.total_windows(parse_utc("2024-01-01T00:24:00Z").unwrap()), 4);
        assert_eq!(schedule.window_count(), 10);
    }

    #[test]
    fn rejects_sub_millisecond_windows() {
        let start = parse_utc("2024-01-01T00:00:00Z").unwrap();
        let end = parse_utc("2024-01-02T00:00:00Z").unwrap();
        assert!(Schedule::new(start, end, 1e-9).is_err());
    }

    proptest! {
        #[test]
        fn total_windows_is_monotonic_and_clamped(a in -100_000i64..400_000, b in -100_000i64..400_000) {
            let schedule = two_day_schedule();
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            let early = schedule.start + chrono::Duration::seconds(early);
            let late = schedule.start + chrono::Duration::seconds(late);
            prop_assert!(schedule.total_windows(early) <= schedule.total_windows(late));
            prop_assert!(schedule.total_windows(late) <= schedule.window_count());
        }
    }
}
