//! Countdown to the next Saturday midnight
//!
//! The target is derived from "now" on every call and never cached, so clock
//! changes, DST transitions and suspend/resume are picked up on the next tick.

use chrono::{DateTime, Datelike, Days, Duration, LocalResult, NaiveDateTime, TimeZone, Timelike};

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_MINUTE: i64 = 60;

/// Days from Sunday (chrono `num_days_from_sunday`) of the target weekday
const TARGET_WEEKDAY: u32 = 6;

/// Output options for the countdown string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownFormat {
    /// Append the seconds field
    pub show_seconds: bool,
    /// Whether the active font has a `:` glyph; when false, separators become spaces
    pub has_colon: bool,
}

impl Default for CountdownFormat {
    fn default() -> Self {
        Self {
            show_seconds: true,
            has_colon: true,
        }
    }
}

/// Remaining time split into display fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Remaining {
    /// Split a non-negative number of seconds (negative input clamps to zero)
    pub fn from_secs(total: i64) -> Self {
        let mut secs = total.max(0);
        let days = secs / SECS_PER_DAY;
        secs %= SECS_PER_DAY;
        let hours = secs / SECS_PER_HOUR;
        secs %= SECS_PER_HOUR;
        let minutes = secs / SECS_PER_MINUTE;
        Self {
            days,
            hours,
            minutes,
            seconds: secs % SECS_PER_MINUTE,
        }
    }

    pub fn format(&self, format: CountdownFormat) -> String {
        let Self {
            days,
            hours,
            minutes,
            seconds,
        } = *self;

        let text = match (days > 0, format.show_seconds) {
            (true, true) => format!("{days}:{hours:02}:{minutes:02}:{seconds:02}"),
            (true, false) => format!("{days}:{hours:02}:{minutes:02}"),
            (false, true) => format!("{hours:02}:{minutes:02}:{seconds:02}"),
            (false, false) => format!("{hours:02}:{minutes:02}"),
        };

        if format.has_colon {
            text
        } else {
            text.replace(':', " ")
        }
    }
}

/// The next Saturday 00:00:00 local time after `now`.
///
/// When `now` is exactly Saturday midnight (to the second) the target is `now`
/// itself and the countdown reads zero. Any later instant on Saturday targets
/// the following week.
pub fn next_target<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let weekday = now.weekday().num_days_from_sunday();
    let mut days_ahead = (TARGET_WEEKDAY + 7 - weekday) % 7;

    let at_midnight = now.hour() == 0 && now.minute() == 0 && now.second() == 0;
    if days_ahead == 0 && !at_midnight {
        days_ahead = 7;
    }

    let date = now
        .date_naive()
        .checked_add_days(Days::new(days_ahead as u64))
        .unwrap_or(now.date_naive());
    resolve_local(&now.timezone(), date.and_time(chrono::NaiveTime::MIN))
}

/// Whole seconds until the next target, never negative.
///
/// `now` is truncated to the whole second first, so the display changes on
/// wall-clock second boundaries.
pub fn remaining_secs<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let now = now.with_nanosecond(0).unwrap_or_else(|| now.clone());
    let target = next_target(&now);
    target.signed_duration_since(now).num_seconds().max(0)
}

/// Format the countdown for `now`
pub fn format_countdown<Tz: TimeZone>(now: &DateTime<Tz>, format: CountdownFormat) -> String {
    Remaining::from_secs(remaining_secs(now)).format(format)
}

/// Map a local wall-clock time to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap move forward until they exist.
fn resolve_local<Tz: TimeZone>(tz: &Tz, mut naive: NaiveDateTime) -> DateTime<Tz> {
    for _ in 0..24 {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => return t,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => naive += Duration::minutes(30),
        }
    }
    tz.from_utc_datetime(&naive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(y, m, d)
                    .unwrap()
                    .and_hms_opt(h, min, s)
                    .unwrap(),
            )
            .unwrap()
    }

    /// Parse a countdown string back into seconds (either separator)
    fn parse_secs(text: &str) -> i64 {
        let fields: Vec<i64> = text
            .split([':', ' '])
            .map(|f| f.parse().unwrap())
            .collect();
        match fields.as_slice() {
            [d, h, m, s] => d * 86_400 + h * 3_600 + m * 60 + s,
            [h, m, s] => h * 3_600 + m * 60 + s,
            other => panic!("unexpected field count: {other:?}"),
        }
    }

    // 2024-06-01 is a Saturday
    const SAT: u32 = 1;

    #[test]
    fn test_target_is_next_saturday_midnight() {
        // Wednesday 2024-05-29 12:00
        let now = at(2024, 5, 29, 12, 0, 0);
        assert_eq!(next_target(&now), at(2024, 6, SAT, 0, 0, 0));
        assert_eq!(remaining_secs(&now), 2 * 86_400 + 12 * 3_600);
    }

    #[test]
    fn test_exact_saturday_midnight_reads_zero() {
        let now = at(2024, 6, SAT, 0, 0, 0);
        assert_eq!(next_target(&now), now);
        assert_eq!(remaining_secs(&now), 0);
        assert_eq!(format_countdown(&now, CountdownFormat::default()), "00:00:00");
        let hidden = CountdownFormat {
            show_seconds: false,
            has_colon: true,
        };
        assert_eq!(format_countdown(&now, hidden), "00:00");
    }

    #[test]
    fn test_one_second_past_saturday_midnight_rolls_to_next_week() {
        let now = at(2024, 6, SAT, 0, 0, 1);
        assert_eq!(next_target(&now), at(2024, 6, 8, 0, 0, 0));
        assert_eq!(
            format_countdown(&now, CountdownFormat::default()),
            "6:23:59:59"
        );
    }

    #[test]
    fn test_sub_second_past_midnight_clamps_to_zero() {
        let now = at(2024, 6, SAT, 0, 0, 0) + Duration::milliseconds(500);
        assert_eq!(remaining_secs(&now), 0);
    }

    #[test]
    fn test_friday_last_second() {
        let now = at(2024, 5, 31, 23, 59, 59);
        assert_eq!(format_countdown(&now, CountdownFormat::default()), "00:00:01");
    }

    #[test]
    fn test_fraction_of_a_second_is_dropped() {
        let now = at(2024, 5, 31, 23, 59, 59) + Duration::milliseconds(500);
        assert_eq!(remaining_secs(&now), 1);
        assert_eq!(format_countdown(&now, CountdownFormat::default()), "00:00:01");

        let now = at(2024, 5, 29, 12, 0, 0) + Duration::milliseconds(999);
        assert_eq!(remaining_secs(&now), 2 * 86_400 + 12 * 3_600);
    }

    #[test]
    fn test_format_with_days() {
        let r = Remaining::from_secs(86_400 + 2 * 3_600 + 3 * 60 + 4);
        assert_eq!(r.format(CountdownFormat::default()), "1:02:03:04");
        assert_eq!(
            r.format(CountdownFormat {
                show_seconds: false,
                has_colon: true
            }),
            "1:02:03"
        );
    }

    #[test]
    fn test_missing_colon_becomes_space() {
        let r = Remaining::from_secs(86_400 + 2 * 3_600 + 3 * 60 + 4);
        let text = r.format(CountdownFormat {
            show_seconds: true,
            has_colon: false,
        });
        assert_eq!(text, "1 02 03 04");
        assert_eq!(text.len(), "1:02:03:04".len());
    }

    #[test]
    fn test_hours_only_without_seconds() {
        let r = Remaining::from_secs(5 * 3_600 + 9 * 60 + 30);
        let text = r.format(CountdownFormat {
            show_seconds: false,
            has_colon: true,
        });
        assert_eq!(text, "05:09");
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(
            Remaining::from_secs(-42),
            Remaining {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 0
            }
        );
    }

    #[test]
    fn test_every_hour_of_a_week_stays_within_seven_days() {
        let start = at(2024, 5, 26, 0, 0, 0);
        for hour in 0..(24 * 8) {
            for offset in [0, 1, 59, 1799] {
                let now = start + Duration::hours(hour) + Duration::seconds(offset);
                let text = format_countdown(&now, CountdownFormat::default());
                let secs = parse_secs(&text);
                assert!((0..=7 * 86_400).contains(&secs), "{now}: {text}");
                assert_eq!(secs, remaining_secs(&now));
            }
        }
    }

    #[test]
    fn test_hidden_seconds_has_at_most_two_groups_after_days() {
        let start = at(2024, 5, 26, 0, 0, 0);
        let format = CountdownFormat {
            show_seconds: false,
            has_colon: true,
        };
        for hour in 0..(24 * 7) {
            let now = start + Duration::hours(hour) + Duration::minutes(17);
            let text = format_countdown(&now, format);
            let groups = text.split(':').count();
            let has_days = remaining_secs(&now) >= 86_400;
            assert_eq!(groups, if has_days { 3 } else { 2 }, "{text}");
        }
    }
}
