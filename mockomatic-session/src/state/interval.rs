//! Interval codec.
//!
//! Durations are stored the way the backing store keeps them (months, days,
//! microseconds). Every display value is derived on demand from that record.

use serde::{Deserialize, Serialize};

pub const MICROS_PER_MILLI: i64 = 1_000;
pub const MICROS_PER_SECOND: i64 = 1_000_000;
pub const MICROS_PER_MINUTE: i64 = 60_000_000;
pub const MICROS_PER_HOUR: i64 = 3_600_000_000;
pub const MICROS_PER_DAY: i64 = 86_400_000_000;
pub const DAYS_PER_MONTH: i64 = 30;
pub const MINUTES_PER_DAY: i64 = 1_440;

/// Largest minute count whose microsecond total still fits in an `i64`.
const MAX_MINUTES: u64 = (i64::MAX / MICROS_PER_MINUTE) as u64 - 1;

/// Calendar-aware duration, mirroring a SQL interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

/// A duration split into clock units. Hours are not wrapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockDuration {
    pub hour: i64,
    pub minute: i64,
    pub second: i64,
    pub millisecond: i64,
}

impl Interval {
    /// Interval holding only a microsecond component.
    pub fn from_micros(microseconds: i64) -> Self {
        Interval {
            months: 0,
            days: 0,
            microseconds,
        }
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self::from_micros(seconds * MICROS_PER_SECOND)
    }

    fn whole_days(&self) -> i64 {
        self.months as i64 * DAYS_PER_MONTH + self.days as i64
    }

    /// Total length in microseconds using 1 month = 30 days. Saturates.
    pub fn total_micros(&self) -> i64 {
        self.whole_days()
            .saturating_mul(MICROS_PER_DAY)
            .saturating_add(self.microseconds)
    }
}

/// Whole minutes in an interval, rounding the microsecond part half-up.
/// An absent interval counts as zero.
pub fn to_minutes(interval: Option<&Interval>) -> i64 {
    let Some(interval) = interval else {
        return 0;
    };
    let from_days = interval.whole_days() * MINUTES_PER_DAY;
    let from_micros = (interval.microseconds + MICROS_PER_MINUTE / 2).div_euclid(MICROS_PER_MINUTE);
    from_days + from_micros
}

/// Render an interval as `MM:SS`. Minutes grow past two digits when needed.
pub fn to_minute_second_string(interval: &Interval) -> String {
    let minutes =
        interval.microseconds.div_euclid(MICROS_PER_MINUTE) + interval.whole_days() * MINUTES_PER_DAY;
    let seconds = interval.microseconds.rem_euclid(MICROS_PER_MINUTE) / MICROS_PER_SECOND;
    format!("{:02}:{:02}", minutes, seconds)
}

/// Total microseconds. Absence propagates instead of collapsing to zero.
pub fn to_microseconds(interval: Option<&Interval>) -> Option<i64> {
    interval.map(Interval::total_micros)
}

/// Parse `MM:SS` into an interval. Missing or unparseable components are 0.
///
/// Callers should pass the output of [`normalize_minute_seconds`].
pub fn from_minute_second_string(value: &str) -> Interval {
    let mut parts = value.split(':');
    let minutes = parse_component(parts.next());
    let seconds = parse_component(parts.next());
    let micros = ((minutes * 60.0 + seconds) * MICROS_PER_SECOND as f64).round() as i64;
    Interval::from_micros(micros)
}

fn parse_component(part: Option<&str>) -> f64 {
    part.and_then(|p| p.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Clean raw user input into `MM:SS`.
///
/// Strips everything except digits and colons, keeps the first two
/// components and carries seconds above 59 into minutes. Returns `None` when
/// nothing usable remains or the value is too large to represent, so the
/// caller can keep the previous value.
pub fn normalize_minute_seconds(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ':')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut parts = cleaned.split(':');
    let minute = parse_count(parts.next())?;
    let second = parse_count(parts.next())?;

    let minute = minute.checked_add(second / 60).filter(|m| *m <= MAX_MINUTES)?;
    Some(format!("{:02}:{:02}", minute, second % 60))
}

/// An empty component is 0; one that overflows is unusable.
fn parse_count(part: Option<&str>) -> Option<u64> {
    match part {
        None | Some("") => Some(0),
        Some(digits) => digits.parse::<u64>().ok(),
    }
}

/// Mixed-radix split of a microsecond count into h/m/s/ms.
pub fn microseconds_to_clock_duration(micros: i64) -> ClockDuration {
    let hour = micros / MICROS_PER_HOUR;
    let rest = micros % MICROS_PER_HOUR;
    let minute = rest / MICROS_PER_MINUTE;
    let rest = rest % MICROS_PER_MINUTE;
    let second = rest / MICROS_PER_SECOND;
    let rest = rest % MICROS_PER_SECOND;
    let millisecond = rest / MICROS_PER_MILLI;

    ClockDuration {
        hour,
        minute,
        second,
        millisecond,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_minutes_expands_months_and_days() {
        let interval = Interval {
            months: 1,
            days: 2,
            microseconds: 90 * MICROS_PER_SECOND,
        };
        // 32 days of minutes plus 1.5 minutes rounded up
        assert_eq!(to_minutes(Some(&interval)), 32 * 1_440 + 2);
    }

    #[test]
    fn test_to_minutes_absent_is_zero() {
        assert_eq!(to_minutes(None), 0);
    }

    #[test]
    fn test_to_minutes_rounds_half_up() {
        assert_eq!(to_minutes(Some(&Interval::from_seconds(29))), 0);
        assert_eq!(to_minutes(Some(&Interval::from_seconds(30))), 1);
    }

    #[test]
    fn test_minute_second_string() {
        assert_eq!(to_minute_second_string(&Interval::from_seconds(210)), "03:30");
        assert_eq!(to_minute_second_string(&Interval::from_seconds(5)), "00:05");
        assert_eq!(to_minute_second_string(&Interval::default()), "00:00");
    }

    #[test]
    fn test_minute_second_string_includes_days() {
        let interval = Interval {
            months: 0,
            days: 1,
            microseconds: 61 * MICROS_PER_SECOND,
        };
        assert_eq!(to_minute_second_string(&interval), "1441:01");
    }

    #[test]
    fn test_to_microseconds_keeps_absence() {
        assert_eq!(to_microseconds(None), None);
        let interval = Interval {
            months: 1,
            days: 1,
            microseconds: 5,
        };
        assert_eq!(to_microseconds(Some(&interval)), Some(31 * MICROS_PER_DAY + 5));
    }

    #[test]
    fn test_from_minute_second_string() {
        assert_eq!(from_minute_second_string("03:30"), Interval::from_seconds(210));
        assert_eq!(from_minute_second_string("2"), Interval::from_seconds(120));
        assert_eq!(from_minute_second_string(""), Interval::default());
    }

    #[test]
    fn test_whole_minute_intervals_survive_formatting() {
        for minutes in [0, 1, 7, 59, 60, 125] {
            let interval = Interval::from_micros(minutes * MICROS_PER_MINUTE);
            let text = to_minute_second_string(&interval);
            assert_eq!(from_minute_second_string(&text), interval, "{}", text);
        }
    }

    #[test]
    fn test_normalize_strips_junk_and_carries_seconds() {
        assert_eq!(normalize_minute_seconds("1:75").as_deref(), Some("02:15"));
        assert_eq!(normalize_minute_seconds(" 4m:05s ").as_deref(), Some("04:05"));
        assert_eq!(normalize_minute_seconds("3").as_deref(), Some("03:00"));
        assert_eq!(normalize_minute_seconds("1:2:3").as_deref(), Some("01:02"));
    }

    #[test]
    fn test_normalize_rejects_empty_input() {
        assert_eq!(normalize_minute_seconds(""), None);
        assert_eq!(normalize_minute_seconds("abc"), None);
        assert_eq!(normalize_minute_seconds(":"), None);
    }

    #[test]
    fn test_clock_duration_decomposition() {
        let micros = 2 * MICROS_PER_HOUR + 3 * MICROS_PER_MINUTE + 4 * MICROS_PER_SECOND + 5_678;
        assert_eq!(
            microseconds_to_clock_duration(micros),
            ClockDuration {
                hour: 2,
                minute: 3,
                second: 4,
                millisecond: 5,
            }
        );
    }

    #[test]
    fn test_normalize_rejects_values_too_large_to_hold() {
        assert_eq!(normalize_minute_seconds("99999999999999999999"), None);
        assert_eq!(normalize_minute_seconds("18446744073709551615:60"), None);
        assert_eq!(normalize_minute_seconds("999999999999:00"), None);
        assert_eq!(normalize_minute_seconds("1:99999999999999999999"), None);
    }

    #[test]
    fn test_largest_accepted_minutes_fit_in_microseconds() {
        let text = normalize_minute_seconds(&format!("{}:59", MAX_MINUTES)).unwrap();
        let interval = from_minute_second_string(&text);
        assert!(interval.microseconds > 0);
        assert!(interval.microseconds < i64::MAX);
    }

    #[test]
    fn test_total_micros_saturates() {
        let interval = Interval {
            months: i32::MAX,
            days: i32::MAX,
            microseconds: i64::MAX,
        };
        assert_eq!(interval.total_micros(), i64::MAX);
    }
}
