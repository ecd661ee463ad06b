//! Wall-clock time of day.
//!
//! Arithmetic wraps modulo 24h and never carries into a date.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::state::interval::{MICROS_PER_DAY, MICROS_PER_MILLI, MICROS_PER_SECOND};

/// Formats accepted when reading a stored time back.
const STORED_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Time of day with microsecond resolution.
///
/// Ordering is total over (hour, minute, second, sub-second).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    time: NaiveTime,
}

impl Default for ClockTime {
    fn default() -> Self {
        ClockTime::MIDNIGHT
    }
}

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime {
        time: NaiveTime::MIN,
    };

    /// Build a time, clamping each component into range.
    pub fn from_hms_milli(hour: i64, minute: i64, second: i64, millisecond: i64) -> Self {
        Self::from_hms_micro(hour, minute, second, millisecond.clamp(0, 999) * MICROS_PER_MILLI)
    }

    fn from_hms_micro(hour: i64, minute: i64, second: i64, microsecond: i64) -> Self {
        let time = NaiveTime::from_hms_micro_opt(
            hour.clamp(0, 23) as u32,
            minute.clamp(0, 59) as u32,
            second.clamp(0, 59) as u32,
            microsecond.clamp(0, MICROS_PER_SECOND - 1) as u32,
        )
        .unwrap_or(NaiveTime::MIN);
        ClockTime { time }
    }

    pub fn from_hm(hour: i64, minute: i64) -> Self {
        Self::from_hms_milli(hour, minute, 0, 0)
    }

    /// Wrap an arbitrary microsecond offset from midnight into the day.
    pub fn from_micros_since_midnight(micros: i64) -> Self {
        Self::MIDNIGHT.add(micros)
    }

    pub fn micros_since_midnight(&self) -> i64 {
        let sub_second = (self.time.nanosecond() as i64 / 1_000).min(MICROS_PER_SECOND - 1);
        self.time.num_seconds_from_midnight() as i64 * MICROS_PER_SECOND + sub_second
    }

    pub fn hour(&self) -> i64 {
        self.time.hour() as i64
    }

    pub fn minute(&self) -> i64 {
        self.time.minute() as i64
    }

    pub fn second(&self) -> i64 {
        self.time.second() as i64
    }

    pub fn millisecond(&self) -> i64 {
        self.microsecond() / MICROS_PER_MILLI
    }

    fn microsecond(&self) -> i64 {
        self.micros_since_midnight() % MICROS_PER_SECOND
    }

    /// Add a signed duration, wrapping past midnight in either direction.
    pub fn add(self, micros: i64) -> Self {
        let delta = TimeDelta::microseconds(micros.rem_euclid(MICROS_PER_DAY));
        let (time, _) = self.time.overflowing_add_signed(delta);
        ClockTime { time }
    }

    /// Signed difference `self - other` within one day. Not wrapped.
    pub fn subtract(self, other: ClockTime) -> i64 {
        self.time
            .signed_duration_since(other.time)
            .num_microseconds()
            .unwrap_or_default()
    }

    /// Forward distance from `self` to `later`, wrapping past midnight.
    pub fn elapsed_until(self, later: ClockTime) -> i64 {
        later.subtract(self).rem_euclid(MICROS_PER_DAY)
    }

    /// Three-way comparison as -1, 0 or 1.
    pub fn compare(&self, other: &ClockTime) -> i8 {
        match self.cmp(other) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        }
    }

    /// Parse `HH:MM`, `HH:MM:SS` or `HH:MM:SS.ffffff` without failing.
    ///
    /// Unparseable components become 0 and out-of-range ones are clamped.
    pub fn parse_lenient(value: &str) -> Self {
        let (clock, fraction) = match value.trim().split_once('.') {
            Some((clock, fraction)) => (clock, Some(fraction)),
            None => (value.trim(), None),
        };
        let mut parts = clock.split(':').map(parse_int);
        let hour = parts.next().unwrap_or(0);
        let minute = parts.next().unwrap_or(0);
        let second = parts.next().unwrap_or(0);
        let microsecond = fraction.map(parse_micros).unwrap_or(0);
        Self::from_hms_micro(hour, minute, second, microsecond)
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        self.time
    }

    /// Drops anything finer than a microsecond.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        let micros = time.num_seconds_from_midnight() as i64 * MICROS_PER_SECOND
            + (time.nanosecond() as i64 / 1_000).min(MICROS_PER_SECOND - 1);
        Self::from_micros_since_midnight(micros)
    }
}

fn parse_int(part: &str) -> i64 {
    part.trim().parse::<i64>().unwrap_or(0)
}

fn parse_micros(fraction: &str) -> i64 {
    let digits: String = fraction
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .chain("000000".chars())
        .take(6)
        .collect();
    digits.parse::<i64>().unwrap_or(0)
}

/// `HH:MM` on the minute, otherwise seconds and as many fraction digits as
/// the value needs (`.mmm` or `.ffffff`).
impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let microsecond = self.microsecond();
        let format = if microsecond == 0 && self.second() == 0 {
            "%H:%M"
        } else if microsecond == 0 {
            "%H:%M:%S"
        } else if microsecond % MICROS_PER_MILLI == 0 {
            "%H:%M:%S%.3f"
        } else {
            "%H:%M:%S%.6f"
        };
        write!(f, "{}", self.time.format(format))
    }
}

impl FromStr for ClockTime {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(ClockTime::parse_lenient(s))
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let stored = STORED_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(text.trim(), fmt).ok());
        Ok(match stored {
            Some(time) => ClockTime::from_naive_time(time),
            None => ClockTime::parse_lenient(&text),
        })
    }
}
