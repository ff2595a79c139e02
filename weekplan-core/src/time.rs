//! Time-of-day arithmetic: clock times as minutes since midnight.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Minutes in a day; `24:00` is accepted as the end of a window.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A wall-clock time, stored as minutes since 00:00 (0..=1440).
///
/// Serializes as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// Build from hours and minutes. Out-of-range input is clamped to 24:00.
    pub const fn hm(hours: u32, minutes: u32) -> Self {
        let total = hours * 60 + minutes;
        if total > MINUTES_PER_DAY {
            ClockTime(MINUTES_PER_DAY)
        } else {
            ClockTime(total)
        }
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self::hm(0, minutes)
    }

    pub const fn minutes(self) -> u32 {
        self.0
    }

    pub const fn plus(self, minutes: u32) -> Self {
        Self::from_minutes(self.0 + minutes)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ScheduleError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(bad)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(bad());
        }
        let hours: u32 = h.parse().map_err(|_| bad())?;
        let minutes: u32 = m.parse().map_err(|_| bad())?;
        if minutes >= 60 || hours > 24 || (hours == 24 && minutes != 0) {
            return Err(bad());
        }
        Ok(ClockTime(hours * 60 + minutes))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// Parse `"09:00-12:00"` into a (start, end) pair with start < end.
pub fn parse_time_range(s: &str) -> Result<(ClockTime, ClockTime), ScheduleError> {
    let bad = || ScheduleError::InvalidWindow(s.to_string());
    let (a, b) = s.split_once('-').ok_or_else(bad)?;
    let start: ClockTime = a.parse().map_err(|_| bad())?;
    let end: ClockTime = b.parse().map_err(|_| bad())?;
    if start >= end {
        return Err(bad());
    }
    Ok((start, end))
}

/// Accepts `Mon`, `monday`, `TUE`, ...
pub fn parse_weekday(s: &str) -> Result<Weekday, ScheduleError> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| ScheduleError::UnknownWeekday(s.to_string()))
}

/// Monday-first, matching `Weekday::num_days_from_monday`.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Minutes to hours, rounded to one decimal place.
pub fn round_hours(minutes: u32) -> f64 {
    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}
