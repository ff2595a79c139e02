//! Routine model: recurring tasks with an optional preferred start.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::task::Priority;
use crate::time::{ClockTime, WEEKDAYS};

/// Set of weekdays a routine task recurs on. Serializes as `["Mon", "Thu"]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct Recurrence(u8);

impl Recurrence {
    pub fn from_days(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut r = Recurrence(0);
        for d in days {
            r.insert(d);
        }
        r
    }

    pub fn daily() -> Self {
        Self::from_days(WEEKDAYS)
    }

    pub fn weekdays() -> Self {
        Self::from_days(WEEKDAYS[..5].iter().copied())
    }

    pub fn weekends() -> Self {
        Self::from_days([Weekday::Sat, Weekday::Sun])
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Monday-first.
    pub fn days(&self) -> Vec<Weekday> {
        WEEKDAYS.iter().copied().filter(|d| self.contains(*d)).collect()
    }
}

impl From<Vec<Weekday>> for Recurrence {
    fn from(days: Vec<Weekday>) -> Self {
        Self::from_days(days)
    }
}

impl From<Recurrence> for Vec<Weekday> {
    fn from(r: Recurrence) -> Self {
        r.days()
    }
}

/// Either an exact time or a symbolic part of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PreferredTime {
    At(ClockTime),
    Morning,
    Afternoon,
    Evening,
}

impl PreferredTime {
    pub fn resolve(self) -> ClockTime {
        match self {
            PreferredTime::At(t) => t,
            PreferredTime::Morning => ClockTime::hm(9, 0),
            PreferredTime::Afternoon => ClockTime::hm(13, 0),
            PreferredTime::Evening => ClockTime::hm(19, 0),
        }
    }
}

impl fmt::Display for PreferredTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferredTime::At(t) => write!(f, "{t}"),
            PreferredTime::Morning => f.write_str("morning"),
            PreferredTime::Afternoon => f.write_str("afternoon"),
            PreferredTime::Evening => f.write_str("evening"),
        }
    }
}

impl FromStr for PreferredTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(PreferredTime::Morning),
            "afternoon" => Ok(PreferredTime::Afternoon),
            "evening" => Ok(PreferredTime::Evening),
            other => other.parse().map(PreferredTime::At),
        }
    }
}

impl TryFrom<String> for PreferredTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PreferredTime> for String {
    fn from(value: PreferredTime) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineTask {
    /// Also the event title; one event per name per date.
    pub name: String,
    /// Minutes.
    pub duration: u32,
    pub repeat: Recurrence,
    #[serde(default)]
    pub preferred_time: Option<PreferredTime>,
}

impl RoutineTask {
    pub fn new(name: impl Into<String>, duration: u32, repeat: Recurrence) -> Self {
        Self {
            name: name.into(),
            duration,
            repeat,
            preferred_time: None,
        }
    }

    pub fn at(mut self, preferred: PreferredTime) -> Self {
        self.preferred_time = Some(preferred);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub filename: String,
    pub name: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tasks: Vec<RoutineTask>,
}

impl Routine {
    pub fn new(filename: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            name: name.into(),
            priority: Priority::Medium,
            tasks: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: RoutineTask) -> Self {
        self.tasks.push(task);
        self
    }
}
