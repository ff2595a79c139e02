//! Weekly availability: per-weekday time windows tagged by what may use them.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::time::{parse_time_range, ClockTime};

/// Which placement category may consume a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Routine,
    Project,
    #[default]
    Any,
}

impl SlotKind {
    pub fn allows_routines(self) -> bool {
        matches!(self, SlotKind::Routine | SlotKind::Any)
    }

    pub fn allows_projects(self) -> bool {
        matches!(self, SlotKind::Project | SlotKind::Any)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub start: ClockTime,
    pub end: ClockTime,
    #[serde(rename = "type", default)]
    pub kind: SlotKind,
}

impl AvailabilityWindow {
    /// Parse `"09:00-12:00"`.
    pub fn parse(range: &str, kind: SlotKind) -> Result<Self, ScheduleError> {
        let (start, end) = parse_time_range(range)?;
        Ok(Self { start, end, kind })
    }
}

/// Windows keyed by weekday. Days are independent; declared order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyAvailability {
    days: [Vec<AvailabilityWindow>; 7],
}

impl WeeklyAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, day: Weekday, window: AvailabilityWindow) -> Self {
        self.push(day, window);
        self
    }

    pub fn push(&mut self, day: Weekday, window: AvailabilityWindow) {
        self.days[day.num_days_from_monday() as usize].push(window);
    }

    pub fn windows(&self, day: Weekday) -> &[AvailabilityWindow] {
        &self.days[day.num_days_from_monday() as usize]
    }
}
