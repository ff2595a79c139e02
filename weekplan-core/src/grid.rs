//! Time grid: concrete slots for each availability window in the horizon.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::availability::{SlotKind, WeeklyAvailability};
use crate::time::ClockTime;

/// One availability window on one calendar date. Placements consume it from
/// the front, so `start + used` is where the next event begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start: ClockTime,
    pub end: ClockTime,
    pub kind: SlotKind,
    /// Minutes consumed by placements and external bookings.
    pub used: u32,
}

impl TimeSlot {
    pub fn duration(&self) -> u32 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }

    pub fn free(&self) -> u32 {
        self.duration().saturating_sub(self.used)
    }

    /// Where the next placement in this slot would start.
    pub fn cursor(&self) -> ClockTime {
        self.start.plus(self.used)
    }

    pub fn fits(&self, minutes: u32) -> bool {
        self.free() >= minutes
    }

    /// Consume `minutes` from the front of the free space.
    pub fn take(&mut self, minutes: u32) -> Option<(ClockTime, ClockTime)> {
        if !self.fits(minutes) {
            return None;
        }
        let begin = self.cursor();
        self.used += minutes;
        Some((begin, begin.plus(minutes)))
    }

    /// Mark minutes as unavailable without emitting anything.
    pub fn block(&mut self, minutes: u32) {
        self.used = (self.used + minutes).min(self.duration());
    }
}

/// Ordered slots for a horizon: dates ascending, then each weekday's windows
/// in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGrid {
    start: NaiveDate,
    days: i64,
    slots: Vec<TimeSlot>,
}

impl SlotGrid {
    /// Expand `[start, start + weeks * 7)` against the weekly windows.
    /// Zero weeks gives an empty grid.
    pub fn build(availability: &WeeklyAvailability, start: NaiveDate, weeks: u32) -> Self {
        let days = i64::from(weeks) * 7;
        let mut slots = Vec::new();

        for offset in 0..days {
            let date = start + Duration::days(offset);
            for w in availability.windows(date.weekday()) {
                slots.push(TimeSlot {
                    date,
                    start: w.start,
                    end: w.end,
                    kind: w.kind,
                    used: 0,
                });
            }
        }

        trace!(weeks, slots = slots.len(), %start, "built slot grid");
        Self { start, days, slots }
    }

    /// Every date of the horizon, with or without slots.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days).map(move |offset| self.start + Duration::days(offset))
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        let offset = (date - self.start).num_days();
        (0..self.days).contains(&offset)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn get(&self, idx: usize) -> Option<&TimeSlot> {
        self.slots.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut TimeSlot> {
        self.slots.get_mut(idx)
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TimeSlot> {
        self.slots.iter_mut()
    }

    /// Indices of slots on `date`, in grid order.
    pub fn indices_on(&self, date: NaiveDate) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.date == date)
            .map(|(i, _)| i)
            .collect()
    }
}
