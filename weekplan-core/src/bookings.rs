//! Existing calendar bookings: subtracted from slot capacity before placement.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::grid::SlotGrid;
use crate::time::{ClockTime, MINUTES_PER_DAY};

/// A busy interval on one date. Never placed, never emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalBooking {
    pub date: NaiveDate,
    pub start: ClockTime,
    pub end: ClockTime,
}

impl ExternalBooking {
    pub fn new(date: NaiveDate, start: ClockTime, end: ClockTime) -> Self {
        Self { date, start, end }
    }

    /// Split a wall-clock interval into one booking per date it touches.
    pub fn spanning(start: NaiveDateTime, end: NaiveDateTime) -> Vec<Self> {
        let mut out = Vec::new();
        if end <= start {
            return out;
        }

        let mut date = start.date();
        while date <= end.date() {
            let from = if date == start.date() { minute_of_day(start) } else { 0 };
            let to = if date == end.date() { minute_of_day(end) } else { MINUTES_PER_DAY };
            if to > from {
                out.push(Self::new(date, ClockTime::from_minutes(from), ClockTime::from_minutes(to)));
            }
            date = date + Duration::days(1);
        }
        out
    }

    /// Minutes shared with `[start, end)` on the same clock.
    pub fn overlap(&self, start: ClockTime, end: ClockTime) -> u32 {
        let lo = self.start.max(start).minutes();
        let hi = self.end.min(end).minutes();
        hi.saturating_sub(lo)
    }

    /// Strictly inside `[start, end)`, touching neither edge. Front-filled
    /// placements cannot step around such a booking.
    pub fn splits(&self, start: ClockTime, end: ClockTime) -> bool {
        self.start > start && self.end < end
    }
}

fn minute_of_day(dt: NaiveDateTime) -> u32 {
    dt.hour() * 60 + dt.minute()
}

/// Reduce capacity of every same-date slot by its overlap with each booking.
/// Returns the total minutes blocked.
pub fn subtract_bookings(grid: &mut SlotGrid, bookings: &[ExternalBooking]) -> u32 {
    let mut blocked = 0;
    for b in bookings {
        for slot in grid.iter_mut().filter(|s| s.date == b.date) {
            let overlap = b.overlap(slot.start, slot.end);
            if overlap == 0 {
                continue;
            }
            if b.splits(slot.start, slot.end) {
                warn!(
                    date = %b.date,
                    booking = %format!("{}-{}", b.start, b.end),
                    slot = %format!("{}-{}", slot.start, slot.end),
                    "booking sits inside a window; placements there may overlap it"
                );
            }
            let before = slot.used;
            slot.block(overlap);
            blocked += slot.used - before;
            debug!(date = %b.date, slot = %slot.start, overlap, "booking reduces slot capacity");
        }
    }
    blocked
}
