//! Busy-interval files: time already taken by other calendars.
//!
//! ```json
//! [
//!   { "start": "2025-03-03T10:00:00+09:00", "end": "2025-03-03T11:30:00+09:00" },
//!   { "start": "2025-03-04T22:00", "end": "2025-03-05T01:00" },
//!   { "date": "2025-03-06", "start": "09:00", "end": "10:00" }
//! ]
//! ```
//!
//! Offset-carrying stamps are converted into the configured zone; naive stamps
//! are taken as already local.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;
use weekplan_core::{ClockTime, ExternalBooking};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BusyEntry {
    Clock {
        date: NaiveDate,
        start: ClockTime,
        end: ClockTime,
    },
    Stamps {
        start: String,
        end: String,
    },
}

pub fn parse_local(stamp: &str, tz: Tz) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(stamp) {
        return Ok(dt.with_timezone(&tz).naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(stamp, fmt) {
            return Ok(dt);
        }
    }
    bail!("unrecognized datetime '{stamp}'")
}

pub fn parse_busy(json: &str, tz: Tz) -> Result<Vec<ExternalBooking>> {
    let entries: Vec<BusyEntry> = serde_json::from_str(json).context("parse busy intervals")?;
    let mut out = Vec::new();
    for (i, entry) in entries.into_iter().enumerate() {
        match entry {
            BusyEntry::Clock { date, start, end } => {
                if end <= start {
                    bail!("busy entry {i}: end {end} is not after start {start}");
                }
                out.push(ExternalBooking::new(date, start, end));
            }
            BusyEntry::Stamps { start, end } => {
                let s = parse_local(&start, tz).with_context(|| format!("busy entry {i}"))?;
                let e = parse_local(&end, tz).with_context(|| format!("busy entry {i}"))?;
                out.extend(ExternalBooking::spanning(s, e));
            }
        }
    }
    debug!(bookings = out.len(), "busy intervals loaded");
    Ok(out)
}

pub fn load_busy(path: &Path, tz: Tz) -> Result<Vec<ExternalBooking>> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_busy(&s, tz).with_context(|| format!("in {}", path.display()))
}
