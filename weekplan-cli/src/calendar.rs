use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::io::Write;
use tracing::warn;
use weekplan_core::{ClockTime, EventKind, ScheduleResult, ScheduledEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub summary: String,
    pub description: String,
    /// Google Calendar palette id.
    pub color_id: &'static str,
    pub uid: String,
}

pub fn color_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Routine => "1",
        EventKind::Focus => "2",
        EventKind::Buffer => "5",
    }
}

fn local_stamp(date: NaiveDate, t: ClockTime) -> NaiveDateTime {
    // 24:00 rolls into the next date
    date.and_time(chrono::NaiveTime::MIN) + Duration::minutes(i64::from(t.minutes()))
}

/// Resolve a wall-clock stamp in `tz`. Ambiguous stamps take the earlier
/// instant; stamps inside a DST gap have no instant.
fn to_utc(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local).earliest().map(|dt| dt.with_timezone(&Utc))
}

fn describe(ev: &ScheduledEvent) -> String {
    match &ev.task_id {
        Some(id) => format!("Source: {} | Task #{}", ev.source, id),
        None => format!("Source: {}", ev.source),
    }
}

fn uid_for(date: NaiveDate, ev: &ScheduledEvent) -> String {
    let raw = format!(
        "{}-{}-{}-{}",
        date.format("%Y%m%d"),
        ev.start.to_string().replace(':', ""),
        ev.source,
        ev.task_id.as_deref().unwrap_or(ev.title.as_str())
    );
    let clean: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{clean}@weekplan")
}

/// Turn a computed schedule into time-zone aware events.
pub fn schedule_to_events(result: &ScheduleResult, tz: Tz) -> Vec<CalendarEvent> {
    let mut out = Vec::new();
    for (date, ev) in result.events() {
        let (Some(start_utc), Some(end_utc)) = (
            to_utc(tz, local_stamp(date, ev.start)),
            to_utc(tz, local_stamp(date, ev.end)),
        ) else {
            warn!(%date, title = %ev.title, "event falls in a DST gap; skipped");
            continue;
        };
        out.push(CalendarEvent {
            start_utc,
            end_utc,
            summary: ev.title.clone(),
            description: describe(ev),
            color_id: color_for(ev.kind),
            uid: uid_for(date, ev),
        });
    }
    out
}

/// Emit a minimal ICS calendar containing VEVENT blocks. DTSTART/DTEND are UTC.
pub fn events_to_ics(events: &[CalendarEvent]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Weekplan//EN\n");

    for e in events {
        let dtstart = e.start_utc.format("%Y%m%dT%H%M%SZ");
        let dtend = e.end_utc.format("%Y%m%dT%H%M%SZ");

        s.push_str("BEGIN:VEVENT\n");
        s.push_str(&format!("UID:{}\n", e.uid));
        s.push_str(&format!("DTSTAMP:{}\n", dtstart));
        s.push_str(&format!("DTSTART:{}\n", dtstart));
        s.push_str(&format!("DTEND:{}\n", dtend));
        s.push_str(&format!("SUMMARY:{}\n", escape_ics(&e.summary)));
        s.push_str(&format!("DESCRIPTION:{}\n", escape_ics(&e.description)));
        s.push_str("END:VEVENT\n");
    }

    s.push_str("END:VCALENDAR\n");
    s
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

/// Push ICS to Google Calendar using gcalcli import.
///
/// This requires `gcalcli` installed and authenticated on the machine.
pub fn push_ics_via_gcalcli(ics: &str, calendar: Option<&str>) -> Result<()> {
    if which::which("gcalcli").is_err() {
        bail!(
            "gcalcli is not installed. Install it, authenticate, then retry.\n\nmacOS (brew):  brew install gcalcli\nUbuntu (pipx): pipx install gcalcli\n\nOr use: weekplan schedule <paths> --ics schedule.ics"
        );
    }

    let mut cmd = std::process::Command::new("gcalcli");
    cmd.arg("import");
    if let Some(cal) = calendar {
        cmd.args(["--calendar", cal]);
    }

    let mut child = cmd
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .spawn()
        .context("spawning gcalcli import")?;

    {
        let stdin = child.stdin.as_mut().context("no stdin")?;
        stdin
            .write_all(ics.as_bytes())
            .context("writing ICS to gcalcli")?;
    }

    let status = child.wait().context("waiting on gcalcli")?;
    if !status.success() {
        bail!("gcalcli import failed: {status}");
    }

    Ok(())
}
