//! Routine files: `type: routine` in the header, one recurring task per line.
//!
//! ```text
//! - [ ] Run | 40m | weekdays | 07:00
//! - [ ] Review week | 1h | Sun | evening
//! ```

use anyhow::Result;
use regex::Regex;
use tracing::{debug, warn};
use weekplan_core::{parse_weekday, Priority, Recurrence, Routine, RoutineTask};

use super::{file_stem, parse_duration};
use crate::frontmatter::Frontmatter;

pub fn parse_routine(content: &str, filename: &str) -> Result<Routine> {
    let task_re = Regex::new(concat!(
        r"^- \[ \] (?P<name>.+?)\s*",
        r"\|\s*(?P<dur>\d+(?:\.\d+)?[hm])\s*",
        r"\|\s*(?P<repeat>[A-Za-z][A-Za-z, ]*?)\s*",
        r"(?:\|\s*(?P<at>\d{2}:\d{2}|morning|afternoon|evening)\s*)?$"
    ))?;

    let stem = file_stem(filename);
    let fm = Frontmatter::split(content);
    let mut routine = Routine::new(stem, fm.get("name").unwrap_or(stem));

    if let Some(p) = fm.get("priority") {
        match p.parse::<Priority>() {
            Ok(p) => routine.priority = p,
            Err(e) => warn!(file = %filename, "{e}; using medium"),
        }
    }

    for line in fm.body.lines() {
        let Some(caps) = task_re.captures(line.trim()) else { continue };
        let Some(minutes) = parse_duration(&caps["dur"]) else { continue };
        let name = caps["name"].trim();

        let repeat = parse_repeat(&caps["repeat"], filename);
        if repeat.is_empty() {
            warn!(file = %filename, task = %name, "routine has no valid days; skipping");
            continue;
        }

        let mut task = RoutineTask::new(name, minutes, repeat);
        if let Some(at) = caps.name("at") {
            match at.as_str().parse() {
                Ok(pref) => task = task.at(pref),
                Err(e) => warn!(file = %filename, task = %name, "{e}; no preferred time"),
            }
        }
        routine = routine.with_task(task);
    }

    debug!(file = %filename, tasks = routine.tasks.len(), "parsed routine");
    Ok(routine)
}

/// `daily`, `weekdays`, `weekends` or a comma list of day names.
fn parse_repeat(s: &str, filename: &str) -> Recurrence {
    match s.trim().to_lowercase().as_str() {
        "daily" => return Recurrence::daily(),
        "weekdays" => return Recurrence::weekdays(),
        "weekends" => return Recurrence::weekends(),
        _ => {}
    }

    let mut days = Recurrence::default();
    for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match parse_weekday(token) {
            Ok(day) => days.insert(day),
            Err(e) => warn!(file = %filename, "{e}; skipped"),
        }
    }
    days
}
