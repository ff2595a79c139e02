//! Plain-text agenda output.

use std::fmt::Write;

use chrono::Datelike;
use weekplan_core::{AlternativeReason, EventKind, ScheduleEstimate, ScheduleResult, UnplacedReason};

fn kind_label(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Routine => "routine",
        EventKind::Focus => "focus",
        EventKind::Buffer => "buffer",
    }
}

fn alternative_label(reason: AlternativeReason) -> &'static str {
    match reason {
        AlternativeReason::SlotFull => "preferred slot full",
        AlternativeReason::NoSlot => "no slot that day",
    }
}

fn unplaced_label(reason: UnplacedReason) -> &'static str {
    match reason {
        UnplacedReason::Inactive => "project not in focus or buffer",
        UnplacedReason::BlockedByDependency => "waiting on a dependency",
        UnplacedReason::NoCapacity => "no room in the horizon",
    }
}

pub fn agenda(result: &ScheduleResult) -> String {
    let mut s = String::new();

    if result.schedule.is_empty() {
        s.push_str("Nothing scheduled.\n");
    }
    for day in &result.schedule {
        let _ = writeln!(s, "{} ({})", day.date, day.date.weekday());
        for ev in &day.events {
            let _ = writeln!(s, "  {}-{}  {:<7}  {}", ev.start, ev.end, kind_label(ev.kind), ev.title);
        }
        s.push('\n');
    }

    let sum = &result.summary;
    let _ = writeln!(
        s,
        "Tasks: {} total, {} scheduled, {} unscheduled. Planned hours: {:.1}",
        sum.total_tasks, sum.scheduled_tasks, sum.unscheduled_tasks, sum.total_hours
    );

    if !result.routine_alternatives.is_empty() {
        s.push_str("\nMoved routines:\n");
        for alt in &result.routine_alternatives {
            let _ = writeln!(
                s,
                "  {}: {} {} at {} -> {} {} at {} ({})",
                alt.routine_name,
                alt.original_day,
                alt.original_date,
                alt.original_time,
                alt.scheduled_day,
                alt.scheduled_date,
                alt.scheduled_time,
                alternative_label(alt.reason)
            );
        }
    }

    if !result.unplaced.is_empty() {
        s.push_str("\nNot scheduled:\n");
        for u in &result.unplaced {
            let _ = writeln!(s, "  {} #{} {} ({})", u.project, u.task_id, u.task_name, unplaced_label(u.reason));
        }
    }

    s
}

/// `fits` is false when the search ceiling still left tasks unscheduled.
pub fn estimate(est: &ScheduleEstimate, fits: bool) -> String {
    let mut s = format!(
        "{} tasks, {:.1} hours of project work.\n",
        est.total_tasks, est.total_hours
    );
    if !fits {
        let _ = writeln!(s, "Does not fit within {} weeks.", est.required_weeks);
    } else {
        let _ = writeln!(s, "Fits in {} week(s).", est.required_weeks);
    }
    s
}
