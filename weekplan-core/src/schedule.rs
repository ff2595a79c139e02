//! Schedule output types and the assembler that turns placements into days.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::task::{Project, ProjectRole};
use crate::time::{round_hours, ClockTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Routine,
    Focus,
    Buffer,
}

impl From<ProjectRole> for EventKind {
    fn from(role: ProjectRole) -> Self {
        match role {
            ProjectRole::Focus => EventKind::Focus,
            ProjectRole::Buffer => EventKind::Buffer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    pub start: ClockTime,
    pub end: ClockTime,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Filename of the owning project or routine.
    pub source: String,
    /// Project task id, `-partN` suffixed for split parts. None for routines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl ScheduledEvent {
    pub fn duration(&self) -> u32 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub events: Vec<ScheduledEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlternativeReason {
    /// Placed on the intended day at another time.
    SlotFull,
    /// Moved to a nearby day.
    NoSlot,
}

/// A routine occurrence that did not land at its preferred day/time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineAlternative {
    pub routine_name: String,
    pub original_day: Weekday,
    pub original_date: NaiveDate,
    /// Resolved preferred time, or `"any"` when none was given.
    pub original_time: String,
    pub scheduled_day: Weekday,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: ClockTime,
    pub reason: AlternativeReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// The project has neither the focus nor the buffer role.
    Inactive,
    /// A dependency was never placed.
    BlockedByDependency,
    /// No eligible slot had room left.
    NoCapacity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnplacedTask {
    pub project: String,
    pub task_id: String,
    pub task_name: String,
    pub reason: UnplacedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub total_tasks: usize,
    pub scheduled_tasks: usize,
    pub unscheduled_tasks: usize,
    pub total_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub schedule: Vec<DaySchedule>,
    pub summary: ScheduleSummary,
    #[serde(default)]
    pub routine_alternatives: Vec<RoutineAlternative>,
    #[serde(default)]
    pub unplaced: Vec<UnplacedTask>,
}

impl ScheduleResult {
    pub fn events(&self) -> impl Iterator<Item = (NaiveDate, &ScheduledEvent)> {
        self.schedule
            .iter()
            .flat_map(|d| d.events.iter().map(move |e| (d.date, e)))
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DaySchedule> {
        self.schedule.iter().find(|d| d.date == date)
    }
}

/// Placements collected during a run, keyed by date in insertion order.
#[derive(Debug, Default)]
pub struct ScheduleBook {
    days: BTreeMap<NaiveDate, Vec<ScheduledEvent>>,
}

impl ScheduleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, date: NaiveDate, event: ScheduledEvent) {
        self.days.entry(date).or_default().push(event);
    }

    /// Whether a routine event titled `title` already sits on `date`.
    pub fn has_routine(&self, date: NaiveDate, title: &str) -> bool {
        self.days
            .get(&date)
            .is_some_and(|evs| evs.iter().any(|e| e.kind == EventKind::Routine && e.title == title))
    }

    /// Sort each day by start (stable) and compute the summary.
    ///
    /// `total` counts every supplied project task regardless of role; `scheduled`
    /// counts tasks with at least one placed part.
    pub fn assemble(
        self,
        projects: &[Project],
        scheduled: usize,
        routine_alternatives: Vec<RoutineAlternative>,
        unplaced: Vec<UnplacedTask>,
    ) -> ScheduleResult {
        let total: usize = projects.iter().map(|p| p.tasks.len()).sum();

        let schedule: Vec<DaySchedule> = self
            .days
            .into_iter()
            .map(|(date, mut events)| {
                events.sort_by_key(|e| e.start);
                DaySchedule { date, events }
            })
            .collect();

        let minutes: u32 = schedule
            .iter()
            .flat_map(|d| d.events.iter())
            .map(ScheduledEvent::duration)
            .sum();

        ScheduleResult {
            schedule,
            summary: ScheduleSummary {
                total_tasks: total,
                scheduled_tasks: scheduled,
                unscheduled_tasks: total.saturating_sub(scheduled),
                total_hours: round_hours(minutes),
            },
            routine_alternatives,
            unplaced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn event(start: ClockTime, minutes: u32, title: &str, kind: EventKind) -> ScheduledEvent {
        ScheduledEvent {
            start,
            end: start.plus(minutes),
            title: title.to_string(),
            kind,
            source: "src".to_string(),
            task_id: None,
        }
    }

    #[test]
    fn assemble_sorts_days_and_events() {
        let d1 = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        let d0 = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut book = ScheduleBook::new();
        book.push(d1, event(ClockTime::hm(14, 0), 30, "b", EventKind::Focus));
        book.push(d1, event(ClockTime::hm(9, 0), 60, "a", EventKind::Routine));
        book.push(d0, event(ClockTime::hm(10, 0), 30, "c", EventKind::Buffer));

        let projects = vec![Project::new("p", "P").with_task(Task::new("1", "x")).with_task(Task::new("2", "y"))];
        let r = book.assemble(&projects, 1, vec![], vec![]);

        assert_eq!(r.schedule.len(), 2);
        assert_eq!(r.schedule[0].date, d0);
        assert_eq!(r.schedule[1].events[0].title, "a");
        assert_eq!(r.summary.total_tasks, 2);
        assert_eq!(r.summary.unscheduled_tasks, 1);
        // 30 + 60 + 30 minutes, routines included
        assert_eq!(r.summary.total_hours, 2.0);
    }

    #[test]
    fn detects_routine_already_on_date() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut book = ScheduleBook::new();
        book.push(d, event(ClockTime::hm(7, 0), 30, "Run", EventKind::Routine));
        book.push(d, event(ClockTime::hm(8, 0), 30, "Read", EventKind::Focus));
        assert!(book.has_routine(d, "Run"));
        assert!(!book.has_routine(d, "Read"));
        assert!(!book.has_routine(d.succ_opt().unwrap(), "Run"));
    }

    #[test]
    fn result_json_matches_contract() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut book = ScheduleBook::new();
        book.push(d, event(ClockTime::hm(9, 0), 60, "Run", EventKind::Routine));
        let r = book.assemble(&[], 0, vec![], vec![]);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["schedule"][0]["date"], "2025-01-06");
        assert_eq!(v["schedule"][0]["events"][0]["type"], "routine");
        assert_eq!(v["schedule"][0]["events"][0]["end"], "10:00");
        assert!(v["schedule"][0]["events"][0].get("taskId").is_none());
        assert_eq!(v["summary"]["totalHours"], 1.0);
        assert_eq!(v["summary"]["unscheduledTasks"], 0);
    }
}
