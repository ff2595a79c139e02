//! Project task placement: ranked projects, dependency order, first fit with a
//! split fallback.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::dependency::ordered_tasks;
use crate::error::ScheduleError;
use crate::grid::{SlotGrid, TimeSlot};
use crate::schedule::{EventKind, ScheduleBook, ScheduledEvent, UnplacedReason, UnplacedTask};
use crate::task::{Project, ProjectRole, Task};
use crate::time::ClockTime;

/// Smallest free gap the split fallback will put a part into.
pub const MIN_SPLIT_PART_MINUTES: u32 = 30;

/// A point on the grid: date plus clock time.
type GridInstant = (NaiveDate, ClockTime);

/// Projects holding `role`, best first: priority, then deadline (dated before
/// undated), then filename.
pub fn rank_projects(projects: &[Project], role: ProjectRole) -> Vec<&Project> {
    let mut ranked: Vec<&Project> = projects.iter().filter(|p| p.role == Some(role)).collect();
    ranked.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| match (a.deadline, b.deadline) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.filename.cmp(&b.filename))
    });
    ranked
}

/// Cross-pass record of placed tasks and the ones left behind.
#[derive(Debug, Default)]
pub struct PlacementLedger {
    /// (project filename, task id) -> end of the task's last part.
    finished: HashMap<(String, String), GridInstant>,
    unplaced: Vec<UnplacedTask>,
}

impl PlacementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_unplaced(&mut self, project: &Project, task: &Task, reason: UnplacedReason) {
        self.unplaced.push(UnplacedTask {
            project: project.filename.clone(),
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            reason,
        });
    }

    pub fn into_unplaced(self) -> Vec<UnplacedTask> {
        self.unplaced
    }

    fn end_of(&self, project: &str, task: &str) -> Option<GridInstant> {
        self.finished.get(&(project.to_string(), task.to_string())).copied()
    }

    fn record(&mut self, project: &str, task: &str, end: GridInstant) {
        self.finished.insert((project.to_string(), task.to_string()), end);
    }
}

/// Run one placement pass over every project holding `role`, in rank order.
/// Returns how many tasks were scheduled (whole or in parts).
pub fn place_role(
    projects: &[Project],
    role: ProjectRole,
    grid: &mut SlotGrid,
    book: &mut ScheduleBook,
    ledger: &mut PlacementLedger,
) -> Result<usize, ScheduleError> {
    let mut scheduled = 0;
    for project in rank_projects(projects, role) {
        let n = place_project(project, EventKind::from(role), grid, book, ledger)?;
        debug!(project = %project.filename, ?role, scheduled = n, total = project.tasks.len(), "project pass done");
        scheduled += n;
    }
    Ok(scheduled)
}

fn place_project(
    project: &Project,
    kind: EventKind,
    grid: &mut SlotGrid,
    book: &mut ScheduleBook,
    ledger: &mut PlacementLedger,
) -> Result<usize, ScheduleError> {
    let mut scheduled = 0;

    for task in ordered_tasks(project)? {
        let mut earliest: Option<GridInstant> = None;
        let mut blocked = false;
        for dep in &task.dependencies {
            match ledger.end_of(&project.filename, dep) {
                Some(end) => earliest = earliest.max(Some(end)),
                None => blocked = true,
            }
        }
        if blocked {
            trace!(project = %project.filename, task = %task.id, "dependency not placed; skipping");
            ledger.mark_unplaced(project, task, UnplacedReason::BlockedByDependency);
            continue;
        }

        let placement = place_whole(project, task, kind, earliest, grid, book)
            .or_else(|| place_split(project, task, kind, earliest, grid, book));

        match placement {
            Some(end) => {
                ledger.record(&project.filename, &task.id, end);
                scheduled += 1;
            }
            None => {
                debug!(project = %project.filename, task = %task.id, minutes = task.duration, "no slot for task");
                ledger.mark_unplaced(project, task, UnplacedReason::NoCapacity);
            }
        }
    }

    Ok(scheduled)
}

/// Project-eligible and not before the dependencies finish.
fn usable(slot: &TimeSlot, earliest: Option<GridInstant>) -> bool {
    slot.kind.allows_projects() && earliest.is_none_or(|e| (slot.date, slot.cursor()) >= e)
}

fn place_whole(
    project: &Project,
    task: &Task,
    kind: EventKind,
    earliest: Option<GridInstant>,
    grid: &mut SlotGrid,
    book: &mut ScheduleBook,
) -> Option<GridInstant> {
    let idx = grid.slots().iter().position(|s| {
        usable(s, earliest) && s.fits(task.duration) && task.block_type.suits(s.free())
    })?;

    let slot = grid.get_mut(idx)?;
    let date = slot.date;
    let (start, end) = slot.take(task.duration)?;
    debug!(project = %project.filename, task = %task.id, %date, %start, %end, "placed task");

    book.push(
        date,
        ScheduledEvent {
            start,
            end,
            title: format!("[{}] {}", project.name, task.name),
            kind,
            source: project.filename.clone(),
            task_id: Some(task.id.clone()),
        },
    );
    Some((date, end))
}

/// Spread the task over successive slots with at least
/// `MIN_SPLIT_PART_MINUTES` free. Partial placement still returns the end of
/// the last part.
fn place_split(
    project: &Project,
    task: &Task,
    kind: EventKind,
    earliest: Option<GridInstant>,
    grid: &mut SlotGrid,
    book: &mut ScheduleBook,
) -> Option<GridInstant> {
    let mut remaining = task.duration;
    let mut part = 0;
    let mut last_end = None;

    for idx in 0..grid.len() {
        if remaining == 0 {
            break;
        }
        let Some(slot) = grid.get_mut(idx) else { break };
        if !usable(slot, earliest) || slot.free() < MIN_SPLIT_PART_MINUTES {
            continue;
        }

        let minutes = remaining.min(slot.free());
        let date = slot.date;
        let Some((start, end)) = slot.take(minutes) else { continue };
        remaining -= minutes;
        part += 1;
        debug!(project = %project.filename, task = %task.id, part, %date, %start, %end, "placed task part");

        // A first part that covers the whole task needs no part suffix.
        let (title, task_id) = if part == 1 && remaining == 0 {
            (format!("[{}] {}", project.name, task.name), task.id.clone())
        } else {
            (
                format!("[{}] {} (Part {})", project.name, task.name, part),
                format!("{}-part{}", task.id, part),
            )
        };
        book.push(
            date,
            ScheduledEvent {
                start,
                end,
                title,
                kind,
                source: project.filename.clone(),
                task_id: Some(task_id),
            },
        );
        last_end = Some((date, end));
    }

    if remaining > 0 && part > 0 {
        debug!(project = %project.filename, task = %task.id, remaining, "task only partially placed");
    }
    last_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{AvailabilityWindow, SlotKind, WeeklyAvailability};
    use crate::task::{BlockType, Priority};
    use chrono::{Datelike, Weekday};

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn grid(windows: &[(Weekday, &str, SlotKind)]) -> SlotGrid {
        let mut a = WeeklyAvailability::new();
        for (day, range, kind) in windows {
            a.push(*day, AvailabilityWindow::parse(range, *kind).unwrap());
        }
        SlotGrid::build(&a, monday(), 1)
    }

    fn run(projects: &[Project], grid: &mut SlotGrid) -> (usize, Vec<(NaiveDate, ScheduledEvent)>, Vec<UnplacedTask>) {
        let mut book = ScheduleBook::new();
        let mut ledger = PlacementLedger::new();
        let mut n = place_role(projects, ProjectRole::Focus, grid, &mut book, &mut ledger).unwrap();
        n += place_role(projects, ProjectRole::Buffer, grid, &mut book, &mut ledger).unwrap();
        let r = book.assemble(projects, n, vec![], vec![]);
        let evs = r.events().map(|(d, e)| (d, e.clone())).collect();
        (n, evs, ledger.into_unplaced())
    }

    #[test]
    fn ranking_uses_priority_deadline_then_filename() {
        let ps = vec![
            Project::new("c", "C").with_role(ProjectRole::Focus),
            Project::new("b", "B").with_role(ProjectRole::Focus).with_deadline(date(2025, 3, 1)),
            Project::new("a", "A").with_role(ProjectRole::Focus),
            Project::new("d", "D").with_role(ProjectRole::Focus).with_deadline(date(2025, 2, 1)),
            Project::new("z", "Z").with_role(ProjectRole::Focus).with_priority(Priority::High),
            Project::new("q", "Q").with_role(ProjectRole::Buffer).with_priority(Priority::High),
            Project::new("n", "N"),
        ];
        let order: Vec<&str> = rank_projects(&ps, ProjectRole::Focus)
            .iter()
            .map(|p| p.filename.as_str())
            .collect();
        assert_eq!(order, vec!["z", "d", "b", "a", "c"]);
    }

    #[test]
    fn whole_task_lands_in_first_fitting_slot() {
        let mut g = grid(&[
            (Weekday::Mon, "09:00-09:30", SlotKind::Any),
            (Weekday::Mon, "10:00-12:00", SlotKind::Routine),
            (Weekday::Tue, "10:00-12:00", SlotKind::Project),
        ]);
        let p = Project::new("web", "Website")
            .with_role(ProjectRole::Focus)
            .with_task(Task::new("1", "Wireframes").with_duration(60));
        let (n, evs, unplaced) = run(&[p], &mut g);
        assert_eq!(n, 1);
        assert!(unplaced.is_empty());
        assert_eq!(evs[0].0, monday().succ_opt().unwrap());
        assert_eq!(evs[0].1.title, "[Website] Wireframes");
        assert_eq!(evs[0].1.task_id.as_deref(), Some("1"));
        assert_eq!(evs[0].1.kind, EventKind::Focus);
    }

    #[test]
    fn long_tasks_need_three_free_hours() {
        let mut g = grid(&[
            (Weekday::Mon, "09:00-11:00", SlotKind::Any),
            (Weekday::Wed, "09:00-12:00", SlotKind::Any),
        ]);
        let p = Project::new("p", "P")
            .with_role(ProjectRole::Focus)
            .with_task(Task::new("1", "Deep work").with_duration(90).with_block_type(BlockType::Long));
        let (_, evs, _) = run(&[p], &mut g);
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].0.weekday(), Weekday::Wed);
    }

    #[test]
    fn long_task_fitting_one_short_slot_keeps_its_plain_title() {
        let mut g = grid(&[(Weekday::Mon, "09:00-11:00", SlotKind::Any)]);
        let p = Project::new("p", "P")
            .with_role(ProjectRole::Focus)
            .with_task(Task::new("1", "Deep work").with_duration(90).with_block_type(BlockType::Long));
        let (n, evs, unplaced) = run(&[p], &mut g);
        assert_eq!(n, 1);
        assert!(unplaced.is_empty());
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].1.title, "[P] Deep work");
        assert_eq!(evs[0].1.task_id.as_deref(), Some("1"));
        assert_eq!(evs[0].1.duration(), 90);
    }

    #[test]
    fn single_partial_part_still_carries_the_suffix() {
        let mut g = grid(&[(Weekday::Mon, "09:00-10:00", SlotKind::Any)]);
        let p = Project::new("p", "P")
            .with_role(ProjectRole::Focus)
            .with_task(Task::new("1", "Write").with_duration(90));
        let (n, evs, _) = run(&[p], &mut g);
        assert_eq!(n, 1);
        assert_eq!(evs[0].1.title, "[P] Write (Part 1)");
        assert_eq!(evs[0].1.task_id.as_deref(), Some("1-part1"));
    }

    #[test]
    fn oversized_task_is_split_into_parts() {
        let mut g = grid(&[
            (Weekday::Mon, "09:00-10:00", SlotKind::Any),
            (Weekday::Tue, "09:00-09:20", SlotKind::Any),
            (Weekday::Wed, "09:00-11:00", SlotKind::Any),
        ]);
        let p = Project::new("p", "P")
            .with_role(ProjectRole::Focus)
            .with_task(Task::new("4", "Write").with_duration(150));
        let (n, evs, _) = run(&[p], &mut g);
        assert_eq!(n, 1);
        let titles: Vec<&str> = evs.iter().map(|(_, e)| e.title.as_str()).collect();
        assert_eq!(titles, vec!["[P] Write (Part 1)", "[P] Write (Part 2)"]);
        assert_eq!(evs[1].1.task_id.as_deref(), Some("4-part2"));
        assert_eq!(evs[0].1.duration() + evs[1].1.duration(), 150);
    }

    #[test]
    fn dependents_wait_for_their_dependencies() {
        // Task 1 only fits Tuesday; task 2 would fit Monday but depends on 1.
        let mut g = grid(&[
            (Weekday::Mon, "09:00-09:45", SlotKind::Any),
            (Weekday::Tue, "09:00-11:00", SlotKind::Any),
        ]);
        let p = Project::new("p", "P")
            .with_role(ProjectRole::Focus)
            .with_task(Task::new("1", "Design").with_duration(90))
            .with_task(Task::new("2", "Build").with_duration(30).after("1"));
        let (n, evs, _) = run(&[p], &mut g);
        assert_eq!(n, 2);
        let build = evs.iter().find(|(_, e)| e.task_id.as_deref() == Some("2")).unwrap();
        assert_eq!(build.0.weekday(), Weekday::Tue);
        assert_eq!(build.1.start, ClockTime::hm(10, 30));
    }

    #[test]
    fn blocked_dependents_are_never_attempted() {
        let mut g = grid(&[(Weekday::Mon, "09:00-10:00", SlotKind::Any)]);
        let p = Project::new("p", "P")
            .with_role(ProjectRole::Focus)
            .with_task(Task::new("1", "Huge").with_duration(600).with_block_type(BlockType::Long))
            .with_task(Task::new("2", "Small").with_duration(15).after("1"));
        let mut book = ScheduleBook::new();
        let mut ledger = PlacementLedger::new();
        // Fill the only slot first so task 1 cannot even split.
        g.get_mut(0).unwrap().block(45);
        let n = place_role(&[p], ProjectRole::Focus, &mut g, &mut book, &mut ledger).unwrap();
        assert_eq!(n, 0);
        let reasons: Vec<UnplacedReason> = ledger.into_unplaced().into_iter().map(|u| u.reason).collect();
        assert_eq!(reasons, vec![UnplacedReason::NoCapacity, UnplacedReason::BlockedByDependency]);
    }

    #[test]
    fn buffer_runs_after_focus_and_is_tagged_buffer() {
        let mut g = grid(&[(Weekday::Mon, "09:00-10:00", SlotKind::Any)]);
        let focus = Project::new("f", "F")
            .with_role(ProjectRole::Focus)
            .with_task(Task::new("1", "A").with_duration(40));
        let buffer = Project::new("b", "B")
            .with_role(ProjectRole::Buffer)
            .with_priority(Priority::High)
            .with_task(Task::new("1", "B").with_duration(20));
        let (n, evs, _) = run(&[buffer, focus], &mut g);
        assert_eq!(n, 2);
        assert_eq!(evs[0].1.kind, EventKind::Focus);
        assert_eq!(evs[1].1.kind, EventKind::Buffer);
        assert_eq!(evs[1].1.start, ClockTime::hm(9, 40));
    }

    #[test]
    fn project_only_slots_reject_nothing_for_projects_but_routine_slots_do() {
        let mut g = grid(&[(Weekday::Mon, "09:00-10:00", SlotKind::Routine)]);
        let p = Project::new("p", "P")
            .with_role(ProjectRole::Focus)
            .with_task(Task::new("1", "A").with_duration(30));
        let (n, evs, unplaced) = run(&[p], &mut g);
        assert_eq!(n, 0);
        assert!(evs.is_empty());
        assert_eq!(unplaced[0].reason, UnplacedReason::NoCapacity);
    }
}
