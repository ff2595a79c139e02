//! Routine placement: preferred slot, then same day, then a nearby day.
//!
//! Each (routine task, matching date) pair is one occurrence. An occurrence is
//! skipped when the same routine task already sits on its date, which also
//! covers dates filled earlier by the nearby-day fallback.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, trace};

use crate::grid::SlotGrid;
use crate::routine::{Routine, RoutineTask};
use crate::schedule::{AlternativeReason, EventKind, RoutineAlternative, ScheduleBook, ScheduledEvent};
use crate::time::ClockTime;

/// How far (in days, each direction) the nearby-day fallback searches.
pub const NEARBY_DAY_RADIUS: i64 = 7;

/// Place every routine occurrence in the horizon. Returns the deviations from
/// preferred slots.
pub fn place_routines(
    routines: &[Routine],
    grid: &mut SlotGrid,
    book: &mut ScheduleBook,
) -> Vec<RoutineAlternative> {
    let mut alternatives = Vec::new();
    let dates: Vec<NaiveDate> = grid.dates().collect();

    for routine in routines {
        for task in &routine.tasks {
            for &date in dates.iter().filter(|d| task.repeat.contains(d.weekday())) {
                if book.has_routine(date, &task.name) {
                    trace!(task = %task.name, %date, "routine already on date");
                    continue;
                }
                if let Some(alt) = place_occurrence(routine, task, date, grid, book) {
                    alternatives.push(alt);
                }
            }
        }
    }

    alternatives
}

/// Returns an alternative record when the occurrence lands away from its
/// preferred slot.
fn place_occurrence(
    routine: &Routine,
    task: &RoutineTask,
    date: NaiveDate,
    grid: &mut SlotGrid,
    book: &mut ScheduleBook,
) -> Option<RoutineAlternative> {
    let preferred = task.preferred_time.map(|p| p.resolve());

    if let Some(at) = preferred {
        let exact = grid.indices_on(date).into_iter().find(|&i| {
            grid.get(i)
                .is_some_and(|s| s.start == at && s.kind.allows_routines() && s.fits(task.duration))
        });
        if let Some(idx) = exact {
            place(routine, task, idx, grid, book);
            return None;
        }
    }

    if let Some(idx) = first_routine_slot(grid, date, task.duration) {
        let slot_start = grid.get(idx).map(|s| s.start);
        let start = place(routine, task, idx, grid, book)?;
        return match preferred {
            Some(at) if slot_start != Some(at) => Some(alternative(
                task,
                date,
                preferred,
                date,
                start,
                AlternativeReason::SlotFull,
            )),
            _ => None,
        };
    }

    for offset in 1..=NEARBY_DAY_RADIUS {
        for candidate in [date + Duration::days(offset), date - Duration::days(offset)] {
            if !grid.contains_date(candidate) || book.has_routine(candidate, &task.name) {
                continue;
            }
            if let Some(idx) = first_routine_slot(grid, candidate, task.duration) {
                let start = place(routine, task, idx, grid, book)?;
                return Some(alternative(
                    task,
                    date,
                    preferred,
                    candidate,
                    start,
                    AlternativeReason::NoSlot,
                ));
            }
        }
    }

    debug!(task = %task.name, %date, "routine occurrence dropped: no slot within a week");
    None
}

fn first_routine_slot(grid: &SlotGrid, date: NaiveDate, minutes: u32) -> Option<usize> {
    grid.indices_on(date).into_iter().find(|&i| {
        grid.get(i)
            .is_some_and(|s| s.kind.allows_routines() && s.fits(minutes))
    })
}

fn place(
    routine: &Routine,
    task: &RoutineTask,
    idx: usize,
    grid: &mut SlotGrid,
    book: &mut ScheduleBook,
) -> Option<ClockTime> {
    let slot = grid.get_mut(idx)?;
    let date = slot.date;
    let (start, end) = slot.take(task.duration)?;
    debug!(task = %task.name, %date, %start, %end, "placed routine");
    book.push(
        date,
        ScheduledEvent {
            start,
            end,
            title: task.name.clone(),
            kind: EventKind::Routine,
            source: routine.filename.clone(),
            task_id: None,
        },
    );
    Some(start)
}

fn alternative(
    task: &RoutineTask,
    original: NaiveDate,
    preferred: Option<ClockTime>,
    scheduled: NaiveDate,
    scheduled_time: ClockTime,
    reason: AlternativeReason,
) -> RoutineAlternative {
    RoutineAlternative {
        routine_name: task.name.clone(),
        original_day: original.weekday(),
        original_date: original,
        original_time: preferred.map_or_else(|| "any".to_string(), |t| t.to_string()),
        scheduled_day: scheduled.weekday(),
        scheduled_date: scheduled,
        scheduled_time,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{AvailabilityWindow, SlotKind, WeeklyAvailability};
    use crate::routine::{PreferredTime, Recurrence};
    use chrono::Weekday;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn window(range: &str, kind: SlotKind) -> AvailabilityWindow {
        AvailabilityWindow::parse(range, kind).unwrap()
    }

    fn run(availability: WeeklyAvailability, routines: &[Routine]) -> (ScheduleBook, Vec<RoutineAlternative>) {
        let mut grid = SlotGrid::build(&availability, monday(), 1);
        let mut book = ScheduleBook::new();
        let alts = place_routines(routines, &mut grid, &mut book);
        (book, alts)
    }

    fn events(book: ScheduleBook) -> Vec<(NaiveDate, ScheduledEvent)> {
        let r = book.assemble(&[], 0, vec![], vec![]);
        r.events().map(|(d, e)| (d, e.clone())).collect()
    }

    #[test]
    fn preferred_slot_wins_over_earlier_slot() {
        let a = WeeklyAvailability::new()
            .with_window(Weekday::Mon, window("07:00-08:00", SlotKind::Any))
            .with_window(Weekday::Mon, window("19:00-20:00", SlotKind::Routine));
        let r = Routine::new("health", "Health").with_task(
            RoutineTask::new("Stretch", 30, Recurrence::from_days([Weekday::Mon])).at(PreferredTime::Evening),
        );
        let (book, alts) = run(a, &[r]);
        let evs = events(book);
        assert!(alts.is_empty());
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].1.start, ClockTime::hm(19, 0));
        assert_eq!(evs[0].1.source, "health");
    }

    #[test]
    fn same_day_fallback_records_slot_full() {
        let a = WeeklyAvailability::new()
            .with_window(Weekday::Mon, window("09:00-09:30", SlotKind::Any))
            .with_window(Weekday::Mon, window("12:00-13:00", SlotKind::Any));
        let r = Routine::new("health", "Health").with_task(
            RoutineTask::new("Run", 45, Recurrence::from_days([Weekday::Mon])).at(PreferredTime::Morning),
        );
        let (_, alts) = run(a, &[r]);
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].reason, AlternativeReason::SlotFull);
        assert_eq!(alts[0].original_time, "09:00");
        assert_eq!(alts[0].scheduled_time, ClockTime::hm(12, 0));
        assert_eq!(alts[0].scheduled_date, monday());
    }

    #[test]
    fn no_preference_takes_first_routine_slot_without_alternative() {
        let a = WeeklyAvailability::new()
            .with_window(Weekday::Mon, window("08:00-09:00", SlotKind::Project))
            .with_window(Weekday::Mon, window("10:00-11:00", SlotKind::Routine));
        let r = Routine::new("r", "R").with_task(RoutineTask::new("Read", 30, Recurrence::from_days([Weekday::Mon])));
        let (book, alts) = run(a, &[r]);
        assert!(alts.is_empty());
        assert_eq!(events(book)[0].1.start, ClockTime::hm(10, 0));
    }

    #[test]
    fn nearby_day_fallback_prefers_forward_then_backward() {
        // Wednesday has nothing; Tuesday and Thursday both have room.
        let a = WeeklyAvailability::new()
            .with_window(Weekday::Tue, window("18:00-19:00", SlotKind::Any))
            .with_window(Weekday::Thu, window("18:00-19:00", SlotKind::Any));
        let r = Routine::new("r", "R").with_task(RoutineTask::new("Journal", 20, Recurrence::from_days([Weekday::Wed])));
        let (book, alts) = run(a, &[r]);
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].reason, AlternativeReason::NoSlot);
        assert_eq!(alts[0].original_day, Weekday::Wed);
        assert_eq!(alts[0].original_time, "any");
        assert_eq!(alts[0].scheduled_day, Weekday::Thu);
        assert_eq!(events(book).len(), 1);
    }

    #[test]
    fn nearby_day_fallback_looks_backward_when_forward_is_empty() {
        // Only Tuesday has room; the week ends before the next Tuesday.
        let a = WeeklyAvailability::new().with_window(Weekday::Tue, window("18:00-19:00", SlotKind::Any));
        let r = Routine::new("r", "R").with_task(RoutineTask::new("Journal", 20, Recurrence::from_days([Weekday::Wed])));
        let (book, alts) = run(a, &[r]);
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].reason, AlternativeReason::NoSlot);
        assert_eq!(alts[0].original_date, monday() + Duration::days(2));
        assert_eq!(alts[0].scheduled_day, Weekday::Tue);
        assert_eq!(alts[0].scheduled_date, monday() + Duration::days(1));
        assert_eq!(alts[0].scheduled_time, ClockTime::hm(18, 0));
        let evs = events(book);
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].0, monday() + Duration::days(1));
    }

    #[test]
    fn nearby_day_fallback_stops_at_the_radius() {
        // Two weeks, Sunday slots only, and the first Sunday is already taken.
        // The first Monday is 13 days from the second Sunday and must not use it;
        // the second Monday is six days before it.
        let a = WeeklyAvailability::new().with_window(Weekday::Sun, window("10:00-11:00", SlotKind::Any));
        let mut grid = SlotGrid::build(&a, monday(), 2);
        let first_sunday = monday() + Duration::days(6);
        for slot in grid.iter_mut().filter(|s| s.date == first_sunday) {
            slot.block(60);
        }
        let r = Routine::new("r", "R").with_task(RoutineTask::new("Plan week", 30, Recurrence::from_days([Weekday::Mon])));
        let mut book = ScheduleBook::new();
        let alts = place_routines(&[r], &mut grid, &mut book);

        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].original_date, monday() + Duration::days(7));
        assert_eq!(alts[0].scheduled_date, monday() + Duration::days(13));
        let evs = events(book);
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].0, monday() + Duration::days(13));
    }

    #[test]
    fn never_places_twice_on_one_date() {
        // Daily routine, only Monday has slots: Monday's own occurrence lands,
        // every other day searches nearby but Monday is taken.
        let a = WeeklyAvailability::new().with_window(Weekday::Mon, window("06:00-10:00", SlotKind::Any));
        let r = Routine::new("r", "R").with_task(RoutineTask::new("Walk", 30, Recurrence::daily()));
        let (book, _) = run(a, &[r]);
        let evs = events(book);
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].0, monday());
    }

    #[test]
    fn occurrence_without_room_is_dropped() {
        let a = WeeklyAvailability::new().with_window(Weekday::Mon, window("06:00-06:15", SlotKind::Any));
        let r = Routine::new("r", "R").with_task(RoutineTask::new("Yoga", 60, Recurrence::daily()));
        let (book, alts) = run(a, &[r]);
        assert!(alts.is_empty());
        assert!(events(book).is_empty());
    }
}
