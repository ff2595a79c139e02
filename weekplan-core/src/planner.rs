//! Schedule planner: grid, bookings, routines, then project passes.

use chrono::NaiveDate;
use tracing::info;

use crate::availability::WeeklyAvailability;
use crate::bookings::{subtract_bookings, ExternalBooking};
use crate::dependency::ordered_tasks;
use crate::error::ScheduleError;
use crate::grid::SlotGrid;
use crate::project_placer::{place_role, PlacementLedger};
use crate::routine::Routine;
use crate::routine_placer::place_routines;
use crate::schedule::{ScheduleBook, ScheduleResult, UnplacedReason};
use crate::task::{Project, ProjectRole};

/// Everything a run needs. Each `plan` call starts from a fresh grid, so one
/// planner can be run for several horizons.
#[derive(Debug, Clone, Default)]
pub struct SchedulePlanner {
    projects: Vec<Project>,
    routines: Vec<Routine>,
    availability: WeeklyAvailability,
    bookings: Vec<ExternalBooking>,
}

impl SchedulePlanner {
    pub fn new(projects: Vec<Project>, routines: Vec<Routine>, availability: WeeklyAvailability) -> Self {
        Self {
            projects,
            routines,
            availability,
            bookings: Vec::new(),
        }
    }

    pub fn with_bookings(mut self, bookings: Vec<ExternalBooking>) -> Self {
        self.bookings = bookings;
        self
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Check every project's dependency graph, active or not.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        for p in &self.projects {
            ordered_tasks(p)?;
        }
        Ok(())
    }

    /// Build the schedule for `weeks` weeks starting at `start`.
    pub fn plan(&self, start: NaiveDate, weeks: u32) -> Result<ScheduleResult, ScheduleError> {
        self.validate()?;
        let result = self.run(start, weeks)?;
        info!(
            %start,
            weeks,
            scheduled = result.summary.scheduled_tasks,
            unscheduled = result.summary.unscheduled_tasks,
            hours = result.summary.total_hours,
            alternatives = result.routine_alternatives.len(),
            "schedule built"
        );
        Ok(result)
    }

    /// One pass over a fresh grid; inputs must already be validated.
    pub(crate) fn run(&self, start: NaiveDate, weeks: u32) -> Result<ScheduleResult, ScheduleError> {
        let mut grid = SlotGrid::build(&self.availability, start, weeks);
        subtract_bookings(&mut grid, &self.bookings);

        let mut book = ScheduleBook::new();
        let alternatives = place_routines(&self.routines, &mut grid, &mut book);

        let mut ledger = PlacementLedger::new();
        let mut scheduled = place_role(&self.projects, ProjectRole::Focus, &mut grid, &mut book, &mut ledger)?;
        scheduled += place_role(&self.projects, ProjectRole::Buffer, &mut grid, &mut book, &mut ledger)?;

        for p in self.projects.iter().filter(|p| p.role.is_none()) {
            for t in &p.tasks {
                ledger.mark_unplaced(p, t, UnplacedReason::Inactive);
            }
        }

        Ok(book.assemble(&self.projects, scheduled, alternatives, ledger.into_unplaced()))
    }
}

/// One-shot form of [`SchedulePlanner::plan`].
pub fn create_schedule(
    projects: &[Project],
    routines: &[Routine],
    availability: &WeeklyAvailability,
    bookings: &[ExternalBooking],
    start: NaiveDate,
    weeks: u32,
) -> Result<ScheduleResult, ScheduleError> {
    SchedulePlanner::new(projects.to_vec(), routines.to_vec(), availability.clone())
        .with_bookings(bookings.to_vec())
        .plan(start, weeks)
}
