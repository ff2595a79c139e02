//! How many weeks until every task fits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::availability::WeeklyAvailability;
use crate::bookings::ExternalBooking;
use crate::error::ScheduleError;
use crate::planner::SchedulePlanner;
use crate::routine::Routine;
use crate::task::Project;
use crate::time::round_hours;

pub const DEFAULT_MAX_WEEKS: u32 = 52;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEstimate {
    pub required_weeks: u32,
    pub total_tasks: usize,
    /// Sum of every task's duration, in hours to one decimal.
    pub total_hours: f64,
}

impl SchedulePlanner {
    /// Smallest horizon in `1..=max_weeks` that leaves nothing unscheduled,
    /// or `max_weeks` when none does.
    ///
    /// Tasks of inactive projects are never scheduled, so their presence
    /// always drives the answer to `max_weeks`.
    pub fn estimate(&self, start: NaiveDate, max_weeks: u32) -> Result<ScheduleEstimate, ScheduleError> {
        self.validate()?;

        let total_tasks = self.projects().iter().map(|p| p.tasks.len()).sum();
        let minutes: u32 = self.projects().iter().map(Project::total_minutes).sum();
        let estimate = |required_weeks| ScheduleEstimate {
            required_weeks,
            total_tasks,
            total_hours: round_hours(minutes),
        };

        for weeks in 1..=max_weeks {
            let result = self.run(start, weeks)?;
            debug!(weeks, unscheduled = result.summary.unscheduled_tasks, "estimate probe");
            if result.summary.unscheduled_tasks == 0 {
                info!(weeks, total_tasks, "estimate found");
                return Ok(estimate(weeks));
            }
        }

        info!(max_weeks, total_tasks, "estimate hit ceiling");
        Ok(estimate(max_weeks))
    }
}

/// One-shot form of [`SchedulePlanner::estimate`].
pub fn calculate_required_weeks(
    projects: &[Project],
    routines: &[Routine],
    availability: &WeeklyAvailability,
    bookings: &[ExternalBooking],
    start: NaiveDate,
    max_weeks: u32,
) -> Result<ScheduleEstimate, ScheduleError> {
    SchedulePlanner::new(projects.to_vec(), routines.to_vec(), availability.clone())
        .with_bookings(bookings.to_vec())
        .estimate(start, max_weeks)
}
