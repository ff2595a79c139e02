//! weekplan-core: slot-allocation engine for a personal weekly schedule

pub mod availability;
pub mod bookings;
pub mod dependency;
pub mod error;
pub mod estimate;
pub mod grid;
pub mod planner;
pub mod project_placer;
pub mod routine;
pub mod routine_placer;
pub mod schedule;
pub mod task;
pub mod time;

pub use availability::{AvailabilityWindow, SlotKind, WeeklyAvailability};
pub use bookings::{subtract_bookings, ExternalBooking};
pub use dependency::{ordered_tasks, TaskGraph};
pub use error::ScheduleError;
pub use estimate::{calculate_required_weeks, ScheduleEstimate, DEFAULT_MAX_WEEKS};
pub use grid::{SlotGrid, TimeSlot};
pub use planner::{create_schedule, SchedulePlanner};
pub use project_placer::{rank_projects, MIN_SPLIT_PART_MINUTES};
pub use routine::{PreferredTime, Recurrence, Routine, RoutineTask};
pub use routine_placer::{place_routines, NEARBY_DAY_RADIUS};
pub use schedule::{
    AlternativeReason, DaySchedule, EventKind, RoutineAlternative, ScheduleResult, ScheduleSummary,
    ScheduledEvent, UnplacedReason, UnplacedTask,
};
pub use task::{BlockType, Priority, Project, ProjectRole, Task, LONG_BLOCK_MINUTES};
pub use time::{parse_time_range, parse_weekday, ClockTime, WEEKDAYS};
