//! Input faults the engine refuses to interpret.
//!
//! Ordinary scheduling failure (no room, blocked dependency) is never an error;
//! it is reported through the summary and `ScheduleResult::unplaced`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("project '{project}': task #{task} depends on unknown task #{dependency}")]
    MalformedDependency {
        project: String,
        task: String,
        dependency: String,
    },

    #[error("project '{project}': task id #{task} is used more than once")]
    DuplicateTask { project: String, task: String },

    #[error("project '{project}': dependency cycle through task #{task}")]
    CyclicDependency { project: String, task: String },

    #[error("invalid clock time '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("invalid time window '{0}' (expected HH:MM-HH:MM with start before end)")]
    InvalidWindow(String),

    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),
}
