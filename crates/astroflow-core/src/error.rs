//! Core domain errors.

use crate::ids::TaskName;
use thiserror::Error;

/// Configuration errors: a prerequisite or runner declaration that does not
/// resolve against the catalogs. These indicate a typo in wiring, not a
/// transient condition, and are fatal at validation time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Task name not present in the task catalog.
    #[error("Unknown task: {0}")]
    UnknownTask(TaskName),

    /// Status message not present in the status catalog.
    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    /// A runner declared no prerequisites at all.
    #[error("Task '{0}' declares no prerequisites; it must at least declare the status it expects of itself")]
    EmptyPrerequisites(TaskName),

    /// A runner's prerequisites do not cover its own task.
    #[error("Task '{0}' does not declare a prerequisite on its own status")]
    MissingSelfPrerequisite(TaskName),

    /// A runner's failure status must be terminal.
    #[error("Task '{task}' declares non-terminal failure status '{status}'")]
    NonTerminalFailedStatus { task: TaskName, status: String },
}
