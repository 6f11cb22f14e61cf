//! Scheduler errors.

use astroflow_core::{ConfigError, TaskName, TransientName};
use thiserror::Error;

use crate::store::StoreError;

/// Failure type task logic may return. Boxed so implementations keep their
/// own error enums.
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the scheduling core.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A declaration did not resolve against the catalogs. Fatal.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The register rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Task logic returned a status message the catalog does not know.
    /// The entry has already been moved to the runner's failure status.
    #[error("Task '{task}' returned unknown status '{status}' for transient '{transient}'")]
    UnknownOutcome {
        task: TaskName,
        transient: TransientName,
        status: String,
    },

    /// Task logic returned a non-terminal status. Every invocation must end
    /// in a terminal classification; the entry has been moved to the
    /// runner's failure status.
    #[error("Task '{task}' returned non-terminal status '{status}' for transient '{transient}'")]
    NonTerminalOutcome {
        task: TaskName,
        transient: TransientName,
        status: String,
    },

    /// Task logic failed. The entry holds the runner's failure status and
    /// the original error is re-raised here for the cadence layer.
    #[error("Task '{task}' failed for transient '{transient}': {source}")]
    Logic {
        task: TaskName,
        transient: TransientName,
        #[source]
        source: TaskError,
    },
}
