//! The task register entry - the pipeline's mutable state of record.

use crate::ids::{TaskName, TransientName};
use crate::status::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the task register: the current state of one task for one
/// transient.
///
/// At most one entry exists per (transient, task) pair, and exactly one once
/// the transient has been initialized. Status, timestamps and timing change
/// only through runner-driven writes and operator actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRegisterEntry {
    /// Owning transient. Immutable after creation.
    pub transient: TransientName,

    /// Pipeline stage. Immutable after creation.
    pub task: TaskName,

    /// Current status.
    pub status: Status,

    /// Stamped on every status change.
    pub last_modified: DateTime<Utc>,

    /// Process-CPU seconds of the most recent execution attempt, rounded to
    /// two decimal places. Absent until the task has run at least once.
    #[serde(default)]
    pub last_processing_time_seconds: Option<f64>,

    /// Raised by the operator "report issue" action; never touched by the
    /// scheduler's normal transitions.
    #[serde(default)]
    pub user_warning: bool,
}

impl TaskRegisterEntry {
    /// Create a fresh entry in the given status, stamped at `now`.
    pub fn new(
        transient: TransientName,
        task: TaskName,
        status: Status,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            transient,
            task,
            status,
            last_modified: now,
            last_processing_time_seconds: None,
            user_warning: false,
        }
    }

    /// Replace the status, stamping `last_modified`.
    pub fn set_status(&mut self, status: Status, now: DateTime<Utc>) {
        self.status = status;
        self.last_modified = now;
    }

    /// Record an execution outcome: terminal status plus timing.
    pub fn record_outcome(&mut self, status: Status, now: DateTime<Utc>, processing_seconds: f64) {
        self.set_status(status, now);
        self.last_processing_time_seconds = Some(processing_seconds);
    }
}
