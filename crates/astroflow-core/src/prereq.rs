//! Prerequisite declarations.

use crate::ids::TaskName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A task's declared requirements on the current statuses of (possibly
/// itself and) other tasks before it may run.
///
/// The map must not be empty, and a runner must always declare the status it
/// expects of its own task; both rules are enforced when a runner is built.
/// Iteration order is the task-name order, so evaluation is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisites {
    required: BTreeMap<TaskName, String>,
}

impl Prerequisites {
    /// Create an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to require `task` to currently hold `status`.
    /// Declaring the same task twice replaces the earlier requirement.
    pub fn require(mut self, task: impl Into<TaskName>, status: impl Into<String>) -> Self {
        self.required.insert(task.into(), status.into());
        self
    }

    /// The required status message for one task, if declared.
    pub fn status_for(&self, task: &TaskName) -> Option<&str> {
        self.required.get(task).map(String::as_str)
    }

    /// Check whether a task appears in the declaration.
    pub fn contains(&self, task: &TaskName) -> bool {
        self.required.contains_key(task)
    }

    /// Iterate (task, required status) pairs in task-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&TaskName, &str)> {
        self.required.iter().map(|(t, s)| (t, s.as_str()))
    }

    /// Number of declared pairs.
    pub fn len(&self) -> usize {
        self.required.len()
    }

    /// Whether nothing is declared. An empty declaration never validates.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}
