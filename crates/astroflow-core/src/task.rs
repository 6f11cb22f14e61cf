//! Pipeline stages and the task catalog.

use crate::ids::TaskName;
use serde::{Deserialize, Serialize};

/// A named pipeline stage. Identity is the name; tasks are created once at
/// setup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    /// Stage name, e.g. "Host match".
    pub name: TaskName,
}

impl Task {
    /// Create a new Task.
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self { name: name.into() }
    }
}

/// Immutable, ordered catalog of the pipeline's stages.
///
/// Order matters only for initialization and reporting; scheduling order is
/// driven entirely by prerequisites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskCatalog {
    tasks: Vec<Task>,
}

impl TaskCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard transient-processing pipeline stages.
    pub fn transient_pipeline() -> Self {
        [
            "Cutout download",
            "Host match",
            "Host information",
            "Global aperture construction",
            "Global aperture photometry",
            "Local aperture photometry",
            "Validate global photometry",
            "Validate local photometry",
            "Global host SED inference",
            "Local host SED inference",
        ]
        .into_iter()
        .fold(Self::new(), |catalog, name| catalog.with_task(Task::new(name)))
    }

    /// Builder method to append a stage. Duplicate names are ignored.
    pub fn with_task(mut self, task: Task) -> Self {
        if !self.contains(&task.name) {
            self.tasks.push(task);
        }
        self
    }

    /// Look up a stage by name.
    pub fn resolve(&self, name: &TaskName) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.name == name)
    }

    /// Check whether a stage is registered.
    pub fn contains(&self, name: &TaskName) -> bool {
        self.resolve(name).is_some()
    }

    /// Iterate the stages in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
