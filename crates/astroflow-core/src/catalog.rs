//! Combined catalog handle.
//!
//! Task and status catalogs are small, rarely-changing reference tables.
//! They are built once at process start, shared via `Arc`, and refreshed
//! only by rebuilding - never queried from storage per lookup.

use crate::error::ConfigError;
use crate::ids::TaskName;
use crate::status::{Status, StatusCatalog};
use crate::task::{Task, TaskCatalog};
use serde::{Deserialize, Serialize};

/// The immutable pair of reference catalogs the scheduler resolves names
/// against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalogs {
    /// Pipeline stages.
    pub tasks: TaskCatalog,

    /// Known statuses.
    pub statuses: StatusCatalog,
}

impl Catalogs {
    /// Create from explicit catalogs.
    pub fn new(tasks: TaskCatalog, statuses: StatusCatalog) -> Self {
        Self { tasks, statuses }
    }

    /// The shipped pipeline: standard stages, canonical statuses plus the
    /// stage-specific terminal outcomes.
    pub fn standard() -> Self {
        let statuses = StatusCatalog::standard()
            .with_status(Status::warning("no host match"))
            .with_status(Status::warning("not retrieved"));
        Self::new(TaskCatalog::transient_pipeline(), statuses)
    }

    /// Resolve a task name or fail with a configuration error.
    pub fn resolve_task(&self, name: &TaskName) -> Result<&Task, ConfigError> {
        self.tasks
            .resolve(name)
            .ok_or_else(|| ConfigError::UnknownTask(name.clone()))
    }

    /// Resolve a status message or fail with a configuration error.
    pub fn resolve_status(&self, message: &str) -> Result<&Status, ConfigError> {
        self.statuses
            .resolve(message)
            .ok_or_else(|| ConfigError::UnknownStatus(message.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status;

    #[test]
    fn test_standard_resolution() {
        let catalogs = Catalogs::standard();
        assert!(catalogs.resolve_task(&TaskName::new("Host match")).is_ok());
        assert!(catalogs.resolve_status(status::PROCESSED).is_ok());
        assert!(catalogs.resolve_status("no host match").is_ok());
    }

    #[test]
    fn test_unknown_names_are_config_errors() {
        let catalogs = Catalogs::standard();
        assert!(matches!(
            catalogs.resolve_task(&TaskName::new("Frobnicate")),
            Err(ConfigError::UnknownTask(_))
        ));
        assert!(matches!(
            catalogs.resolve_status("half done"),
            Err(ConfigError::UnknownStatus(_))
        ));
    }
}
