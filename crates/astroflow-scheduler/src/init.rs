//! Register initialization for newly admitted transients.

use std::sync::Arc;

use tracing::{debug, info};

use astroflow_core::{status, Catalogs, TaskRegisterEntry, TransientName};

use crate::clock::{SystemWallClock, WallClock};
use crate::error::SchedulerError;
use crate::store::RegisterStore;

/// Creates the "not processed" register rows that admit a transient to the
/// pipeline: one per catalogued task.
pub struct TaskInitializer {
    catalogs: Arc<Catalogs>,
    store: Arc<dyn RegisterStore>,
    wall: Arc<dyn WallClock>,
}

impl TaskInitializer {
    /// Create a new initializer.
    pub fn new(catalogs: Arc<Catalogs>, store: Arc<dyn RegisterStore>) -> Self {
        Self::with_clock(catalogs, store, Arc::new(SystemWallClock))
    }

    /// Create a new initializer with an explicit wall clock.
    pub fn with_clock(
        catalogs: Arc<Catalogs>,
        store: Arc<dyn RegisterStore>,
        wall: Arc<dyn WallClock>,
    ) -> Self {
        Self {
            catalogs,
            store,
            wall,
        }
    }

    /// Create one "not processed" entry per task for the transient, leaving
    /// any existing entries untouched. Safe to call repeatedly. Returns the
    /// number of rows created.
    pub async fn initialize(&self, transient: &TransientName) -> Result<usize, SchedulerError> {
        let not_processed = self.catalogs.resolve_status(status::NOT_PROCESSED)?.clone();

        let mut created = 0;
        for task in self.catalogs.tasks.iter() {
            let inserted = self
                .store
                .insert_entry_if_absent(TaskRegisterEntry::new(
                    transient.clone(),
                    task.name.clone(),
                    not_processed.clone(),
                    self.wall.now(),
                ))
                .await?;
            if inserted {
                created += 1;
            }
        }

        if created > 0 {
            info!(transient = %transient, entries = created, "register initialized");
        } else {
            debug!(transient = %transient, "already initialized");
        }
        Ok(created)
    }

    /// Initialize every admitted transient that is missing entries - the
    /// periodic "not yet initialized" pass. Returns the transients for
    /// which any row was created.
    pub async fn sweep(&self) -> Result<Vec<TransientName>, SchedulerError> {
        let mut touched = Vec::new();
        for transient in self.store.list_transients().await? {
            if self.initialize(&transient.name).await? > 0 {
                touched.push(transient.name);
            }
        }
        Ok(touched)
    }
}
