//! Prerequisite evaluation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use astroflow_core::{Catalogs, Prerequisites, Transient, TransientName};

use crate::error::SchedulerError;
use crate::store::RegisterStore;

/// Computes which transients currently satisfy a prerequisite declaration.
pub struct PrerequisiteEvaluator {
    catalogs: Arc<Catalogs>,
    store: Arc<dyn RegisterStore>,
}

impl PrerequisiteEvaluator {
    /// Create a new evaluator over the given catalogs and store.
    pub fn new(catalogs: Arc<Catalogs>, store: Arc<dyn RegisterStore>) -> Self {
        Self { catalogs, store }
    }

    /// The set of transients whose register entries satisfy every declared
    /// prerequisite simultaneously.
    ///
    /// Pure with respect to register contents: two calls without intervening
    /// writes return the same set. The result is unordered; ordering happens
    /// only at selection. A transient lacking an entry for a prerequisite
    /// task cannot match that pair and falls out of the intersection.
    ///
    /// Unresolvable task or status names are configuration errors - a typo
    /// in a declaration, not a transient condition.
    pub async fn find_eligible(
        &self,
        prerequisites: &Prerequisites,
    ) -> Result<Vec<Transient>, SchedulerError> {
        let universe = self.store.list_transients().await?;
        let mut candidates: HashSet<TransientName> =
            universe.iter().map(|t| t.name.clone()).collect();

        for (task, required) in prerequisites.iter() {
            self.catalogs.resolve_task(task)?;
            self.catalogs.resolve_status(required)?;

            let matching: HashSet<TransientName> = self
                .store
                .entries_for_task(task)
                .await?
                .into_iter()
                .filter(|entry| entry.status.message == required)
                .map(|entry| entry.transient)
                .collect();

            candidates.retain(|name| matching.contains(name));
            if candidates.is_empty() {
                break;
            }
        }

        debug!(
            candidates = candidates.len(),
            prerequisites = prerequisites.len(),
            "prerequisite evaluation complete"
        );

        Ok(universe
            .into_iter()
            .filter(|t| candidates.contains(&t.name))
            .collect())
    }
}
