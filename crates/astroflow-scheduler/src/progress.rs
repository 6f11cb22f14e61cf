//! Read-side aggregation over the register for reporting layers.

use std::collections::BTreeMap;

use astroflow_core::{TaskName, TransientName};

use crate::store::{RegisterStore, StoreError};

/// How far one transient has progressed through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineProgress {
    /// Register rows the transient has.
    pub total: usize,

    /// Rows in a terminal status.
    pub terminal: usize,

    /// Terminal fraction as a whole percentage.
    pub percentage: u8,
}

/// Progress of one transient: the fraction of its register entries that
/// have reached a terminal status. A transient with no rows (not yet
/// initialized) reports zero progress.
pub async fn transient_progress(
    store: &dyn RegisterStore,
    transient: &TransientName,
) -> Result<PipelineProgress, StoreError> {
    let entries = store.entries_for_transient(transient).await?;
    let total = entries.len();
    let terminal = entries.iter().filter(|e| e.status.is_terminal()).count();
    let percentage = if total == 0 {
        0
    } else {
        ((terminal as f64 / total as f64) * 100.0).round() as u8
    };
    Ok(PipelineProgress {
        total,
        terminal,
        percentage,
    })
}

/// Count of one task's register rows per status message, for dashboards and
/// metrics export. Ordered by message for stable output.
pub async fn status_counts(
    store: &dyn RegisterStore,
    task: &TaskName,
) -> Result<BTreeMap<String, usize>, StoreError> {
    let mut counts = BTreeMap::new();
    for entry in store.entries_for_task(task).await? {
        *counts.entry(entry.status.message).or_insert(0) += 1;
    }
    Ok(counts)
}
