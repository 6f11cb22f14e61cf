//! Operator actions.
//!
//! These sit outside the runner's normal transitions: flagging an entry for
//! human attention, and explicitly re-admitting terminal work. Failed work
//! is never re-run without the reprocess action.

use chrono::Utc;
use tracing::info;

use astroflow_core::{status, Catalogs, TaskName, TransientName};

use crate::error::SchedulerError;
use crate::store::{RegisterStore, StoreError};

/// Flag an entry for operator attention.
pub async fn report_issue(
    store: &dyn RegisterStore,
    transient: &TransientName,
    task: &TaskName,
) -> Result<(), StoreError> {
    store.set_user_warning(transient, task, true).await?;
    info!(transient = %transient, task = %task, "issue reported");
    Ok(())
}

/// Clear a previously reported issue.
pub async fn resolve_issue(
    store: &dyn RegisterStore,
    transient: &TransientName,
    task: &TaskName,
) -> Result<(), StoreError> {
    store.set_user_warning(transient, task, false).await?;
    info!(transient = %transient, task = %task, "issue resolved");
    Ok(())
}

/// Reset a terminal entry to "not processed", re-admitting it to
/// eligibility. Rejects entries that are still "not processed" or
/// "processing". The warning flag is left as-is.
pub async fn reprocess(
    store: &dyn RegisterStore,
    catalogs: &Catalogs,
    transient: &TransientName,
    task: &TaskName,
) -> Result<(), SchedulerError> {
    let not_processed = catalogs.resolve_status(status::NOT_PROCESSED)?.clone();
    store
        .reset_entry(transient, task, not_processed, Utc::now())
        .await?;
    info!(transient = %transient, task = %task, "entry reset for reprocessing");
    Ok(())
}
