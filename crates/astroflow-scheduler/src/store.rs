//! The register store seam and the in-memory reference implementation.
//!
//! The store is the only shared mutable resource in the scheduling core.
//! Every trait method is one atomic step against the backing storage;
//! `claim_entry` in particular is the single conditional update that gives a
//! runner ownership of an entry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use astroflow_core::{Status, TaskName, TaskRegisterEntry, Transient, TransientName};

/// Register store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Operation referenced a transient the store has never admitted.
    #[error("Transient not found: {0}")]
    UnknownTransient(TransientName),

    /// A transient with this name was already admitted.
    #[error("Transient already admitted: {0}")]
    DuplicateTransient(TransientName),

    /// No register entry exists for the pair. The scheduler treats this as
    /// a fatal precondition violation - the initializer was not run.
    #[error("No register entry for transient '{transient}', task '{task}'")]
    MissingEntry {
        transient: TransientName,
        task: TaskName,
    },

    /// Reset was attempted on an entry that is not in a terminal status.
    #[error("Entry for transient '{transient}', task '{task}' is '{status}', not terminal")]
    NotTerminal {
        transient: TransientName,
        task: TaskName,
        status: String,
    },

    /// Backing storage failed. Only produced by external implementations.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Persistent view of the task register.
///
/// Implementations must guarantee that each method executes atomically with
/// respect to the others and that state survives process restarts.
#[async_trait]
pub trait RegisterStore: Send + Sync {
    /// Admit a new transient. Fails on a duplicate name.
    async fn admit(&self, transient: Transient) -> Result<(), StoreError>;

    /// Remove a transient and cascade-delete its register entries.
    async fn remove_transient(&self, name: &TransientName) -> Result<(), StoreError>;

    /// All admitted transients, in unspecified order.
    async fn list_transients(&self) -> Result<Vec<Transient>, StoreError>;

    /// One register row, if present.
    async fn entry(
        &self,
        transient: &TransientName,
        task: &TaskName,
    ) -> Result<Option<TaskRegisterEntry>, StoreError>;

    /// All rows of one transient.
    async fn entries_for_transient(
        &self,
        transient: &TransientName,
    ) -> Result<Vec<TaskRegisterEntry>, StoreError>;

    /// All rows of one task column.
    async fn entries_for_task(&self, task: &TaskName)
        -> Result<Vec<TaskRegisterEntry>, StoreError>;

    /// Insert a row unless one already exists for its (transient, task)
    /// pair. Returns whether a row was created. The transient must have
    /// been admitted.
    async fn insert_entry_if_absent(&self, entry: TaskRegisterEntry) -> Result<bool, StoreError>;

    /// The atomic claim: move the row to `processing` and stamp
    /// `last_modified`, but only if its status message currently equals
    /// `expected`. Returns whether the claim took effect; `false` means a
    /// concurrent claimant won. A missing row is an error, not a failed
    /// claim.
    async fn claim_entry(
        &self,
        transient: &TransientName,
        task: &TaskName,
        expected: &str,
        processing: Status,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Record an execution outcome: terminal status, `last_modified`, and
    /// the processing-time measurement, in one write.
    async fn write_outcome(
        &self,
        transient: &TransientName,
        task: &TaskName,
        status: Status,
        now: DateTime<Utc>,
        processing_seconds: f64,
    ) -> Result<(), StoreError>;

    /// Set or clear the operator-facing warning flag. Does not touch the
    /// status or timestamps.
    async fn set_user_warning(
        &self,
        transient: &TransientName,
        task: &TaskName,
        value: bool,
    ) -> Result<(), StoreError>;

    /// Reset a terminal row to the given status (normally "not processed"),
    /// stamping `last_modified`. Rejects rows that are not terminal.
    async fn reset_entry(
        &self,
        transient: &TransientName,
        task: &TaskName,
        status: Status,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    transients: HashMap<TransientName, Transient>,
    entries: HashMap<(TransientName, TaskName), TaskRegisterEntry>,
}

/// In-memory reference store.
///
/// A single `RwLock` over both maps; every trait method takes the lock once,
/// which makes each call atomic. Use [`MemoryStore::snapshot`] to capture
/// state for persistence and [`MemoryStore::from_snapshot`] to restore it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store wrapped in Arc.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Capture the full store state as a serializable document.
    pub async fn snapshot(&self) -> RegisterSnapshot {
        let inner = self.inner.read().await;
        let mut transients: Vec<Transient> = inner.transients.values().cloned().collect();
        transients.sort_by(|a, b| a.name.cmp(&b.name));
        let mut entries: Vec<TaskRegisterEntry> = inner.entries.values().cloned().collect();
        entries.sort_by(|a, b| (&a.transient, &a.task).cmp(&(&b.transient, &b.task)));
        RegisterSnapshot {
            transients,
            entries,
        }
    }

    /// Rebuild a store from a snapshot.
    pub fn from_snapshot(snapshot: RegisterSnapshot) -> Arc<Self> {
        let mut inner = Inner::default();
        for transient in snapshot.transients {
            inner.transients.insert(transient.name.clone(), transient);
        }
        for entry in snapshot.entries {
            inner
                .entries
                .insert((entry.transient.clone(), entry.task.clone()), entry);
        }
        Arc::new(Self {
            inner: RwLock::new(inner),
        })
    }
}

/// Serializable capture of the reference store's state, used to carry the
/// register across restarts with any bytes-shaped storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSnapshot {
    /// Admitted transients, name-ordered.
    pub transients: Vec<Transient>,

    /// Register rows, (transient, task)-ordered.
    pub entries: Vec<TaskRegisterEntry>,
}

#[async_trait]
impl RegisterStore for MemoryStore {
    async fn admit(&self, transient: Transient) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.transients.contains_key(&transient.name) {
            return Err(StoreError::DuplicateTransient(transient.name));
        }
        inner.transients.insert(transient.name.clone(), transient);
        Ok(())
    }

    async fn remove_transient(&self, name: &TransientName) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.transients.remove(name).is_none() {
            return Err(StoreError::UnknownTransient(name.clone()));
        }
        inner.entries.retain(|(transient, _), _| transient != name);
        Ok(())
    }

    async fn list_transients(&self) -> Result<Vec<Transient>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.transients.values().cloned().collect())
    }

    async fn entry(
        &self,
        transient: &TransientName,
        task: &TaskName,
    ) -> Result<Option<TaskRegisterEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .get(&(transient.clone(), task.clone()))
            .cloned())
    }

    async fn entries_for_transient(
        &self,
        transient: &TransientName,
    ) -> Result<Vec<TaskRegisterEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .values()
            .filter(|entry| &entry.transient == transient)
            .cloned()
            .collect())
    }

    async fn entries_for_task(
        &self,
        task: &TaskName,
    ) -> Result<Vec<TaskRegisterEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .values()
            .filter(|entry| &entry.task == task)
            .cloned()
            .collect())
    }

    async fn insert_entry_if_absent(&self, entry: TaskRegisterEntry) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.transients.contains_key(&entry.transient) {
            return Err(StoreError::UnknownTransient(entry.transient));
        }
        let key = (entry.transient.clone(), entry.task.clone());
        if inner.entries.contains_key(&key) {
            return Ok(false);
        }
        inner.entries.insert(key, entry);
        Ok(true)
    }

    async fn claim_entry(
        &self,
        transient: &TransientName,
        task: &TaskName,
        expected: &str,
        processing: Status,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .entries
            .get_mut(&(transient.clone(), task.clone()))
            .ok_or_else(|| StoreError::MissingEntry {
                transient: transient.clone(),
                task: task.clone(),
            })?;
        if entry.status.message != expected {
            return Ok(false);
        }
        entry.set_status(processing, now);
        Ok(true)
    }

    async fn write_outcome(
        &self,
        transient: &TransientName,
        task: &TaskName,
        status: Status,
        now: DateTime<Utc>,
        processing_seconds: f64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .entries
            .get_mut(&(transient.clone(), task.clone()))
            .ok_or_else(|| StoreError::MissingEntry {
                transient: transient.clone(),
                task: task.clone(),
            })?;
        entry.record_outcome(status, now, processing_seconds);
        Ok(())
    }

    async fn set_user_warning(
        &self,
        transient: &TransientName,
        task: &TaskName,
        value: bool,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .entries
            .get_mut(&(transient.clone(), task.clone()))
            .ok_or_else(|| StoreError::MissingEntry {
                transient: transient.clone(),
                task: task.clone(),
            })?;
        entry.user_warning = value;
        Ok(())
    }

    async fn reset_entry(
        &self,
        transient: &TransientName,
        task: &TaskName,
        status: Status,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .entries
            .get_mut(&(transient.clone(), task.clone()))
            .ok_or_else(|| StoreError::MissingEntry {
                transient: transient.clone(),
                task: task.clone(),
            })?;
        if !entry.status.is_terminal() {
            return Err(StoreError::NotTerminal {
                transient: transient.clone(),
                task: task.clone(),
                status: entry.status.message.clone(),
            });
        }
        entry.set_status(status, now);
        Ok(())
    }
}
