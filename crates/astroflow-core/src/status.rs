//! Processing statuses and the status catalog.
//!
//! A status is identified by its message string. The `kind` only drives
//! presentation (badge colour in a UI, log emphasis) and never scheduling
//! decisions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Message of the status every register entry starts in.
pub const NOT_PROCESSED: &str = "not processed";

/// Message of the transitional status a claimed entry holds while its task
/// logic is executing.
pub const PROCESSING: &str = "processing";

/// Message of the canonical success status.
pub const PROCESSED: &str = "processed";

/// Message of the canonical failure status.
pub const FAILED: &str = "failed";

/// Presentation category of a status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Neutral, no emphasis.
    #[default]
    Plain,
    /// Completed, but with a caveat worth surfacing (e.g. "no host match").
    Warning,
    /// Completed unsuccessfully.
    Error,
    /// Completed successfully.
    Success,
}

/// A named state of one task for one transient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// The message string. This is the status identity.
    pub message: String,

    /// Presentation category.
    pub kind: StatusKind,
}

impl Status {
    /// Create a plain status.
    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Plain,
        }
    }

    /// Create a warning status.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Warning,
        }
    }

    /// Create an error status.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Error,
        }
    }

    /// Create a success status.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Success,
        }
    }

    /// A status is terminal unless it is one of the two life-cycle states
    /// the runner itself moves entries through.
    pub fn is_terminal(&self) -> bool {
        self.message != NOT_PROCESSED && self.message != PROCESSING
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Immutable catalog of known statuses, keyed by message.
///
/// Built once at startup and shared by reference; task-specific terminal
/// statuses are registered at construction time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCatalog {
    by_message: HashMap<String, Status>,
}

impl StatusCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical four statuses every pipeline carries.
    pub fn standard() -> Self {
        Self::new()
            .with_status(Status::plain(NOT_PROCESSED))
            .with_status(Status::plain(PROCESSING))
            .with_status(Status::success(PROCESSED))
            .with_status(Status::error(FAILED))
    }

    /// Builder method to register a status. Re-registering a message
    /// replaces the previous definition.
    pub fn with_status(mut self, status: Status) -> Self {
        self.by_message.insert(status.message.clone(), status);
        self
    }

    /// Look up a status by message.
    pub fn resolve(&self, message: &str) -> Option<&Status> {
        self.by_message.get(message)
    }

    /// Check whether a message is registered.
    pub fn contains(&self, message: &str) -> bool {
        self.by_message.contains_key(message)
    }

    /// Number of registered statuses.
    pub fn len(&self) -> usize {
        self.by_message.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.by_message.is_empty()
    }
}
