//! The work item carried through the pipeline.

use crate::ids::TransientName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An astronomical transient being processed end-to-end.
///
/// The scheduler reads only the name and the priority timestamp; the payload
/// is opaque and passed through to task logic untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transient {
    /// Survey designation. This is the transient identity.
    pub name: TransientName,

    /// Time the event was made public, used only for priority ordering.
    /// Absent for events ingested without one; those sort after all
    /// timestamped transients.
    pub public_timestamp: Option<DateTime<Utc>>,

    /// Domain payload for task logic (coordinates, survey metadata, ...).
    pub payload: serde_json::Value,
}

impl Transient {
    /// Create a new Transient with no timestamp and an empty payload.
    pub fn new(name: impl Into<TransientName>) -> Self {
        Self {
            name: name.into(),
            public_timestamp: None,
            payload: serde_json::Value::Null,
        }
    }

    /// Builder method to set the priority timestamp.
    pub fn with_public_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.public_timestamp = Some(at);
        self
    }

    /// Builder method to set the domain payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
