//! Newtype wrappers for identifiers to ensure type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique name of a transient (the survey designation, e.g. "2022abc").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransientName(String);

impl TransientName {
    /// Create a new TransientName from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TransientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TransientName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TransientName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Unique name of a pipeline stage (e.g. "Host match").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskName(String);

impl TaskName {
    /// Create a new TaskName from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_display() {
        let name = TransientName::new("2022abc");
        assert_eq!(format!("{}", name), "2022abc");
    }

    #[test]
    fn test_name_equality_is_by_value() {
        assert_eq!(TaskName::new("Host match"), TaskName::from("Host match"));
        assert_ne!(TaskName::new("Host match"), TaskName::new("Cutout download"));
    }
}
