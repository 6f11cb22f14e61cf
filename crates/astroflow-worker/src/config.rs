//! Worker configuration.

use std::time::Duration;

/// Cadence settings for one periodic worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Delay between ticks that found work.
    pub poll_interval: Duration,

    /// Delay after an idle tick. Defaults to the poll interval; raise it to
    /// keep quiet stages from hammering the store.
    pub idle_interval: Duration,
}

impl WorkerConfig {
    /// Builder method to set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builder method to set the idle interval.
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            idle_interval: Duration::from_secs(30),
        }
    }
}
