//! Clock seams.
//!
//! The runner stamps `last_modified` from a wall clock and measures
//! execution from a process-CPU clock. The recorded duration reflects
//! computation actually spent by this process, not time blocked on external
//! I/O that happens to overlap other work.

use chrono::{DateTime, Utc};
use cpu_time::ProcessTime;
use std::sync::Mutex;
use std::time::Duration;

/// Source of wall-clock timestamps.
pub trait WallClock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Source of cumulative process-CPU time.
pub trait ProcessClock: Send + Sync {
    /// CPU time consumed by this process so far.
    fn cpu_now(&self) -> Duration;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Process-CPU clock backed by the OS (clock_gettime / GetProcessTimes).
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuClock;

impl ProcessClock for CpuClock {
    fn cpu_now(&self) -> Duration {
        ProcessTime::try_now()
            .map(|t| t.as_duration())
            .unwrap_or_default()
    }
}

/// Manually advanced clock for deterministic tests. Implements both seams.
#[derive(Debug)]
pub struct ManualClock {
    wall: Mutex<DateTime<Utc>>,
    cpu: Mutex<Duration>,
}

impl ManualClock {
    /// Create a manual clock starting at the given wall time with zero CPU
    /// time consumed.
    pub fn starting_at(wall: DateTime<Utc>) -> Self {
        Self {
            wall: Mutex::new(wall),
            cpu: Mutex::new(Duration::ZERO),
        }
    }

    /// Advance the wall clock.
    pub fn advance_wall(&self, by: chrono::Duration) {
        let mut wall = self.wall.lock().unwrap();
        *wall = *wall + by;
    }

    /// Advance the CPU clock.
    pub fn advance_cpu(&self, by: Duration) {
        let mut cpu = self.cpu.lock().unwrap();
        *cpu += by;
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.wall.lock().unwrap()
    }
}

impl ProcessClock for ManualClock {
    fn cpu_now(&self) -> Duration {
        *self.cpu.lock().unwrap()
    }
}
