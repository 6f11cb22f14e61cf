//! Astroflow Worker
//!
//! Cadence layer for the scheduling core: wraps each
//! [`astroflow_scheduler::TaskRunner`] in a periodic loop with a shutdown
//! signal. Deployments run one worker per pipeline stage (replicas are
//! safe - entry claims are atomic at the store).

pub mod config;
pub mod worker;

pub use config::WorkerConfig;
pub use worker::TaskWorker;
