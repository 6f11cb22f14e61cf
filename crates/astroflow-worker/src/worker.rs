//! The periodic driver.
//!
//! One `TaskWorker` wraps one runner and ticks it on a cadence, the way the
//! production deployment triggers each stage. Ticks never overlap within a
//! worker; concurrency across stages (and across replicas of the same
//! stage) is safe because claims are atomic at the store.
//!
//! This is also the retry/alerting boundary: domain failures re-raised by
//! `run_process` are logged here and the loop keeps ticking. The register
//! already reflects them.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use astroflow_scheduler::{RunOutcome, SchedulerError, TaskRunner};

use crate::config::WorkerConfig;

/// Periodically ticks one task runner until shut down.
pub struct TaskWorker {
    runner: Arc<TaskRunner>,
    config: WorkerConfig,
}

impl TaskWorker {
    /// Create a new worker.
    pub fn new(runner: Arc<TaskRunner>, config: WorkerConfig) -> Self {
        Self { runner, config }
    }

    /// Run until the shutdown signal flips to `true`. The pending sleep is
    /// abandoned on shutdown; an in-flight tick always completes so the
    /// register is never left with a dangling "processing" claim.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(task = %self.runner.task(), "worker started");
        loop {
            let delay = match self.tick().await {
                Ok(RunOutcome::Idle) => self.config.idle_interval,
                _ => self.config.poll_interval,
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(task = %self.runner.task(), "worker stopped");
    }

    /// Spawn the worker onto the current runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn tick(&self) -> Result<RunOutcome, SchedulerError> {
        let result = self.runner.run_process().await;
        match &result {
            Ok(RunOutcome::Idle) => {
                debug!(task = %self.runner.task(), "idle tick");
            }
            Ok(RunOutcome::Processed {
                transient,
                status,
                processing_time_seconds,
            }) => {
                info!(
                    task = %self.runner.task(),
                    transient = %transient,
                    status = %status,
                    processing_time_seconds,
                    "tick processed transient"
                );
            }
            Err(error) => {
                warn!(
                    task = %self.runner.task(),
                    error = %error,
                    "tick failed; continuing"
                );
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use astroflow_core::{
        status, Catalogs, Prerequisites, TaskName, Transient, TransientName,
    };
    use astroflow_scheduler::{
        MemoryStore, RegisterStore, RunnerSpec, TaskError, TaskInitializer, TaskLogic,
    };

    struct StaticLogic {
        outcome: &'static str,
    }

    #[async_trait]
    impl TaskLogic for StaticLogic {
        async fn run(&self, _transient: &Transient) -> Result<String, TaskError> {
            Ok(self.outcome.to_owned())
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();
    }

    fn fast_config() -> WorkerConfig {
        WorkerConfig::default()
            .with_poll_interval(Duration::from_millis(5))
            .with_idle_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_worker_drains_pending_work_and_stops() {
        init_tracing();
        let catalogs = Arc::new(Catalogs::standard());
        let store = MemoryStore::new();
        for name in ["2023aaa", "2023bbb"] {
            store.admit(Transient::new(name)).await.unwrap();
        }
        TaskInitializer::new(catalogs.clone(), store.clone())
            .sweep()
            .await
            .unwrap();

        let runner = Arc::new(
            TaskRunner::new(
                RunnerSpec {
                    task: TaskName::new("Cutout download"),
                    prerequisites: Prerequisites::new()
                        .require("Cutout download", status::NOT_PROCESSED),
                    failed_status: status::FAILED.into(),
                    logic: Arc::new(StaticLogic {
                        outcome: status::PROCESSED,
                    }),
                },
                catalogs,
                store.clone(),
            )
            .unwrap(),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = TaskWorker::new(runner, fast_config()).spawn(shutdown_rx);

        // Two pending transients, one claim per tick: give the worker a few
        // cycles to drain both.
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        for name in ["2023aaa", "2023bbb"] {
            let entry = store
                .entry(&TransientName::new(name), &TaskName::new("Cutout download"))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(entry.status.message, status::PROCESSED);
        }
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_idle_wait() {
        let catalogs = Arc::new(Catalogs::standard());
        let store = MemoryStore::new();

        let runner = Arc::new(
            TaskRunner::new(
                RunnerSpec {
                    task: TaskName::new("Cutout download"),
                    prerequisites: Prerequisites::new()
                        .require("Cutout download", status::NOT_PROCESSED),
                    failed_status: status::FAILED.into(),
                    logic: Arc::new(StaticLogic {
                        outcome: status::PROCESSED,
                    }),
                },
                catalogs,
                store,
            )
            .unwrap(),
        );

        // A long idle interval: shutdown must not wait for it to elapse.
        let config = WorkerConfig::default()
            .with_poll_interval(Duration::from_millis(5))
            .with_idle_interval(Duration::from_secs(3600));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = TaskWorker::new(runner, config).spawn(shutdown_rx);

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker did not stop promptly")
            .unwrap();
    }
}
