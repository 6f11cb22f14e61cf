//! The task runner - the per-stage state machine.
//!
//! One runner exists per pipeline stage. Each `run_process` tick evaluates
//! prerequisites over the register, claims the single highest-priority
//! eligible transient, invokes the stage's domain logic under CPU-time
//! measurement, and records the terminal outcome.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use astroflow_core::{
    status, Catalogs, ConfigError, Prerequisites, Status, TaskName, Transient, TransientName,
};

use crate::clock::{CpuClock, ProcessClock, SystemWallClock, WallClock};
use crate::eligible::PrerequisiteEvaluator;
use crate::error::{SchedulerError, TaskError};
use crate::select;
use crate::store::RegisterStore;

/// Domain logic of one pipeline stage.
///
/// Implementations perform the stage's real work and classify the result as
/// a terminal status message ("processed", "failed", "no host match", ...).
/// They never mean "still processing" and never write to the register
/// themselves; all bookkeeping belongs to the runner.
#[async_trait]
pub trait TaskLogic: Send + Sync {
    /// Run the stage against one transient.
    async fn run(&self, transient: &Transient) -> Result<String, TaskError>;
}

/// The four slots in which pipeline stages differ.
pub struct RunnerSpec {
    /// Stage this runner drives.
    pub task: TaskName,

    /// Statuses required of (this and) other stages before a transient is
    /// eligible. Must include this runner's own task; the self-requirement
    /// is also the expected status of the atomic claim.
    pub prerequisites: Prerequisites,

    /// Terminal status recorded when the logic fails.
    pub failed_status: String,

    /// The stage's domain logic.
    pub logic: Arc<dyn TaskLogic>,
}

/// Outcome of one `run_process` tick.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No eligible (or claimable) transient this cycle. Normal no-op.
    Idle,

    /// One transient was processed to a terminal status.
    Processed {
        /// The transient that ran.
        transient: TransientName,
        /// The terminal status recorded.
        status: Status,
        /// Process-CPU seconds spent, rounded to two decimals.
        processing_time_seconds: f64,
    },
}

/// Drives one pipeline stage over the register.
pub struct TaskRunner {
    spec: RunnerSpec,
    /// The self-requirement, doubling as the expected status of the claim.
    claim_expected: String,
    catalogs: Arc<Catalogs>,
    store: Arc<dyn RegisterStore>,
    evaluator: PrerequisiteEvaluator,
    wall: Arc<dyn WallClock>,
    cpu: Arc<dyn ProcessClock>,
}

impl TaskRunner {
    /// Build a runner, validating the spec against the catalogs. Fails fast
    /// on any unresolvable or structurally invalid declaration.
    pub fn new(
        spec: RunnerSpec,
        catalogs: Arc<Catalogs>,
        store: Arc<dyn RegisterStore>,
    ) -> Result<Self, ConfigError> {
        Self::with_clocks(
            spec,
            catalogs,
            store,
            Arc::new(SystemWallClock),
            Arc::new(CpuClock),
        )
    }

    /// Build a runner with explicit clocks.
    pub fn with_clocks(
        spec: RunnerSpec,
        catalogs: Arc<Catalogs>,
        store: Arc<dyn RegisterStore>,
        wall: Arc<dyn WallClock>,
        cpu: Arc<dyn ProcessClock>,
    ) -> Result<Self, ConfigError> {
        validate_spec(&spec, &catalogs)?;
        let claim_expected = spec
            .prerequisites
            .status_for(&spec.task)
            .ok_or_else(|| ConfigError::MissingSelfPrerequisite(spec.task.clone()))?
            .to_owned();
        let evaluator = PrerequisiteEvaluator::new(catalogs.clone(), store.clone());
        Ok(Self {
            spec,
            claim_expected,
            catalogs,
            store,
            evaluator,
            wall,
            cpu,
        })
    }

    /// The stage this runner drives.
    pub fn task(&self) -> &TaskName {
        &self.spec.task
    }

    /// One scheduling tick.
    ///
    /// Evaluates prerequisites, claims the highest-priority eligible
    /// transient via the store's conditional update (falling through to the
    /// next candidate if a concurrent claimant wins), executes the stage
    /// logic, and records the outcome. On logic failure the runner's
    /// declared failure status is recorded and the original error is
    /// re-raised to the caller; the cadence layer owns retry and alerting.
    pub async fn run_process(&self) -> Result<RunOutcome, SchedulerError> {
        let candidates = self.evaluator.find_eligible(&self.spec.prerequisites).await?;
        if candidates.is_empty() {
            debug!(task = %self.spec.task, "no eligible transients");
            return Ok(RunOutcome::Idle);
        }

        let chosen = match self.claim_first(select::priority_order(candidates)).await? {
            Some(transient) => transient,
            None => {
                debug!(task = %self.spec.task, "all candidates claimed concurrently");
                return Ok(RunOutcome::Idle);
            }
        };

        info!(
            task = %self.spec.task,
            transient = %chosen.name,
            "processing transient"
        );

        let cpu_start = self.cpu.cpu_now();
        let result = self.spec.logic.run(&chosen).await;
        let elapsed = self.cpu.cpu_now().saturating_sub(cpu_start);
        let seconds = round_seconds(elapsed.as_secs_f64());

        match result {
            Ok(message) => self.record_return(&chosen.name, message, seconds).await,
            Err(source) => {
                self.record_failure(&chosen.name, seconds).await?;
                warn!(
                    task = %self.spec.task,
                    transient = %chosen.name,
                    error = %source,
                    "task logic failed; failure status recorded"
                );
                Err(SchedulerError::Logic {
                    task: self.spec.task.clone(),
                    transient: chosen.name,
                    source,
                })
            }
        }
    }

    /// Claim candidates in priority order; the first conditional update
    /// that takes effect wins. Exactly one entry transitions per tick.
    async fn claim_first(
        &self,
        ordered: Vec<Transient>,
    ) -> Result<Option<Transient>, SchedulerError> {
        let processing = self.catalogs.resolve_status(status::PROCESSING)?.clone();

        for candidate in ordered {
            let claimed = self
                .store
                .claim_entry(
                    &candidate.name,
                    &self.spec.task,
                    &self.claim_expected,
                    processing.clone(),
                    self.wall.now(),
                )
                .await?;
            if claimed {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Map a normal logic return onto the register. An unknown or
    /// non-terminal message is recorded as a failure and surfaced as an
    /// error, so a misbehaving stage cannot wedge an entry in "processing".
    async fn record_return(
        &self,
        transient: &TransientName,
        message: String,
        seconds: f64,
    ) -> Result<RunOutcome, SchedulerError> {
        let resolved = match self.catalogs.resolve_status(&message) {
            Ok(resolved) if resolved.is_terminal() => resolved.clone(),
            Ok(_) => {
                self.record_failure(transient, seconds).await?;
                return Err(SchedulerError::NonTerminalOutcome {
                    task: self.spec.task.clone(),
                    transient: transient.clone(),
                    status: message,
                });
            }
            Err(_) => {
                self.record_failure(transient, seconds).await?;
                return Err(SchedulerError::UnknownOutcome {
                    task: self.spec.task.clone(),
                    transient: transient.clone(),
                    status: message,
                });
            }
        };

        self.store
            .write_outcome(
                transient,
                &self.spec.task,
                resolved.clone(),
                self.wall.now(),
                seconds,
            )
            .await?;

        info!(
            task = %self.spec.task,
            transient = %transient,
            status = %resolved,
            processing_time_seconds = seconds,
            "transient processed"
        );

        Ok(RunOutcome::Processed {
            transient: transient.clone(),
            status: resolved,
            processing_time_seconds: seconds,
        })
    }

    async fn record_failure(
        &self,
        transient: &TransientName,
        seconds: f64,
    ) -> Result<(), SchedulerError> {
        let failed = self.catalogs.resolve_status(&self.spec.failed_status)?.clone();
        self.store
            .write_outcome(transient, &self.spec.task, failed, self.wall.now(), seconds)
            .await?;
        Ok(())
    }
}

/// Round to two decimal places for the register's timing column.
fn round_seconds(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

fn validate_spec(spec: &RunnerSpec, catalogs: &Catalogs) -> Result<(), ConfigError> {
    catalogs.resolve_task(&spec.task)?;

    if spec.prerequisites.is_empty() {
        return Err(ConfigError::EmptyPrerequisites(spec.task.clone()));
    }
    if !spec.prerequisites.contains(&spec.task) {
        return Err(ConfigError::MissingSelfPrerequisite(spec.task.clone()));
    }
    for (task, required) in spec.prerequisites.iter() {
        catalogs.resolve_task(task)?;
        catalogs.resolve_status(required)?;
    }

    let failed = catalogs.resolve_status(&spec.failed_status)?;
    if !failed.is_terminal() {
        return Err(ConfigError::NonTerminalFailedStatus {
            task: spec.task.clone(),
            status: spec.failed_status.clone(),
        });
    }
    Ok(())
}
