//! End-to-end scenarios over a two-stage pipeline: cutout download feeding
//! host matching, driven the way the periodic workers drive production.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use astroflow_core::{
    status, Catalogs, Prerequisites, Status, StatusCatalog, Task, TaskCatalog, TaskName, Transient,
    TransientName,
};
use astroflow_scheduler::{
    actions, transient_progress, MemoryStore, RegisterStore, RunOutcome, RunnerSpec,
    SchedulerError, TaskError, TaskInitializer, TaskLogic, TaskRunner,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();
}

struct StaticOutcome(Result<&'static str, &'static str>);

#[async_trait]
impl TaskLogic for StaticOutcome {
    async fn run(&self, _transient: &Transient) -> Result<String, TaskError> {
        match self.0 {
            Ok(message) => Ok(message.to_owned()),
            Err(error) => Err(error.into()),
        }
    }
}

fn catalogs() -> Arc<Catalogs> {
    Arc::new(Catalogs::new(
        TaskCatalog::new()
            .with_task(Task::new("Cutout download"))
            .with_task(Task::new("Host match")),
        StatusCatalog::standard().with_status(Status::warning("no host match")),
    ))
}

fn cutout_runner(
    catalogs: Arc<Catalogs>,
    store: Arc<MemoryStore>,
    outcome: Result<&'static str, &'static str>,
) -> TaskRunner {
    TaskRunner::new(
        RunnerSpec {
            task: TaskName::new("Cutout download"),
            prerequisites: Prerequisites::new().require("Cutout download", status::NOT_PROCESSED),
            failed_status: status::FAILED.into(),
            logic: Arc::new(StaticOutcome(outcome)),
        },
        catalogs,
        store,
    )
    .unwrap()
}

fn host_match_runner(
    catalogs: Arc<Catalogs>,
    store: Arc<MemoryStore>,
    outcome: Result<&'static str, &'static str>,
) -> TaskRunner {
    TaskRunner::new(
        RunnerSpec {
            task: TaskName::new("Host match"),
            prerequisites: Prerequisites::new()
                .require("Host match", status::NOT_PROCESSED)
                .require("Cutout download", status::PROCESSED),
            failed_status: status::FAILED.into(),
            logic: Arc::new(StaticOutcome(outcome)),
        },
        catalogs,
        store,
    )
    .unwrap()
}

async fn admit(store: &Arc<MemoryStore>, name: &str, day: u32) {
    store
        .admit(
            Transient::new(name)
                .with_public_timestamp(Utc.with_ymd_and_hms(2023, 1, day, 0, 0, 0).unwrap()),
        )
        .await
        .unwrap();
}

async fn status_of(store: &Arc<MemoryStore>, name: &str, task: &str) -> String {
    store
        .entry(&TransientName::new(name), &TaskName::new(task))
        .await
        .unwrap()
        .unwrap()
        .status
        .message
}

#[tokio::test]
async fn test_pipeline_converges_stage_by_stage() {
    init_tracing();
    let catalogs = catalogs();
    let store = MemoryStore::new();
    admit(&store, "2023aaa", 1).await;

    let initializer = TaskInitializer::new(catalogs.clone(), store.clone());
    initializer.sweep().await.unwrap();

    let host_match = host_match_runner(catalogs.clone(), store.clone(), Ok(status::PROCESSED));
    let cutout = cutout_runner(catalogs.clone(), store.clone(), Ok(status::PROCESSED));

    // Host match is gated on the cutout stage: nothing to do yet.
    assert_eq!(host_match.run_process().await.unwrap(), RunOutcome::Idle);

    // The cutout stage runs, unblocking host matching.
    assert!(matches!(
        cutout.run_process().await.unwrap(),
        RunOutcome::Processed { .. }
    ));
    assert_eq!(status_of(&store, "2023aaa", "Cutout download").await, status::PROCESSED);

    assert!(matches!(
        host_match.run_process().await.unwrap(),
        RunOutcome::Processed { .. }
    ));
    assert_eq!(status_of(&store, "2023aaa", "Host match").await, status::PROCESSED);

    let progress = transient_progress(store.as_ref(), &TransientName::new("2023aaa"))
        .await
        .unwrap();
    assert_eq!(progress.percentage, 100);

    // Everything terminal: further ticks are no-ops.
    assert_eq!(cutout.run_process().await.unwrap(), RunOutcome::Idle);
    assert_eq!(host_match.run_process().await.unwrap(), RunOutcome::Idle);
}

#[tokio::test]
async fn test_one_tick_processes_only_the_oldest() {
    let catalogs = catalogs();
    let store = MemoryStore::new();
    admit(&store, "2023bbb", 5).await;
    admit(&store, "2023aaa", 1).await;

    TaskInitializer::new(catalogs.clone(), store.clone())
        .sweep()
        .await
        .unwrap();

    let cutout = cutout_runner(catalogs, store.clone(), Ok(status::PROCESSED));
    match cutout.run_process().await.unwrap() {
        RunOutcome::Processed { transient, .. } => assert_eq!(transient.as_str(), "2023aaa"),
        other => panic!("expected Processed, got {:?}", other),
    }

    assert_eq!(status_of(&store, "2023aaa", "Cutout download").await, status::PROCESSED);
    assert_eq!(status_of(&store, "2023bbb", "Cutout download").await, status::NOT_PROCESSED);
}

#[tokio::test]
async fn test_gating_ignores_own_stage_readiness_of_unready_items() {
    let catalogs = catalogs();
    let store = MemoryStore::new();
    admit(&store, "2023aaa", 1).await;
    admit(&store, "2023bbb", 2).await;

    TaskInitializer::new(catalogs.clone(), store.clone())
        .sweep()
        .await
        .unwrap();

    // One cutout tick processes the oldest transient, 2023aaa.
    let cutout = cutout_runner(catalogs.clone(), store.clone(), Ok(status::PROCESSED));
    cutout.run_process().await.unwrap();

    // 2023aaa's cutout is now processed; 2023bbb's is not. Host match must
    // pick 2023aaa and never touch 2023bbb regardless of 2023bbb's
    // own-entry status.
    let host_match = host_match_runner(catalogs, store.clone(), Ok("no host match"));
    match host_match.run_process().await.unwrap() {
        RunOutcome::Processed { transient, status, .. } => {
            assert_eq!(transient.as_str(), "2023aaa");
            assert_eq!(status.message, "no host match");
        }
        other => panic!("expected Processed, got {:?}", other),
    }
    assert_eq!(status_of(&store, "2023bbb", "Host match").await, status::NOT_PROCESSED);
}

#[tokio::test]
async fn test_failure_reprocess_cycle() {
    let catalogs = catalogs();
    let store = MemoryStore::new();
    admit(&store, "2023aaa", 1).await;

    TaskInitializer::new(catalogs.clone(), store.clone())
        .sweep()
        .await
        .unwrap();

    let failing = cutout_runner(catalogs.clone(), store.clone(), Err("survey API timeout"));
    let error = failing.run_process().await.unwrap_err();
    assert!(matches!(error, SchedulerError::Logic { .. }));
    assert_eq!(status_of(&store, "2023aaa", "Cutout download").await, status::FAILED);

    // Failed work stays failed until an operator re-admits it.
    assert_eq!(failing.run_process().await.unwrap(), RunOutcome::Idle);

    actions::reprocess(
        store.as_ref(),
        &catalogs,
        &TransientName::new("2023aaa"),
        &TaskName::new("Cutout download"),
    )
    .await
    .unwrap();

    let succeeding = cutout_runner(catalogs, store.clone(), Ok(status::PROCESSED));
    assert!(matches!(
        succeeding.run_process().await.unwrap(),
        RunOutcome::Processed { .. }
    ));
    assert_eq!(status_of(&store, "2023aaa", "Cutout download").await, status::PROCESSED);
}

#[tokio::test]
async fn test_snapshot_restore_resumes_pipeline() {
    let catalogs = catalogs();
    let store = MemoryStore::new();
    admit(&store, "2023aaa", 1).await;

    TaskInitializer::new(catalogs.clone(), store.clone())
        .sweep()
        .await
        .unwrap();
    cutout_runner(catalogs.clone(), store.clone(), Ok(status::PROCESSED))
        .run_process()
        .await
        .unwrap();

    // Process restart: carry the register over as a snapshot document.
    let snapshot = store.snapshot().await;
    let restored = MemoryStore::from_snapshot(snapshot);

    let host_match = host_match_runner(catalogs, restored.clone(), Ok(status::PROCESSED));
    assert!(matches!(
        host_match.run_process().await.unwrap(),
        RunOutcome::Processed { .. }
    ));
    assert_eq!(status_of(&restored, "2023aaa", "Host match").await, status::PROCESSED);
}
