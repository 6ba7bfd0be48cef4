use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;

use archivist::errors::ArchivistError;
use archivist::job::{JobRecord, SharedRecord};
use archivist::registry::{JobControl, JobTable};
use archivist::types::{BinaryKind, DuplicatePolicy};
use archivist_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn record(id: &str) -> SharedRecord {
    JobRecord::new(id, BinaryKind::Ytdlp, "true", vec![]).into_shared()
}

#[test]
fn test_allocate_id_suffixes_on_collision() -> TestResult {
    let table = JobTable::new();
    assert_eq!(table.allocate_id("v1"), "v1");

    table.register("v1", record("v1"), None)?;
    assert_eq!(table.allocate_id("v1"), "v1.0");
    assert_eq!(table.allocate_id("v1"), "v1.0");

    table.register("v1.0", record("v1.0"), None)?;
    assert_eq!(table.allocate_id("v1"), "v1.1");
    assert_eq!(table.allocate_id("v2"), "v2");
    Ok(())
}

#[test]
fn test_register_rejects_taken_id() -> TestResult {
    let table = JobTable::new();
    table.register("v1", record("v1"), None)?;

    match table.register("v1", record("v1"), None) {
        Err(ArchivistError::DuplicateJob(id)) => assert_eq!(id, "v1"),
        other => panic!("expected DuplicateJob, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_insert_new_follows_policy() -> TestResult {
    let table = JobTable::new();

    let first = table.insert_new("v1", DuplicatePolicy::Suffix, |id| (record(id), None))?;
    let second = table.insert_new("v1", DuplicatePolicy::Suffix, |id| (record(id), None))?;
    assert_eq!(first, "v1");
    assert_eq!(second, "v1.0");
    assert_eq!(table.get("v1.0").map(|r| r.lock().id().to_string()), Some("v1.0".into()));

    let rejected = table.insert_new("v1", DuplicatePolicy::Reject, |id| (record(id), None));
    assert!(matches!(rejected, Err(ArchivistError::DuplicateJob(_))));
    assert_eq!(table.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_remove_frees_id_for_reuse() -> TestResult {
    init_tracing();
    let table = JobTable::new();
    table.register("v1", record("v1"), None)?;
    table.register("v1.0", record("v1.0"), None)?;

    table.remove("v1", Duration::from_millis(100)).await?;
    assert!(!table.contains("v1"));
    assert_eq!(table.allocate_id("v1"), "v1");
    assert_eq!(table.ids(), vec!["v1.0".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_remove_unknown_id_is_not_found() {
    let table = JobTable::new();
    let res = table.remove("ghost", Duration::from_millis(100)).await;
    assert!(matches!(res, Err(ArchivistError::JobNotFound(id)) if id == "ghost"));
}

#[tokio::test]
async fn test_remove_cancels_supervision_task() -> TestResult {
    init_tracing();
    let table = JobTable::new();

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let (seen_tx, seen_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        if cancel_rx.await.is_ok() {
            let _ = seen_tx.send(());
        }
    });
    table.register("v1", record("v1"), Some(JobControl::new(cancel_tx, handle)))?;

    with_timeout(table.remove("v1", Duration::from_millis(200))).await?;

    assert!(seen_rx.await.is_ok(), "supervision task never saw the cancel");
    assert!(table.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_entry_being_removed_is_hidden_from_snapshot() -> TestResult {
    init_tracing();
    let table = Arc::new(JobTable::new());

    // A task that ignores cancellation, so removal has to wait it out.
    let (cancel_tx, _cancel_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(60)).await;
    });
    table.register("stuck", record("stuck"), Some(JobControl::new(cancel_tx, handle)))?;
    table.register("other", record("other"), None)?;

    let removal = {
        let table = Arc::clone(&table);
        tokio::spawn(async move { table.remove("stuck", Duration::from_millis(100)).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = table.snapshot();
    assert!(snapshot.contains_key("other"));
    assert!(!snapshot.contains_key("stuck"));
    assert!(table.contains("stuck"));

    // A racing second removal waits for the first one to finish.
    with_timeout(table.remove("stuck", Duration::from_millis(100))).await?;
    assert!(!table.contains("stuck"));

    with_timeout(removal).await??;
    assert!(!table.contains("stuck"));
    Ok(())
}

#[tokio::test]
async fn test_abandoned_removal_still_frees_the_id() -> TestResult {
    init_tracing();
    let table = JobTable::new();

    let (cancel_tx, _cancel_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(60)).await;
    });
    table.register("v1", record("v1"), Some(JobControl::new(cancel_tx, handle)))?;

    let abandoned = timeout(
        Duration::from_millis(50),
        table.remove("v1", Duration::from_millis(100)),
    )
    .await;
    assert!(abandoned.is_err(), "removal should still be terminating");

    with_timeout(async {
        while table.contains("v1") {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    assert_eq!(table.allocate_id("v1"), "v1");
    assert!(matches!(
        table.remove("v1", Duration::from_millis(100)).await,
        Err(ArchivistError::JobNotFound(_))
    ));
    Ok(())
}
