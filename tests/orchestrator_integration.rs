//! Integration tests for the download orchestrator against a mock HTTP
//! server: happy path, idempotent re-runs, retry bounds, permanent
//! failures, cancellation, and progress reporting.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use romgrab_core::{
    DownloadTask, Entry, EntryKind, Event, HttpTransport, Orchestrator, RetryPolicy, SkipReason,
    TaskState, event_channel,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "romgrab-tests";

fn transport() -> Arc<HttpTransport> {
    Arc::new(HttpTransport::new(Duration::from_secs(5), USER_AGENT))
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(50))
}

fn file_entry(server: &MockServer, name: &str) -> Entry {
    Entry {
        display_name: name.to_string(),
        raw_href: name.to_string(),
        kind: EntryKind::File,
        absolute_url: format!("{}/files/{name}", server.uri()),
        is_external: false,
    }
}

fn tasks_for(server: &MockServer, names: &[&str], dir: &Path) -> Vec<DownloadTask> {
    names
        .iter()
        .enumerate()
        .map(|(id, name)| DownloadTask::new(id, file_entry(server, name), dir))
        .collect()
}

#[tokio::test]
async fn batch_downloads_files_to_destination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"content a".as_slice()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"content b".as_slice()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (tx, _rx) = event_channel();
    let orchestrator = Orchestrator::new(transport(), policy(3), tx);

    let report = orchestrator
        .run(tasks_for(&server, &["a.zip", "b.zip"], dir.path()))
        .await;

    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(
        std::fs::read(dir.path().join("a.zip")).unwrap(),
        b"content a"
    );
    assert_eq!(
        std::fs::read(dir.path().join("b.zip")).unwrap(),
        b"content b"
    );
}

#[tokio::test]
async fn second_run_skips_everything_already_downloaded() {
    let server = MockServer::start().await;
    // Each file may only be requested once across both runs.
    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"content".as_slice()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();

    let (tx, _rx) = event_channel();
    let first = Orchestrator::new(transport(), policy(3), tx)
        .run(tasks_for(&server, &["a.zip"], dir.path()))
        .await;
    assert_eq!(first.summary.succeeded, 1);

    let (tx, _rx) = event_channel();
    let second = Orchestrator::new(transport(), policy(3), tx)
        .run(tasks_for(&server, &["a.zip"], dir.path()))
        .await;
    assert_eq!(second.summary.skipped, 1);
    assert_eq!(
        second.tasks[0].state,
        TaskState::Skipped(SkipReason::AlreadyExists)
    );

    server.verify().await;
}

#[tokio::test]
async fn transient_failures_retry_up_to_the_attempt_bound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/flaky.zip"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (tx, _rx) = event_channel();
    let report = Orchestrator::new(transport(), policy(3), tx)
        .run(tasks_for(&server, &["flaky.zip"], dir.path()))
        .await;

    assert!(matches!(report.tasks[0].state, TaskState::Failed { .. }));
    assert_eq!(report.tasks[0].attempts, 3);
    server.verify().await;
}

#[tokio::test]
async fn recovery_mid_retry_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/recovers.zip"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/recovers.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"finally".as_slice()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (tx, _rx) = event_channel();
    let report = Orchestrator::new(transport(), policy(3), tx)
        .run(tasks_for(&server, &["recovers.zip"], dir.path()))
        .await;

    assert_eq!(report.tasks[0].state, TaskState::Succeeded);
    assert_eq!(report.tasks[0].attempts, 3);
    assert_eq!(
        std::fs::read(dir.path().join("recovers.zip")).unwrap(),
        b"finally"
    );
}

#[tokio::test]
async fn http_404_is_permanent_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/gone.zip"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (tx, _rx) = event_channel();
    let report = Orchestrator::new(transport(), policy(3), tx)
        .run(tasks_for(&server, &["gone.zip"], dir.path()))
        .await;

    assert!(matches!(report.tasks[0].state, TaskState::Failed { .. }));
    assert_eq!(report.tasks[0].attempts, 1);
    server.verify().await;
}

#[tokio::test]
async fn one_bad_file_never_blocks_the_rest_of_the_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/bad.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/good.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fine".as_slice()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (tx, _rx) = event_channel();
    let report = Orchestrator::new(transport(), policy(1), tx)
        .run(tasks_for(&server, &["bad.zip", "good.zip"], dir.path()))
        .await;

    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.succeeded, 1);
    assert!(dir.path().join("good.zip").exists());
}

#[tokio::test]
async fn cancellation_mid_batch_marks_remaining_tasks_cancelled() {
    let server = MockServer::start().await;
    for name in ["t1.zip", "t2.zip"] {
        Mock::given(method("GET"))
            .and(path(format!("/files/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".as_slice()))
            .mount(&server)
            .await;
    }
    // Task 3 always fails transiently, parking the orchestrator in its
    // retry delay, which is the cancellation boundary under test.
    Mock::given(method("GET"))
        .and(path("/files/t3.zip"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (tx, mut rx) = event_channel();
    let orchestrator = Orchestrator::new(
        transport(),
        RetryPolicy::new(3, Duration::from_secs(2)),
        tx,
    );
    let cancel = orchestrator.cancel_flag();

    // Flip the flag as soon as the second task reports its outcome; task 3
    // then stops at its first retry boundary and 4-5 are never started.
    let watcher = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Event::DownloadOutcome { task_id: 1, .. } = event {
                cancel.store(true, Ordering::SeqCst);
                break;
            }
        }
    });

    let report = orchestrator
        .run(tasks_for(
            &server,
            &["t1.zip", "t2.zip", "t3.zip", "t4.zip", "t5.zip"],
            dir.path(),
        ))
        .await;
    watcher.await.unwrap();

    assert_eq!(report.tasks[0].state, TaskState::Succeeded);
    assert_eq!(report.tasks[1].state, TaskState::Succeeded);
    for task in &report.tasks[2..] {
        assert_eq!(
            task.state,
            TaskState::Cancelled,
            "task {} should be cancelled, not pending or failed",
            task.id
        );
    }
}

#[tokio::test]
async fn progress_events_are_monotonic_and_finish_at_total() {
    let server = MockServer::start().await;
    let body = vec![7u8; 64 * 1024];
    Mock::given(method("GET"))
        .and(path("/files/big.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (tx, mut rx) = event_channel();
    let report = Orchestrator::new(transport(), policy(1), tx)
        .run(tasks_for(&server, &["big.zip"], dir.path()))
        .await;
    assert_eq!(report.summary.succeeded, 1);

    let mut progress = Vec::new();
    let mut saw_outcome = false;
    let mut saw_batch_complete = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::DownloadProgress { bytes, total, .. } => progress.push((bytes, total)),
            Event::DownloadOutcome { state, .. } => {
                assert_eq!(state, TaskState::Succeeded);
                saw_outcome = true;
            }
            Event::BatchComplete(summary) => {
                assert_eq!(summary.succeeded, 1);
                saw_batch_complete = true;
            }
            Event::ListingUpdated(_) | Event::NavigationError { .. } => {}
        }
    }

    assert!(saw_outcome);
    assert!(saw_batch_complete);
    assert!(!progress.is_empty());
    assert!(
        progress.windows(2).all(|w| w[0].0 <= w[1].0),
        "byte counts must be non-decreasing"
    );
    let total = body.len() as u64;
    assert_eq!(progress.last().copied(), Some((total, Some(total))));
}
