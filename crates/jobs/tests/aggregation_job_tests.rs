use ferrous_feed_application::services::StatusBoard;
use ferrous_feed_domain::Source;
use ferrous_feed_jobs::{AggregationJob, SourceReport};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

mod helpers;
use helpers::{
    failed_report, fresh_report, make_board, make_cycle, make_source, unchanged_report, wait_for,
    MockFeedPublisher,
};

fn job(
    publisher: Arc<MockFeedPublisher>,
    sources: &[Source],
    token: CancellationToken,
) -> (mpsc::Sender<SourceReport>, Arc<StatusBoard>, AggregationJob) {
    let (tx, rx) = mpsc::channel(16);
    let board = make_board(sources);
    let job = AggregationJob::new(make_cycle(publisher), board.clone(), rx, sources)
        .with_batch_window(Duration::from_millis(50))
        .with_startup_grace(Duration::from_secs(5))
        .with_cancellation(token);
    (tx, board, job)
}

// ============================================================================
// Initial round
// ============================================================================

#[tokio::test]
async fn test_first_cycle_waits_for_all_sources() {
    // Arrange
    let sources = vec![make_source("A", true), make_source("B", true)];
    let publisher = Arc::new(MockFeedPublisher::new());
    let token = CancellationToken::new();
    let (tx, _board, job) = job(publisher.clone(), &sources, token.clone());
    job.start();

    // Act
    tx.send(fresh_report(0, &sources[0], &["evil.com"])).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    let before_b = publisher.generation();
    tx.send(fresh_report(1, &sources[1], &["ads.com"])).await.unwrap();

    // Assert
    assert_eq!(before_b, None);
    assert!(wait_for(|| publisher.generation() == Some(1)).await);
    assert_eq!(publisher.lines(), vec!["ads.com", "evil.com"]);
    token.cancel();
}

#[tokio::test]
async fn test_startup_grace_bounds_initial_wait() {
    // Arrange
    let sources = vec![make_source("A", true), make_source("B", true)];
    let publisher = Arc::new(MockFeedPublisher::new());
    let (tx, rx) = mpsc::channel(16);
    let token = CancellationToken::new();
    AggregationJob::new(make_cycle(publisher.clone()), make_board(&sources), rx, &sources)
        .with_startup_grace(Duration::from_millis(100))
        .with_cancellation(token.clone())
        .start();

    // Act: B never reports
    tx.send(fresh_report(0, &sources[0], &["evil.com"])).await.unwrap();

    // Assert
    assert!(wait_for(|| publisher.generation() == Some(1)).await);
    assert_eq!(publisher.lines(), vec!["evil.com"]);
    token.cancel();
}

// ============================================================================
// Batching
// ============================================================================

#[tokio::test]
async fn test_reports_within_window_fold_into_one_cycle() {
    // Arrange
    let sources = vec![make_source("A", true), make_source("B", true)];
    let publisher = Arc::new(MockFeedPublisher::new());
    let token = CancellationToken::new();
    let (tx, board, job) = job(publisher.clone(), &sources, token.clone());
    job.start();
    tx.send(fresh_report(0, &sources[0], &["a.com"])).await.unwrap();
    tx.send(fresh_report(1, &sources[1], &["b.com"])).await.unwrap();
    assert!(wait_for(|| publisher.generation() == Some(1)).await);

    // Act
    tx.send(fresh_report(0, &sources[0], &["a2.com"])).await.unwrap();
    tx.send(fresh_report(1, &sources[1], &["b2.com"])).await.unwrap();
    sleep(Duration::from_millis(300)).await;

    // Assert
    assert_eq!(publisher.generation(), Some(2));
    assert_eq!(publisher.lines(), vec!["a2.com", "b2.com"]);
    assert_eq!(board.cycle().cycles, 2);
    token.cancel();
}

#[tokio::test]
async fn test_unchanged_reuses_previous_entries() {
    let sources = vec![make_source("A", true)];
    let publisher = Arc::new(MockFeedPublisher::new());
    let token = CancellationToken::new();
    let (tx, _board, job) = job(publisher.clone(), &sources, token.clone());
    job.start();

    tx.send(fresh_report(0, &sources[0], &["evil.com"])).await.unwrap();
    assert!(wait_for(|| publisher.generation() == Some(1)).await);
    tx.send(unchanged_report(0)).await.unwrap();

    assert!(wait_for(|| publisher.generation() == Some(2)).await);
    assert_eq!(publisher.lines(), vec!["evil.com"]);
    token.cancel();
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_blackout_keeps_published_generation() {
    // Arrange
    let sources = vec![make_source("A", true), make_source("B", true)];
    let publisher = Arc::new(MockFeedPublisher::new());
    let token = CancellationToken::new();
    let (tx, board, job) = job(publisher.clone(), &sources, token.clone());
    job.start();
    tx.send(fresh_report(0, &sources[0], &["a.com"])).await.unwrap();
    tx.send(fresh_report(1, &sources[1], &["b.com"])).await.unwrap();
    assert!(wait_for(|| publisher.generation() == Some(1)).await);

    // Act
    tx.send(failed_report(0)).await.unwrap();
    tx.send(failed_report(1)).await.unwrap();

    // Assert
    assert!(wait_for(|| board.cycle().blackouts == 1).await);
    assert_eq!(publisher.generation(), Some(1));
    assert_eq!(publisher.lines(), vec!["a.com", "b.com"]);
    token.cancel();
}

#[tokio::test]
async fn test_degrading_source_retained_for_exactly_one_cycle() {
    // Arrange
    let sources = vec![make_source("A", true), make_source("B", true)];
    let publisher = Arc::new(MockFeedPublisher::new());
    let token = CancellationToken::new();
    let (tx, _board, job) = job(publisher.clone(), &sources, token.clone());
    job.start();
    tx.send(fresh_report(0, &sources[0], &["a.com"])).await.unwrap();
    tx.send(fresh_report(1, &sources[1], &["b.com"])).await.unwrap();
    assert!(wait_for(|| publisher.generation() == Some(1)).await);

    // Act: B fails, then A refreshes twice
    tx.send(failed_report(1)).await.unwrap();
    assert!(wait_for(|| publisher.generation() == Some(2)).await);
    let retained = publisher.lines();

    tx.send(fresh_report(0, &sources[0], &["a.com"])).await.unwrap();
    assert!(wait_for(|| publisher.generation() == Some(3)).await);

    // Assert
    assert_eq!(retained, vec!["a.com", "b.com"]);
    assert_eq!(publisher.lines(), vec!["a.com"]);
    token.cancel();
}

#[tokio::test]
async fn test_degrading_source_keeps_domain_first_claimed_by_failed_strict_source() {
    // Arrange
    let sources = vec![
        make_source("A", false),
        make_source("B", true),
        make_source("C", true),
    ];
    let publisher = Arc::new(MockFeedPublisher::new());
    let token = CancellationToken::new();
    let (tx, _board, job) = job(publisher.clone(), &sources, token.clone());
    job.start();
    tx.send(fresh_report(0, &sources[0], &["shared.com"])).await.unwrap();
    tx.send(fresh_report(1, &sources[1], &["shared.com", "b.com"])).await.unwrap();
    tx.send(fresh_report(2, &sources[2], &["c.com"])).await.unwrap();
    assert!(wait_for(|| publisher.generation() == Some(1)).await);

    // Act
    tx.send(failed_report(0)).await.unwrap();
    tx.send(failed_report(1)).await.unwrap();

    // Assert
    assert!(wait_for(|| publisher.generation() == Some(2)).await);
    assert_eq!(publisher.lines(), vec!["b.com", "c.com", "shared.com"]);
    token.cancel();
}

#[tokio::test]
async fn test_strict_source_dropped_immediately() {
    let sources = vec![make_source("A", true), make_source("B", false)];
    let publisher = Arc::new(MockFeedPublisher::new());
    let token = CancellationToken::new();
    let (tx, _board, job) = job(publisher.clone(), &sources, token.clone());
    job.start();
    tx.send(fresh_report(0, &sources[0], &["a.com"])).await.unwrap();
    tx.send(fresh_report(1, &sources[1], &["b.com"])).await.unwrap();
    assert!(wait_for(|| publisher.generation() == Some(1)).await);

    tx.send(failed_report(1)).await.unwrap();

    assert!(wait_for(|| publisher.generation() == Some(2)).await);
    assert_eq!(publisher.lines(), vec!["a.com"]);
    token.cancel();
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_cancellation_stops_job_before_first_cycle() {
    let sources = vec![make_source("A", true)];
    let publisher = Arc::new(MockFeedPublisher::new());
    let token = CancellationToken::new();
    let (_tx, _board, job) = job(publisher.clone(), &sources, token.clone());
    let handle = job.start();

    token.cancel();

    let joined = tokio::time::timeout(Duration::from_secs(1), handle).await;
    assert!(joined.is_ok());
    assert_eq!(publisher.generation(), None);
}

#[tokio::test]
async fn test_cancellation_inside_batch_window_abandons_cycle() {
    let sources = vec![make_source("A", true)];
    let publisher = Arc::new(MockFeedPublisher::new());
    let (tx, rx) = mpsc::channel(16);
    let token = CancellationToken::new();
    let handle = AggregationJob::new(make_cycle(publisher.clone()), make_board(&sources), rx, &sources)
        .with_batch_window(Duration::from_millis(500))
        .with_cancellation(token.clone())
        .start();
    tx.send(fresh_report(0, &sources[0], &["a.com"])).await.unwrap();
    assert!(wait_for(|| publisher.generation() == Some(1)).await);

    tx.send(fresh_report(0, &sources[0], &["b.com"])).await.unwrap();
    sleep(Duration::from_millis(50)).await;
    token.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert_eq!(publisher.generation(), Some(1));
}
