//! Produce → log → consume → persist flows against the in-process
//! engine, including the shutdown and failure-policy contracts.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use courier_api::{
    CursorStart, LogPublisher, PersistenceError, Record, RecordStore, now_ms,
};
use log_engine::PartitionedLog;
use pipeline::{ConsumerConfig, ConsumerGroup, Persister, Publisher};
use store_memory::MemoryStore;

fn record(id: &str, owner: &str, content: &str) -> Record {
    Record {
        id: id.into(),
        owner: owner.into(),
        content: content.into(),
        created_at: now_ms(),
        processed_at: None,
    }
}

async fn wait_for_len(store: &MemoryStore, want: usize) {
    for _ in 0..400 {
        if store.len().await == want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("store never reached {want} documents");
}

// ── Test doubles ──

/// Keeps the order upserts arrived in; never serves reads.
#[derive(Default)]
struct RecordingStore {
    order: tokio::sync::Mutex<Vec<String>>,
}

impl RecordStore for RecordingStore {
    fn upsert(
        &self,
        record: &Record,
    ) -> Pin<Box<dyn Future<Output = Result<(), PersistenceError>> + Send + '_>> {
        let id = record.id.clone();
        Box::pin(async move {
            self.order.lock().await.push(id);
            Ok(())
        })
    }

    fn fetch(
        &self,
        _id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, PersistenceError>> + Send + '_>> {
        Box::pin(async { Ok(None) })
    }
}

/// Fails every write, counting attempts.
#[derive(Default)]
struct FailingStore {
    attempts: AtomicUsize,
}

impl RecordStore for FailingStore {
    fn upsert(
        &self,
        _record: &Record,
    ) -> Pin<Box<dyn Future<Output = Result<(), PersistenceError>> + Send + '_>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(PersistenceError::Unavailable("injected failure".into())) })
    }

    fn fetch(
        &self,
        _id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, PersistenceError>> + Send + '_>> {
        Box::pin(async { Ok(None) })
    }
}

/// Writes that never complete; only the worker's timeout bounds them.
struct StalledStore;

impl RecordStore for StalledStore {
    fn upsert(
        &self,
        _record: &Record,
    ) -> Pin<Box<dyn Future<Output = Result<(), PersistenceError>> + Send + '_>> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
    }

    fn fetch(
        &self,
        _id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, PersistenceError>> + Send + '_>> {
        Box::pin(async { Ok(None) })
    }
}

// ── Flows ──

#[tokio::test]
async fn submitted_records_end_up_in_the_store() {
    let log = Arc::new(PartitionedLog::new(3, 1000));
    let store = Arc::new(MemoryStore::new());
    let persister = Arc::new(Persister::new(store.clone()));
    let token = CancellationToken::new();

    let mut group = ConsumerGroup::start(
        log.clone(),
        persister,
        ConsumerConfig::default(),
        token.clone(),
    )
    .await
    .unwrap();

    let publisher = Publisher::new(log);
    for n in 0..5 {
        let r = record(&format!("id-{n}"), &format!("owner-{n}"), "hello");
        publisher.send(&r.owner, &r).await.unwrap();
    }

    wait_for_len(&store, 5).await;
    let doc = store.fetch("id-0").await.unwrap().unwrap();
    assert_eq!(doc.content, "hello");
    assert_eq!(doc.owner, "owner-0");
    assert!(doc.processed_at.unwrap() >= doc.created_at);

    group.close().await;
}

#[tokio::test]
async fn same_key_records_persist_in_send_order() {
    let log = Arc::new(PartitionedLog::new(4, 1000));
    let store = Arc::new(RecordingStore::default());
    let persister = Arc::new(Persister::new(store.clone()));
    let token = CancellationToken::new();

    let mut group = ConsumerGroup::start(
        log.clone(),
        persister,
        ConsumerConfig::default(),
        token.clone(),
    )
    .await
    .unwrap();

    let publisher = Publisher::new(log);
    let mut sent = Vec::new();
    for n in 0..20 {
        let r = record(&format!("id-{n:02}"), "owner-1", "x");
        publisher.send("owner-1", &r).await.unwrap();
        sent.push(r.id);
    }

    for _ in 0..400 {
        if store.order.lock().await.len() == sent.len() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    group.close().await;

    assert_eq!(*store.order.lock().await, sent);
}

#[tokio::test]
async fn malformed_payload_does_not_stop_the_worker() {
    let log = Arc::new(PartitionedLog::new(1, 1000));
    let store = Arc::new(MemoryStore::new());
    let persister = Arc::new(Persister::new(store.clone()));
    let token = CancellationToken::new();

    let mut group = ConsumerGroup::start(
        log.clone(),
        persister,
        ConsumerConfig::default(),
        token.clone(),
    )
    .await
    .unwrap();

    log.publish("owner-1", b"not json".to_vec()).await.unwrap();

    let publisher = Publisher::new(log);
    publisher
        .send("owner-1", &record("good", "owner-1", "still flowing"))
        .await
        .unwrap();

    wait_for_len(&store, 1).await;
    assert!(store.fetch("good").await.unwrap().is_some());

    group.close().await;
}

#[tokio::test]
async fn store_failures_are_dropped_and_the_loop_continues() {
    let log = Arc::new(PartitionedLog::new(1, 1000));
    let store = Arc::new(FailingStore::default());
    let persister = Arc::new(Persister::new(store.clone()));
    let token = CancellationToken::new();

    let mut group = ConsumerGroup::start(
        log.clone(),
        persister,
        ConsumerConfig::default(),
        token.clone(),
    )
    .await
    .unwrap();

    let publisher = Publisher::new(log);
    for n in 0..3 {
        publisher
            .send("owner-1", &record(&format!("id-{n}"), "owner-1", "x"))
            .await
            .unwrap();
    }

    // All three attempted means the worker survived the first failure.
    for _ in 0..400 {
        if store.attempts.load(Ordering::SeqCst) == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(store.attempts.load(Ordering::SeqCst), 3);

    group.close().await;
}

#[tokio::test]
async fn earliest_start_replays_backlog() {
    let log = Arc::new(PartitionedLog::new(2, 1000));
    let store = Arc::new(MemoryStore::new());
    let persister = Arc::new(Persister::new(store.clone()));
    let token = CancellationToken::new();

    let publisher = Publisher::new(log.clone());
    for n in 0..3 {
        publisher
            .send("owner-1", &record(&format!("id-{n}"), "owner-1", "early"))
            .await
            .unwrap();
    }

    let config = ConsumerConfig {
        start: CursorStart::Earliest,
        ..Default::default()
    };
    let mut group = ConsumerGroup::start(log, persister, config, token.clone())
        .await
        .unwrap();

    wait_for_len(&store, 3).await;
    group.close().await;
}

#[tokio::test]
async fn newest_start_ignores_backlog() {
    let log = Arc::new(PartitionedLog::new(2, 1000));
    let store = Arc::new(MemoryStore::new());
    let persister = Arc::new(Persister::new(store.clone()));
    let token = CancellationToken::new();

    let publisher = Publisher::new(log.clone());
    for n in 0..2 {
        publisher
            .send("owner-1", &record(&format!("old-{n}"), "owner-1", "early"))
            .await
            .unwrap();
    }

    let mut group = ConsumerGroup::start(
        log,
        persister,
        ConsumerConfig::default(),
        token.clone(),
    )
    .await
    .unwrap();

    publisher
        .send("owner-1", &record("live", "owner-1", "late"))
        .await
        .unwrap();

    wait_for_len(&store, 1).await;
    assert!(store.fetch("live").await.unwrap().is_some());
    assert!(store.fetch("old-0").await.unwrap().is_none());

    group.close().await;
}

#[tokio::test]
async fn configured_delay_defers_persistence() {
    let log = Arc::new(PartitionedLog::new(1, 1000));
    let store = Arc::new(MemoryStore::new());
    let persister = Arc::new(Persister::new(store.clone()));
    let token = CancellationToken::new();

    let config = ConsumerConfig {
        process_delay_ms: 200,
        ..Default::default()
    };
    let mut group = ConsumerGroup::start(log.clone(), persister, config, token.clone())
        .await
        .unwrap();

    let publisher = Publisher::new(log);
    publisher
        .send("owner-1", &record("slow", "owner-1", "x"))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.is_empty().await, "persisted before the delay elapsed");

    wait_for_len(&store, 1).await;
    group.close().await;
}

// ── Shutdown ──

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_stops_workers_within_the_store_timeout() {
    let log = Arc::new(PartitionedLog::new(2, 1000));
    let persister = Arc::new(Persister::new(Arc::new(StalledStore)));
    let token = CancellationToken::new();

    let config = ConsumerConfig {
        store_timeout_ms: 200,
        ..Default::default()
    };
    let mut group = ConsumerGroup::start(log.clone(), persister, config, token.clone())
        .await
        .unwrap();

    // Continuous arrival while shutting down.
    let feeder_token = token.clone();
    let feeder = tokio::spawn(async move {
        let publisher = Publisher::new(log);
        let mut n = 0u32;
        while !feeder_token.is_cancelled() {
            let r = record(&format!("id-{n}"), "owner-1", "x");
            let _ = publisher.send("owner-1", &r).await;
            n += 1;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    // Let the workers get a write in flight, then pull the plug.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let started = std::time::Instant::now();
    token.cancel();
    group.close().await;

    // Bounded by the store timeout plus scheduling slack, not by the
    // stalled write's full 60s.
    assert!(
        started.elapsed() < Duration::from_millis(1500),
        "close took {:?}",
        started.elapsed()
    );
    let _ = feeder.await;
}

#[tokio::test]
async fn close_is_idempotent() {
    let log = Arc::new(PartitionedLog::new(2, 1000));
    let store = Arc::new(MemoryStore::new());
    let persister = Arc::new(Persister::new(store));
    let token = CancellationToken::new();

    let mut group = ConsumerGroup::start(log, persister, ConsumerConfig::default(), token)
        .await
        .unwrap();

    group.close().await;
    group.close().await;
}
