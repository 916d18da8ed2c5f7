use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use courier_api::{LogConsumer, LogEntry, PartitionStream, Record};

use crate::config::ConsumerConfig;
use crate::error::PipelineError;
use crate::persist::Persister;

// ═══════════════════════════════════════════════════════════════
//  ConsumerGroup
// ═══════════════════════════════════════════════════════════════

/// Owns one worker task per partition and the cancellation signal
/// that tears them all down together.
pub struct ConsumerGroup {
    token: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl ConsumerGroup {
    /// Resolve the partition set once, subscribe each partition with
    /// the configured cursor, spawn one worker per partition.
    /// Partitions are consumed fully independently: ordering holds
    /// within a partition (and thus per key), never across.
    ///
    /// A subscription failure here is fatal to startup.
    pub async fn start(
        log: Arc<dyn LogConsumer>,
        persister: Arc<Persister>,
        config: ConsumerConfig,
        token: CancellationToken,
    ) -> Result<Self, PipelineError> {
        let partitions = log.partitions();
        if partitions.is_empty() {
            return Err(PipelineError::NoPartitions);
        }

        let mut workers = Vec::with_capacity(partitions.len());
        for partition in partitions {
            let stream = log
                .subscribe(partition, config.start, config.buffer, config.overflow)
                .await
                .map_err(|source| PipelineError::Subscription { partition, source })?;

            tracing::info!(partition, start = ?config.start, "partition worker starting");
            workers.push(spawn_partition_worker(
                partition,
                stream,
                persister.clone(),
                config.clone(),
                token.clone(),
            ));
        }

        Ok(Self { token, workers })
    }

    /// Cancel and wait for every worker to finish its current unit of
    /// work. Idempotent: a second call returns immediately.
    pub async fn close(&mut self) {
        self.token.cancel();
        for handle in self.workers.drain(..) {
            let _ = handle.await;
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Partition worker — recv → deserialize → persist (loop)
// ═══════════════════════════════════════════════════════════════

/// One long-lived loop per partition. Per-entry failures are logged
/// and dropped; only cancellation or stream end stops the loop.
fn spawn_partition_worker(
    partition: i32,
    mut stream: Box<dyn PartitionStream>,
    persister: Arc<Persister>,
    config: ConsumerConfig,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => break,
                entry = stream.recv() => {
                    match entry {
                        Some(entry) => {
                            if !process_entry(partition, entry, &persister, &config, &token).await {
                                break;
                            }
                        }
                        None => {
                            tracing::info!(partition, "partition stream closed");
                            break;
                        }
                    }
                }
            }
        }
        tracing::info!(partition, "partition worker stopped");
    })
}

/// Handle one entry. Returns false when cancellation interrupted the
/// pre-persist delay and the worker should stop.
async fn process_entry(
    partition: i32,
    entry: LogEntry,
    persister: &Persister,
    config: &ConsumerConfig,
    token: &CancellationToken,
) -> bool {
    // Simulated downstream backpressure. Cancellable, so shutdown
    // waits out an in-flight store write at most, not this delay.
    let delay = config.process_delay();
    if !delay.is_zero() {
        tokio::select! {
            biased;

            _ = token.cancelled() => return false,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    let record: Record = match serde_json::from_slice(&entry.payload) {
        Ok(record) => record,
        Err(error) => {
            tracing::warn!(partition, offset = entry.offset, %error, "bad payload, skipping");
            return true;
        }
    };

    // The write itself is never preempted; the timeout is its only
    // bound. Timeout or store error drops the record: no retry, no
    // requeue.
    let id = record.id.clone();
    match tokio::time::timeout(config.store_timeout(), persister.store(record)).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            tracing::error!(partition, offset = entry.offset, %id, %error, "store error, dropping");
        }
        Err(_) => {
            tracing::error!(partition, offset = entry.offset, %id, "store timeout, dropping");
        }
    }
    true
}
