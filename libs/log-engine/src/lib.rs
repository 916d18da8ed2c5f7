use std::collections::VecDeque;
use std::future::Future;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::pin::Pin;

use tokio::sync::{RwLock, mpsc};

use courier_api::{
    CursorStart, LogConsumer, LogEntry, LogPublisher, OverflowPolicy, PartitionStream, Placement,
    TransportError, now_ms,
};

// ═══════════════════════════════════════════════════════════════
//  Subscriber
// ═══════════════════════════════════════════════════════════════

struct Subscriber {
    tx: mpsc::Sender<LogEntry>,
    overflow: OverflowPolicy,
}

// ═══════════════════════════════════════════════════════════════
//  MpscStream — engine-side PartitionStream impl
// ═══════════════════════════════════════════════════════════════

/// Stream over one partition: replayed backlog first (earliest
/// cursor), then live entries from the subscriber channel.
#[derive(Debug)]
pub struct MpscStream {
    pending: VecDeque<LogEntry>,
    rx: mpsc::Receiver<LogEntry>,
}

impl PartitionStream for MpscStream {
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = Option<LogEntry>> + Send + '_>> {
        Box::pin(async {
            if let Some(entry) = self.pending.pop_front() {
                return Some(entry);
            }
            self.rx.recv().await
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Partition
// ═══════════════════════════════════════════════════════════════

struct PartitionState {
    next_offset: i64,
    /// Retained backlog, ring capped at the log's `backlog`.
    entries: VecDeque<LogEntry>,
    subscribers: Vec<Subscriber>,
}

struct Partition {
    id: i32,
    state: RwLock<PartitionState>,
}

impl Partition {
    fn new(id: i32) -> Self {
        Self {
            id,
            state: RwLock::new(PartitionState {
                next_offset: 0,
                entries: VecDeque::new(),
                subscribers: Vec::new(),
            }),
        }
    }

    /// Append one entry: assign offset → retain → notify subscribers.
    /// Offset assignment and fan-out happen under the partition lock,
    /// so subscribers observe entries in offset order.
    async fn append(&self, key: String, payload: Vec<u8>, backlog: usize) -> Placement {
        let mut state = self.state.write().await;

        let entry = LogEntry {
            partition: self.id,
            offset: state.next_offset,
            key,
            payload,
            ts_ms: now_ms(),
        };
        state.next_offset += 1;

        if state.entries.len() >= backlog {
            state.entries.pop_front();
        }
        state.entries.push_back(entry.clone());

        let mut i = 0;
        while i < state.subscribers.len() {
            let sub = &state.subscribers[i];
            if sub.tx.is_closed() {
                state.subscribers.swap_remove(i);
                continue;
            }
            match sub.overflow {
                OverflowPolicy::Drop => match sub.tx.try_send(entry.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(partition = self.id, "subscriber channel full, dropping");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        state.subscribers.swap_remove(i);
                        continue;
                    }
                },
                // Await capacity while holding the partition lock:
                // publishers stall, but entries stay in offset order.
                OverflowPolicy::BackPressure => {
                    if sub.tx.send(entry.clone()).await.is_err() {
                        state.subscribers.swap_remove(i);
                        continue;
                    }
                }
            }
            i += 1;
        }

        Placement {
            partition: self.id,
            offset: entry.offset,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  PartitionedLog
// ═══════════════════════════════════════════════════════════════

/// In-process partitioned ordered log.
///
/// The partition set is fixed at construction. A key is hashed to a
/// partition, so entries sharing a key share a partition and keep
/// their relative order; nothing is guaranteed across partitions.
pub struct PartitionedLog {
    partitions: Vec<Partition>,
    backlog: usize,
}

impl PartitionedLog {
    /// `partitions` must be at least 1; `backlog` is the per-partition
    /// retention cap for earliest-cursor replay.
    pub fn new(partitions: usize, backlog: usize) -> Self {
        let partitions = partitions.max(1);
        Self {
            partitions: (0..partitions as i32).map(Partition::new).collect(),
            backlog,
        }
    }

    fn partition_for(&self, key: &str) -> &Partition {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() % self.partitions.len() as u64) as usize;
        &self.partitions[idx]
    }
}

impl LogPublisher for PartitionedLog {
    fn publish(
        &self,
        key: &str,
        payload: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<Placement, TransportError>> + Send + '_>> {
        if key.is_empty() {
            return Box::pin(async { Err(TransportError::EmptyKey) });
        }
        let partition = self.partition_for(key);
        let key = key.to_string();
        Box::pin(async move { Ok(partition.append(key, payload, self.backlog).await) })
    }
}

impl LogConsumer for PartitionedLog {
    fn partitions(&self) -> Vec<i32> {
        self.partitions.iter().map(|p| p.id).collect()
    }

    fn subscribe(
        &self,
        partition: i32,
        start: CursorStart,
        buffer: usize,
        overflow: OverflowPolicy,
    ) -> Pin<
        Box<dyn Future<Output = Result<Box<dyn PartitionStream>, TransportError>> + Send + '_>,
    > {
        Box::pin(async move {
            let p = self
                .partitions
                .iter()
                .find(|p| p.id == partition)
                .ok_or(TransportError::UnknownPartition(partition))?;

            let mut state = p.state.write().await;
            let (tx, rx) = mpsc::channel(buffer.max(1));
            let pending = match start {
                CursorStart::Earliest => state.entries.iter().cloned().collect(),
                CursorStart::Newest => VecDeque::new(),
            };
            state.subscribers.push(Subscriber { tx, overflow });

            Ok(Box::new(MpscStream { pending, rx }) as Box<dyn PartitionStream>)
        })
    }
}
