use std::future::Future;
use std::pin::Pin;

use crate::{CursorStart, LogEntry, OverflowPolicy, Placement, TransportError};

// ════════════════════════════════════════════════════════════════
//  Ordered-log capabilities
// ════════════════════════════════════════════════════════════════

/// Append capability of the ordered log.
pub trait LogPublisher: Send + Sync {
    /// Append a payload under a partition key. Entries sharing a key
    /// land in the same partition and keep their relative order.
    /// Resolves once the log has durably assigned a placement.
    fn publish(
        &self,
        key: &str,
        payload: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<Placement, TransportError>> + Send + '_>>;
}

/// One consumed partition: entries in offset order.
///
/// Implemented engine-side; this crate only defines the trait, with
/// no runtime dependency.
pub trait PartitionStream: Send + std::fmt::Debug {
    /// Next entry. None = log closed / subscription ended.
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = Option<LogEntry>> + Send + '_>>;
}

/// Consume capability of the ordered log.
pub trait LogConsumer: Send + Sync {
    /// The partition set of the topic, fixed for the log's lifetime.
    fn partitions(&self) -> Vec<i32>;

    /// Subscribe to one partition from the given cursor position.
    ///
    /// - `buffer`: subscriber channel capacity
    /// - `overflow`: what a full channel does (Drop or BackPressure)
    #[allow(clippy::type_complexity)]
    fn subscribe(
        &self,
        partition: i32,
        start: CursorStart,
        buffer: usize,
        overflow: OverflowPolicy,
    ) -> Pin<
        Box<dyn Future<Output = Result<Box<dyn PartitionStream>, TransportError>> + Send + '_>,
    >;
}
