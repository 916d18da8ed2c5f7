use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  Overflow Policy
// ════════════════════════════════════════════════════════════════

/// Strategy when a bounded subscriber channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// try_send(): drop the entry and log when the channel is full.
    Drop,
    /// .send().await: wait for capacity (back-pressure).
    #[serde(alias = "backpressure")]
    BackPressure,
}

// ════════════════════════════════════════════════════════════════
//  Cursor Start
// ════════════════════════════════════════════════════════════════

/// Position a new partition subscription starts reading from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorStart {
    /// Only entries appended after the subscription. Backlog published
    /// before the consumer started is not replayed.
    #[default]
    Newest,
    /// Replay the retained backlog first, then continue live.
    Earliest,
}

// ════════════════════════════════════════════════════════════════
//  Placement / LogEntry
// ════════════════════════════════════════════════════════════════

/// Physical placement the log assigned to an appended entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub partition: i32,
    pub offset: i64,
}

/// One entry of a partition log.
///
/// Payload bytes are opaque to the log; only the pipeline ends
/// serialize/deserialize them.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub partition: i32,
    /// Offset within the partition. Dense and strictly increasing.
    pub offset: i64,
    /// Partition key the entry was published under.
    pub key: String,
    pub payload: Vec<u8>,
    /// Append timestamp, unix ms.
    pub ts_ms: i64,
}
