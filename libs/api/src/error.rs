// ════════════════════════════════════════════════════════════════
//  Error taxonomy
// ════════════════════════════════════════════════════════════════

/// Log transport failure: the append or subscription itself failed.
///
/// Distinct from [`PublishError::Encoding`]: a transport error means
/// the log was reached and said no.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Partition keys carry the per-key ordering contract; an empty
    /// key has no defined placement.
    #[error("partition key must be non-empty")]
    EmptyKey,

    #[error("partition {0} not found")]
    UnknownPartition(i32),
}

/// Publish-side failure, surfaced synchronously to the ingress caller.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Record could not be serialized to the wire encoding.
    #[error("encode: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The log rejected or could not take the append.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

/// Document store failure. Never retried by the persister; the
/// consumer side logs and drops.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistenceError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
