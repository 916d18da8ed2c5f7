use std::sync::Arc;

use courier_api::{LogPublisher, Placement, PublishError, Record, TransportError};

// ═══════════════════════════════════════════════════════════════
//  Publisher — record → canonical JSON → log append
// ═══════════════════════════════════════════════════════════════

/// Appends records to the log.
///
/// Synchronous from the caller's view: `send` returns only once the
/// log has assigned a placement. No retries live here; a transport
/// error propagates to the caller, which owns the retry decision.
pub struct Publisher {
    log: Arc<dyn LogPublisher>,
}

impl Publisher {
    pub fn new(log: Arc<dyn LogPublisher>) -> Self {
        Self { log }
    }

    /// Serialize and append under `key`. Records sharing a key keep
    /// their relative order on the consuming side.
    pub async fn send(&self, key: &str, record: &Record) -> Result<Placement, PublishError> {
        if key.is_empty() {
            return Err(TransportError::EmptyKey.into());
        }

        let payload = serde_json::to_vec(record)?;
        let placement = self.log.publish(key, payload).await?;

        tracing::debug!(
            id = %record.id,
            partition = placement.partition,
            offset = placement.offset,
            "record appended"
        );
        Ok(placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_api::now_ms;
    use log_engine::PartitionedLog;

    fn record(id: &str) -> Record {
        Record {
            id: id.into(),
            content: "hello".into(),
            owner: "u1".into(),
            created_at: now_ms(),
            processed_at: None,
        }
    }

    #[tokio::test]
    async fn send_returns_placement() {
        let log = Arc::new(PartitionedLog::new(3, 100));
        let publisher = Publisher::new(log);

        let a = publisher.send("u1", &record("a")).await.unwrap();
        let b = publisher.send("u1", &record("b")).await.unwrap();
        assert_eq!(a.partition, b.partition);
        assert_eq!(b.offset, a.offset + 1);
    }

    #[tokio::test]
    async fn empty_key_is_rejected_before_transport() {
        let log = Arc::new(PartitionedLog::new(3, 100));
        let publisher = Publisher::new(log);

        let err = publisher.send("", &record("a")).await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::Transport(TransportError::EmptyKey)
        ));
    }
}
