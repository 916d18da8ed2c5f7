use std::sync::Arc;

use courier_api::{PersistenceError, Record, RecordStore, now_ms};

// ═══════════════════════════════════════════════════════════════
//  Persister — timestamp + idempotent upsert
// ═══════════════════════════════════════════════════════════════

/// Writes records to the document store, keyed by id.
pub struct Persister {
    store: Arc<dyn RecordStore>,
}

impl Persister {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Stamp the processing time and upsert. Storing the same id
    /// twice leaves exactly one document carrying the later
    /// timestamp. Failures are returned, never retried here.
    pub async fn store(&self, mut record: Record) -> Result<(), PersistenceError> {
        record.processed_at = Some(now_ms());
        self.store.upsert(&record).await?;
        tracing::debug!(id = %record.id, "record persisted");
        Ok(())
    }
}
