use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::RwLock;

use courier_api::{PersistenceError, Record, RecordStore};

// ═══════════════════════════════════════════════════════════════
//  MemoryStore
// ═══════════════════════════════════════════════════════════════

/// In-memory document store keyed by record id. Upsert semantics:
/// writing an id that already exists replaces the document.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn upsert(
        &self,
        record: &Record,
    ) -> Pin<Box<dyn Future<Output = Result<(), PersistenceError>> + Send + '_>> {
        let record = record.clone();
        Box::pin(async move {
            let mut docs = self.docs.write().await;
            docs.insert(record.id.clone(), record);
            Ok(())
        })
    }

    fn fetch(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, PersistenceError>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.docs.read().await.get(&id).cloned()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_api::now_ms;

    fn record(id: &str, content: &str) -> Record {
        Record {
            id: id.into(),
            content: content.into(),
            owner: "u1".into(),
            created_at: now_ms(),
            processed_at: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_fetch() {
        let store = MemoryStore::new();
        store.upsert(&record("a", "hello")).await.unwrap();

        let doc = store.fetch("a").await.unwrap().unwrap();
        assert_eq!(doc.content, "hello");
        assert!(store.fetch("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_id_overwrites() {
        let store = MemoryStore::new();
        store.upsert(&record("a", "first")).await.unwrap();
        store.upsert(&record("a", "second")).await.unwrap();

        assert_eq!(store.len().await, 1);
        let doc = store.fetch("a").await.unwrap().unwrap();
        assert_eq!(doc.content, "second");
    }
}
