use std::future::Future;
use std::pin::Pin;

use crate::{PersistenceError, Record};

// ════════════════════════════════════════════════════════════════
//  Document store capability
// ════════════════════════════════════════════════════════════════

/// Upsert-capable persistence backend, keyed by `Record::id`.
pub trait RecordStore: Send + Sync {
    /// Write a record. Same id overwrites deterministically: the
    /// consumer may see a record twice under crash-and-redeliver and
    /// the store must end up with exactly one document.
    fn upsert(
        &self,
        record: &Record,
    ) -> Pin<Box<dyn Future<Output = Result<(), PersistenceError>> + Send + '_>>;

    /// Fetch a stored record by id. None = not (yet) persisted.
    #[allow(clippy::type_complexity)]
    fn fetch(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, PersistenceError>> + Send + '_>>;
}
