use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  Record
// ════════════════════════════════════════════════════════════════

/// The domain object carried end-to-end: ingress → log → store.
///
/// Serialized to JSON unchanged for transport; the only mutation in
/// its lifetime is the persister stamping `processed_at`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Globally unique identifier, assigned at ingress (never by the
    /// log or the store). Natural key for persistence: repeated
    /// stores of the same id overwrite.
    pub id: String,
    /// Opaque payload.
    pub content: String,
    /// Owner identifier. Used as the partition key, so records of one
    /// owner keep their relative order.
    pub owner: String,
    /// Unix ms, set at ingress.
    pub created_at: i64,
    /// Unix ms, set by the persister just before the write. Absent
    /// until the record has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<i64>,
}
