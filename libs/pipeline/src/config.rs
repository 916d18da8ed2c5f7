use std::time::Duration;

use serde::Deserialize;

use courier_api::{CursorStart, OverflowPolicy};

// ═══════════════════════════════════════════════════════════════
//  Consumer Config
// ═══════════════════════════════════════════════════════════════

/// Consumer-side tuning. Every field has a serde default, so a bare
/// `[consumer]` table (or none at all) is valid.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerConfig {
    /// Cursor position for fresh partition subscriptions. `newest`
    /// skips everything published before the consumer started;
    /// `earliest` replays the retained backlog (reprocessing on
    /// restart).
    #[serde(default)]
    pub start: CursorStart,
    /// Artificial delay before each persist, simulating downstream
    /// backpressure. Zero disables it.
    #[serde(default)]
    pub process_delay_ms: u64,
    /// Bound on a single store write.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Subscriber channel capacity per partition.
    #[serde(default = "default_buffer")]
    pub buffer: usize,
    /// Strategy when a partition worker falls behind the log.
    #[serde(default = "default_overflow")]
    pub overflow: OverflowPolicy,
}

fn default_store_timeout_ms() -> u64 {
    5_000
}
fn default_buffer() -> usize {
    1024
}
fn default_overflow() -> OverflowPolicy {
    OverflowPolicy::BackPressure
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            start: CursorStart::default(),
            process_delay_ms: 0,
            store_timeout_ms: default_store_timeout_ms(),
            buffer: default_buffer(),
            overflow: default_overflow(),
        }
    }
}

impl ConsumerConfig {
    pub fn process_delay(&self) -> Duration {
        Duration::from_millis(self.process_delay_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
