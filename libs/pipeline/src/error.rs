#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The log resolved an empty partition set at startup.
    #[error("no partitions resolved")]
    NoPartitions,

    #[error("subscription (partition {partition}): {source}")]
    Subscription {
        partition: i32,
        source: courier_api::TransportError,
    },
}
