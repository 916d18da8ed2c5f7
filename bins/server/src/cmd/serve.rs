use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{ServeArgs, ServerConfig};
use crate::error::ServerError;

use log_engine::PartitionedLog;
use pipeline::{ConsumerGroup, Persister, Publisher};
use store_memory::MemoryStore;

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("courier-server starting");

    // --- Load config ---
    let config = ServerConfig::load(&args.config)?;
    tracing::info!(config = %args.config, topic = %config.topic.name, "loaded config");

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    // --- Document store + persister (acquired first, dropped last) ---
    let store = Arc::new(MemoryStore::new());
    let persister = Arc::new(Persister::new(store.clone()));

    // --- Partitioned log + publish capability ---
    let log = Arc::new(PartitionedLog::new(
        config.topic.partitions,
        config.topic.backlog,
    ));
    let publisher = Arc::new(Publisher::new(log.clone()));
    tracing::info!(
        topic = %config.topic.name,
        partitions = config.topic.partitions,
        backlog = config.topic.backlog,
        "log ready"
    );

    // --- Consumer group: draining before ingress opens, so nothing
    // is ever acknowledged without a live consume path behind it ---
    let mut group = ConsumerGroup::start(
        log.clone(),
        persister,
        config.consumer.clone(),
        token.clone(),
    )
    .await?;
    tracing::info!(
        partitions = config.topic.partitions,
        start = ?config.consumer.start,
        "consumer group running"
    );

    // --- API server (ingress) ---
    let api_port = config.api_port;
    let api_store = store.clone();
    let api_token = token.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = ingest_api_server::run(api_port, publisher, api_store, api_token).await {
            tracing::error!(error = %e, "api server error");
        }
    });

    tracing::info!(port = api_port, "api server listening");
    tracing::info!("server ready");

    // --- Wait for ctrl-c ---
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down...");

    // One stroke stops ingress and signals every partition worker.
    token.cancel();

    // Ingress drains first; then every worker finishes its current
    // unit of work. Store and log handles drop afterwards, in reverse
    // acquisition order.
    let _ = api_handle.await;
    group.close().await;

    tracing::info!("shutdown complete");
    Ok(())
}
