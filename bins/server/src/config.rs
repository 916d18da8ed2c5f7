use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

pub use pipeline::ConsumerConfig;

#[derive(Parser)]
#[command(name = "courier-server", about = "Message ingestion pipeline service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the server
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml", env = "CONFIG_PATH")]
    pub config: String,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    pub topic: TopicConfig,
    #[serde(default)]
    pub consumer: ConsumerConfig,
}

/// The single ingest topic.
#[derive(Debug, Deserialize)]
pub struct TopicConfig {
    /// Topic name. Required: a missing value fails startup.
    pub name: String,
    #[serde(default = "default_partitions")]
    pub partitions: usize,
    /// Per-partition retention, bounds earliest-cursor replay.
    #[serde(default = "default_backlog")]
    pub backlog: usize,
}

fn default_api_port() -> u16 {
    8080
}
fn default_partitions() -> usize {
    3
}
fn default_backlog() -> usize {
    10_000
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self, crate::error::ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        toml::from_str(&content)
            .map_err(|e| crate::error::ServerError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }
}
