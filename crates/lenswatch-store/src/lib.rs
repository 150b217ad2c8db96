//! Graph store access for Lenswatch
//!
//! This crate provides the read-only store interface used by the diff
//! engine, a Dgraph HTTP implementation, and an in-memory implementation
//! for fixtures and tests.

pub mod store;
pub mod query;
pub mod dgraph;
pub mod memory;


use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use store::{FetchError, GraphStore, StoreConnector};
pub use dgraph::{DgraphConnector, DgraphSession};
pub use memory::MemoryStore;

/// Which store backend to use and how to reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `dgraph` or `memory`
    pub kind: String,
    pub endpoint: String,
    pub timeout_ms: u64,
    /// JSON fixture loaded into the memory store.
    pub fixture: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: "dgraph".to_string(),
            endpoint: dgraph::DEFAULT_ENDPOINT.to_string(),
            timeout_ms: dgraph::DEFAULT_TIMEOUT.as_millis() as u64,
            fixture: None,
        }
    }
}

/// Factory function to create store connectors
pub async fn create_connector(config: &StoreConfig) -> Result<Box<dyn StoreConnector>> {
    match config.kind.as_str() {
        "dgraph" => {
            let connector =
                DgraphConnector::new(&config.endpoint, Duration::from_millis(config.timeout_ms))?;
            Ok(Box::new(connector))
        }
        "memory" => {
            let store = MemoryStore::new();
            if let Some(path) = &config.fixture {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read fixture {}", path.display()))?;
                let fixture = serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse fixture {}", path.display()))?;
                let count = store.load_fixture(fixture).await?;
                tracing::info!("Loaded {} lens(es) from {}", count, path.display());
            }
            Ok(Box::new(store))
        }
        _ => anyhow::bail!("Unknown store kind: {}", config.kind),
    }
}
