//! Layered application configuration
//!
//! Precedence, lowest first: built-in defaults, the TOML file given with
//! `--config`, `.env`, `LENSWATCH_*` environment variables, CLI flags.

use std::path::Path;

use anyhow::{Context, Result};
use lenswatch_poller::PollConfig;
use lenswatch_server::ServerConfig;
use lenswatch_store::StoreConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub poll: PollConfig,
}

impl AppConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {}", e);
            }
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Apply `LENSWATCH_*` overrides read through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = var("LENSWATCH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("LENSWATCH_PORT") {
            self.server.port = port.parse().context("LENSWATCH_PORT is not a port number")?;
        }
        if let Some(kind) = var("LENSWATCH_STORE") {
            self.store.kind = kind;
        }
        if let Some(url) = var("LENSWATCH_DGRAPH_URL") {
            self.store.endpoint = url;
        }
        if let Some(fixture) = var("LENSWATCH_FIXTURE") {
            self.store.fixture = Some(fixture.into());
        }
        if let Some(ms) = var("LENSWATCH_POLL_DEADLINE_MS") {
            self.poll.deadline_ms = ms.parse().context("LENSWATCH_POLL_DEADLINE_MS is not a number")?;
        }
        if let Some(ms) = var("LENSWATCH_POLL_INTERVAL_MS") {
            self.poll.interval_ms = ms.parse().context("LENSWATCH_POLL_INTERVAL_MS is not a number")?;
        }
        Ok(())
    }
}
