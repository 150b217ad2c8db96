//! HTTP adapter in front of the lens diff engine

pub mod router;
pub mod handlers;
pub mod error;


use std::future::Future;
use std::sync::Arc;

use lenswatch_poller::{CancelHandle, Cancellation, Poller, cancellation};
use lenswatch_store::StoreConnector;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub use error::ApiError;
pub use router::create_router;

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7890,
        }
    }
}

/// Shared by every request handler.
///
/// Holds no per-request state: each request opens its own store session
/// through `connector` and brings its own snapshot.
pub struct ServerState {
    pub connector: Arc<dyn StoreConnector>,
    pub poller: Poller,
    shutdown_handle: CancelHandle,
    shutdown: Cancellation,
}

impl ServerState {
    pub fn new(connector: Arc<dyn StoreConnector>, poller: Poller) -> Self {
        let (shutdown_handle, shutdown) = cancellation();
        Self {
            connector,
            poller,
            shutdown_handle,
            shutdown,
        }
    }

    /// Signal observed by in-flight polls; fires on server shutdown.
    pub fn shutdown_signal(&self) -> Cancellation {
        self.shutdown.clone()
    }

    /// Interrupt every in-flight poll.
    pub fn shutdown(&self) {
        self.shutdown_handle.cancel();
    }
}

pub struct LensServer {
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl LensServer {
    pub fn new(connector: Arc<dyn StoreConnector>, poller: Poller, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(ServerState::new(connector, poller)),
            config,
        }
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Bind to the configured address and serve until Ctrl-C.
    pub async fn start(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Listening on http://{}", listener.local_addr()?);

        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
    }

    /// Serve on an already bound listener until `shutdown` resolves, then
    /// cancel in-flight polls.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let state = self.state();
        let router = create_router(self.state);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutting down, cancelling in-flight polls");
                state.shutdown();
            })
            .await?;
        Ok(())
    }
}
