//! CLI command implementations

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use lenswatch_core::{Snapshot, UpdateRequest};
use lenswatch_poller::{Poller, cancellation};
use lenswatch_server::LensServer;
use lenswatch_store::create_connector;

use crate::config::AppConfig;

pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Starting Lenswatch server on {}:{} ({} store)",
        config.server.host,
        config.server.port,
        config.store.kind
    );

    let connector = create_connector(&config.store).await?;
    let server = LensServer::new(Arc::from(connector), Poller::new(config.poll), config.server);

    server.start().await
}

/// Poll one lens from the command line; Ctrl-C interrupts the wait.
pub async fn update(config: AppConfig, lens: String, snapshot: Option<PathBuf>) -> anyhow::Result<()> {
    let snapshot = match snapshot {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse snapshot {}", path.display()))?
        }
        None => Snapshot::new(),
    };
    let request = UpdateRequest::new(&lens, snapshot)?;

    let connector = create_connector(&config.store).await?;
    let poller = Poller::new(config.poll);
    let (handle, mut cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let outcome = poller.poll_with(connector.as_ref(), &request, &mut cancel).await?;
    if outcome.timed_out() {
        tracing::info!("No change within {:?}", poller.config().deadline());
    }

    println!("{}", serde_json::to_string_pretty(outcome.diff())?);
    Ok(())
}

pub async fn lenses(config: AppConfig, prefix: String) -> anyhow::Result<()> {
    let connector = create_connector(&config.store).await?;
    let session = connector.connect().await?;
    let lenses = session.list_lenses(prefix.trim()).await?;

    tracing::info!("Found {} lens(es)", lenses.len());
    println!("{}", serde_json::to_string_pretty(&lenses)?);
    Ok(())
}
