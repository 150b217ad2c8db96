//! Lenswatch CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "lenswatch")]
#[command(about = "Scoped lens views over a graph store, with change detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store backend (dgraph or memory)
    #[arg(long)]
    store: Option<String>,

    /// Dgraph alpha HTTP endpoint
    #[arg(long)]
    dgraph_url: Option<String>,

    /// JSON fixture for the memory store
    #[arg(long)]
    fixture: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
    /// Poll a lens once and print the diff as JSON
    Update {
        /// Lens name
        lens: String,

        /// JSON file mapping uid to content hash
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },
    /// List lenses ranked by score
    Lenses {
        /// Full-text prefix; lists every scored lens when omitted
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("lenswatch={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = config::AppConfig::load(cli.config.as_deref())?;
    if let Some(kind) = cli.store {
        config.store.kind = kind;
    }
    if let Some(url) = cli.dgraph_url {
        config.store.endpoint = url;
    }
    if let Some(fixture) = cli.fixture {
        config.store.fixture = Some(fixture);
    }

    tracing::debug!("Lenswatch v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            commands::serve(config).await
        }
        Commands::Update { lens, snapshot } => {
            commands::update(config, lens, snapshot).await
        }
        Commands::Lenses { prefix } => {
            commands::lenses(config, prefix).await
        }
        Commands::Version => {
            println!("Lenswatch v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
