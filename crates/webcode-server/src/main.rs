use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use webcode_infrastructure::AppConfig;
use webcode_server::{bootstrap, logging, router};

/// WebCode HTTP server.
#[derive(Debug, Parser)]
#[command(name = "webcode-server", version, about)]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:5000
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(database) = &self.database {
            config.storage.database_path = database.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply_env();
    cli.apply(&mut config);

    let _log_guard = logging::init_logging(&config.logging)?;

    let db = bootstrap::open_database(&config)?;
    let state = bootstrap::build_state(db, &config)?;
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    tracing::info!("[Server] Listening on {}", listener.local_addr()?);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("[Server] Received Ctrl+C, shutting down"),
                Err(e) => tracing::error!("[Server] Failed to listen for Ctrl+C: {}", e),
            }
            shutdown.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("server error")?;

    let timeout = Duration::from_millis(config.session.shutdown_flush_timeout_ms);
    if let Err(e) = state.sessions.shutdown(timeout).await {
        tracing::error!("[Server] Pending session saves were not flushed: {}", e);
    }
    tracing::info!("[Server] Stopped");
    Ok(())
}
