//! Tracing subscriber setup.
//!
//! The filter comes from `WEBCODE_LOG`, then `RUST_LOG`, then the configured
//! level. Console output is pretty or JSON; with a log directory configured,
//! a daily rolling file receives the same events.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};
use webcode_infrastructure::config::{LogFormat, LoggingConfig};

pub const ENV_LOG: &str = "WEBCODE_LOG";

const LOG_FILE_PREFIX: &str = "webcode.log";

/// Picks the filter directive: `WEBCODE_LOG`, `RUST_LOG`, then `default`.
pub fn resolve_filter_directive(
    lookup: impl Fn(&str) -> Option<String>,
    default: &str,
) -> String {
    [ENV_LOG, "RUST_LOG"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let directive = resolve_filter_directive(|key| std::env::var(key).ok(), &config.level);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter '{directive}'"))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(match config.format {
        LogFormat::Pretty => fmt::layer().with_target(false).boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    });

    let mut guard = None;
    if let Some(directory) = &config.directory {
        std::fs::create_dir_all(directory)
            .with_context(|| format!("failed to create log directory {}", directory.display()))?;
        let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        let file_layer = fmt::layer().with_ansi(false).with_writer(writer);
        layers.push(match config.format {
            LogFormat::Pretty => file_layer.boxed(),
            LogFormat::Json => file_layer.json().boxed(),
        });
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers.with_filter(filter))
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::debug!("[Logging] Initialized with filter '{}'", directive);
    Ok(guard)
}
