use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use swarm_autobuyer::config::{load_config, LoadedConfig};

use super::context::CliContext;
use super::env::CliArgs;

const LOG_FILE_PREFIX: &str = "swarm-autobuyer.log";

/// Installs the global subscriber. Keep the returned guard alive so the file
/// writer flushes on exit.
pub fn init_logging(
    level: &str,
    debug: bool,
    log_dir: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_json = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let console_text = (!json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Loads the configuration and resolves the effective metrics port.
pub async fn build_context(cli: &CliArgs) -> Result<CliContext> {
    let LoadedConfig { config, path } = load_config(cli.config.as_deref()).await?;
    let metrics_port = cli.metrics_port.unwrap_or(config.metrics_port);
    Ok(CliContext::new(config, path, metrics_port))
}

/// Resolves once Ctrl-C is received. Never resolves when the handler cannot
/// be installed.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(err) => {
            warn!(?err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
