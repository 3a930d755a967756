use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::dispatch::dispatch;
use super::env::{CliArgs, VERSION};
use super::runtime::{build_context, init_logging};

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    let _log_guard = init_logging(
        &cli.log_level,
        cli.debug,
        cli.log_dir.as_deref(),
        cli.log_json,
    )?;
    info!("Starting swarm-autobuyer v{}", VERSION);

    let ctx = build_context(&cli).await?;

    match dispatch(&cli, &ctx).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
