use std::sync::Arc;

use anyhow::{Context, Result};
use autobuyer_scheduler::{AutoBuyerService, EnginePorts, SchedulerError};
use cdp_adapter::PageSession;
use clap::Args;
use swarm_autobuyer::{metrics, AppConfig, PageBridge};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::context::CliContext;
use super::runtime::shutdown_signal;

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Game URL to open or reuse
    #[arg(long)]
    pub url: Option<String>,

    /// Attach to a running browser's DevTools websocket instead of launching one
    #[arg(long, value_name = "WS_URL")]
    pub ws_url: Option<String>,

    /// Launch the browser headless
    #[arg(long)]
    pub headless: bool,

    /// Start buying as soon as the control appears
    #[arg(long)]
    pub enable: bool,
}

impl RunArgs {
    /// Flags win over file and environment settings.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.url {
            config.browser.url = url.clone();
        }
        if let Some(ws) = &self.ws_url {
            config.browser.session.websocket_url = Some(ws.clone());
        }
        if self.headless {
            config.browser.session.headless = true;
        }
        if self.enable {
            config.engine.start_enabled = true;
        }
    }
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let mut config = ctx.config().clone();
    args.apply(&mut config);
    config.validate()?;

    let _metrics_server = metrics::spawn_metrics_server(ctx.metrics_port());

    let session = Arc::new(
        PageSession::open(&config.browser.session, &config.browser.url)
            .await
            .context("Failed to open the game page")?,
    );
    let bridge = Arc::new(PageBridge::new(session.clone()));
    let service = AutoBuyerService::new(config.engine.clone(), EnginePorts::from_shared(bridge))?;

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            cancel.cancel();
        })
    };

    let started = service.start(&cancel).await;
    let result = match started {
        Ok(()) => {
            info!(
                url = %config.browser.url,
                interval = %humantime::format_duration(config.engine.cycle_interval()),
                "auto-buyer ready; press Ctrl-C to stop"
            );
            cancel.cancelled().await;
            Ok(())
        }
        Err(SchedulerError::Cancelled) => {
            info!("startup interrupted");
            Ok(())
        }
        Err(err) => Err(err).context("Auto-buyer failed to start"),
    };

    service.shutdown().await;
    session.close().await;
    watcher.abort();
    log_session_summary();
    result
}

fn log_session_summary() {
    let cycles = autobuyer_scheduler::metrics::snapshot();
    let buys = tool_buy::metrics::snapshot();
    let evaluations = cdp_adapter::metrics::snapshot();
    info!(
        cycles = cycles.cycles_completed,
        categories_skipped = cycles.categories_skipped,
        bought = buys.bought,
        skipped = buys.skipped,
        not_found = buys.not_found,
        dispatch_failed = buys.dispatch_failed,
        script_failures = evaluations.evaluation_failures,
        "session summary"
    );
}
