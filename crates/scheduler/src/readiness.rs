use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SchedulerError;
use crate::model::ReadinessConfig;
use crate::ports::ReadinessProbe;

/// Polls until both the page framework and the game UI are up.
///
/// Probe errors count as "not ready yet". Returns the time spent waiting.
pub async fn wait_until_ready(
    probe: &dyn ReadinessProbe,
    cfg: &ReadinessConfig,
    cancel: &CancellationToken,
) -> Result<Duration, SchedulerError> {
    let started = Instant::now();
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        if is_ready(probe).await {
            let waited = started.elapsed();
            info!(attempts, waited_ms = waited.as_millis() as u64, "page ready");
            return Ok(waited);
        }
        if let Some(limit) = cfg.timeout() {
            if started.elapsed() >= limit {
                return Err(SchedulerError::ReadinessTimeout(limit));
            }
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(SchedulerError::Cancelled),
            _ = sleep(cfg.poll()) => {}
        }
    }
}

async fn is_ready(probe: &dyn ReadinessProbe) -> bool {
    match probe.is_framework_ready().await {
        Ok(true) => {}
        Ok(false) => return false,
        Err(err) => {
            debug!(error = %err, "framework probe failed");
            return false;
        }
    }
    match probe.is_game_ready().await {
        Ok(ready) => ready,
        Err(err) => {
            debug!(error = %err, "game probe failed");
            false
        }
    }
}
