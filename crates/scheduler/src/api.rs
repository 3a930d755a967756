use std::sync::Arc;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tool_buy::{BuyToolBuilder, InteractionPort};
use tracing::info;

use crate::category::CategoryRunner;
use crate::error::SchedulerError;
use crate::model::EngineConfig;
use crate::orchestrator::CycleOrchestrator;
use crate::ports::{BulkActionPort, CategoryNavPort, ItemListPort, ReadinessProbe, StatusSurface};
use crate::readiness::wait_until_ready;
use crate::reader::StateReader;
use crate::runtime::Scheduler;

/// Everything the engine needs from the page.
#[derive(Clone)]
pub struct EnginePorts {
    pub probe: Arc<dyn ReadinessProbe>,
    pub nav: Arc<dyn CategoryNavPort>,
    pub items: Arc<dyn ItemListPort>,
    pub interaction: Arc<dyn InteractionPort>,
    pub bulk: Arc<dyn BulkActionPort>,
    pub status: Arc<dyn StatusSurface>,
}

impl EnginePorts {
    /// All ports served by one object, as the page bridge does.
    pub fn from_shared<P>(page: Arc<P>) -> Self
    where
        P: ReadinessProbe
            + CategoryNavPort
            + ItemListPort
            + InteractionPort
            + BulkActionPort
            + StatusSurface
            + 'static,
    {
        Self {
            probe: page.clone(),
            nav: page.clone(),
            items: page.clone(),
            interaction: page.clone(),
            bulk: page.clone(),
            status: page,
        }
    }
}

/// Wires the engine together and drives its startup.
pub struct AutoBuyerService {
    config: Arc<EngineConfig>,
    probe: Arc<dyn ReadinessProbe>,
    scheduler: Scheduler,
}

impl AutoBuyerService {
    pub fn new(config: EngineConfig, ports: EnginePorts) -> Result<Self, SchedulerError> {
        config.validate()?;
        let config = Arc::new(config);

        let buyer = BuyToolBuilder::new(config.dispatch.clone())
            .with_port(ports.interaction)
            .build()?;
        let reader = StateReader::new(ports.nav, ports.items);
        let runner = CategoryRunner::new(reader, buyer, config.clone());
        let orchestrator = Arc::new(CycleOrchestrator::new(runner, ports.bulk, config.clone()));
        let scheduler = Scheduler::new(orchestrator, ports.status, config.clone())?;

        Ok(Self {
            config,
            probe: ports.probe,
            scheduler,
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Waits for the page, exposes the control, and optionally enables
    /// buying right away.
    pub async fn start(&self, cancel: &CancellationToken) -> Result<(), SchedulerError> {
        wait_until_ready(self.probe.as_ref(), &self.config.readiness, cancel).await?;
        tokio::select! {
            _ = cancel.cancelled() => return Err(SchedulerError::Cancelled),
            _ = sleep(self.config.readiness.settle()) => {}
        }
        self.scheduler.expose().await?;
        info!("auto-buyer control ready");
        if self.config.start_enabled {
            self.scheduler.enable().await;
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.scheduler.disable().await;
    }
}
