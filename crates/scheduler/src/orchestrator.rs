use std::sync::Arc;

use async_trait::async_trait;
use autobuyer_core_types::CycleId;
use tokio::time::sleep;
use tool_buy::ErrorClass;
use tracing::{info, instrument, warn};

use crate::category::CategoryRunner;
use crate::metrics;
use crate::model::{BulkReport, CycleReport, EngineConfig};
use crate::ports::BulkActionPort;

/// One awaitable unit of work for the scheduler.
#[async_trait]
pub trait CycleRunner: Send + Sync {
    async fn run_cycle(&self, cycle: CycleId);
}

pub struct CycleOrchestrator {
    runner: CategoryRunner,
    bulk: Arc<dyn BulkActionPort>,
    config: Arc<EngineConfig>,
}

impl CycleOrchestrator {
    pub fn new(
        runner: CategoryRunner,
        bulk: Arc<dyn BulkActionPort>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            runner,
            bulk,
            config,
        }
    }

    /// Categories in configured order, each followed by the inter-category
    /// pause, then the bulk upgrade step. A locked category never stops the
    /// rest of the cycle.
    #[instrument(skip(self), fields(cycle = %cycle))]
    pub async fn execute(&self, cycle: CycleId) -> CycleReport {
        let mut categories = Vec::with_capacity(self.config.categories.len());
        for category in &self.config.categories {
            categories.push(self.runner.run_category(&cycle, *category).await);
            sleep(self.config.pacing.inter_category()).await;
        }
        let bulk = self.run_bulk_upgrades().await;
        CycleReport {
            cycle,
            categories,
            bulk,
        }
    }

    pub async fn run_bulk_upgrades(&self) -> BulkReport {
        let mut report = BulkReport::default();
        match self.bulk.has_overflow_menu().await {
            Ok(true) => report.menu_present = true,
            Ok(false) => {
                info!(class = %ErrorClass::AdapterUnavailable, "no upgrade menu");
                return report;
            }
            Err(err) => {
                warn!(error = %err, "upgrade menu probe failed");
                return report;
            }
        }

        if let Err(err) = self.bulk.open_overflow_menu().await {
            warn!(error = %err, "opening upgrade menu failed");
        } else {
            sleep(self.config.pacing.dropdown_settle()).await;
            report.bought_all = self.bulk.buy_all_affordable().await.unwrap_or_else(|err| {
                warn!(error = %err, "buy-all upgrades failed");
                false
            });
            report.bought_cheapest =
                self.bulk
                    .buy_cheapest_affordable()
                    .await
                    .unwrap_or_else(|err| {
                        warn!(error = %err, "buy-cheapest upgrades failed");
                        false
                    });
        }

        if let Err(err) = self.bulk.close_overflow_menu().await {
            warn!(error = %err, "closing upgrade menu failed");
        }
        metrics::record_bulk(report.bought_all || report.bought_cheapest);
        info!(
            bought_all = report.bought_all,
            bought_cheapest = report.bought_cheapest,
            "upgrades processed"
        );
        report
    }
}

#[async_trait]
impl CycleRunner for CycleOrchestrator {
    async fn run_cycle(&self, cycle: CycleId) {
        let report = self.execute(cycle).await;
        let bought: usize = report.categories.iter().map(|c| c.bought()).sum();
        info!(
            cycle = %report.cycle,
            bought,
            upgrades = report.bulk.bought_all || report.bulk.bought_cheapest,
            "cycle summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use tool_buy::BuyToolBuilder;

    use super::*;
    use crate::reader::StateReader;
    use crate::testing::{fast_config, item, shared, FakePage};
    use autobuyer_core_types::CategoryId;

    fn orchestrator(page: &Arc<FakePage>) -> CycleOrchestrator {
        let config = Arc::new(fast_config());
        let buyer = BuyToolBuilder::new(config.dispatch.clone())
            .with_port(page.clone())
            .build()
            .unwrap();
        let runner = CategoryRunner::new(
            StateReader::new(page.clone(), page.clone()),
            buyer,
            config.clone(),
        );
        CycleOrchestrator::new(runner, page.clone(), config)
    }

    #[tokio::test(start_paused = true)]
    async fn categories_run_in_order_then_bulk() {
        let page = shared(
            FakePage {
                menu: true,
                ..FakePage::default()
            }
            .with_rows(
                CategoryId::Territory,
                vec![item("swarmling", 0.0, 4.0, CategoryId::Territory)],
            ),
        );
        let report = orchestrator(&page).execute(CycleId::new()).await;

        let nav: Vec<_> = page
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("present:") || c.starts_with("menu"))
            .collect();
        assert_eq!(
            nav,
            vec![
                "present:meat",
                "present:territory",
                "menu?",
                "menu:open",
                "menu:all",
                "menu:cheapest",
                "menu:close",
            ]
        );
        assert!(!report.categories[0].available);
        assert!(report.categories[1].available);
        assert_eq!(report.categories[1].outcomes.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_menu_takes_no_action() {
        let page = shared(FakePage::default());
        let report = orchestrator(&page).run_bulk_upgrades().await;

        assert_eq!(report, BulkReport::default());
        assert_eq!(page.calls(), vec!["menu?"]);
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_reports_which_actions_were_enabled() {
        let page = shared(FakePage {
            menu: true,
            buy_all_enabled: false,
            cheapest_enabled: true,
            ..FakePage::default()
        });
        let report = orchestrator(&page).run_bulk_upgrades().await;

        assert!(report.menu_present);
        assert!(!report.bought_all);
        assert!(report.bought_cheapest);
        assert_eq!(page.calls().last().map(String::as_str), Some("menu:close"));
    }
}
