use std::sync::Arc;

use autobuyer_core_types::{CategoryId, CycleId};
use tokio::time::sleep;
use tool_buy::{decide, BuyTool, Decision, ErrorClass, ExecCtx, PurchaseOutcome};
use tracing::{debug, info, instrument};

use crate::metrics;
use crate::model::{CategoryReport, EngineConfig};
use crate::reader::StateReader;

/// Read → decide → dispatch over every row of one category.
pub struct CategoryRunner {
    reader: StateReader,
    buyer: Arc<dyn BuyTool>,
    config: Arc<EngineConfig>,
}

impl CategoryRunner {
    pub fn new(reader: StateReader, buyer: Arc<dyn BuyTool>, config: Arc<EngineConfig>) -> Self {
        Self {
            reader,
            buyer,
            config,
        }
    }

    /// Rows are walked bottom-up: the highest tier goes first so buying a
    /// cheap unit cannot starve the expensive one in the same pass.
    #[instrument(skip(self), fields(cycle = %cycle))]
    pub async fn run_category(&self, cycle: &CycleId, category: CategoryId) -> CategoryReport {
        let mut report = CategoryReport::new(category);
        if !self.reader.is_category_available(category).await
            || !self.reader.activate(category).await
        {
            info!(class = %ErrorClass::AdapterUnavailable, "category locked or missing");
            metrics::record_category(category, false);
            return report;
        }
        report.available = true;
        metrics::record_category(category, true);

        let pacing = &self.config.pacing;
        sleep(pacing.tab_load()).await;

        let items = self.reader.list_items(category).await;
        let ctx = ExecCtx::new(cycle.clone(), category, pacing.dropdown_settle());
        for item in items.iter().rev() {
            let outcome = match decide(item) {
                Decision::Buy => self.buyer.attempt_purchase(&ctx, item).await,
                Decision::Skip(reason) => {
                    debug!(item = %item.identity, %reason, "skipping");
                    let outcome = PurchaseOutcome::Skipped(reason);
                    tool_buy::metrics::record_outcome(&outcome);
                    outcome
                }
            };
            report.outcomes.push((item.identity.clone(), outcome));
            sleep(pacing.inter_purchase()).await;
        }

        info!(
            rows = report.outcomes.len(),
            bought = report.bought(),
            "category finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tool_buy::{BuyToolBuilder, SkipReason};

    use super::*;
    use crate::testing::{fast_config, item, shared, FakePage};

    fn runner(page: &Arc<FakePage>) -> CategoryRunner {
        let config = Arc::new(fast_config());
        let buyer = BuyToolBuilder::new(config.dispatch.clone())
            .with_port(page.clone())
            .build()
            .unwrap();
        CategoryRunner::new(StateReader::new(page.clone(), page.clone()), buyer, config)
    }

    #[tokio::test(start_paused = true)]
    async fn rows_are_bought_bottom_up() {
        let page = shared(
            FakePage {
                pointer_ok: true,
                ..FakePage::default()
            }
            .with_rows(
                CategoryId::Meat,
                vec![
                    item("drone", 0.0, 5.0, CategoryId::Meat),
                    item("queen", 0.0, 2.0, CategoryId::Meat),
                    item("nest", 1.0, 3.0, CategoryId::Meat),
                ],
            ),
        );
        let report = runner(&page)
            .run_category(&CycleId::new(), CategoryId::Meat)
            .await;

        assert!(report.available);
        let order: Vec<_> = report.outcomes.iter().map(|(id, _)| id.0.as_str()).collect();
        assert_eq!(order, vec!["nest", "queen", "drone"]);
        assert_eq!(report.bought(), 3);

        let opens: Vec<_> = page
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("open:"))
            .collect();
        assert_eq!(opens, vec!["open:nest", "open:queen", "open:drone"]);
    }

    #[tokio::test(start_paused = true)]
    async fn locked_category_dispatches_nothing() {
        let page = shared(FakePage::default().with_rows(
            CategoryId::Meat,
            vec![item("drone", 0.0, 5.0, CategoryId::Meat)],
        ));
        let report = runner(&page)
            .run_category(&CycleId::new(), CategoryId::Territory)
            .await;

        assert!(!report.available);
        assert!(report.outcomes.is_empty());
        assert_eq!(page.calls(), vec!["present:territory"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_dispatch_moves_on_after_pause() {
        let page = shared(FakePage::default().with_rows(
            CategoryId::Meat,
            vec![
                item("hatchery", 0.0, 3.0, CategoryId::Meat),
                item("drone", 5.0, 8.0, CategoryId::Meat),
            ],
        ));
        let report = runner(&page)
            .run_category(&CycleId::new(), CategoryId::Meat)
            .await;

        assert_eq!(
            report.outcomes.iter().map(|(_, o)| *o).collect::<Vec<_>>(),
            vec![PurchaseOutcome::DispatchFailed, PurchaseOutcome::DispatchFailed]
        );

        let calls = page.timed_calls();
        let first_close = calls
            .iter()
            .find(|(_, c)| c == "close")
            .map(|(at, _)| *at)
            .unwrap();
        let next_open = calls
            .iter()
            .find(|(_, c)| c == "open:hatchery")
            .map(|(at, _)| *at)
            .unwrap();
        assert!(next_open - first_close >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn rows_without_gain_are_skipped() {
        let mut locked = item("larva", 0.0, 9.0, CategoryId::Meat);
        locked.purchasable = false;
        let page = shared(FakePage::default().with_rows(
            CategoryId::Meat,
            vec![item("drone", 5.0, 5.0, CategoryId::Meat), locked],
        ));
        let report = runner(&page)
            .run_category(&CycleId::new(), CategoryId::Meat)
            .await;

        assert_eq!(
            report.outcomes.iter().map(|(_, o)| *o).collect::<Vec<_>>(),
            vec![
                PurchaseOutcome::Skipped(SkipReason::NotPurchasable),
                PurchaseOutcome::Skipped(SkipReason::NoNetGain),
            ]
        );
        assert!(!page.calls().iter().any(|c| c.starts_with("open:")));
    }
}
