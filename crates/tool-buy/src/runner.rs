use std::time::{Duration, Instant};

use autobuyer_core_types::ItemSnapshot;
use tokio::time::{self, sleep, timeout, timeout_at};
use tracing::{debug, info, instrument, warn};

use crate::errors::DispatchError;
use crate::metrics;
use crate::model::{
    DispatchReport, ExecCtx, PurchaseOutcome, SkipReason, StrategyKind, StrategyVerdict,
};
use crate::policy::DispatchPolicyView;
use crate::ports::InteractionPort;
use crate::strategy::DispatchStrategy;

/// Floor for closing the buy surface once the dispatch budget is spent.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

pub struct RuntimeDeps<'a> {
    pub port: &'a dyn InteractionPort,
    pub strategies: &'a [Box<dyn DispatchStrategy>],
    pub policy: &'a DispatchPolicyView,
}

enum Opened {
    Missing,
    Broken,
    Dispatched,
}

/// Opens the buy surface, settles, runs the strategy chain and closes the
/// surface again. Everything up to the close shares one deadline.
#[instrument(skip_all, fields(cycle = %ctx.cycle, category = %ctx.category, item = %item.identity))]
pub async fn execute(ctx: &ExecCtx, item: &ItemSnapshot, deps: RuntimeDeps<'_>) -> DispatchReport {
    let mut report = DispatchReport::new(Instant::now());
    if !deps.policy.enabled {
        return conclude(report, PurchaseOutcome::Skipped(SkipReason::Disabled));
    }

    let budget = deps.policy.total_timeout();
    let deadline = time::Instant::now() + budget;
    let dispatch = open_and_dispatch(ctx, item, &deps, &mut report.verdicts);
    let opened = match timeout_at(deadline, dispatch).await {
        Ok(opened) => opened,
        Err(_) => {
            warn!(error = %DispatchError::TimedOut(budget), "dispatch cut short");
            report.timed_out = true;
            Opened::Dispatched
        }
    };

    if matches!(opened, Opened::Missing) {
        return conclude(report, PurchaseOutcome::NotFound);
    }

    let remaining = deadline
        .saturating_duration_since(time::Instant::now())
        .max(CLOSE_GRACE);
    if timeout(remaining, close_surface(deps.port)).await.is_err() {
        warn!(limit_ms = remaining.as_millis() as u64, "closing buy surface timed out");
    }

    let outcome = match opened {
        Opened::Broken => PurchaseOutcome::NotFound,
        _ if report.any_fired() => PurchaseOutcome::Bought,
        _ => PurchaseOutcome::DispatchFailed,
    };
    conclude(report, outcome)
}

async fn open_and_dispatch(
    ctx: &ExecCtx,
    item: &ItemSnapshot,
    deps: &RuntimeDeps<'_>,
    verdicts: &mut Vec<(StrategyKind, StrategyVerdict)>,
) -> Opened {
    match deps.port.open_surface(item).await {
        Ok(true) => {}
        Ok(false) => {
            let err = DispatchError::SurfaceMissing(item.identity.0.clone());
            debug!(error = %err, "nothing to open");
            return Opened::Missing;
        }
        Err(err) => {
            warn!(error = %DispatchError::Port(err), "opening buy surface failed");
            return Opened::Broken;
        }
    }
    sleep(ctx.settle).await;
    run_strategies(item, deps, verdicts).await;
    Opened::Dispatched
}

async fn run_strategies(
    item: &ItemSnapshot,
    deps: &RuntimeDeps<'_>,
    verdicts: &mut Vec<(StrategyKind, StrategyVerdict)>,
) {
    let mut handled = false;
    let mut ran_any = false;
    for strategy in deps.strategies {
        let kind = strategy.kind();
        if handled && strategy.last_resort() {
            verdicts.push((kind, StrategyVerdict::Skipped));
            continue;
        }
        if ran_any {
            sleep(deps.policy.strategy_gap()).await;
        }
        ran_any = true;

        let verdict = strategy.attempt(deps.port, item, deps.policy).await;
        match &verdict {
            StrategyVerdict::Failed(reason) => {
                debug!(strategy = kind.as_str(), %reason, "strategy failed")
            }
            other => debug!(strategy = kind.as_str(), verdict = other.as_str(), "strategy done"),
        }
        metrics::record_verdict(kind, &verdict);
        handled |= verdict == StrategyVerdict::Handled;
        verdicts.push((kind, verdict));
    }
}

async fn close_surface(port: &dyn InteractionPort) {
    if let Err(err) = port.close_surface().await {
        warn!(error = %err, "closing buy surface failed");
    }
}

fn conclude(report: DispatchReport, outcome: PurchaseOutcome) -> DispatchReport {
    let report = report.finish(outcome, Instant::now());
    metrics::record_outcome(&outcome);
    match outcome.error_class() {
        None => info!(latency_ms = report.latency_ms as u64, "purchase dispatched"),
        Some(class) => info!(
            outcome = outcome.as_str(),
            class = %class,
            timed_out = report.timed_out,
            "purchase not dispatched"
        ),
    }
    report
}
