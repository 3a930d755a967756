use std::sync::atomic::{AtomicU64, Ordering};

use lazy_static::lazy_static;
use prometheus::{core::Collector, IntCounterVec, Opts, Registry};
use tracing::error;

use crate::model::{PurchaseOutcome, StrategyKind, StrategyVerdict};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuyMetricsSnapshot {
    pub bought: u64,
    pub skipped: u64,
    pub not_found: u64,
    pub dispatch_failed: u64,
}

static BOUGHT: AtomicU64 = AtomicU64::new(0);
static SKIPPED: AtomicU64 = AtomicU64::new(0);
static NOT_FOUND: AtomicU64 = AtomicU64::new(0);
static DISPATCH_FAILED: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    static ref PURCHASE_OUTCOMES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "autobuyer_purchase_outcomes_total",
            "Purchase attempts by outcome"
        ),
        &["outcome"]
    )
    .unwrap();
    static ref STRATEGY_VERDICTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "autobuyer_strategy_verdicts_total",
            "Dispatch strategy verdicts"
        ),
        &["strategy", "verdict"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register buy metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, PURCHASE_OUTCOMES_TOTAL.clone());
    register(registry, STRATEGY_VERDICTS_TOTAL.clone());
}

pub fn record_outcome(outcome: &PurchaseOutcome) {
    let counter = match outcome {
        PurchaseOutcome::Bought => &BOUGHT,
        PurchaseOutcome::Skipped(_) => &SKIPPED,
        PurchaseOutcome::NotFound => &NOT_FOUND,
        PurchaseOutcome::DispatchFailed => &DISPATCH_FAILED,
    };
    counter.fetch_add(1, Ordering::Relaxed);
    PURCHASE_OUTCOMES_TOTAL
        .with_label_values(&[outcome.as_str()])
        .inc();
}

pub fn record_verdict(kind: StrategyKind, verdict: &StrategyVerdict) {
    STRATEGY_VERDICTS_TOTAL
        .with_label_values(&[kind.as_str(), verdict.as_str()])
        .inc();
}

pub fn snapshot() -> BuyMetricsSnapshot {
    BuyMetricsSnapshot {
        bought: BOUGHT.load(Ordering::Relaxed),
        skipped: SKIPPED.load(Ordering::Relaxed),
        not_found: NOT_FOUND.load(Ordering::Relaxed),
        dispatch_failed: DISPATCH_FAILED.load(Ordering::Relaxed),
    }
}
