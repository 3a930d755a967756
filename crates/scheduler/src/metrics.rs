use std::sync::atomic::{AtomicU64, Ordering};

use autobuyer_core_types::CategoryId;
use lazy_static::lazy_static;
use once_cell::sync::Lazy;
use prometheus::{core::Collector, IntCounter, IntCounterVec, Opts, Registry};
use tracing::error;

#[derive(Default)]
struct Counters {
    cycles_started: AtomicU64,
    cycles_completed: AtomicU64,
    categories_run: AtomicU64,
    categories_skipped: AtomicU64,
    bulk_runs: AtomicU64,
}

static COUNTERS: Lazy<Counters> = Lazy::new(Counters::default);

lazy_static! {
    static ref CYCLES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("autobuyer_cycles_total", "Buying cycles by phase"),
        &["phase"]
    )
    .unwrap();
    static ref CATEGORY_RUNS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "autobuyer_category_runs_total",
            "Category visits by availability"
        ),
        &["category", "available"]
    )
    .unwrap();
    static ref BULK_PURCHASES_TOTAL: IntCounter = IntCounter::new(
        "autobuyer_bulk_purchases_total",
        "Cycles where a bulk upgrade action was attempted"
    )
    .unwrap();
}

fn increment(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register scheduler metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, CYCLES_TOTAL.clone());
    register(registry, CATEGORY_RUNS_TOTAL.clone());
    register(registry, BULK_PURCHASES_TOTAL.clone());
}

pub fn record_cycle_started() {
    increment(&COUNTERS.cycles_started);
    CYCLES_TOTAL.with_label_values(&["started"]).inc();
}

pub fn record_cycle_completed() {
    increment(&COUNTERS.cycles_completed);
    CYCLES_TOTAL.with_label_values(&["completed"]).inc();
}

pub fn record_category(category: CategoryId, available: bool) {
    if available {
        increment(&COUNTERS.categories_run);
    } else {
        increment(&COUNTERS.categories_skipped);
    }
    let available = if available { "true" } else { "false" };
    CATEGORY_RUNS_TOTAL
        .with_label_values(&[category.as_str(), available])
        .inc();
}

pub fn record_bulk(attempted: bool) {
    if attempted {
        increment(&COUNTERS.bulk_runs);
        BULK_PURCHASES_TOTAL.inc();
    }
}

#[derive(Clone, Debug, Default)]
pub struct SchedulerMetricsSnapshot {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub categories_run: u64,
    pub categories_skipped: u64,
    pub bulk_runs: u64,
}

pub fn snapshot() -> SchedulerMetricsSnapshot {
    SchedulerMetricsSnapshot {
        cycles_started: COUNTERS.cycles_started.load(Ordering::Relaxed),
        cycles_completed: COUNTERS.cycles_completed.load(Ordering::Relaxed),
        categories_run: COUNTERS.categories_run.load(Ordering::Relaxed),
        categories_skipped: COUNTERS.categories_skipped.load(Ordering::Relaxed),
        bulk_runs: COUNTERS.bulk_runs.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_categories_are_counted_apart() {
        let before = snapshot();
        record_category(CategoryId::Territory, false);
        record_category(CategoryId::Meat, true);
        record_bulk(false);
        let after = snapshot();
        assert!(after.categories_skipped > before.categories_skipped);
        assert!(after.categories_run > before.categories_run);

        let registry = Registry::new();
        register_metrics(&registry);
        register_metrics(&registry);
        assert!(registry
            .gather()
            .iter()
            .any(|family| family.get_name() == "autobuyer_category_runs_total"));
    }
}
