use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{core::Collector, histogram_opts, Histogram, IntCounterVec, Registry};
use tracing::error;

use crate::error::AdapterErrorKind;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdapterMetricsSnapshot {
    pub evaluations: u64,
    pub evaluation_failures: u64,
    pub evaluation_latency_total_us: u64,
}

static EVALUATIONS: AtomicU64 = AtomicU64::new(0);
static EVALUATION_FAILURES: AtomicU64 = AtomicU64::new(0);
static EVALUATION_LATENCY_TOTAL_US: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    static ref CDP_EVALUATION_DURATION: Histogram = Histogram::with_opts(histogram_opts!(
        "autobuyer_cdp_evaluation_duration_seconds",
        "Script evaluation latency",
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]
    ))
    .unwrap();
    static ref CDP_EVALUATION_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            "autobuyer_cdp_evaluation_failures_total",
            "Script evaluations that failed"
        ),
        &["kind"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register cdp metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, CDP_EVALUATION_DURATION.clone());
    register(registry, CDP_EVALUATION_FAILURES_TOTAL.clone());
}

pub fn record_evaluation(duration: Duration) {
    EVALUATIONS.fetch_add(1, Ordering::Relaxed);
    let micros = duration.as_micros().min(u64::MAX as u128) as u64;
    EVALUATION_LATENCY_TOTAL_US.fetch_add(micros, Ordering::Relaxed);
    CDP_EVALUATION_DURATION.observe(duration.as_secs_f64());
}

pub fn record_evaluation_failure(kind: AdapterErrorKind) {
    EVALUATION_FAILURES.fetch_add(1, Ordering::Relaxed);
    CDP_EVALUATION_FAILURES_TOTAL
        .with_label_values(&[kind.as_str()])
        .inc();
}

pub fn snapshot() -> AdapterMetricsSnapshot {
    AdapterMetricsSnapshot {
        evaluations: EVALUATIONS.load(Ordering::Relaxed),
        evaluation_failures: EVALUATION_FAILURES.load(Ordering::Relaxed),
        evaluation_latency_total_us: EVALUATION_LATENCY_TOTAL_US.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_success_and_failure_metrics() {
        let before = snapshot();
        record_evaluation(Duration::from_micros(150));
        record_evaluation_failure(AdapterErrorKind::ScriptFailed);
        let after = snapshot();
        assert!(after.evaluations > before.evaluations);
        assert!(after.evaluation_failures > before.evaluation_failures);
        assert!(after.evaluation_latency_total_us >= before.evaluation_latency_total_us + 150);
    }
}
