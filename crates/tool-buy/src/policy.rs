use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::StrategyKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchPolicyView {
    pub enabled: bool,
    /// Strategies tried for every purchase, in this order.
    pub strategies: Vec<StrategyKind>,
    /// Upper bound on the strategy phase of one purchase.
    pub total_timeout_ms: u64,
    /// Pause between consecutive strategies.
    pub strategy_gap_ms: u64,
    /// Parent hops searched when looking for the owning action handler.
    pub max_ascent_depth: u8,
    pub pointer: PointerTempo,
}

impl DispatchPolicyView {
    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }

    pub fn strategy_gap(&self) -> Duration {
        Duration::from_millis(self.strategy_gap_ms)
    }
}

impl Default for DispatchPolicyView {
    fn default() -> Self {
        Self {
            enabled: true,
            strategies: StrategyKind::DEFAULT_ORDER.to_vec(),
            total_timeout_ms: 5_000,
            strategy_gap_ms: 50,
            max_ascent_depth: 12,
            pointer: PointerTempo::default(),
        }
    }
}

/// Pacing between the synthetic pointer events of strategy A.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerTempo {
    pub step_ms: u64,
    /// Random extra delay in `0..=jitter_ms` added to every step.
    pub jitter_ms: u64,
}

impl Default for PointerTempo {
    fn default() -> Self {
        Self {
            step_ms: 30,
            jitter_ms: 0,
        }
    }
}
