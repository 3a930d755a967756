use std::time::Duration;

use autobuyer_core_types::{CategoryId, CycleId, ItemId};
use serde::{Deserialize, Serialize};
use tool_buy::{DispatchPolicyView, PurchaseOutcome};

use crate::error::SchedulerError;

/// Immutable engine settings. Build a new engine to change them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cycle_interval_ms: u64,
    /// How often the countdown label refreshes.
    pub countdown_tick_ms: u64,
    /// Turn buying on as soon as the control is exposed.
    pub start_enabled: bool,
    /// Categories visited each cycle, in order.
    pub categories: Vec<CategoryId>,
    pub pacing: Pacing,
    pub readiness: ReadinessConfig,
    pub dispatch: DispatchPolicyView,
}

impl EngineConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.cycle_interval_ms == 0 {
            return Err(SchedulerError::InvalidConfig(
                "cycle_interval_ms must be positive".into(),
            ));
        }
        if self.countdown_tick_ms == 0 {
            return Err(SchedulerError::InvalidConfig(
                "countdown_tick_ms must be positive".into(),
            ));
        }
        if self.readiness.poll_ms == 0 {
            return Err(SchedulerError::InvalidConfig(
                "readiness.poll_ms must be positive".into(),
            ));
        }
        if self.categories.is_empty() {
            return Err(SchedulerError::InvalidConfig(
                "at least one category is required".into(),
            ));
        }
        if self.dispatch.total_timeout_ms == 0 {
            return Err(SchedulerError::InvalidConfig(
                "dispatch.total_timeout_ms must be positive".into(),
            ));
        }
        if self.dispatch.strategies.is_empty() {
            return Err(SchedulerError::InvalidConfig(
                "dispatch.strategies is empty".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 60_000,
            countdown_tick_ms: 1_000,
            start_enabled: false,
            categories: CategoryId::ALL.to_vec(),
            pacing: Pacing::default(),
            readiness: ReadinessConfig::default(),
            dispatch: DispatchPolicyView::default(),
        }
    }
}

/// Waits that let the page finish its own updates before the next step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    pub tab_load_ms: u64,
    pub inter_category_ms: u64,
    pub inter_purchase_ms: u64,
    pub dropdown_settle_ms: u64,
}

impl Pacing {
    pub fn tab_load(&self) -> Duration {
        Duration::from_millis(self.tab_load_ms)
    }

    pub fn inter_category(&self) -> Duration {
        Duration::from_millis(self.inter_category_ms)
    }

    pub fn inter_purchase(&self) -> Duration {
        Duration::from_millis(self.inter_purchase_ms)
    }

    pub fn dropdown_settle(&self) -> Duration {
        Duration::from_millis(self.dropdown_settle_ms)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            tab_load_ms: 500,
            inter_category_ms: 1_000,
            inter_purchase_ms: 100,
            dropdown_settle_ms: 200,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub poll_ms: u64,
    /// Extra wait between readiness and exposing the control.
    pub settle_ms: u64,
    /// `None` polls until cancelled.
    pub timeout_ms: Option<u64>,
}

impl ReadinessConfig {
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_ms: 500,
            settle_ms: 2_000,
            timeout_ms: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CycleState {
    Disabled,
    /// Enabled, waiting for an earlier cycle to give up the cycle slot.
    Idle,
    Buying,
    CountingDown,
}

impl CycleState {
    pub fn is_enabled(self) -> bool {
        !matches!(self, CycleState::Disabled)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StatusTone {
    Off,
    Active,
    Busy,
}

#[derive(Clone, Debug)]
pub struct CategoryReport {
    pub category: CategoryId,
    pub available: bool,
    /// Outcomes in the order items were processed.
    pub outcomes: Vec<(ItemId, PurchaseOutcome)>,
}

impl CategoryReport {
    pub fn new(category: CategoryId) -> Self {
        Self {
            category,
            available: false,
            outcomes: Vec::new(),
        }
    }

    pub fn bought(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == PurchaseOutcome::Bought)
            .count()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BulkReport {
    pub menu_present: bool,
    pub bought_all: bool,
    pub bought_cheapest: bool,
}

#[derive(Clone, Debug)]
pub struct CycleReport {
    pub cycle: CycleId,
    pub categories: Vec<CategoryReport>,
    pub bulk: BulkReport,
}
