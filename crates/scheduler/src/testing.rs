//! In-memory page used by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use autobuyer_core_types::{BuyerError, CategoryId, CycleId, HandlerRef, ItemSnapshot};
use parking_lot::Mutex;
use tokio::time::Instant;
use tool_buy::{InteractionPort, PointerEvent};

use crate::model::{EngineConfig, Pacing, StatusTone};
use crate::orchestrator::CycleRunner;
use crate::ports::{
    ActivateHandler, BulkActionPort, CategoryNavPort, ItemListPort, ReadinessProbe, StatusSurface,
};

pub fn item(name: &str, owned: f64, offered: f64, category: CategoryId) -> ItemSnapshot {
    ItemSnapshot::new(name, owned, offered, true, category)
}

pub fn fast_config() -> EngineConfig {
    EngineConfig {
        pacing: Pacing {
            tab_load_ms: 10,
            inter_category_ms: 20,
            inter_purchase_ms: 100,
            dropdown_settle_ms: 5,
        },
        ..EngineConfig::default()
    }
}

#[derive(Default)]
pub struct FakePage {
    pub present: HashMap<CategoryId, bool>,
    pub rows: HashMap<CategoryId, Vec<ItemSnapshot>>,
    /// Strategy A succeeds.
    pub pointer_ok: bool,
    pub menu: bool,
    pub buy_all_enabled: bool,
    pub cheapest_enabled: bool,
    /// Readiness flips to true after this many game probes.
    pub ready_after: usize,
    pub probes: AtomicUsize,
    pub calls: Mutex<Vec<(Instant, String)>>,
    pub labels: Mutex<Vec<(String, StatusTone)>>,
    pub handler: Mutex<Option<ActivateHandler>>,
}

impl FakePage {
    pub fn with_rows(mut self, category: CategoryId, rows: Vec<ItemSnapshot>) -> Self {
        self.present.insert(category, true);
        self.rows.insert(category, rows);
        self
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().push((Instant::now(), call.into()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, String)> {
        self.calls.lock().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn last_tone(&self) -> Option<StatusTone> {
        self.labels.lock().last().map(|(_, tone)| *tone)
    }

    pub fn press_control(&self) -> bool {
        match self.handler.lock().clone() {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ReadinessProbe for FakePage {
    async fn is_framework_ready(&self) -> Result<bool, BuyerError> {
        Ok(true)
    }

    async fn is_game_ready(&self) -> Result<bool, BuyerError> {
        let seen = self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(seen >= self.ready_after)
    }
}

#[async_trait]
impl CategoryNavPort for FakePage {
    async fn is_present(&self, category: CategoryId) -> Result<bool, BuyerError> {
        self.log(format!("present:{category}"));
        Ok(self.present.get(&category).copied().unwrap_or(false))
    }

    async fn activate(&self, category: CategoryId) -> Result<bool, BuyerError> {
        self.log(format!("activate:{category}"));
        Ok(self.present.get(&category).copied().unwrap_or(false))
    }
}

#[async_trait]
impl ItemListPort for FakePage {
    async fn list_items(&self, category: CategoryId) -> Result<Vec<ItemSnapshot>, BuyerError> {
        self.log(format!("list:{category}"));
        Ok(self.rows.get(&category).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl InteractionPort for FakePage {
    async fn open_surface(&self, item: &ItemSnapshot) -> Result<bool, BuyerError> {
        self.log(format!("open:{}", item.identity));
        Ok(true)
    }

    async fn close_surface(&self) -> Result<(), BuyerError> {
        self.log("close");
        Ok(())
    }

    async fn pointer_event(
        &self,
        _item: &ItemSnapshot,
        _event: PointerEvent,
    ) -> Result<bool, BuyerError> {
        Ok(self.pointer_ok)
    }

    async fn trigger_event(&self, _item: &ItemSnapshot) -> Result<bool, BuyerError> {
        Ok(false)
    }

    async fn ascend_for_handler(
        &self,
        _item: &ItemSnapshot,
        _max_depth: u8,
    ) -> Result<Option<HandlerRef>, BuyerError> {
        Ok(None)
    }

    async fn invoke_handler(
        &self,
        _item: &ItemSnapshot,
        _handler: &HandlerRef,
    ) -> Result<bool, BuyerError> {
        Ok(false)
    }

    async fn submit_native(&self, _item: &ItemSnapshot) -> Result<bool, BuyerError> {
        Ok(false)
    }

    async fn follow_link(&self, _item: &ItemSnapshot) -> Result<bool, BuyerError> {
        Ok(false)
    }
}

#[async_trait]
impl BulkActionPort for FakePage {
    async fn has_overflow_menu(&self) -> Result<bool, BuyerError> {
        self.log("menu?");
        Ok(self.menu)
    }

    async fn open_overflow_menu(&self) -> Result<(), BuyerError> {
        self.log("menu:open");
        Ok(())
    }

    async fn buy_all_affordable(&self) -> Result<bool, BuyerError> {
        self.log("menu:all");
        Ok(self.buy_all_enabled)
    }

    async fn buy_cheapest_affordable(&self) -> Result<bool, BuyerError> {
        self.log("menu:cheapest");
        Ok(self.cheapest_enabled)
    }

    async fn close_overflow_menu(&self) -> Result<(), BuyerError> {
        self.log("menu:close");
        Ok(())
    }
}

#[async_trait]
impl StatusSurface for FakePage {
    async fn set_label(&self, text: &str) -> Result<(), BuyerError> {
        self.labels.lock().push((text.to_string(), StatusTone::Off));
        Ok(())
    }

    async fn set_tone(&self, tone: StatusTone) -> Result<(), BuyerError> {
        if let Some(last) = self.labels.lock().last_mut() {
            last.1 = tone;
        }
        Ok(())
    }

    async fn on_activate(&self, handler: ActivateHandler) -> Result<(), BuyerError> {
        *self.handler.lock() = Some(handler);
        Ok(())
    }
}

/// Cycle runner that only counts and optionally takes time.
#[derive(Default)]
pub struct CountingRunner {
    pub duration: Duration,
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl CountingRunner {
    pub fn taking(duration: Duration) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CycleRunner for CountingRunner {
    async fn run_cycle(&self, _cycle: CycleId) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.duration.is_zero() {
            tokio::time::sleep(self.duration).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn shared(page: FakePage) -> Arc<FakePage> {
    Arc::new(page)
}
