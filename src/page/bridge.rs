use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use autobuyer_core_types::{BuyerError, CategoryId, HandlerRef, ItemSnapshot};
use autobuyer_scheduler::ports::{
    ActivateHandler, BulkActionPort, CategoryNavPort, ItemListPort, ReadinessProbe, StatusSurface,
};
use autobuyer_scheduler::StatusTone;
use cdp_adapter::{AdapterError, Cdp};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tool_buy::{InteractionPort, PointerEvent};
use tracing::{debug, info};

use super::quantity::parse_quantity;
use super::scripts;

const CLICK_POLL: Duration = Duration::from_millis(250);

/// Serves every engine port by evaluating scripts in the game tab.
pub struct PageBridge {
    cdp: Arc<dyn Cdp>,
    click_poll: Duration,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    name: String,
    owned: String,
    offered: String,
    purchasable: bool,
}

impl PageBridge {
    pub fn new(cdp: Arc<dyn Cdp>) -> Self {
        Self {
            cdp,
            click_poll: CLICK_POLL,
            watcher: Mutex::new(None),
        }
    }

    pub fn with_click_poll(mut self, every: Duration) -> Self {
        self.click_poll = every;
        self
    }

    async fn run(&self, body: &str, args: Value) -> Result<Value, BuyerError> {
        run_script(self.cdp.as_ref(), body, &args).await
    }

    async fn run_bool(&self, body: &str, args: Value) -> Result<bool, BuyerError> {
        Ok(self.run(body, args).await?.as_bool().unwrap_or(false))
    }
}

impl Drop for PageBridge {
    fn drop(&mut self) {
        if let Some(task) = self.watcher.lock().take() {
            task.abort();
        }
    }
}

async fn run_script(cdp: &dyn Cdp, body: &str, args: &Value) -> Result<Value, BuyerError> {
    cdp.evaluate(&scripts::wrap(body, args))
        .await
        .map_err(adapter_error)
}

fn adapter_error(err: AdapterError) -> BuyerError {
    BuyerError::new(format!("page script failed: {err}"))
}

fn tone_color(tone: StatusTone) -> &'static str {
    match tone {
        StatusTone::Off => "#ff4444",
        StatusTone::Active => "#44ff44",
        StatusTone::Busy => "#ffaa00",
    }
}

fn snapshot(row: RawRow, category: CategoryId) -> ItemSnapshot {
    ItemSnapshot::new(
        row.name,
        parse_quantity(&row.owned),
        parse_quantity(&row.offered),
        row.purchasable,
        category,
    )
}

/// Calls `handler` once per click counted on the page since `seen`.
async fn watch_clicks(
    cdp: Arc<dyn Cdp>,
    mut seen: u64,
    every: Duration,
    handler: ActivateHandler,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let count = match run_script(cdp.as_ref(), scripts::READ_CLICKS, &json!({})).await {
            Ok(value) => value.as_u64().unwrap_or(0),
            Err(err) => {
                debug!(error = %err, "reading control clicks failed");
                continue;
            }
        };
        // A reload resets the page counter.
        if count < seen {
            seen = 0;
        }
        for _ in seen..count {
            handler();
        }
        seen = count;
    }
}

#[async_trait]
impl ReadinessProbe for PageBridge {
    async fn is_framework_ready(&self) -> Result<bool, BuyerError> {
        self.run_bool(scripts::FRAMEWORK_READY, json!({})).await
    }

    async fn is_game_ready(&self) -> Result<bool, BuyerError> {
        self.run_bool(scripts::GAME_READY, json!({})).await
    }
}

#[async_trait]
impl CategoryNavPort for PageBridge {
    async fn is_present(&self, category: CategoryId) -> Result<bool, BuyerError> {
        self.run_bool(scripts::TAB_PRESENT, json!({ "tab": category.as_str() }))
            .await
    }

    async fn activate(&self, category: CategoryId) -> Result<bool, BuyerError> {
        self.run_bool(scripts::TAB_ACTIVATE, json!({ "tab": category.as_str() }))
            .await
    }
}

#[async_trait]
impl ItemListPort for PageBridge {
    async fn list_items(&self, category: CategoryId) -> Result<Vec<ItemSnapshot>, BuyerError> {
        let value = self.run(scripts::LIST_ITEMS, json!({})).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        let rows: Vec<RawRow> = serde_json::from_value(value)
            .map_err(|err| BuyerError::new(format!("unexpected row data: {err}")))?;
        Ok(rows.into_iter().map(|row| snapshot(row, category)).collect())
    }
}

#[async_trait]
impl InteractionPort for PageBridge {
    async fn open_surface(&self, item: &ItemSnapshot) -> Result<bool, BuyerError> {
        self.run_bool(scripts::OPEN_SURFACE, json!({ "name": item.identity.0 }))
            .await
    }

    async fn close_surface(&self) -> Result<(), BuyerError> {
        self.run(scripts::CLOSE_SURFACE, json!({})).await.map(|_| ())
    }

    async fn pointer_event(
        &self,
        item: &ItemSnapshot,
        event: PointerEvent,
    ) -> Result<bool, BuyerError> {
        self.run_bool(
            scripts::POINTER_EVENT,
            json!({ "name": item.identity.0, "event": event.dom_type() }),
        )
        .await
    }

    async fn trigger_event(&self, item: &ItemSnapshot) -> Result<bool, BuyerError> {
        self.run_bool(scripts::TRIGGER_EVENT, json!({ "name": item.identity.0 }))
            .await
    }

    async fn ascend_for_handler(
        &self,
        item: &ItemSnapshot,
        max_depth: u8,
    ) -> Result<Option<HandlerRef>, BuyerError> {
        let value = self
            .run(
                scripts::ASCEND_FOR_HANDLER,
                json!({ "name": item.identity.0, "maxDepth": max_depth }),
            )
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|err| BuyerError::new(format!("unexpected handler data: {err}")))
    }

    async fn invoke_handler(
        &self,
        item: &ItemSnapshot,
        handler: &HandlerRef,
    ) -> Result<bool, BuyerError> {
        self.run_bool(
            scripts::INVOKE_HANDLER,
            json!({
                "name": item.identity.0,
                "depth": handler.depth,
                "expression": handler.expression,
            }),
        )
        .await
    }

    async fn submit_native(&self, item: &ItemSnapshot) -> Result<bool, BuyerError> {
        self.run_bool(scripts::SUBMIT_NATIVE, json!({ "name": item.identity.0 }))
            .await
    }

    async fn follow_link(&self, item: &ItemSnapshot) -> Result<bool, BuyerError> {
        self.run_bool(scripts::FOLLOW_LINK, json!({ "name": item.identity.0 }))
            .await
    }
}

#[async_trait]
impl BulkActionPort for PageBridge {
    async fn has_overflow_menu(&self) -> Result<bool, BuyerError> {
        self.run_bool(scripts::HAS_OVERFLOW_MENU, json!({})).await
    }

    async fn open_overflow_menu(&self) -> Result<(), BuyerError> {
        if self.run_bool(scripts::OPEN_OVERFLOW_MENU, json!({})).await? {
            Ok(())
        } else {
            Err(BuyerError::new("overflow menu disappeared"))
        }
    }

    async fn buy_all_affordable(&self) -> Result<bool, BuyerError> {
        self.run_bool(scripts::BULK_ACTION, json!({ "action": "buyAllUpgrades" }))
            .await
    }

    async fn buy_cheapest_affordable(&self) -> Result<bool, BuyerError> {
        self.run_bool(
            scripts::BULK_ACTION,
            json!({ "action": "buyCheapestUpgrades" }),
        )
        .await
    }

    async fn close_overflow_menu(&self) -> Result<(), BuyerError> {
        self.run(scripts::CLOSE_SURFACE, json!({})).await.map(|_| ())
    }
}

#[async_trait]
impl StatusSurface for PageBridge {
    async fn set_label(&self, text: &str) -> Result<(), BuyerError> {
        self.run(scripts::SET_LABEL, json!({ "text": text }))
            .await
            .map(|_| ())
    }

    async fn set_tone(&self, tone: StatusTone) -> Result<(), BuyerError> {
        self.run(scripts::SET_TONE, json!({ "color": tone_color(tone) }))
            .await
            .map(|_| ())
    }

    async fn on_activate(&self, handler: ActivateHandler) -> Result<(), BuyerError> {
        let seen = self
            .run(scripts::READ_CLICKS, json!({}))
            .await?
            .as_u64()
            .unwrap_or(0);
        let task = tokio::spawn(watch_clicks(
            self.cdp.clone(),
            seen,
            self.click_poll,
            handler,
        ));
        if let Some(previous) = self.watcher.lock().replace(task) {
            previous.abort();
        }
        info!(control = scripts::CONTROL_ID, "status control wired");
        Ok(())
    }
}
