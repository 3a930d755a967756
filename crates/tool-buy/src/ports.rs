use async_trait::async_trait;
use autobuyer_core_types::{BuyerError, HandlerRef, ItemSnapshot};

use crate::model::PointerEvent;

/// Side-effecting half of the item list adapter.
///
/// Methods returning `bool` report whether the page had the element or API the
/// call needed; `false` is a normal answer, not an error.
#[async_trait]
pub trait InteractionPort: Send + Sync {
    /// Expands the row's buy dropdown. `false` when the row or toggle is gone.
    async fn open_surface(&self, item: &ItemSnapshot) -> Result<bool, BuyerError>;
    async fn close_surface(&self) -> Result<(), BuyerError>;
    async fn pointer_event(
        &self,
        item: &ItemSnapshot,
        event: PointerEvent,
    ) -> Result<bool, BuyerError>;
    /// Fires the host page's own event-trigger API on the buy control.
    async fn trigger_event(&self, item: &ItemSnapshot) -> Result<bool, BuyerError>;
    /// Walks up from the buy control through its owners looking for the
    /// element that exposes the control's action handler.
    async fn ascend_for_handler(
        &self,
        item: &ItemSnapshot,
        max_depth: u8,
    ) -> Result<Option<HandlerRef>, BuyerError>;
    /// Applies the handler and forces the page to refresh its state.
    async fn invoke_handler(
        &self,
        item: &ItemSnapshot,
        handler: &HandlerRef,
    ) -> Result<bool, BuyerError>;
    async fn submit_native(&self, item: &ItemSnapshot) -> Result<bool, BuyerError>;
    async fn follow_link(&self, item: &ItemSnapshot) -> Result<bool, BuyerError>;
}
