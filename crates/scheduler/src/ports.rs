use std::sync::Arc;

use async_trait::async_trait;
use autobuyer_core_types::{BuyerError, CategoryId, ItemSnapshot};

use crate::model::StatusTone;

/// Polled before the engine exposes its control.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn is_framework_ready(&self) -> Result<bool, BuyerError>;
    async fn is_game_ready(&self) -> Result<bool, BuyerError>;
}

#[async_trait]
pub trait CategoryNavPort: Send + Sync {
    /// Read-only check for the category's navigation control.
    async fn is_present(&self, category: CategoryId) -> Result<bool, BuyerError>;
    /// Switches to the category. `false` while the category is still locked.
    async fn activate(&self, category: CategoryId) -> Result<bool, BuyerError>;
}

#[async_trait]
pub trait ItemListPort: Send + Sync {
    /// Rows of the active category in page order.
    async fn list_items(&self, category: CategoryId) -> Result<Vec<ItemSnapshot>, BuyerError>;
}

#[async_trait]
pub trait BulkActionPort: Send + Sync {
    /// True only when the secondary-actions menu exists and is the "More" menu.
    async fn has_overflow_menu(&self) -> Result<bool, BuyerError>;
    async fn open_overflow_menu(&self) -> Result<(), BuyerError>;
    /// Returns whether the action was present and enabled, i.e. attempted.
    async fn buy_all_affordable(&self) -> Result<bool, BuyerError>;
    async fn buy_cheapest_affordable(&self) -> Result<bool, BuyerError>;
    async fn close_overflow_menu(&self) -> Result<(), BuyerError>;
}

pub type ActivateHandler = Arc<dyn Fn() + Send + Sync>;

/// The single user-facing control.
#[async_trait]
pub trait StatusSurface: Send + Sync {
    async fn set_label(&self, text: &str) -> Result<(), BuyerError>;
    async fn set_tone(&self, tone: StatusTone) -> Result<(), BuyerError>;
    async fn on_activate(&self, handler: ActivateHandler) -> Result<(), BuyerError>;
}
