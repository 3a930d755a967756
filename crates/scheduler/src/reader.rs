use std::sync::Arc;

use autobuyer_core_types::{CategoryId, ItemSnapshot};
use tracing::warn;

use crate::ports::{CategoryNavPort, ItemListPort};

/// Error-free view over the page's categories and rows.
///
/// Anything the page cannot answer right now reads as "absent": a category
/// that unlocks later in the game is a normal state, not a failure.
#[derive(Clone)]
pub struct StateReader {
    nav: Arc<dyn CategoryNavPort>,
    items: Arc<dyn ItemListPort>,
}

impl StateReader {
    pub fn new(nav: Arc<dyn CategoryNavPort>, items: Arc<dyn ItemListPort>) -> Self {
        Self { nav, items }
    }

    pub async fn is_category_available(&self, category: CategoryId) -> bool {
        match self.nav.is_present(category).await {
            Ok(present) => present,
            Err(err) => {
                warn!(%category, error = %err, "category probe failed");
                false
            }
        }
    }

    pub async fn activate(&self, category: CategoryId) -> bool {
        match self.nav.activate(category).await {
            Ok(activated) => activated,
            Err(err) => {
                warn!(%category, error = %err, "category activation failed");
                false
            }
        }
    }

    pub async fn list_items(&self, category: CategoryId) -> Vec<ItemSnapshot> {
        match self.items.list_items(category).await {
            Ok(items) => items,
            Err(err) => {
                warn!(%category, error = %err, "reading item rows failed");
                Vec::new()
            }
        }
    }
}
