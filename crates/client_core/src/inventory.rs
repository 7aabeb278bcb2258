use std::sync::Arc;

use shared::{
    domain::{availability_percent, ItemFilter, ItemId, MenuItem},
    error::DomainError,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::ApiResult, AdminEvent, InventoryApi, LoadOutcome, Sequencer, ViewLifetime,
    EVENT_CHANNEL_CAPACITY,
};

#[derive(Debug, Clone, Default)]
pub struct InventoryState {
    pub items: Vec<MenuItem>,
    pub filter: ItemFilter,
    applied_seq: u64,
}

impl InventoryState {
    pub fn find(&self, item_id: ItemId) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn visible_items(&self) -> Vec<MenuItem> {
        self.items
            .iter()
            .filter(|item| self.filter.matches(item))
            .cloned()
            .collect()
    }

    /// Highest stock across all loaded items, never below 1.
    pub fn highest_count(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.available_count)
            .max()
            .unwrap_or(0)
            .max(1)
    }

    pub fn availability(&self, item: &MenuItem) -> u32 {
        availability_percent(item.available_count, self.highest_count())
    }
}

/// Result of an accepted stock adjustment. A failed reconciling reload does
/// not undo the adjustment; it is reported in `reconciled` and the count
/// shown is the locally projected one.
#[derive(Debug)]
pub struct StockOutcome {
    pub item_id: ItemId,
    pub delta: i64,
    /// Count held by the view after the adjustment; `None` once torn down.
    pub available_count: Option<i64>,
    pub reconciled: ApiResult<LoadOutcome>,
}

pub struct InventoryView {
    api: Arc<dyn InventoryApi>,
    lifetime: ViewLifetime,
    sequence: Sequencer,
    inner: Mutex<InventoryState>,
    events: broadcast::Sender<AdminEvent>,
}

impl InventoryView {
    pub fn new(api: Arc<dyn InventoryApi>) -> Self {
        Self::with_lifetime(api, ViewLifetime::new())
    }

    pub fn with_lifetime(api: Arc<dyn InventoryApi>, lifetime: ViewLifetime) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            lifetime,
            sequence: Sequencer::default(),
            inner: Mutex::new(InventoryState::default()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AdminEvent> {
        self.events.subscribe()
    }

    pub fn teardown(&self) {
        self.lifetime.teardown();
    }

    pub async fn snapshot(&self) -> InventoryState {
        self.inner.lock().await.clone()
    }

    pub async fn set_filter(&self, filter: ItemFilter) {
        self.inner.lock().await.filter = filter;
    }

    pub async fn clear_filters(&self) {
        self.inner.lock().await.filter = ItemFilter::default();
    }

    pub async fn reload(&self) -> ApiResult<LoadOutcome> {
        let seq = self.sequence.next();
        let items = match self.api.list_menu_items().await {
            Ok(items) => items,
            Err(err) => {
                if self.lifetime.is_active() {
                    warn!(error = %err, "inventory: reload failed");
                    let _ = self
                        .events
                        .send(AdminEvent::Error(format!("Failed to load items: {err}")));
                }
                return Err(err);
            }
        };

        if !self.lifetime.is_active() {
            let _ = self
                .events
                .send(AdminEvent::ResultDiscarded { view: "inventory" });
            return Ok(LoadOutcome::Discarded);
        }

        let mut guard = self.inner.lock().await;
        if seq <= guard.applied_seq {
            debug!(seq, "inventory: stale reload superseded");
            return Ok(LoadOutcome::Superseded);
        }
        guard.applied_seq = seq;
        guard.items = items;
        let count = guard.items.len();
        drop(guard);

        let _ = self.events.send(AdminEvent::MenuItemsLoaded { count });
        Ok(LoadOutcome::Applied { records: count })
    }

    /// Applies a signed stock delta through the API and reloads the menu.
    /// The item must be loaded so the resulting count can be checked first.
    pub async fn adjust_stock(&self, item_id: ItemId, delta: i64) -> ApiResult<StockOutcome> {
        {
            let guard = self.inner.lock().await;
            let item = guard
                .find(item_id)
                .ok_or(DomainError::UnknownItem(item_id.0))?;
            let resulting = item.stock_after(delta)?;
            debug!(item_id = item_id.0, delta, resulting, "inventory: adjusting stock");
        }

        if let Err(err) = self.api.adjust_stock(item_id, delta).await {
            warn!(item_id = item_id.0, delta, error = %err, "inventory: stock adjustment failed");
            let _ = self
                .events
                .send(AdminEvent::Error(format!("Update failed: {err}")));
            return Err(err);
        }
        info!(item_id = item_id.0, delta, "inventory: stock adjustment accepted");
        let _ = self.events.send(AdminEvent::StockAdjusted { item_id, delta });

        if !self.lifetime.is_active() {
            return Ok(StockOutcome {
                item_id,
                delta,
                available_count: None,
                reconciled: Ok(LoadOutcome::Discarded),
            });
        }
        self.project_stock(item_id, delta).await;

        let reconciled = self.reload().await;
        if let Err(err) = &reconciled {
            warn!(item_id = item_id.0, error = %err, "inventory: reconcile failed, keeping projected count");
        }
        let available_count = if self.lifetime.is_active() {
            self.inner
                .lock()
                .await
                .find(item_id)
                .map(|item| item.available_count)
        } else {
            None
        };
        Ok(StockOutcome {
            item_id,
            delta,
            available_count,
            reconciled,
        })
    }

    async fn project_stock(&self, item_id: ItemId, delta: i64) {
        let seq = self.sequence.next();
        let mut guard = self.inner.lock().await;
        guard.applied_seq = seq;
        if let Some(item) = guard.items.iter_mut().find(|item| item.id == item_id) {
            item.available_count = item.available_count.saturating_add(delta);
            debug!(item_id = item_id.0, count = item.available_count, "inventory: projected stock");
        }
    }
}

#[cfg(test)]
#[path = "tests/inventory_tests.rs"]
mod tests;
