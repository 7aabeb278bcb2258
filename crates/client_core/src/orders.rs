//! Order list state and the operator-facing status lifecycle.
//!
//! A status change is applied in two steps: the new status is projected onto
//! the loaded orders as soon as the API accepts it, then the whole list is
//! reloaded. Every projection and reload is stamped by a [`Sequencer`], so a
//! reload that was issued before a later projection cannot overwrite it.

use std::sync::Arc;

use shared::{
    domain::{plan_transition, Order, OrderId, OrderStatus, TransitionPlan},
    error::DomainError,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::{ApiRequestError, ApiResult},
    AdminEvent, LoadOutcome, OrdersApi, Sequencer, ViewLifetime, EVENT_CHANNEL_CAPACITY,
};

#[derive(Debug, Clone, Default)]
pub struct OrdersState {
    pub orders: Vec<Order>,
    pub active: Option<Order>,
    pub status_filter: Option<OrderStatus>,
    applied_seq: u64,
}

impl OrdersState {
    pub fn find(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| &order.id == order_id)
    }

    /// Status the operator currently sees for an order, preferring the list
    /// entry over the open order.
    pub fn status_of(&self, order_id: &OrderId) -> Option<OrderStatus> {
        self.find(order_id)
            .or(self.active.as_ref().filter(|order| &order.id == order_id))
            .map(|order| order.status)
    }

    pub fn visible_orders(&self) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|order| self.status_filter.map_or(true, |status| order.status == status))
            .cloned()
            .collect()
    }

    fn resync_active(&mut self) {
        let Some(active_id) = self.active.as_ref().map(|order| order.id.clone()) else {
            return;
        };
        self.active = self.find(&active_id).cloned();
        if self.active.is_none() {
            debug!(order_id = %active_id, "orders: active order no longer listed");
        }
    }
}

#[derive(Debug)]
pub enum TransitionOutcome {
    /// The order already had the requested status; nothing was sent.
    Skipped,
    Applied {
        status: OrderStatus,
        reconciled: LoadOutcome,
    },
    /// The API accepted the change but the follow-up reload failed; the
    /// projected status is kept.
    ReconcileFailed {
        status: OrderStatus,
        error: ApiRequestError,
    },
}

pub struct OrderLifecycle {
    api: Arc<dyn OrdersApi>,
    lifetime: ViewLifetime,
    sequence: Sequencer,
    inner: Mutex<OrdersState>,
    events: broadcast::Sender<AdminEvent>,
}

impl OrderLifecycle {
    pub fn new(api: Arc<dyn OrdersApi>) -> Self {
        Self::with_lifetime(api, ViewLifetime::new())
    }

    pub fn with_lifetime(api: Arc<dyn OrdersApi>, lifetime: ViewLifetime) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            lifetime,
            sequence: Sequencer::default(),
            inner: Mutex::new(OrdersState::default()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AdminEvent> {
        self.events.subscribe()
    }

    pub fn lifetime(&self) -> &ViewLifetime {
        &self.lifetime
    }

    pub fn teardown(&self) {
        self.lifetime.teardown();
    }

    pub async fn snapshot(&self) -> OrdersState {
        self.inner.lock().await.clone()
    }

    pub async fn visible_orders(&self) -> Vec<Order> {
        self.inner.lock().await.visible_orders()
    }

    pub async fn active_order(&self) -> Option<Order> {
        self.inner.lock().await.active.clone()
    }

    pub async fn open_order(&self, order_id: &OrderId) -> Option<Order> {
        let mut guard = self.inner.lock().await;
        guard.active = guard.find(order_id).cloned();
        guard.active.clone()
    }

    pub async fn close_order(&self) {
        self.inner.lock().await.active = None;
    }

    /// Selecting the filter that is already active clears it.
    pub async fn toggle_filter(&self, status: Option<OrderStatus>) -> Option<OrderStatus> {
        let mut guard = self.inner.lock().await;
        guard.status_filter = if guard.status_filter == status {
            None
        } else {
            status
        };
        guard.status_filter
    }

    pub async fn reload(&self) -> ApiResult<LoadOutcome> {
        let seq = self.sequence.next();
        let orders = match self.api.list_orders().await {
            Ok(orders) => orders,
            Err(err) => {
                if self.lifetime.is_active() {
                    warn!(error = %err, "orders: reload failed");
                    let _ = self
                        .events
                        .send(AdminEvent::Error(format!("Failed to load orders: {err}")));
                }
                return Err(err);
            }
        };

        if !self.lifetime.is_active() {
            debug!(seq, "orders: view torn down, discarding reload");
            let _ = self.events.send(AdminEvent::ResultDiscarded { view: "orders" });
            return Ok(LoadOutcome::Discarded);
        }

        let mut guard = self.inner.lock().await;
        if seq <= guard.applied_seq {
            debug!(
                seq,
                applied_seq = guard.applied_seq,
                "orders: stale reload superseded"
            );
            return Ok(LoadOutcome::Superseded);
        }
        guard.applied_seq = seq;
        guard.orders = orders;
        guard.resync_active();
        let count = guard.orders.len();
        drop(guard);

        let _ = self.events.send(AdminEvent::OrdersLoaded { count });
        Ok(LoadOutcome::Applied { records: count })
    }

    pub async fn request_transition(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
    ) -> ApiResult<TransitionOutcome> {
        let current = self
            .inner
            .lock()
            .await
            .status_of(order_id)
            .ok_or_else(|| DomainError::UnknownOrder(order_id.to_string()))?;

        let plan = plan_transition(current, target)?;
        let sent = match plan {
            TransitionPlan::Skip => {
                info!(order_id = %order_id, status = %current, "orders: transition to current status skipped");
                return Ok(TransitionOutcome::Skipped);
            }
            TransitionPlan::Cancel => self.api.cancel_order(order_id).await,
            TransitionPlan::UpdateStatus(status) => {
                self.api.update_order_status(order_id, status).await
            }
        };
        if let Err(err) = sent {
            warn!(order_id = %order_id, target = %target, error = %err, "orders: transition failed");
            let _ = self
                .events
                .send(AdminEvent::Error(format!("Status update failed: {err}")));
            return Err(err);
        }

        if !self.lifetime.is_active() {
            return Ok(TransitionOutcome::Applied {
                status: target,
                reconciled: LoadOutcome::Discarded,
            });
        }

        self.project_status(order_id, target).await;
        let _ = self.events.send(AdminEvent::OrderStatusChanged {
            order_id: order_id.clone(),
            status: target,
        });

        match self.reload().await {
            Ok(reconciled) => Ok(TransitionOutcome::Applied {
                status: target,
                reconciled,
            }),
            Err(error) => Ok(TransitionOutcome::ReconcileFailed {
                status: target,
                error,
            }),
        }
    }

    async fn project_status(&self, order_id: &OrderId, status: OrderStatus) {
        let seq = self.sequence.next();
        let mut guard = self.inner.lock().await;
        guard.applied_seq = seq;
        if let Some(order) = guard.orders.iter_mut().find(|order| &order.id == order_id) {
            order.status = status;
        }
        if let Some(active) = guard.active.as_mut().filter(|order| &order.id == order_id) {
            active.status = status;
        }
        debug!(order_id = %order_id, %status, seq, "orders: status projected");
    }
}

#[cfg(test)]
#[path = "tests/orders_tests.rs"]
mod tests;
