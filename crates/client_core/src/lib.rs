use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use shared::{
    domain::{ItemId, MenuItem, Order, OrderId, OrderStatus},
    protocol::{DashboardStats, FacialLog, FacialLogFilter, TopCategories, WeatherLog},
};

pub mod analytics;
pub mod config;
pub mod error;
mod http;
pub mod inventory;
pub mod orders;

pub use analytics::{AnalyticsState, AnalyticsView, OverviewQuery};
pub use config::{ApiConfig, StockDeltaMode, DEFAULT_API_BASE};
pub use error::{ApiRequestError, ApiResult};
pub use http::{AdminClient, ApiPayload};
pub use inventory::{InventoryState, InventoryView, StockOutcome};
pub use orders::{OrderLifecycle, OrdersState, TransitionOutcome};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn list_menu_items(&self) -> ApiResult<Vec<MenuItem>>;
    async fn adjust_stock(&self, item_id: ItemId, delta: i64) -> ApiResult<()>;
}

#[async_trait]
pub trait OrdersApi: Send + Sync {
    async fn list_orders(&self) -> ApiResult<Vec<Order>>;
    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatus)
        -> ApiResult<()>;
    async fn cancel_order(&self, order_id: &OrderId) -> ApiResult<()>;
}

#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    async fn dashboard_stats(&self, days: u32) -> ApiResult<DashboardStats>;
    async fn weather_logs(&self, limit: u32) -> ApiResult<Vec<WeatherLog>>;
    async fn facial_logs(&self, limit: u32, filter: &FacialLogFilter)
        -> ApiResult<Vec<FacialLog>>;
    async fn top_categories(&self, k: u32) -> ApiResult<TopCategories>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdminEvent {
    MenuItemsLoaded {
        count: usize,
    },
    StockAdjusted {
        item_id: ItemId,
        delta: i64,
    },
    OrdersLoaded {
        count: usize,
    },
    OrderStatusChanged {
        order_id: OrderId,
        status: OrderStatus,
    },
    AnalyticsLoaded,
    ResultDiscarded {
        view: &'static str,
    },
    Error(String),
}

/// What happened to a fetched result once it came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { records: usize },
    /// A newer projection or reload was applied while this one was in flight.
    Superseded,
    /// The view was torn down before the response arrived.
    Discarded,
}

/// Flag shared by a view and its in-flight requests. Requests are never
/// aborted; results that arrive after teardown are dropped.
#[derive(Debug, Clone, Default)]
pub struct ViewLifetime {
    torn_down: Arc<AtomicBool>,
}

impl ViewLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        !self.torn_down.load(Ordering::SeqCst)
    }
}

/// Monotonic stamps for state writes; a write is kept only if its stamp is
/// newer than the last one applied.
#[derive(Debug, Default)]
pub(crate) struct Sequencer {
    issued: AtomicU64,
}

impl Sequencer {
    pub(crate) fn next(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }
}
