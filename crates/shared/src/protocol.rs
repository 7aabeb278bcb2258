use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{ItemId, OrderId};

pub const DEFAULT_STATS_DAYS: u32 = 7;
pub const DEFAULT_LOG_LIMIT: u32 = 20;
pub const DEFAULT_TOP_K: u32 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct StockAdjustRequest {
    pub delta: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOrderRequest {
    pub order_id: OrderId,
}

pub fn menu_items_route() -> &'static str {
    "/menu/items/all"
}

pub fn stock_route(item_id: ItemId) -> String {
    format!("/menu/items/{}/stock", item_id.0)
}

pub fn orders_route() -> &'static str {
    "/orders"
}

pub fn order_status_route(order_id: &OrderId) -> String {
    format!("/orders/{}/status", order_id.0)
}

pub fn cancel_order_route() -> &'static str {
    "/orders/cancel"
}

pub fn dashboard_stats_route() -> &'static str {
    "/analytics/dashboard-stats"
}

pub fn weather_logs_route() -> &'static str {
    "/analytics/weather-logs"
}

pub fn facial_logs_route() -> &'static str {
    "/analytics/facial-logs"
}

pub fn top_categories_route() -> &'static str {
    "/analytics/top-categories"
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacialLog {
    pub session_id: String,
    pub age_group: Option<String>,
    pub gender: Option<String>,
    pub weather_temp: Option<String>,
    pub weather_tod: Option<String>,
    pub dominant_emotion: Option<String>,
    pub emotion_counts: BTreeMap<String, f64>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherLog {
    pub timestamp: String,
    pub temperature_bucket: String,
    pub time_of_day: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySessions {
    pub day: String,
    pub count: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub age_distribution: BTreeMap<String, f64>,
    pub gender_distribution: BTreeMap<String, f64>,
    pub emotion_frequency: BTreeMap<String, f64>,
    pub daily_sessions: Vec<DailySessions>,
    pub emotion_by_weather: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopCategories {
    pub global: Vec<CategoryCount>,
    pub segments: BTreeMap<String, Vec<CategoryCount>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacialLogFilter {
    pub age_group: Option<String>,
    pub gender: Option<String>,
    pub dominant_emotion: Option<String>,
}

impl FacialLogFilter {
    /// Query pairs for `/analytics/facial-logs`; unset or blank filters are omitted.
    pub fn query_pairs(&self, limit: u32) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", limit.to_string())];
        let filters = [
            ("age_group", &self.age_group),
            ("gender", &self.gender),
            ("dominant_emotion", &self.dominant_emotion),
        ];
        for (key, value) in filters {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        pairs
    }
}
