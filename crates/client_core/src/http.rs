use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, CONTENT_TYPE},
    Client, Method, RequestBuilder, StatusCode,
};
use serde_json::Value;
use shared::{
    domain::{ItemId, MenuItem, Order, OrderId, OrderStatus},
    normalize::{
        dashboard_stats_from_payload, facial_logs_from_envelope, menu_items_from_envelope,
        orders_from_envelope, top_categories_from_payload, weather_logs_from_envelope,
    },
    protocol::{
        cancel_order_route, dashboard_stats_route, facial_logs_route, menu_items_route,
        order_status_route, orders_route, stock_route, top_categories_route, weather_logs_route,
        CancelOrderRequest, DashboardStats, FacialLog, FacialLogFilter, OrderStatusRequest,
        StockAdjustRequest, TopCategories, WeatherLog,
    },
};
use tracing::{debug, info, warn};

use crate::{
    config::{ApiConfig, StockDeltaMode},
    error::{ApiRequestError, ApiResult},
    AnalyticsApi, InventoryApi, OrdersApi,
};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Successful response body: parsed JSON when the server labels it as JSON,
/// raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiPayload {
    Json(Value),
    Text(String),
}

impl ApiPayload {
    /// Text bodies become a JSON string so the normalizers treat them as an
    /// unrecognized shape instead of failing.
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}

/// Body text of a rejected request; the status reason stands in when the body
/// cannot be read.
fn rejection_body<E: std::fmt::Display>(status: StatusCode, body: Result<String, E>) -> String {
    match body {
        Ok(body) => body,
        Err(err) => {
            warn!(status = status.as_u16(), error = %err, "api: failed to read error body");
            status.canonical_reason().unwrap_or_default().to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    config: ApiConfig,
}

impl AdminClient {
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.config.endpoint(path))
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult<ApiPayload> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = rejection_body(status, response.text().await);
            warn!(status = status.as_u16(), %body, "api: request rejected");
            return Err(ApiRequestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains(JSON_CONTENT_TYPE));
        if is_json {
            let bytes = response.bytes().await?;
            Ok(ApiPayload::Json(serde_json::from_slice(&bytes)?))
        } else {
            Ok(ApiPayload::Text(response.text().await?))
        }
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> ApiResult<ApiPayload> {
        debug!(path, "api: GET");
        self.execute(self.request(Method::GET, path).query(query))
            .await
    }
}

#[async_trait]
impl InventoryApi for AdminClient {
    async fn list_menu_items(&self) -> ApiResult<Vec<MenuItem>> {
        let payload = self.get(menu_items_route(), &[]).await?;
        Ok(menu_items_from_envelope(&payload.into_value()))
    }

    async fn adjust_stock(&self, item_id: ItemId, delta: i64) -> ApiResult<()> {
        let request = self.request(Method::PUT, &stock_route(item_id));
        let request = match self.config.stock_delta_mode() {
            StockDeltaMode::Body => request.json(&StockAdjustRequest { delta }),
            StockDeltaMode::Query => request.query(&[("quantity", delta)]),
        };
        self.execute(request).await?;
        info!(item_id = item_id.0, delta, "inventory: stock adjusted");
        Ok(())
    }
}

#[async_trait]
impl OrdersApi for AdminClient {
    async fn list_orders(&self) -> ApiResult<Vec<Order>> {
        let payload = self.get(orders_route(), &[]).await?;
        Ok(orders_from_envelope(&payload.into_value()))
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> ApiResult<()> {
        let request = self
            .request(Method::PUT, &order_status_route(order_id))
            .json(&OrderStatusRequest {
                status: status.as_str().to_string(),
            });
        self.execute(request).await?;
        info!(order_id = %order_id, %status, "orders: status updated");
        Ok(())
    }

    async fn cancel_order(&self, order_id: &OrderId) -> ApiResult<()> {
        let request = self
            .request(Method::POST, cancel_order_route())
            .json(&CancelOrderRequest {
                order_id: order_id.clone(),
            });
        self.execute(request).await?;
        info!(order_id = %order_id, "orders: cancelled");
        Ok(())
    }
}

#[async_trait]
impl AnalyticsApi for AdminClient {
    async fn dashboard_stats(&self, days: u32) -> ApiResult<DashboardStats> {
        let payload = self
            .get(dashboard_stats_route(), &[("days", days.to_string())])
            .await?;
        Ok(dashboard_stats_from_payload(&payload.into_value()))
    }

    async fn weather_logs(&self, limit: u32) -> ApiResult<Vec<WeatherLog>> {
        let payload = self
            .get(weather_logs_route(), &[("limit", limit.to_string())])
            .await?;
        Ok(weather_logs_from_envelope(&payload.into_value()))
    }

    async fn facial_logs(
        &self,
        limit: u32,
        filter: &FacialLogFilter,
    ) -> ApiResult<Vec<FacialLog>> {
        let payload = self
            .get(facial_logs_route(), &filter.query_pairs(limit))
            .await?;
        Ok(facial_logs_from_envelope(&payload.into_value()))
    }

    async fn top_categories(&self, k: u32) -> ApiResult<TopCategories> {
        let payload = self
            .get(top_categories_route(), &[("k", k.to_string())])
            .await?;
        Ok(top_categories_from_payload(&payload.into_value()))
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
