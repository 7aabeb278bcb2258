use std::time::Duration;

use url::Url;

use crate::error::{ApiRequestError, ApiResult};

pub const DEFAULT_API_BASE: &str = "https://icecreamemultiagent-production.up.railway.app";

/// How a stock delta is attached to `PUT /menu/items/{id}/stock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockDeltaMode {
    /// JSON body `{"delta": n}`.
    #[default]
    Body,
    /// Query string `?quantity=n`.
    Query,
}

impl StockDeltaMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "body" => Some(Self::Body),
            "query" | "quantity" => Some(Self::Query),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
    stock_delta_mode: StockDeltaMode,
    request_timeout: Option<Duration>,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            stock_delta_mode: StockDeltaMode::default(),
            request_timeout: None,
        })
    }

    pub fn with_stock_delta_mode(mut self, mode: StockDeltaMode) -> Self {
        self.stock_delta_mode = mode;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stock_delta_mode(&self) -> StockDeltaMode {
        self.stock_delta_mode
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            stock_delta_mode: StockDeltaMode::default(),
            request_timeout: None,
        }
    }
}

fn normalize_base_url(raw: &str) -> ApiResult<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|source| ApiRequestError::InvalidBaseUrl {
        url: trimmed.to_string(),
        source,
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiRequestError::UnsupportedScheme(parsed.scheme().to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
