use thiserror::Error;

/// Client-side rejections raised before anything is sent to the API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("'{0}' is not a status an operator can set (expected pending, done or cancelled)")]
    InvalidTransitionTarget(String),
    #[error("stock adjustment must be a non-zero whole number")]
    ZeroStockDelta,
    #[error("adjusting item {item_id} by {delta} would leave {resulting} in stock")]
    NegativeStock {
        item_id: i64,
        delta: i64,
        resulting: i64,
    },
    #[error("menu item {0} is not loaded")]
    UnknownItem(i64),
    #[error("order {0} is not loaded")]
    UnknownOrder(String),
}
