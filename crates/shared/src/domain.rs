use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ItemId);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

pub const MENU_CATEGORIES: [&str; 4] = ["Cone", "Cup", "Sundae", "Stick"];
pub const MENU_FLAVORS: [&str; 4] = ["Vanilla", "Chocolate", "Strawberry", "Mint"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub flavor: String,
    pub available_count: i64,
}

impl MenuItem {
    /// Count the item would have after `delta` is applied, rejecting adjustments
    /// that are empty or would take stock below zero.
    pub fn stock_after(&self, delta: i64) -> Result<i64, DomainError> {
        if delta == 0 {
            return Err(DomainError::ZeroStockDelta);
        }
        let resulting = self.available_count.saturating_add(delta);
        if resulting < 0 {
            return Err(DomainError::NegativeStock {
                item_id: self.id.0,
                delta,
                resulting,
            });
        }
        Ok(resulting)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub category: Option<String>,
    pub flavor: Option<String>,
}

impl ItemFilter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.flavor.is_none()
    }

    pub fn matches(&self, item: &MenuItem) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |category| item.category.eq_ignore_ascii_case(category));
        let flavor_ok = self
            .flavor
            .as_deref()
            .map_or(true, |flavor| item.flavor.eq_ignore_ascii_case(flavor));
        category_ok && flavor_ok
    }
}

/// Width of an item's availability bar relative to the best-stocked item.
pub fn availability_percent(available_count: i64, highest_count: i64) -> u32 {
    let highest = highest_count.max(1) as f64;
    let ratio = (available_count.max(0) as f64 / highest * 100.0).round();
    ratio.clamp(0.0, 100.0) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Done,
    Cancelled,
    Unknown,
}

impl OrderStatus {
    pub const MUTATION_TARGETS: [OrderStatus; 3] =
        [OrderStatus::Pending, OrderStatus::Done, OrderStatus::Cancelled];

    pub fn canonicalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "done" => Self::Done,
            "cancelled" | "canceled" | "cancled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Done => "Done",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_mutation_target(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::canonicalize(s))
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::canonicalize(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    pub name: String,
    pub qty: i64,
    pub price: f64,
    pub amount: f64,
    pub code: Option<i64>,
}

impl OrderLine {
    pub fn expected_amount(&self) -> f64 {
        self.qty as f64 * self.price
    }

    /// Amounts are reported by the API and never rewritten; this only flags
    /// lines whose amount disagrees with qty × price.
    pub fn is_amount_consistent(&self) -> bool {
        (self.amount - self.expected_amount()).abs() < 0.01
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: Option<String>,
    pub items: Vec<OrderLine>,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl Order {
    pub fn display_name(&self) -> &str {
        match self.customer_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Walk-in guest",
        }
    }

    pub fn line_amount_sum(&self) -> f64 {
        self.items.iter().map(|line| line.amount).sum()
    }
}

/// How a requested status change reaches the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Target equals the current status; nothing is sent.
    Skip,
    /// Cancellation goes through the dedicated cancel action.
    Cancel,
    UpdateStatus(OrderStatus),
}

pub fn plan_transition(
    current: OrderStatus,
    target: OrderStatus,
) -> Result<TransitionPlan, DomainError> {
    if !target.is_mutation_target() {
        return Err(DomainError::InvalidTransitionTarget(target.to_string()));
    }
    Ok(match target {
        target if target == current => TransitionPlan::Skip,
        OrderStatus::Cancelled => TransitionPlan::Cancel,
        target => TransitionPlan::UpdateStatus(target),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionButton {
    pub target: OrderStatus,
    pub label: String,
    pub enabled: bool,
    pub primary: bool,
}

pub fn transition_buttons(current: OrderStatus) -> Vec<TransitionButton> {
    OrderStatus::MUTATION_TARGETS
        .iter()
        .map(|target| TransitionButton {
            target: *target,
            label: format!("Mark {}", target.label()),
            enabled: *target != current,
            primary: *target == current,
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
