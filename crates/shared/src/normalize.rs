//! Tolerant decoding of API records that may arrive either as positional
//! tuples or as keyed objects.
//!
//! Every record kind lists its canonical field order once in
//! [`Normalize::FIELDS`]; tuple position `i` and object key `FIELDS[i]` are the
//! same logical field. Coercions never fail: missing text becomes `""`, missing
//! numbers become `0.0`, and records that are neither tuples nor objects are
//! dropped.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    domain::{ItemId, MenuItem, Order, OrderId, OrderLine, OrderStatus},
    protocol::{
        CategoryCount, DailySessions, DashboardStats, FacialLog, TopCategories, WeatherLog,
    },
};

#[derive(Debug, Clone, Copy)]
pub enum RawRecord<'a> {
    Tuple(&'a [Value]),
    Keyed(&'a Map<String, Value>),
    Unrecognized,
}

impl<'a> RawRecord<'a> {
    /// `None` means there is no record at all (JSON `null`).
    pub fn classify(raw: &'a Value) -> Option<Self> {
        match raw {
            Value::Null => None,
            Value::Array(values) => Some(Self::Tuple(values)),
            Value::Object(map) => Some(Self::Keyed(map)),
            _ => Some(Self::Unrecognized),
        }
    }
}

pub struct Fields<'a> {
    raw: RawRecord<'a>,
    names: &'static [&'static str],
}

impl<'a> Fields<'a> {
    fn new(raw: RawRecord<'a>, names: &'static [&'static str]) -> Self {
        Self { raw, names }
    }

    pub fn value(&self, name: &str) -> Option<&'a Value> {
        match self.raw {
            RawRecord::Tuple(values) => self
                .names
                .iter()
                .position(|field| *field == name)
                .and_then(|index| values.get(index)),
            RawRecord::Keyed(map) => map.get(name),
            RawRecord::Unrecognized => None,
        }
    }

    pub fn text(&self, name: &str) -> String {
        coerce_text(self.value(name))
    }

    pub fn opt_text(&self, name: &str) -> Option<String> {
        coerce_opt_text(self.value(name))
    }

    pub fn number(&self, name: &str) -> f64 {
        coerce_number(self.value(name))
    }

    pub fn integer(&self, name: &str) -> i64 {
        coerce_integer(self.value(name))
    }

    pub fn opt_integer(&self, name: &str) -> Option<i64> {
        coerce_opt_integer(self.value(name))
    }
}

pub trait Normalize: Sized {
    /// Canonical field order, which is also the tuple layout.
    const FIELDS: &'static [&'static str];

    fn from_fields(fields: &Fields<'_>) -> Self;
}

pub fn normalize<T: Normalize>(raw: &Value) -> Option<T> {
    match RawRecord::classify(raw)? {
        RawRecord::Unrecognized => None,
        shape => Some(T::from_fields(&Fields::new(shape, T::FIELDS))),
    }
}

/// Normalizes each entry of a JSON array, keeping order and dropping entries
/// that produce no record. Anything other than an array yields nothing.
pub fn normalize_all<T: Normalize>(raw: &Value) -> Vec<T> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };
    let records: Vec<T> = entries.iter().filter_map(normalize).collect();
    if records.len() != entries.len() {
        debug!(
            received = entries.len(),
            kept = records.len(),
            "normalize: dropped unrecognized records"
        );
    }
    records
}

fn normalize_field<T: Normalize>(raw: Option<&Value>) -> Vec<T> {
    raw.map(normalize_all).unwrap_or_default()
}

pub fn coerce_text(raw: Option<&Value>) -> String {
    match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn coerce_opt_text(raw: Option<&Value>) -> Option<String> {
    match raw {
        None | Some(Value::Null) => None,
        other => Some(coerce_text(other)),
    }
}

pub fn coerce_number(raw: Option<&Value>) -> f64 {
    let number = match raw {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Bool(flag)) => f64::from(u8::from(*flag)),
        _ => 0.0,
    };
    if number.is_finite() {
        number
    } else {
        0.0
    }
}

pub fn coerce_integer(raw: Option<&Value>) -> i64 {
    if let Some(integer) = raw.and_then(Value::as_i64) {
        return integer;
    }
    coerce_number(raw).trunc() as i64
}

pub fn coerce_opt_integer(raw: Option<&Value>) -> Option<i64> {
    match raw {
        Some(Value::Number(_)) => Some(coerce_integer(raw)),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(|number| number.trunc() as i64),
        _ => None,
    }
}

fn coerce_counts(raw: Option<&Value>) -> BTreeMap<String, f64> {
    raw.and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(key, value)| (key.clone(), coerce_number(Some(value))))
                .collect()
        })
        .unwrap_or_default()
}

impl Normalize for FacialLog {
    const FIELDS: &'static [&'static str] = &[
        "session_id",
        "age_group",
        "gender",
        "weather_temp",
        "weather_tod",
        "dominant_emotion",
        "emotion_counts",
        "updated_at",
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            session_id: fields.text("session_id"),
            age_group: fields.opt_text("age_group"),
            gender: fields.opt_text("gender"),
            weather_temp: fields.opt_text("weather_temp"),
            weather_tod: fields.opt_text("weather_tod"),
            dominant_emotion: fields.opt_text("dominant_emotion"),
            emotion_counts: coerce_counts(fields.value("emotion_counts")),
            updated_at: fields.text("updated_at"),
        }
    }
}

impl Normalize for WeatherLog {
    const FIELDS: &'static [&'static str] = &["timestamp", "temperature_bucket", "time_of_day"];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            timestamp: fields.text("timestamp"),
            temperature_bucket: fields.text("temperature_bucket"),
            time_of_day: fields.text("time_of_day"),
        }
    }
}

impl Normalize for OrderLine {
    const FIELDS: &'static [&'static str] = &["name", "qty", "price", "amount", "code"];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            name: fields.text("name"),
            qty: fields.integer("qty"),
            price: fields.number("price"),
            amount: fields.number("amount"),
            code: fields.opt_integer("code"),
        }
    }
}

impl Normalize for Order {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "customer_name",
        "items",
        "total",
        "status",
        "created_at",
        "updated_at",
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            id: OrderId(fields.text("id")),
            customer_name: fields.opt_text("customer_name"),
            items: normalize_field(fields.value("items")),
            total: fields.number("total"),
            status: OrderStatus::canonicalize(&fields.text("status")),
            created_at: fields.text("created_at"),
            updated_at: fields.opt_text("updated_at"),
        }
    }
}

impl Normalize for MenuItem {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "price",
        "category",
        "flavor",
        "available_count",
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            id: ItemId(fields.integer("id")),
            name: fields.text("name"),
            description: fields.text("description"),
            price: fields.number("price"),
            category: fields.text("category"),
            flavor: fields.text("flavor"),
            available_count: fields.integer("available_count"),
        }
    }
}

impl Normalize for DailySessions {
    const FIELDS: &'static [&'static str] = &["day", "count"];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            day: fields.text("day"),
            count: fields.number("count"),
        }
    }
}

impl Normalize for CategoryCount {
    const FIELDS: &'static [&'static str] = &["category", "count"];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            category: fields.text("category"),
            count: fields.number("count"),
        }
    }
}

/// `/orders` answers either `{"orders": [...]}` or `[{"orders": [...]}]`.
pub fn orders_from_envelope(payload: &Value) -> Vec<Order> {
    let envelope = match payload {
        Value::Array(wrapped) => wrapped.first(),
        other => Some(other),
    };
    normalize_field(envelope.and_then(|envelope| envelope.get("orders")))
}

pub fn menu_items_from_envelope(payload: &Value) -> Vec<MenuItem> {
    normalize_field(payload.get("items"))
}

pub fn weather_logs_from_envelope(payload: &Value) -> Vec<WeatherLog> {
    normalize_field(payload.get("weather_logs"))
}

pub fn facial_logs_from_envelope(payload: &Value) -> Vec<FacialLog> {
    normalize_field(payload.get("facial_logs"))
}

pub fn top_categories_from_payload(payload: &Value) -> TopCategories {
    let segments = payload
        .get("segments")
        .and_then(Value::as_object)
        .map(|segments| {
            segments
                .iter()
                .map(|(segment, ranking)| (segment.clone(), normalize_all(ranking)))
                .collect()
        })
        .unwrap_or_default();
    TopCategories {
        global: normalize_field(payload.get("global")),
        segments,
    }
}

pub fn dashboard_stats_from_payload(payload: &Value) -> DashboardStats {
    let emotion_by_weather = payload
        .get("emotion_by_weather")
        .and_then(Value::as_object)
        .map(|weathers| {
            weathers
                .iter()
                .map(|(weather, emotions)| (weather.clone(), coerce_counts(Some(emotions))))
                .collect()
        })
        .unwrap_or_default();
    DashboardStats {
        age_distribution: coerce_counts(payload.get("age_distribution")),
        gender_distribution: coerce_counts(payload.get("gender_distribution")),
        emotion_frequency: coerce_counts(payload.get("emotion_frequency")),
        daily_sessions: normalize_field(payload.get("daily_sessions")),
        emotion_by_weather,
    }
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
