//! Plain-text tables and chart series for terminal output.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use client_core::{AnalyticsState, InventoryState};
use shared::{
    analytics::{
        daily_series, emotion_weather_matrix, slice_total, slices, FacialFilterOptions,
    },
    domain::{transition_buttons, Order},
    protocol::{DashboardStats, TopCategories},
};

pub const PLACEHOLDER: &str = "–";
const BAR_WIDTH: usize = 20;

pub fn format_price(value: f64) -> String {
    format!("Rs {value:.0}")
}

pub fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => PLACEHOLDER,
    }
}

pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders API timestamps as `YYYY-MM-DD HH:MM`; anything unparseable is shown
/// as received.
pub fn format_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return PLACEHOLDER.to_string();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

pub fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

pub fn items_table(state: &InventoryState) -> String {
    let visible = state.visible_items();
    if visible.is_empty() {
        return "No menu items match the current filters.".to_string();
    }
    let mut lines = vec![format!(
        "{:>5}  {:<28} {:<8} {:<11} {:>8} {:>6}  {}",
        "ID", "Name", "Category", "Flavor", "Price", "Stock", "Availability"
    )];
    for item in &visible {
        let percent = state.availability(item);
        lines.push(format!(
            "{:>5}  {:<28} {:<8} {:<11} {:>8} {:>6}  {} {percent:>3}%",
            item.id.0,
            item.name,
            or_placeholder(Some(item.category.as_str())),
            or_placeholder(Some(item.flavor.as_str())),
            format_price(item.price),
            item.available_count,
            bar(f64::from(percent)),
        ));
    }
    lines.join("\n")
}

pub fn orders_table(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders.".to_string();
    }
    let mut lines = vec![format!(
        "{:<14} {:<20} {:>5} {:>9}  {:<10} {}",
        "Order", "Customer", "Items", "Total", "Status", "Created"
    )];
    for order in orders {
        lines.push(format!(
            "{:<14} {:<20} {:>5} {:>9}  {:<10} {}",
            order.id.as_str(),
            order.display_name(),
            order.items.len(),
            format_price(order.total),
            order.status.label(),
            format_timestamp(&order.created_at),
        ));
    }
    lines.join("\n")
}

/// Lines whose amount disagrees with qty × price are marked with `*`.
pub fn order_detail(order: &Order) -> String {
    let mut lines = vec![
        format!("Order {}  [{}]", order.id, order.status.label()),
        format!("Customer: {}", order.display_name()),
        format!("Created:  {}", format_timestamp(&order.created_at)),
        format!(
            "Updated:  {}",
            order
                .updated_at
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        ),
        String::new(),
    ];
    let mut flagged = false;
    for line in &order.items {
        let marker = if line.is_amount_consistent() {
            " "
        } else {
            flagged = true;
            "*"
        };
        lines.push(format!(
            "{marker} {:>3} x {:<24} @ {:>8} = {:>9}",
            line.qty,
            line.name,
            format_price(line.price),
            format_price(line.amount),
        ));
    }
    if order.items.is_empty() {
        lines.push(format!("  {PLACEHOLDER}"));
    }
    lines.push(format!("  Total: {}", format_price(order.total)));
    if flagged {
        lines.push("  * amount differs from qty x price".to_string());
    }
    let actions: Vec<String> = transition_buttons(order.status)
        .into_iter()
        .map(|button| {
            if button.primary {
                format!("<{}>", button.label)
            } else {
                format!("[{}]", button.label)
            }
        })
        .collect();
    lines.push(format!("Actions: {}", actions.join(" ")));
    lines.join("\n")
}

fn distribution_section(title: &str, distribution: &BTreeMap<String, f64>) -> Vec<String> {
    let mut lines = vec![format!("{title}:")];
    let slices = slices(distribution);
    if slices.is_empty() {
        lines.push(format!("  {PLACEHOLDER}"));
        return lines;
    }
    let total = slice_total(&slices);
    for slice in &slices {
        let share = slice.share_percent(total);
        lines.push(format!(
            "  {:<14} {:>6} {} {share:>5.1}%",
            title_case(&slice.name),
            format_count(slice.value),
            bar(share),
        ));
    }
    lines
}

fn stats_sections(stats: &DashboardStats) -> Vec<String> {
    let mut lines = Vec::new();
    lines.extend(distribution_section("Age groups", &stats.age_distribution));
    lines.extend(distribution_section("Genders", &stats.gender_distribution));
    lines.extend(distribution_section("Emotions", &stats.emotion_frequency));

    lines.push("Daily sessions:".to_string());
    let series = daily_series(stats);
    let peak = series.iter().map(|point| point.count).fold(0.0_f64, f64::max);
    if series.is_empty() {
        lines.push(format!("  {PLACEHOLDER}"));
    }
    for point in &series {
        let percent = if peak > 0.0 { point.count / peak * 100.0 } else { 0.0 };
        lines.push(format!(
            "  {:<12} {:>6} {}",
            point.label,
            format_count(point.count),
            bar(percent)
        ));
    }

    lines.push("Emotion by weather:".to_string());
    let matrix = emotion_weather_matrix(stats);
    if matrix.rows.is_empty() {
        lines.push(format!("  {PLACEHOLDER}"));
    } else {
        let header: Vec<String> = matrix
            .emotion_keys
            .iter()
            .map(|key| format!("{:>9}", title_case(key)))
            .collect();
        lines.push(format!("  {:<12}{}", "", header.join("")));
        for row in &matrix.rows {
            let counts: Vec<String> = matrix
                .emotion_keys
                .iter()
                .map(|key| format!("{:>9}", format_count(row.count(key))))
                .collect();
            lines.push(format!("  {:<12}{}", title_case(&row.weather), counts.join("")));
        }
    }

    let options = FacialFilterOptions::from_stats(stats);
    lines.push(format!(
        "Filter options: age [{}] gender [{}] emotion [{}]",
        options.age_groups.join(", "),
        options.genders.join(", "),
        options.emotions.join(", "),
    ));
    lines
}

pub fn overview(state: &AnalyticsState) -> String {
    let mut lines = Vec::new();
    match &state.stats {
        Some(stats) => lines.extend(stats_sections(stats)),
        None => lines.push(format!("Stats: {PLACEHOLDER}")),
    }

    lines.push(String::new());
    lines.push("Recent weather:".to_string());
    if state.weather_logs.is_empty() {
        lines.push(format!("  {PLACEHOLDER}"));
    }
    for log in &state.weather_logs {
        lines.push(format!(
            "  {:<17} {:<10} {}",
            format_timestamp(&log.timestamp),
            title_case(&log.temperature_bucket),
            title_case(&log.time_of_day),
        ));
    }

    lines.push(String::new());
    lines.push("Facial logs:".to_string());
    if let Some(error) = &state.facial_error {
        lines.push(format!("  {error}"));
    } else if state.facial_logs.is_empty() {
        lines.push(format!("  {PLACEHOLDER}"));
    }
    for log in &state.facial_logs {
        let weather = match (log.weather_temp.as_deref(), log.weather_tod.as_deref()) {
            (None, None) => PLACEHOLDER.to_string(),
            (temp, tod) => format!("{}/{}", or_placeholder(temp), or_placeholder(tod)),
        };
        lines.push(format!(
            "  {:<17} {:<12} {:<8} {:<8} {:<10} {:<16} {}",
            format_timestamp(&log.updated_at),
            log.session_id,
            or_placeholder(log.age_group.as_deref()),
            or_placeholder(log.gender.as_deref()),
            or_placeholder(log.dominant_emotion.as_deref()),
            weather,
            log.emotion_counts
                .iter()
                .map(|(emotion, count)| format!("{emotion}={}", format_count(*count)))
                .collect::<Vec<_>>()
                .join(" "),
        ));
    }
    lines.join("\n")
}

pub fn top_categories(top: &TopCategories) -> String {
    let mut lines = vec!["Top categories:".to_string()];
    if top.global.is_empty() {
        lines.push(format!("  {PLACEHOLDER}"));
    }
    for (rank, entry) in top.global.iter().enumerate() {
        lines.push(format!(
            "  {}. {:<12} {}",
            rank + 1,
            entry.category,
            format_count(entry.count)
        ));
    }
    for (segment, entries) in &top.segments {
        let ranked: Vec<String> = entries
            .iter()
            .map(|entry| format!("{} ({})", entry.category, format_count(entry.count)))
            .collect();
        lines.push(format!("  {}: {}", title_case(segment), ranked.join(", ")));
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
