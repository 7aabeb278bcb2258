//! Chart inputs derived from dashboard stats.

use std::collections::BTreeMap;

use crate::protocol::DashboardStats;

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub name: String,
    pub value: f64,
}

impl Slice {
    pub fn share_percent(&self, total: f64) -> f64 {
        if total <= 0.0 {
            0.0
        } else {
            self.value / total * 100.0
        }
    }
}

pub fn slices(distribution: &BTreeMap<String, f64>) -> Vec<Slice> {
    distribution
        .iter()
        .map(|(name, value)| Slice {
            name: name.clone(),
            value: *value,
        })
        .collect()
}

pub fn slice_total(slices: &[Slice]) -> f64 {
    slices.iter().map(|slice| slice.value).sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub count: f64,
}

pub fn daily_series(stats: &DashboardStats) -> Vec<SeriesPoint> {
    stats
        .daily_sessions
        .iter()
        .map(|point| SeriesPoint {
            label: point.day.clone(),
            count: point.count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackedRow {
    pub weather: String,
    pub counts: BTreeMap<String, f64>,
}

impl StackedRow {
    pub fn count(&self, emotion: &str) -> f64 {
        self.counts.get(emotion).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmotionWeatherMatrix {
    pub rows: Vec<StackedRow>,
    /// Emotions in the order they are first seen across rows.
    pub emotion_keys: Vec<String>,
}

pub fn emotion_weather_matrix(stats: &DashboardStats) -> EmotionWeatherMatrix {
    let mut matrix = EmotionWeatherMatrix::default();
    for (weather, emotions) in &stats.emotion_by_weather {
        for emotion in emotions.keys() {
            if !matrix.emotion_keys.contains(emotion) {
                matrix.emotion_keys.push(emotion.clone());
            }
        }
        matrix.rows.push(StackedRow {
            weather: weather.clone(),
            counts: emotions.clone(),
        });
    }
    matrix
}

/// Choices offered by the facial log filters, taken from the stats keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacialFilterOptions {
    pub age_groups: Vec<String>,
    pub genders: Vec<String>,
    pub emotions: Vec<String>,
}

impl FacialFilterOptions {
    pub fn from_stats(stats: &DashboardStats) -> Self {
        Self {
            age_groups: stats.age_distribution.keys().cloned().collect(),
            genders: stats.gender_distribution.keys().cloned().collect(),
            emotions: stats.emotion_frequency.keys().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::DailySessions;

    fn stats() -> DashboardStats {
        let mut stats = DashboardStats::default();
        stats.age_distribution.insert("18-24".into(), 3.0);
        stats.age_distribution.insert("25-34".into(), 1.0);
        stats.daily_sessions.push(DailySessions {
            day: "2025-12-01".into(),
            count: 4.0,
        });
        stats.emotion_by_weather.insert(
            "cold".into(),
            BTreeMap::from([("sad".to_string(), 2.0), ("happy".to_string(), 1.0)]),
        );
        stats.emotion_by_weather.insert(
            "hot".into(),
            BTreeMap::from([("happy".to_string(), 5.0), ("surprise".to_string(), 1.0)]),
        );
        stats
    }

    #[test]
    fn slice_shares_sum_to_hundred() {
        let slices = slices(&stats().age_distribution);
        let total = slice_total(&slices);
        assert_eq!(total, 4.0);
        assert_eq!(slices[0].share_percent(total), 75.0);
        assert_eq!(slices[1].share_percent(total), 25.0);
        assert_eq!(slices[0].share_percent(0.0), 0.0);
    }

    #[test]
    fn emotion_keys_follow_first_seen_order() {
        let matrix = emotion_weather_matrix(&stats());
        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.emotion_keys, vec!["happy", "sad", "surprise"]);
        assert_eq!(matrix.rows[0].weather, "cold");
        assert_eq!(matrix.rows[0].count("surprise"), 0.0);
        assert_eq!(matrix.rows[1].count("happy"), 5.0);
    }

    #[test]
    fn filter_options_come_from_stats_keys() {
        let options = FacialFilterOptions::from_stats(&stats());
        assert_eq!(options.age_groups, vec!["18-24", "25-34"]);
        assert!(options.genders.is_empty());
        assert_eq!(daily_series(&stats())[0].label, "2025-12-01");
    }
}
