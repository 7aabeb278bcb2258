//! Insights view: dashboard stats, weather samples and facial logs.

use std::sync::Arc;

use futures::future::join3;
use shared::protocol::{
    DashboardStats, FacialLog, FacialLogFilter, TopCategories, WeatherLog, DEFAULT_LOG_LIMIT,
    DEFAULT_STATS_DAYS,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::{
    error::ApiResult, AdminEvent, AnalyticsApi, LoadOutcome, Sequencer, ViewLifetime,
    EVENT_CHANNEL_CAPACITY,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewQuery {
    pub days: u32,
    pub weather_limit: u32,
    pub facial_limit: u32,
    pub facial_filter: FacialLogFilter,
}

impl Default for OverviewQuery {
    fn default() -> Self {
        Self {
            days: DEFAULT_STATS_DAYS,
            weather_limit: DEFAULT_LOG_LIMIT,
            facial_limit: DEFAULT_LOG_LIMIT,
            facial_filter: FacialLogFilter::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalyticsState {
    pub stats: Option<DashboardStats>,
    pub weather_logs: Vec<WeatherLog>,
    pub facial_logs: Vec<FacialLog>,
    pub facial_filter: FacialLogFilter,
    pub loading: bool,
    pub error: Option<String>,
    pub facial_error: Option<String>,
    facial_seq: u64,
}

pub struct AnalyticsView {
    api: Arc<dyn AnalyticsApi>,
    lifetime: ViewLifetime,
    facial_sequence: Sequencer,
    inner: Mutex<AnalyticsState>,
    events: broadcast::Sender<AdminEvent>,
}

impl AnalyticsView {
    pub fn new(api: Arc<dyn AnalyticsApi>) -> Self {
        Self::with_lifetime(api, ViewLifetime::new())
    }

    pub fn with_lifetime(api: Arc<dyn AnalyticsApi>, lifetime: ViewLifetime) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            lifetime,
            facial_sequence: Sequencer::default(),
            inner: Mutex::new(AnalyticsState::default()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AdminEvent> {
        self.events.subscribe()
    }

    pub fn teardown(&self) {
        self.lifetime.teardown();
    }

    pub async fn snapshot(&self) -> AnalyticsState {
        self.inner.lock().await.clone()
    }

    /// Fetches stats, weather samples and facial logs concurrently. A failed
    /// facial query clears the facial logs and is reported separately; a failed
    /// stats or weather query fails the whole load.
    pub async fn load_overview(&self, query: &OverviewQuery) -> ApiResult<LoadOutcome> {
        {
            let mut guard = self.inner.lock().await;
            guard.loading = true;
            guard.error = None;
            guard.facial_filter = query.facial_filter.clone();
        }
        let facial_seq = self.facial_sequence.next();

        let (stats, weather, facial) = join3(
            self.api.dashboard_stats(query.days),
            self.api.weather_logs(query.weather_limit),
            self.api
                .facial_logs(query.facial_limit, &query.facial_filter),
        )
        .await;

        if !self.lifetime.is_active() {
            debug!("analytics: view torn down, discarding overview");
            let _ = self
                .events
                .send(AdminEvent::ResultDiscarded { view: "analytics" });
            return Ok(LoadOutcome::Discarded);
        }

        let mut guard = self.inner.lock().await;
        guard.loading = false;
        let (stats, weather_logs) = match (stats, weather) {
            (Ok(stats), Ok(weather_logs)) => (stats, weather_logs),
            (Err(err), _) | (_, Err(err)) => {
                warn!(error = %err, "analytics: overview load failed");
                guard.error = Some(err.to_string());
                drop(guard);
                let _ = self
                    .events
                    .send(AdminEvent::Error(format!("Failed to load analytics: {err}")));
                return Err(err);
            }
        };
        let records = weather_logs.len();
        guard.stats = Some(stats);
        guard.weather_logs = weather_logs;
        let facial_failed = facial_seq > guard.facial_seq
            && apply_facial(&mut guard, facial_seq, facial).is_err();
        let facial_error = guard.facial_error.clone().filter(|_| facial_failed);
        drop(guard);

        if let Some(message) = facial_error {
            let _ = self.events.send(AdminEvent::Error(message));
        }
        let _ = self.events.send(AdminEvent::AnalyticsLoaded);
        Ok(LoadOutcome::Applied { records })
    }

    /// Re-queries facial logs after a filter change. Responses to older filter
    /// selections are dropped once a newer one has been applied.
    pub async fn reload_facial_logs(
        &self,
        filter: FacialLogFilter,
        limit: u32,
    ) -> ApiResult<LoadOutcome> {
        let seq = self.facial_sequence.next();
        self.inner.lock().await.facial_filter = filter.clone();
        let result = self.api.facial_logs(limit, &filter).await;

        if !self.lifetime.is_active() {
            let _ = self
                .events
                .send(AdminEvent::ResultDiscarded { view: "analytics" });
            return Ok(LoadOutcome::Discarded);
        }

        let mut guard = self.inner.lock().await;
        if seq <= guard.facial_seq {
            debug!(seq, "analytics: facial logs superseded by newer filter");
            return Ok(LoadOutcome::Superseded);
        }
        let applied = apply_facial(&mut guard, seq, result);
        let facial_error = guard.facial_error.clone();
        drop(guard);

        match applied {
            Ok(records) => Ok(LoadOutcome::Applied { records }),
            Err(err) => {
                if let Some(message) = facial_error {
                    let _ = self.events.send(AdminEvent::Error(message));
                }
                Err(err)
            }
        }
    }

    pub async fn top_categories(&self, k: u32) -> ApiResult<TopCategories> {
        self.api.top_categories(k).await.inspect_err(|err| {
            let _ = self
                .events
                .send(AdminEvent::Error(format!("Failed to load top categories: {err}")));
        })
    }
}

/// Writes a facial query result stamped `seq` into the view state. Callers
/// check that `seq` is newer than the last applied stamp.
fn apply_facial(
    state: &mut AnalyticsState,
    seq: u64,
    result: ApiResult<Vec<FacialLog>>,
) -> ApiResult<usize> {
    state.facial_seq = seq;
    match result {
        Ok(logs) => {
            state.facial_logs = logs;
            state.facial_error = None;
            Ok(state.facial_logs.len())
        }
        Err(err) => {
            warn!(error = %err, "analytics: facial logs failed");
            state.facial_logs.clear();
            state.facial_error = Some(format!("Failed to load facial logs: {err}"));
            Err(err)
        }
    }
}

#[cfg(test)]
#[path = "tests/analytics_tests.rs"]
mod tests;
