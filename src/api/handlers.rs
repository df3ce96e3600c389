//! HTTP API handlers.

use std::sync::Arc;

use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::scheduler::{SchedulerStats, StatsSnapshot};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Counters of the running scheduler.
    pub stats: Arc<SchedulerStats>,
    /// Prometheus renderer, when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
    /// Whether orders are simulated.
    pub dry_run: bool,
}

impl AppState {
    /// Create new app state around scheduler counters.
    pub fn new(stats: Arc<SchedulerStats>) -> Self {
        Self {
            stats,
            prometheus: None,
            dry_run: true,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Set the trading mode reported by `/api/v1/status`.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.stats.is_ready()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("stats", &self.stats)
            .field("prometheus", &self.prometheus.is_some())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether service is ready.
    pub ready: bool,
    /// Current market slug if available.
    pub market: Option<String>,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// "dry_run" or "live".
    pub mode: &'static str,
    /// Scheduler counters.
    pub scheduler: StatsSnapshot,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let response = ReadyResponse {
        ready: is_ready,
        market: state.stats.snapshot().last_market,
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - returns scheduler statistics.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let scheduler = state.stats.snapshot();
    let status = match (scheduler.ticks, state.is_ready()) {
        (0, _) => "starting",
        (_, true) => "running",
        (_, false) => "degraded",
    };

    Json(StatusResponse {
        status,
        mode: if state.dry_run { "dry_run" } else { "live" },
        scheduler,
    })
}

/// Prometheus text exposition, 404 when no recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "metrics recorder not installed".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_state_defaults() {
        let state = AppState::new(Arc::new(SchedulerStats::default())).with_dry_run(false);
        assert!(!state.is_ready());
        assert!(!state.dry_run);
        assert!(state.prometheus.is_none());
    }
}
