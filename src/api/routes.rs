//! HTTP API route definitions.

use axum::{routing::get, Router};

use super::handlers::{health, metrics, ready, status, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Status endpoint
        .route("/api/v1/status", get(status))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BotError, NetworkError, Result};
    use crate::scheduler::{ScheduledAction, SchedulerStats, TaskScheduler};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Flaky {
        fail: bool,
    }

    impl ScheduledAction for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn market_in_play(&self) -> Option<&str> {
            Some("btc-updown-15m-1765301400")
        }

        async fn execute(&mut self) -> Result<()> {
            if self.fail {
                Err(BotError::from(NetworkError::Decode {
                    url: "mock://".to_string(),
                    reason: "bad".to_string(),
                }))
            } else {
                Ok(())
            }
        }
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, String) {
        let response = create_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let state = AppState::new(Arc::new(SchedulerStats::default()));
        let (status, body) = get(state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ok"));
    }

    #[tokio::test]
    async fn ready_endpoint_returns_503_before_first_success() {
        let state = AppState::new(Arc::new(SchedulerStats::default()));
        let (status, _) = get(state, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn ready_follows_last_tick() {
        let scheduler = TaskScheduler::new(Duration::from_secs(1), true);
        let state = AppState::new(scheduler.stats_handle());
        let mut action = Flaky { fail: false };

        let _ = scheduler.invoke(&mut action).await;
        let (status, body) = get(state.clone(), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("btc-updown-15m-1765301400"));

        action.fail = true;
        let _ = scheduler.invoke(&mut action).await;
        let (status, _) = get(state, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn status_reports_scheduler_snapshot() {
        let scheduler = TaskScheduler::new(Duration::from_secs(1), true);
        let state = AppState::new(scheduler.stats_handle());
        let (_, body) = get(state.clone(), "/api/v1/status").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "starting");
        assert_eq!(json["mode"], "dry_run");

        let _ = scheduler.invoke(&mut Flaky { fail: true }).await;
        let (_, body) = get(state, "/api/v1/status").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["scheduler"]["failures"], 1);
        assert_eq!(json["scheduler"]["action"], "flaky");
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_not_found() {
        let state = AppState::new(Arc::new(SchedulerStats::default()));
        let (status, _) = get(state, "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
