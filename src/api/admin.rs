use crate::watch::{minimum_interval, DeliveryPolicy, PollStatus, Scheduler, SchedulerState};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// State for the admin/status API.
#[derive(Clone)]
pub struct AdminAppState {
    pub scheduler: Arc<Scheduler>,
    /// Required bearer token for PUT /api/admin/interval. None = PUT disabled.
    pub admin_token: Option<String>,
}

#[derive(Deserialize)]
pub struct IntervalUpdate {
    pub interval_seconds: u64,
}

#[derive(Serialize)]
pub struct IntervalResponse {
    pub interval_seconds: u64,
    pub minimum_interval_seconds: u64,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub state: SchedulerState,
    pub interval_seconds: u64,
    pub delivery: DeliveryPolicy,
    pub hosts: usize,
    #[serde(flatten)]
    pub poll: PollStatus,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn create_admin_router(state: AdminAppState) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/admin/interval", get(get_interval).put(put_interval))
        .with_state(Arc::new(state))
}

fn interval_response(interval: Duration) -> IntervalResponse {
    IntervalResponse {
        interval_seconds: interval.as_secs(),
        minimum_interval_seconds: minimum_interval().as_secs(),
    }
}

/// GET /api/status - scheduler state and poll bookkeeping.
async fn get_status(State(state): State<Arc<AdminAppState>>) -> Response {
    let scheduler = &state.scheduler;
    Json(StatusResponse {
        state: scheduler.state(),
        interval_seconds: scheduler.interval().as_secs(),
        delivery: scheduler.delivery(),
        hosts: scheduler.registry().len(),
        poll: scheduler.status().await,
    })
    .into_response()
}

/// GET /api/admin/interval - current interval and floor.
async fn get_interval(State(state): State<Arc<AdminAppState>>) -> Response {
    Json(interval_response(state.scheduler.interval())).into_response()
}

/// PUT /api/admin/interval - request a new interval. Requires the admin bearer token.
/// Responds with the effective (clamped) interval.
async fn put_interval(
    State(state): State<Arc<AdminAppState>>,
    headers: HeaderMap,
    Json(update): Json<IntervalUpdate>,
) -> Response {
    if !validate_admin_token(&headers, &state.admin_token) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Unauthorized".to_string(),
            }),
        )
            .into_response();
    }

    let effective = state
        .scheduler
        .set_interval(Duration::from_secs(update.interval_seconds));

    Json(interval_response(effective)).into_response()
}

/// True when a token is configured and the request carries it as a bearer token.
fn validate_admin_token(headers: &HeaderMap, admin_token: &Option<String>) -> bool {
    let Some(expected) = admin_token else {
        return false;
    };

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn test_validate_admin_token() {
        let token = Some("secret".to_string());
        assert!(validate_admin_token(&headers_with("Bearer secret"), &token));
        assert!(!validate_admin_token(&headers_with("Bearer wrong"), &token));
        assert!(!validate_admin_token(&headers_with("secret"), &token));
        assert!(!validate_admin_token(&HeaderMap::new(), &token));
        // No token configured: always rejected
        assert!(!validate_admin_token(&headers_with("Bearer secret"), &None));
    }
}
