// Integration tests for /api/status and GET/PUT /api/admin/interval

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use hostwatch::api::{create_admin_router, AdminAppState};
use hostwatch::feed::FeedProvider;
use hostwatch::state::{Registry, Snapshot, StatusValue};
use hostwatch::watch::{Scheduler, MAXIMUM_INTERVAL};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct StaticFeed;

#[async_trait]
impl FeedProvider for StaticFeed {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_observations(&self) -> Result<Vec<Snapshot>> {
        Ok(vec![
            Snapshot::new(1, Utc::now(), "a", None, StatusValue::ONLINE),
            Snapshot::new(2, Utc::now(), "b", None, StatusValue::OFFLINE),
        ])
    }
}

fn create_scheduler() -> Arc<Scheduler> {
    Arc::new(Scheduler::new(
        Arc::new(StaticFeed),
        Arc::new(Registry::new()),
        Duration::from_secs(120),
    ))
}

fn create_test_app(scheduler: Arc<Scheduler>, admin_token: Option<&str>) -> Router {
    let state = AdminAppState {
        scheduler,
        admin_token: admin_token.map(|t| t.to_string()),
    };
    create_admin_router(state)
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn put_interval(seconds: u64, auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PUT")
        .uri("/api/admin/interval")
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder
        .body(Body::from(
            serde_json::json!({ "interval_seconds": seconds }).to_string(),
        ))
        .unwrap()
}

/// GET /api/status reflects a primed registry and poll bookkeeping.
#[tokio::test]
async fn test_status_after_fetch() {
    let scheduler = create_scheduler();
    scheduler.fetch().await;
    let app = create_test_app(Arc::clone(&scheduler), None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["state"], "idle");
    assert_eq!(status["delivery"], "block");
    assert_eq!(status["interval_seconds"], 120);
    assert_eq!(status["hosts"], 2);
    assert_eq!(status["poll_count"], 1);
    assert_eq!(status["error_count"], 0);
    assert!(status["last_poll"].is_string());
}

/// GET /api/admin/interval needs no token.
#[tokio::test]
async fn test_get_interval() {
    let app = create_test_app(create_scheduler(), Some("secret"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/interval")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let interval = body_json(response).await;
    assert_eq!(interval["interval_seconds"], 120);
    assert_eq!(interval["minimum_interval_seconds"], 60);
}

/// PUT with the right token updates the scheduler.
#[tokio::test]
async fn test_put_interval_updates_scheduler() {
    let scheduler = create_scheduler();
    let app = create_test_app(Arc::clone(&scheduler), Some("secret"));

    let response = app
        .oneshot(put_interval(300, Some(bearer("secret"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["interval_seconds"], 300);
    assert_eq!(scheduler.interval(), Duration::from_secs(300));
}

/// Requests below the floor are clamped, and the effective value is returned.
#[tokio::test]
async fn test_put_interval_clamps_to_floor() {
    let scheduler = create_scheduler();
    let app = create_test_app(Arc::clone(&scheduler), Some("secret"));

    let response = app
        .oneshot(put_interval(5, Some(bearer("secret"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["interval_seconds"], 60);
    assert_eq!(scheduler.interval(), Duration::from_secs(60));
}

/// Oversized requests are capped instead of overflowing the timer.
#[tokio::test]
async fn test_put_interval_caps_huge_values() {
    let scheduler = create_scheduler();
    let app = create_test_app(Arc::clone(&scheduler), Some("secret"));

    let response = app
        .oneshot(put_interval(u64::MAX, Some(bearer("secret"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["interval_seconds"],
        MAXIMUM_INTERVAL.as_secs()
    );
    assert_eq!(scheduler.interval(), MAXIMUM_INTERVAL);
}

/// PUT with a wrong or missing token is rejected and changes nothing.
#[tokio::test]
async fn test_put_interval_wrong_token() {
    let scheduler = create_scheduler();

    for auth in [Some(bearer("wrong")), None] {
        let app = create_test_app(Arc::clone(&scheduler), Some("secret"));
        let response = app.oneshot(put_interval(300, auth)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(scheduler.interval(), Duration::from_secs(120));
}

/// With no admin token configured, PUT is always rejected.
#[tokio::test]
async fn test_put_interval_without_configured_token() {
    let scheduler = create_scheduler();
    let app = create_test_app(Arc::clone(&scheduler), None);

    let response = app
        .oneshot(put_interval(300, Some(bearer("anything"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Unauthorized");
    assert_eq!(scheduler.interval(), Duration::from_secs(120));
}
