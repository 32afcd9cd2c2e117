#![cfg(test)]

use super::web::*;
use crate::config::Config;
use crate::error::{GridwatchError, Result};
use crate::grid::{GridState, GridStatusSource};
use crate::monitor::{BroadcastSink, MonitorRegistry};
use crate::zip::PostalCode;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use std::sync::Arc;
use std::time::Duration;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Answers green for every offset; rejects `00000` during validation
struct GreenSource;

#[async_trait::async_trait]
impl GridStatusSource for GreenSource {
    async fn fetch_status(&self, _zip: &PostalCode, _hours_in_future: u32) -> Result<GridState> {
        Ok(GridState::Green)
    }

    async fn validate_zip(&self, zip: &PostalCode) -> Result<()> {
        if zip.as_str() == "00000" {
            Err(GridwatchError::http(404, "Not Found"))
        } else {
            Ok(())
        }
    }
}

fn test_state() -> AppState {
    let sink = BroadcastSink::default();
    let registry = MonitorRegistry::new(
        Arc::new(GreenSource),
        Arc::new(sink.clone()),
        Duration::from_secs(600),
    );
    AppState {
        registry: Arc::new(registry),
        events: sink,
        config: Arc::new(Config::default()),
    }
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_ok() {
    let router = axum::Router::new().route("/api/health", get(health));
    let response = router.oneshot(get_req("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn register_then_get_and_list() {
    let state = test_state();
    let router = build_router(state.clone());

    let response = router
        .clone()
        .oneshot(post_json("/api/monitors", r#"{"zip":"70173","name":"Stuttgart"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["zip"], "70173");
    assert_eq!(json["name"], "Stuttgart");

    let response = router
        .clone()
        .oneshot(get_req("/api/monitors/70173"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.oneshot(get_req("/api/monitors")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json.as_array().map(Vec::len), Some(1));

    state.registry.shutdown().await;
}

#[tokio::test]
async fn register_rejects_bad_format_and_duplicates() {
    let state = test_state();
    let router = build_router(state.clone());

    let response = router
        .clone()
        .oneshot(post_json("/api/monitors", r#"{"zip":"7017"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "Validation error: zip - Invalid postal code format"
    );

    let response = router
        .clone()
        .oneshot(post_json("/api/monitors", r#"{"zip":"70173"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(post_json("/api/monitors", r#"{"zip":"70173"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(state.registry.len().await, 1);
    state.registry.shutdown().await;
}

#[tokio::test]
async fn register_reports_remote_validation_failure() {
    let state = test_state();
    let router = build_router(state.clone());

    let response = router
        .oneshot(post_json("/api/monitors", r#"{"zip":"00000"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "API Error: 404 Not Found");
    assert!(state.registry.is_empty().await);
}

#[tokio::test]
async fn delete_monitor() {
    let state = test_state();
    let router = build_router(state.clone());

    let delete = |uri: &str| {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };

    let response = router
        .clone()
        .oneshot(delete("/api/monitors/70173"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    router
        .clone()
        .oneshot(post_json("/api/monitors", r#"{"zip":"70173"}"#))
        .await
        .unwrap();
    let response = router
        .clone()
        .oneshot(delete("/api/monitors/70173"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(get_req("/api/monitors/70173"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn condition_reflects_polled_state() {
    let state = test_state();
    let router = build_router(state.clone());

    router
        .clone()
        .oneshot(post_json(
            "/api/monitors",
            r#"{"zip":"70173","offsets":["now","48h"]}"#,
        ))
        .await
        .unwrap();

    let mut rx = state.registry.subscribe("70173").await.unwrap();
    rx.wait_for(|s| s.total_polls > 0).await.unwrap();

    let response = router
        .clone()
        .oneshot(get_req("/api/monitors/70173/condition?quantity=now&status=green"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["result"], true);

    let response = router
        .clone()
        .oneshot(get_req("/api/monitors/70173/condition?quantity=48h&status=red"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["result"], false);

    // 6h is not tracked by this monitor
    let response = router
        .oneshot(get_req("/api/monitors/70173/condition?quantity=6h&status=green"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["result"], false);

    state.registry.shutdown().await;
}

#[tokio::test]
async fn events_is_event_stream() {
    let router = build_router(test_state());
    let response = router
        .oneshot(get_req("/api/events?zip=70173&quantity=now&status=red"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn config_and_schema() {
    let router = build_router(test_state());

    let response = router.clone().oneshot(get_req("/api/config")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["poll_interval_ms"], 600_000);

    let response = router
        .oneshot(get_req("/api/config/schema"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json.get("properties").is_some());
}

#[tokio::test]
async fn serve_reports_bind_failure_as_web_error() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let err = serve(test_state(), "127.0.0.1", port).await.unwrap_err();
    assert!(matches!(err, GridwatchError::Web { .. }));
    assert!(err.to_string().starts_with("Web server error: Failed to bind"));
}
