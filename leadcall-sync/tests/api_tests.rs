//! HTTP surface tests via tower oneshot

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use helpers::{call, lead, RecordingLeads, ScriptedCalls};
use http_body_util::BodyExt;
use leadcall_common::events::EventBus;
use leadcall_sync::reconciler::{Poller, ReconcilerConfig};
use leadcall_sync::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app_without_reconciler() -> Router {
    build_router(AppState::new(None, EventBus::new(16)))
}

fn app_with_reconciler() -> Router {
    let event_bus = EventBus::new(16);
    let poller = Poller::new(
        ReconcilerConfig::default(),
        Arc::new(ScriptedCalls::repeating(vec![call(
            "C1",
            "ended",
            Some("customer-ended-call"),
            40.0,
            "9876543210",
        )])),
        Arc::new(RecordingLeads::new(vec![lead("L1", "+919876543210")])),
        event_bus.clone(),
    );
    build_router(AppState::new(Some(Arc::new(poller)), event_bus))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn validate_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/phone/validate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app_without_reconciler()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "leadcall-sync");
    assert!(body["uptime_seconds"].as_i64().is_some());
}

#[tokio::test]
async fn test_validate_phone_formats_bare_number() {
    let response = app_without_reconciler()
        .oneshot(validate_request(json!({ "phone": "98765 43210" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["isValid"], true);
    assert_eq!(body["message"], "Valid phone number");
    assert_eq!(body["formatted"], "+919876543210");
    assert_eq!(body["normalized"], "9876543210");
}

#[tokio::test]
async fn test_validate_phone_reports_invalid_number() {
    let response = app_without_reconciler()
        .oneshot(validate_request(json!({ "phone": "+91 5876543210" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["isValid"], false);
    assert_eq!(body["message"], "Mobile number must start with 6, 7, 8, or 9");
}

#[tokio::test]
async fn test_validate_phone_empty_input() {
    let response = app_without_reconciler()
        .oneshot(validate_request(json!({ "phone": "" })))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["isValid"], false);
    assert_eq!(body["message"], "Phone number is required");
}

#[tokio::test]
async fn test_validate_phone_rejects_oversized_input() {
    let response = app_without_reconciler()
        .oneshot(validate_request(json!({ "phone": "9".repeat(100) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_reconciler_status_unavailable_when_disabled() {
    let response = app_without_reconciler()
        .oneshot(
            Request::builder()
                .uri("/api/reconciler/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAVAILABLE");
}

#[tokio::test]
async fn test_manual_tick_then_status() {
    let app = app_with_reconciler();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/reconciler/tick")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["fetched"], 1);
    assert_eq!(report["updated"], 1);
    assert_eq!(report["fetch_error"], Value::Null);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reconciler/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["running"], false);
    assert_eq!(stats["ticks"], 1);
    assert_eq!(stats["updates_applied"], 1);
    assert_eq!(stats["seen_keys"], 1);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = app_without_reconciler()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
