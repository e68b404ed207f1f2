//! Black-box HTTP integration tests covering the end-to-end scenarios.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use quota_ledger::{api, AccountService};

mod common;

fn app(service: AccountService) -> axum::Router {
    api::create_router().with_state(service)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_then_read() {
    let pool = common::setup_test_db().await;
    let app = app(AccountService::new(pool));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/accounts")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"account_id": "a1", "initial_plan_id": "basic", "period": "2026-01"}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["stream_version"], 1);

    let req = Request::builder().method("GET").uri("/v1/accounts/a1").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["exists"], true);
    assert_eq!(json["status"], "active");
    assert_eq!(json["plan_id"], "basic");
    assert_eq!(json["period"], "2026-01");
    assert_eq!(json["stream_version"], 1);
    assert_eq!(json["source"], "projection");
}

#[tokio::test]
async fn usage_accumulates_and_retries_are_idempotent() {
    let pool = common::setup_test_db().await;
    let app = app(AccountService::new(pool));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/accounts")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"account_id": "a1", "initial_plan_id": "basic", "period": "2026-01"}).to_string(),
        ))
        .unwrap();
    app.clone().oneshot(req).await.unwrap();

    let usage_request = || {
        Request::builder()
            .method("POST")
            .uri("/v1/accounts/a1/usage")
            .header("content-type", "application/json")
            .header("idempotency-key", "a1-u1")
            .body(Body::from(
                json!({"meter": "api_calls", "units": 3, "occurred_at": "2026-01-28T01:30:00Z"})
                    .to_string(),
            ))
            .unwrap()
    };

    let response = app.clone().oneshot(usage_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["stream_version"], 2);

    let req = Request::builder().method("GET").uri("/v1/accounts/a1").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["used"]["api_calls"], 3);
    assert_eq!(json["source"], "projection");

    // Retry with the same idempotency key: same version, usage unchanged.
    let response = app.clone().oneshot(usage_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["stream_version"], 2);

    let req = Request::builder().method("GET").uri("/v1/accounts/a1").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["used"]["api_calls"], 3);
}

#[tokio::test]
async fn usage_on_missing_account_is_not_found() {
    let pool = common::setup_test_db().await;
    let app = app(AccountService::new(pool));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/accounts/ghost/usage")
        .header("content-type", "application/json")
        .header("idempotency-key", "ghost-1")
        .body(Body::from(
            json!({"meter": "api_calls", "units": 1, "occurred_at": "2026-01-01T00:00:00Z"})
                .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn suspend_then_record_usage_conflicts() {
    let pool = common::setup_test_db().await;
    let app = app(AccountService::new(pool));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/accounts")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"account_id": "a2", "initial_plan_id": "basic", "period": "2026-01"}).to_string(),
        ))
        .unwrap();
    app.clone().oneshot(req).await.unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/v1/accounts/a2/suspend")
        .header("content-type", "application/json")
        .body(Body::from(json!({"reason": "fraud"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/accounts/a2/usage")
        .header("content-type", "application/json")
        .header("idempotency-key", "a2-u1")
        .body(Body::from(
            json!({"meter": "api_calls", "units": 1, "occurred_at": "2026-01-01T00:00:00Z"})
                .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn usage_without_idempotency_header_is_bad_request() {
    let pool = common::setup_test_db().await;
    let app = app(AccountService::new(pool));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/accounts")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"account_id": "a1", "initial_plan_id": "basic", "period": "2026-01"}).to_string(),
        ))
        .unwrap();
    app.clone().oneshot(req).await.unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/v1/accounts/a1/usage")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"meter": "api_calls", "units": 1, "occurred_at": "2026-01-01T00:00:00Z"})
                .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn events_listing_reflects_full_history() {
    let pool = common::setup_test_db().await;
    let app = app(AccountService::new(pool));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/accounts")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"account_id": "a3", "initial_plan_id": "basic", "period": "2026-01"}).to_string(),
        ))
        .unwrap();
    app.clone().oneshot(req).await.unwrap();

    let req =
        Request::builder().method("GET").uri("/v1/accounts/a3/events").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let events = json["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "AccountCreated");
    assert_eq!(events[0]["schema_version"], 1);
}

#[tokio::test]
async fn healthz_reports_ok() {
    let pool = common::setup_test_db().await;
    let app = app(AccountService::new(pool));

    let req = Request::builder().method("GET").uri("/healthz").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}
