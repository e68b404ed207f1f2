//! API routes
//!
//! Thin HTTP mapping onto `AccountService`: parse the request, build a
//! domain command, execute, shape the response. No business logic lives
//! here.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{Command, CreateAccount, Meter, RecordUsage, ReinstateAccount, SuspendAccount};
use crate::error::AppError;
use crate::handlers::AccountService;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub account_id: String,
    pub initial_plan_id: String,
    pub period: String,
}

#[derive(Debug, Serialize)]
pub struct StreamVersionResponse {
    pub account_id: String,
    pub stream_version: i64,
}

#[derive(Debug, Serialize)]
pub struct AccountStateResponse {
    pub account_id: String,
    pub exists: bool,
    pub status: String,
    pub plan_id: Option<String>,
    pub period: Option<String>,
    pub used: HashMap<String, i64>,
    pub stream_version: i64,
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub account_id: String,
    pub events: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RecordUsageRequest {
    pub meter: Meter,
    pub units: i64,
    pub occurred_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SuspendRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Build the router. State is the shared `AccountService`.
pub fn create_router() -> Router<AccountService> {
    Router::new()
        .route("/v1/accounts", post(create_account))
        .route("/v1/accounts/:id", get(get_account))
        .route("/v1/accounts/:id/events", get(list_events))
        .route("/v1/accounts/:id/usage", post(record_usage))
        .route("/v1/accounts/:id/suspend", post(suspend_account))
        .route("/v1/accounts/:id/reinstate", post(reinstate_account))
        .route("/healthz", get(healthz))
}

async fn create_account(
    State(service): State<AccountService>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<StreamVersionResponse>), AppError> {
    let account_id = request.account_id.clone();
    let command = Command::CreateAccount(CreateAccount {
        account_id: account_id.clone(),
        initial_plan_id: request.initial_plan_id,
        period: request.period,
    });

    let stream_version = service.execute(command).await?;

    Ok((StatusCode::CREATED, Json(StreamVersionResponse { account_id, stream_version })))
}

async fn get_account(
    State(service): State<AccountService>,
    Path(id): Path<String>,
) -> Result<Json<AccountStateResponse>, AppError> {
    let state = service.get_state(&id).await?;
    let used = state.used.into_iter().map(|(meter, units)| (meter.to_string(), units)).collect();

    Ok(Json(AccountStateResponse {
        account_id: state.account_id,
        exists: state.exists,
        status: state.status.as_str().to_string(),
        plan_id: state.plan_id,
        period: state.period,
        used,
        stream_version: state.stream_version,
        source: state.source.as_str().to_string(),
    }))
}

async fn list_events(
    State(service): State<AccountService>,
    Path(id): Path<String>,
) -> Result<Json<EventsResponse>, AppError> {
    let history = service.list_events(&id).await?;
    let events = history.iter().map(|e| e.to_json()).collect();

    Ok(Json(EventsResponse { account_id: id, events }))
}

async fn record_usage(
    State(service): State<AccountService>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<RecordUsageRequest>,
) -> Result<Json<StreamVersionResponse>, AppError> {
    let idempotency_key = headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::MissingHeader("Idempotency-Key".to_string()))?
        .to_string();

    let command = Command::RecordUsage(RecordUsage {
        account_id: id.clone(),
        meter: request.meter,
        units: request.units,
        occurred_at: request.occurred_at,
        idempotency_key,
    });

    let stream_version = service.execute(command).await?;

    Ok(Json(StreamVersionResponse { account_id: id, stream_version }))
}

async fn suspend_account(
    State(service): State<AccountService>,
    Path(id): Path<String>,
    Json(request): Json<SuspendRequest>,
) -> Result<Json<StreamVersionResponse>, AppError> {
    let command =
        Command::SuspendAccount(SuspendAccount { account_id: id.clone(), reason: request.reason });
    let stream_version = service.execute(command).await?;

    Ok(Json(StreamVersionResponse { account_id: id, stream_version }))
}

async fn reinstate_account(
    State(service): State<AccountService>,
    Path(id): Path<String>,
) -> Result<Json<StreamVersionResponse>, AppError> {
    let command = Command::ReinstateAccount(ReinstateAccount { account_id: id.clone() });
    let stream_version = service.execute(command).await?;

    Ok(Json(StreamVersionResponse { account_id: id, stream_version }))
}

async fn healthz(State(service): State<AccountService>) -> Result<Json<HealthResponse>, AppError> {
    crate::db::verify_connection(service.pool()).await?;
    Ok(Json(HealthResponse { status: "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_account_request_deserializes() {
        let json = r#"{"account_id":"a1","initial_plan_id":"basic","period":"2026-01"}"#;
        let request: CreateAccountRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.account_id, "a1");
        assert_eq!(request.period, "2026-01");
    }

    #[test]
    fn record_usage_request_deserializes() {
        let json = r#"{"meter":"api_calls","units":3,"occurred_at":"2026-01-28T01:30:00Z"}"#;
        let request: RecordUsageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.units, 3);
        assert_eq!(request.meter, Meter::ApiCalls);
    }
}
