//! axum routes. Thin: extract token and body, call ScheduleApi, serialize.

use crate::adapters::http::error::ApiError;
use crate::domain::{CalendarEvent, ScheduleProposal, SuggestionSet, UsageStatus, WeeklySummary};
use crate::ports::ScheduleApi;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    api: Arc<dyn ScheduleApi>,
}

#[derive(Serialize)]
struct EventsResponse {
    events: Vec<CalendarEvent>,
}

pub fn router(api: Arc<dyn ScheduleApi>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ai/schedule", post(optimize_schedule))
        .route("/api/ai/suggest", post(suggest_events))
        .route("/api/ai/weekly-summary", post(weekly_summary))
        .route("/api/events", get(saved_events).put(save_events))
        .route("/api/profile", get(usage))
        .with_state(AppState { api })
}

/// `Authorization: Bearer <token>`, scheme matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    let token = token.trim_start();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Unparseable bodies become `null`, which the service rejects as invalid input
/// only after the auth and quota checks, so a bad body never masks 401/402.
fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn optimize_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ScheduleProposal>, ApiError> {
    let body = json_body(&body);
    Ok(Json(state.api.optimize_schedule(bearer_token(&headers), &body).await?))
}

async fn suggest_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SuggestionSet>, ApiError> {
    let body = json_body(&body);
    Ok(Json(state.api.suggest_events(bearer_token(&headers), &body).await?))
}

async fn weekly_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WeeklySummary>, ApiError> {
    let body = json_body(&body);
    Ok(Json(state.api.weekly_summary(bearer_token(&headers), &body).await?))
}

async fn saved_events(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<EventsResponse>, ApiError> {
    let events = state.api.saved_events(bearer_token(&headers)).await?;
    Ok(Json(EventsResponse { events }))
}

async fn save_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EventsResponse>, ApiError> {
    let body = json_body(&body);
    let events = state.api.save_events(bearer_token(&headers), &body).await?;
    Ok(Json(EventsResponse { events }))
}

async fn usage(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsageStatus>, ApiError> {
    Ok(Json(state.api.usage(bearer_token(&headers)).await?))
}
