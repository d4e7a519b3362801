//! HTTP route handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::Value;

use crate::http::{
    models::*,
    state::AppState,
    validation::{not_found, require_task_id, validate_task_id},
};

pub const SERVICE_NAME: &str = "agentbox";

/// Build every route.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/schedule", post(schedule_handler))
        .route("/status", get(status_handler))
        .route("/tasks", get(tasks_handler))
        .route("/logs/:task_id", get(logs_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// POST /schedule - accept a task definition and queue it
async fn schedule_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ScheduleResponse>), HttpServerError> {
    state.record_request("/schedule");

    let Json(document) = body.map_err(|e| {
        state.record_error();
        HttpServerError::InvalidRequest(format!("Invalid JSON body: {}", e.body_text()))
    })?;

    let receipt = state.service.submit(&document).await.map_err(|e| {
        state.record_error();
        HttpServerError::from(e)
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ScheduleResponse {
            success: true,
            task_id: receipt.task_id,
            status: receipt.status,
            message: receipt.message,
        }),
    ))
}

/// GET /status?task_id=<id> - current status record plus log location
async fn status_handler(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, HttpServerError> {
    state.record_request("/status");

    let task_id = require_task_id(query.task_id.as_deref())?;
    let status = state
        .service
        .status(task_id)
        .await?
        .ok_or_else(|| not_found(task_id))?;
    let log_file = state
        .service
        .log_path(task_id)
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    Ok(Json(StatusResponse { status, log_file }))
}

/// GET /tasks - every task, newest first
async fn tasks_handler(
    State(state): State<AppState>,
) -> Result<Json<TaskListResponse>, HttpServerError> {
    state.record_request("/tasks");

    let tasks = state.service.list().await.map_err(|e| {
        state.record_error();
        HttpServerError::from(e)
    })?;
    Ok(Json(TaskListResponse { tasks }))
}

/// GET /logs/:task_id - full execution log
async fn logs_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<LogsResponse>, HttpServerError> {
    state.record_request("/logs");

    validate_task_id(&task_id)?;
    let logs = state
        .service
        .log(&task_id)
        .await?
        .ok_or_else(|| not_found(&task_id))?;

    Ok(Json(LogsResponse { task_id, logs }))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.snapshot();

    Json(HealthResponse {
        status: "healthy".into(),
        service: SERVICE_NAME.into(),
        uptime_seconds: stats.uptime_seconds,
        requests_handled: stats.requests_total,
        errors_total: stats.errors_total,
        requests_by_endpoint: stats.requests_by_endpoint,
        timestamp: Local::now().to_rfc3339(),
    })
}
