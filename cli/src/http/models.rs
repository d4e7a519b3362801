//! HTTP API data models

use agentbox_core::api::{ErrorCode, StoreError, SubmitError, TaskState, TaskStatus};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============= Schedule =============

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub success: bool,
    pub task_id: String,
    pub status: TaskState,
    pub message: String,
}

// ============= Status =============

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: TaskStatus,
    pub log_file: String,
}

// ============= Tasks / Logs =============

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskStatus>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub task_id: String,
    pub logs: String,
}

// ============= Health =============

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub errors_total: u64,
    pub requests_by_endpoint: BTreeMap<String, u64>,
    pub timestamp: String,
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    NotFound(String),
    QueueUnavailable(String),
    Storage(String),
}

impl HttpServerError {
    fn parts(self) -> (StatusCode, ErrorCode, String) {
        match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::TaskNotFound, msg),
            Self::QueueUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::QueueUnavailable,
                msg,
            ),
            Self::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::StorageError,
                msg,
            ),
        }
    }
}

impl From<SubmitError> for HttpServerError {
    fn from(e: SubmitError) -> Self {
        let msg = e.to_string();
        match e {
            SubmitError::NotAnObject | SubmitError::MissingSteps | SubmitError::Invalid(_) => {
                Self::InvalidRequest(msg)
            }
            SubmitError::QueueFull | SubmitError::QueueClosed => Self::QueueUnavailable(msg),
            SubmitError::Store(_) => Self::Storage(msg),
        }
    }
}

impl From<StoreError> for HttpServerError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        let body = serde_json::json!({
            "success": false,
            "error": message,
            "error_code": error_code.as_str(),
        });

        (status, Json(body)).into_response()
    }
}
