//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::TimerError,
    events::FinishedEvent,
    state::{TimerSnapshot, TimerState},
};

/// Body of `POST /countdown`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownRequest {
    pub ms: u64,
}

/// API response structure for timer action endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
}

impl ApiResponse {
    /// Create a response whose status mirrors the timer state
    pub fn new(message: String, timer: TimerSnapshot) -> Self {
        let status = match timer.state {
            TimerState::Edit => "edit",
            TimerState::Stopped => "stopped",
            TimerState::Running => "running",
        };
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timer,
        }
    }
}

/// Status response with display helpers and session metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub label: String,
    pub progress: f64,
    pub tick_period_ms: u64,
    pub presets: Vec<u64>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
    pub last_finished: Option<FinishedEvent>,
}

/// Preset listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetsResponse {
    pub seconds: Vec<u64>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body returned for rejected requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for TimerError {
    fn into_response(self) -> Response {
        let code = match self {
            TimerError::NotAPreset(_) => StatusCode::NOT_FOUND,
            TimerError::Conflict { .. } => StatusCode::CONFLICT,
        };
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.to_string(),
            timestamp: Utc::now(),
        };
        (code, Json(body)).into_response()
    }
}
