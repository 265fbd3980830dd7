//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::{
    error::TimerError,
    state::{AppState, PRESET_SECONDS},
};
use super::responses::{
    ApiResponse, CountdownRequest, HealthResponse, PresetsResponse, StatusResponse,
};

/// Handle POST /countdown - Set an arbitrary duration
pub async fn countdown_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CountdownRequest>,
) -> Json<ApiResponse> {
    let timer = state.set_countdown(request.ms);
    info!("Countdown endpoint called - duration set to {}ms", request.ms);
    Json(ApiResponse::new(format!("Countdown set to {}ms", request.ms), timer))
}

/// Handle POST /preset/:seconds - Set one of the preset durations
pub async fn preset_handler(
    State(state): State<Arc<AppState>>,
    Path(seconds): Path<u64>,
) -> Result<Json<ApiResponse>, TimerError> {
    match state.apply_preset(seconds) {
        Ok(timer) => {
            info!("Preset endpoint called - duration set to {}s", seconds);
            Ok(Json(ApiResponse::new(format!("Countdown set to {} seconds", seconds), timer)))
        }
        Err(e) => {
            warn!("Rejected preset request: {}", e);
            Err(e)
        }
    }
}

/// Handle POST /start - Start or resume the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.start();
    info!("Start endpoint called - {}ms remaining", timer.remaining_ms);
    Json(ApiResponse::new("Countdown running".to_string(), timer))
}

/// Handle POST /pause - Pause the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.pause();
    info!("Pause endpoint called - {}ms remaining", timer.remaining_ms);
    Json(ApiResponse::new("Countdown paused".to_string(), timer))
}

/// Handle POST /stop - Stop the countdown without a finished event
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.stop();
    info!("Stop endpoint called");
    Json(ApiResponse::new("Countdown stopped".to_string(), timer))
}

/// Handle POST /toggle - Start/pause button
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, TimerError> {
    match state.toggle_running() {
        Ok(timer) => {
            info!("Toggle endpoint called - timer is now {:?}", timer.state);
            Ok(Json(ApiResponse::new("Countdown toggled".to_string(), timer)))
        }
        Err(e) => {
            warn!("Rejected toggle request: {}", e);
            Err(e)
        }
    }
}

/// Handle POST /edit/enter - Enter edit mode
pub async fn edit_enter_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.enter_edit_mode();
    Json(ApiResponse::new("Edit mode entered".to_string(), timer))
}

/// Handle POST /edit/exit - Leave edit mode
pub async fn edit_exit_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.exit_edit_mode();
    Json(ApiResponse::new("Edit mode exited".to_string(), timer))
}

/// Handle POST /edit/toggle - Edit button, unavailable while running
pub async fn edit_toggle_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, TimerError> {
    match state.toggle_edit_mode() {
        Ok(timer) => Ok(Json(ApiResponse::new("Edit mode toggled".to_string(), timer))),
        Err(e) => {
            warn!("Rejected edit toggle request: {}", e);
            Err(e)
        }
    }
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timer = state.controller.snapshot();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer,
        label: timer.label(),
        progress: timer.progress(),
        tick_period_ms: u64::try_from(state.controller.tick_period().as_millis()).unwrap_or(u64::MAX),
        presets: PRESET_SECONDS.to_vec(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
        last_finished: state.get_last_finished(),
    })
}

/// Handle GET /presets - List preset durations in seconds
pub async fn presets_handler() -> Json<PresetsResponse> {
    Json(PresetsResponse {
        seconds: PRESET_SECONDS.to_vec(),
    })
}

/// Handle GET /events - Stream finished events as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let finished_rx = state.finished_tx.subscribe();
    info!("Events endpoint called - client subscribed to finished events");

    let events = stream::unfold(finished_rx, |mut finished_rx| async move {
        loop {
            match finished_rx.recv().await {
                Ok(finished) => match Event::default().event("finished").json_data(finished) {
                    Ok(event) => return Some((Ok(event), finished_rx)),
                    Err(e) => warn!("Failed to encode finished event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, {} finished events skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
