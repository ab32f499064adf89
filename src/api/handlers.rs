//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::{
    protocol::{Ack, Command, MinutesPayload, Reply},
    state::{dispatch, AppState, CompletionAlert},
};
use super::responses::{HealthResponse, StatusResponse};

fn respond(state: &Arc<AppState>, command: Command) -> Result<Json<Reply>, StatusCode> {
    let name = command.name();
    dispatch(state, command).map(Json).map_err(|e| {
        error!("Failed to handle {}: {}", name, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

fn minutes(payload: Option<Json<MinutesPayload>>) -> Option<u64> {
    payload.and_then(|Json(payload)| payload.minutes)
}

/// Handle POST /message - Tagged command in the `{"action": ...}` form
pub async fn message_handler(
    State(state): State<Arc<AppState>>,
    Json(command): Json<Command>,
) -> Result<Json<Reply>, StatusCode> {
    respond(&state, command)
}

/// Handle GET /state - Current timer snapshot
pub async fn state_handler(State(state): State<Arc<AppState>>) -> Result<Json<Reply>, StatusCode> {
    respond(&state, Command::GetTimerState)
}

/// Handle POST /start - Start or resume, optionally with a new length
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<MinutesPayload>>,
) -> Result<Json<Reply>, StatusCode> {
    respond(&state, Command::StartTimer { minutes: minutes(payload) })
}

/// Handle POST /pause - Pause a running timer
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<Reply>, StatusCode> {
    respond(&state, Command::PauseTimer)
}

/// Handle POST /reset - Stop and reload the session
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<MinutesPayload>>,
) -> Result<Json<Reply>, StatusCode> {
    respond(&state, Command::ResetTimer { minutes: minutes(payload) })
}

/// Handle POST /minutes - Change the configured length
pub async fn minutes_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<MinutesPayload>>,
) -> Result<Json<Reply>, StatusCode> {
    respond(&state, Command::UpdateMinutes { minutes: minutes(payload) })
}

/// Handle GET /alert - Alert currently on display, or null
pub async fn alert_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<CompletionAlert>>, StatusCode> {
    state.current_alert().map(Json).map_err(|e| {
        error!("Failed to get alert: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle POST /alert/:id/start-another - The alert's action button
pub async fn alert_start_another_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Ack>, StatusCode> {
    match state.start_another(id) {
        Ok(true) => Ok(Json(Ack::ok())),
        Ok(false) => {
            info!("Alert {} is no longer shown, ignoring action", id);
            Ok(Json(Ack::failed()))
        }
        Err(e) => {
            error!("Failed to start another session: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /alert/:id/dismiss - Close the alert
pub async fn alert_dismiss_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Ack>, StatusCode> {
    match state.dismiss_alert(id) {
        Ok(true) => Ok(Json(Ack::ok())),
        Ok(false) => Ok(Json(Ack::failed())),
        Err(e) => {
            error!("Failed to dismiss alert: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Timer, alert and server metadata
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.get_timer_state() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let alert = match state.current_alert() {
        Ok(a) => a,
        Err(e) => {
            error!("Failed to get alert: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        phase: timer.phase(),
        display: timer.display(),
        started_at_epoch_ms: state.started_at_epoch_ms().unwrap_or(None),
        alert,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
