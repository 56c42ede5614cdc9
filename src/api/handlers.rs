//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::{
    error::TimerError,
    state::{AppState, TimerConfiguration, TimerSnapshot},
};
use super::responses::{
    ApiResponse, ConfigureRequest, HealthResponse, IntervalRequest, StatusResponse,
};

type ActionResult = Result<Json<ApiResponse>, Response>;

fn status_for(e: &TimerError) -> StatusCode {
    match e {
        TimerError::InvalidInterval(_)
        | TimerError::InvalidRequest(_)
        | TimerError::IntervalMismatch { .. } => StatusCode::BAD_REQUEST,
        TimerError::InvalidTransition { .. } => StatusCode::CONFLICT,
        TimerError::StatePoisoned(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turn the result of a timer action into an HTTP response
///
/// Rejected actions still report the current timer so clients can resync.
fn respond(
    state: &AppState,
    action: &str,
    result: Result<TimerSnapshot, TimerError>,
) -> ActionResult {
    match result {
        Ok(timer) => {
            info!("{} endpoint called - timer is {}", action, timer.phase);
            Ok(Json(ApiResponse::ok(format!("Timer {}", timer.phase), timer)))
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Failed to {} timer: {}", action, e);
            } else {
                warn!("Rejected {} request: {}", action, e);
            }

            match state.get_snapshot() {
                Ok(timer) => {
                    let body = Json(ApiResponse::error(e.to_string(), timer));
                    Err((status, body).into_response())
                }
                Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR.into_response()),
            }
        }
    }
}

/// Parse a JSON request body; anything that does not fit `T` is a bad request
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, TimerError> {
    serde_json::from_slice(body).map_err(|e| TimerError::InvalidRequest(e.to_string()))
}

/// Handle POST /start - Start a session, or resume a paused one
///
/// An empty body starts with the configured interval; a body that is present
/// must be a valid [`IntervalRequest`].
pub async fn start_handler(State(state): State<Arc<AppState>>, body: Bytes) -> ActionResult {
    let requested = if body.iter().all(u8::is_ascii_whitespace) {
        Ok(None)
    } else {
        parse_body::<IntervalRequest>(&body).map(|req| req.interval_seconds)
    };

    let result = requested.and_then(|requested| match requested {
        Some(seconds) => TimerConfiguration::new(seconds).and_then(|config| state.start(config)),
        None => state.start_configured(),
    });
    respond(&state, "start", result)
}

/// Handle POST /pause - Freeze the running session
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    let result = state.pause();
    respond(&state, "pause", result)
}

/// Handle POST /resume - Continue a paused session
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    let result = state.resume();
    respond(&state, "resume", result)
}

/// Handle POST /toggle - Start, pause or resume depending on the current phase
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    let result = state.toggle();
    respond(&state, "toggle", result)
}

/// Handle POST /reset - Return to idle with counters cleared
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    let result = state.reset();
    respond(&state, "reset", result)
}

/// Handle POST /configure - Set a new interval and reset the session
pub async fn configure_handler(State(state): State<Arc<AppState>>, body: Bytes) -> ActionResult {
    let result = parse_body::<ConfigureRequest>(&body)
        .and_then(|req| TimerConfiguration::new(req.interval_seconds))
        .and_then(|config| state.configure(config));
    respond(&state, "configure", result)
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.get_snapshot() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer snapshot: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        voice_mode: state.voice_mode(),
        failed_voice_labels: state.failed_voice_labels(),
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
