//! Axum route handlers for the voxctl HTTP server.
//!
//! # Routes
//!
//! - `GET  /health`        Returns `{"status": "ok", "version": ..., "service": "voxctl"}`
//! - `POST /api/command`   `{action, loop?, enabled?}`; toggle / off / delay
//! - `GET  /api/status`    Merged `{user_counts, states}` across all workers
//! - `GET  /api/config`    Loop catalog of the active role
//! - `GET  /api/settings`  Operator settings and active role
//! - `POST /api/settings`  Update settings; a new role rebuilds the loop table
//! - `POST /api/volume`    `{loop, volume}` forwarded to the loop's worker
//! - `POST /api/device`    `{direction, device}` forwarded to the primary worker

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::AppState;
use crate::catalog::{is_known_role, normalize_role};
use crate::config::{Settings, SettingsUpdate};
use crate::control::{Command, CommandOutcome, CommandRequest, DeviceDirection, lock_state};
use crate::domain::StatusReport;
use crate::error::VoxError;

/// Error response carrying a `VoxError`
pub struct ApiError(VoxError);

impl From<VoxError> for ApiError {
    fn from(err: VoxError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            VoxError::LoopNotFound(_) => StatusCode::NOT_FOUND,
            VoxError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
            VoxError::InvalidState(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    #[serde(rename = "loop")]
    pub loop_name: String,
    pub volume: f32,
}

#[derive(Debug, Deserialize)]
pub struct DeviceRequest {
    pub direction: DeviceDirection,
    pub device: String,
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/command", post(command_handler))
        .route("/api/status", get(status_handler))
        .route("/api/config", get(catalog_handler))
        .route("/api/settings", get(get_settings_handler).post(save_settings_handler))
        .route("/api/volume", post(volume_handler))
        .route("/api/device", post(device_handler))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: AppState, bind_addr: &str) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log::info!("voxctl server listening on {}", bind_addr);

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutdown requested");
        })
        .await?;
    Ok(())
}

/// GET /health: liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "voxctl",
    }))
}

/// POST /api/command
async fn command_handler(State(state): State<AppState>, Json(request): Json<CommandRequest>) -> ApiResult<CommandOutcome> {
    let command = Command::try_from(request)?;
    log::debug!("Command: {:?}", command);
    Ok(Json(state.dispatcher.dispatch(command).await?))
}

/// GET /api/status
async fn status_handler(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.aggregator.collect().await)
}

/// GET /api/config: loops of the active role
async fn catalog_handler(State(state): State<AppState>) -> Json<Value> {
    let control = lock_state(state.dispatcher.state());
    Json(json!({
        "role": control.role(),
        "loops": control.loops(),
    }))
}

/// GET /api/settings
async fn get_settings_handler(State(state): State<AppState>) -> Json<Settings> {
    Json(state.config.read().await.settings())
}

/// POST /api/settings
///
/// Operator fields missing from the body keep their current value. The loop
/// table is rebuilt only when the role actually changes; the switch runs
/// before the config lock is taken so settings reads are not held up by
/// worker calls. A failed save is reported next to the completed switch.
async fn save_settings_handler(State(state): State<AppState>, Json(update): Json<SettingsUpdate>) -> ApiResult<Value> {
    let role = normalize_role(&update.role);
    if role.is_empty() {
        return Err(VoxError::InvalidCommand("role must not be empty".to_string()).into());
    }
    if !is_known_role(&role) {
        log::warn!("Switching to role {} which has no bundled catalog", role);
    }

    let current_role = lock_state(state.dispatcher.state()).role().to_string();
    let switch = if role != current_role {
        Some(state.dispatcher.switch_role(&role).await?)
    } else {
        None
    };

    let mut config = state.config.write().await;
    config.apply_settings(update);
    // The control state is authoritative if another switch raced this one
    config.role = lock_state(state.dispatcher.state()).role().to_string();

    let save_error = state.config_path.as_ref().and_then(|path| {
        config.save(path).err().map(|e| {
            log::warn!("Settings applied but not saved: {:#}", e);
            format!("{:#}", e)
        })
    });

    Ok(Json(json!({
        "settings": config.settings(),
        "switch": switch,
        "save_error": save_error,
    })))
}

/// POST /api/volume
async fn volume_handler(State(state): State<AppState>, Json(request): Json<VolumeRequest>) -> ApiResult<CommandOutcome> {
    Ok(Json(state.dispatcher.set_volume(&request.loop_name, request.volume).await?))
}

/// POST /api/device
async fn device_handler(State(state): State<AppState>, Json(request): Json<DeviceRequest>) -> ApiResult<CommandOutcome> {
    Ok(Json(state.dispatcher.select_device(request.direction, &request.device).await?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
