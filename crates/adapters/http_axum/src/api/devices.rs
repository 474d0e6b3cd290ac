//! JSON REST handlers for device commands and state.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use synthetix_app::ports::RecordStore;
use synthetix_domain::device::{Command, DeviceState};
use synthetix_domain::error::DeviceError;
use synthetix_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for sending a command.
#[derive(Deserialize)]
pub struct CommandRequest {
    /// Command name, for logging only (e.g. `set_state`).
    #[serde(default)]
    pub command: Option<String>,
    /// Partial state update.
    #[serde(default)]
    pub params: Command,
}

/// A device id with its current state.
#[derive(Serialize)]
pub struct DeviceStateBody {
    pub device_id: DeviceId,
    pub state: DeviceState,
}

/// Possible responses from the command and state endpoints.
pub enum StateResponse {
    Ok(Json<DeviceStateBody>),
}

impl IntoResponse for StateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the release endpoint.
pub enum ReleaseResponse {
    NoContent,
}

impl IntoResponse for ReleaseResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn parse_id(id: String) -> Result<DeviceId, ApiError> {
    DeviceId::new(id).map_err(|err| ApiError::from(DeviceError::from(err)))
}

/// `POST /api/devices/{id}/command`
pub async fn command<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<CommandRequest>,
) -> Result<StateResponse, ApiError>
where
    S: RecordStore + 'static,
{
    let device_id = parse_id(id)?;
    tracing::debug!(
        %device_id,
        command = req.command.as_deref().unwrap_or("set_state"),
        "received device command"
    );
    let new_state = state.service.execute(&device_id, &req.params).await?;
    Ok(StateResponse::Ok(Json(DeviceStateBody {
        device_id,
        state: new_state,
    })))
}

/// `GET /api/devices/{id}/state`
pub async fn state<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StateResponse, ApiError>
where
    S: RecordStore + 'static,
{
    let device_id = parse_id(id)?;
    let current = state.service.state(&device_id).await?;
    Ok(StateResponse::Ok(Json(DeviceStateBody {
        device_id,
        state: current,
    })))
}

/// `GET /api/devices/loaded`
pub async fn loaded<S>(State(state): State<AppState<S>>) -> Json<Vec<DeviceId>>
where
    S: RecordStore + 'static,
{
    Json(state.service.manager().loaded_devices())
}

/// `DELETE /api/devices/{id}/driver`
///
/// Releasing a device that is not loaded is not an error.
pub async fn release<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<ReleaseResponse, ApiError>
where
    S: RecordStore + 'static,
{
    let device_id = parse_id(id)?;
    state.service.release(&device_id).await;
    Ok(ReleaseResponse::NoContent)
}
