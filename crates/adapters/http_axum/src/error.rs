//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use synthetix_domain::device::DeviceState;
use synthetix_domain::error::DeviceError;
use synthetix_domain::id::DeviceId;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    /// Whether the same request may succeed later as is.
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_id: Option<DeviceId>,
    /// New device state, when the command was applied despite the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<DeviceState>,
}

/// Maps [`DeviceError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(DeviceError);

impl From<DeviceError> for ApiError {
    fn from(err: DeviceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DeviceError::UnknownDriverType(_) | DeviceError::InvalidDeviceId(_) => {
                StatusCode::BAD_REQUEST
            }
            DeviceError::NotLoaded(_) => StatusCode::NOT_FOUND,
            DeviceError::AlreadyLoaded(_) => StatusCode::CONFLICT,
            DeviceError::ConnectFailure { .. } | DeviceError::CommandRejected { .. } => {
                StatusCode::BAD_GATEWAY
            }
            DeviceError::PersistenceFailure { .. } | DeviceError::RecordStore { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = self.0;
        let retryable = err.is_retryable();

        let error = match &err {
            DeviceError::RecordStore { .. } => {
                tracing::error!(error = %err, "record store error");
                "internal server error".to_string()
            }
            DeviceError::PersistenceFailure { .. } => {
                tracing::error!(error = %err, "persistence failure");
                err.to_string()
            }
            // Driver failures carry their cause: show it to the caller.
            DeviceError::ConnectFailure { source, .. }
            | DeviceError::CommandRejected { source, .. } => format!("{err}: {source}"),
            _ => err.to_string(),
        };

        let body = match err {
            DeviceError::PersistenceFailure {
                device_id, state, ..
            } => ErrorBody {
                error,
                retryable,
                device_id: Some(device_id),
                state: Some(state),
            },
            _ => ErrorBody {
                error,
                retryable,
                device_id: None,
                state: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
