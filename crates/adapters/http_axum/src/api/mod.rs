//! JSON REST API and WebSocket handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
pub mod drivers;
pub mod ws;

use axum::Router;
use axum::routing::{delete, get, post};

use synthetix_app::ports::RecordStore;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: RecordStore + 'static,
{
    Router::new()
        // Devices
        .route("/devices/loaded", get(devices::loaded::<S>))
        .route("/devices/{id}/command", post(devices::command::<S>))
        .route("/devices/{id}/state", get(devices::state::<S>))
        .route("/devices/{id}/driver", delete(devices::release::<S>))
        // Drivers
        .route("/drivers", get(drivers::list::<S>))
        // Live feed
        .route("/ws/devices", get(ws::devices_feed::<S>))
}
