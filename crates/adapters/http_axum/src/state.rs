//! Shared application state for axum handlers.

use std::sync::Arc;

use synthetix_app::ports::RecordStore;
use synthetix_app::services::command_service::CommandService;

use crate::api::ws::WebSocketObserver;

/// Command service wired to WebSocket observers.
pub type DeviceCommandService<S> = CommandService<S, WebSocketObserver>;

/// Application state shared across all axum handlers.
///
/// Generic over the record store to avoid dynamic dispatch.
/// `Clone` is implemented manually so the store itself does not need to be
/// `Clone` — only the `Arc` wrapper is cloned.
pub struct AppState<S> {
    /// Inbound command path, device manager and notification hub.
    pub service: Arc<DeviceCommandService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S> AppState<S>
where
    S: RecordStore + 'static,
{
    /// Create a new application state from a service instance.
    pub fn new(service: DeviceCommandService<S>) -> Self {
        Self::from_arc(Arc::new(service))
    }

    /// Create a new application state from a pre-wrapped `Arc` service.
    ///
    /// Use this when the service must stay reachable after the server
    /// stops, e.g. to unload every device on shutdown.
    pub fn from_arc(service: Arc<DeviceCommandService<S>>) -> Self {
        Self { service }
    }
}
