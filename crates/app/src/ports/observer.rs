//! Observer transport port: one subscriber to state-change notifications.

use std::future::Future;

use synthetix_domain::error::NotificationError;
use synthetix_domain::event::StateChangeEvent;
use synthetix_domain::id::ObserverId;

/// A bidirectional channel to one observer (WebSocket, SSE, test double, …).
///
/// Accepting/establishing the channel is the transport's business; the
/// [`NotificationHub`](crate::notification_hub::NotificationHub) only sees
/// connections that are already open.
pub trait ObserverConnection: Send + Sync {
    /// Stable identity of this connection, used for unsubscribe.
    fn id(&self) -> ObserverId;

    /// Send one event encoded as JSON.
    fn send_json(
        &self,
        event: &StateChangeEvent,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;

    /// Close the channel. Must be safe to call on an already closed channel.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
