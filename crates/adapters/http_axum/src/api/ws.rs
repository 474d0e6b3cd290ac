//! WebSocket observer feed.
//!
//! Every connection to `/api/ws/devices` joins the notification hub and
//! receives each state-change event as a JSON text frame. Frames sent by
//! the client are heartbeats and ignored.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;

use synthetix_app::ports::{ObserverConnection, RecordStore};
use synthetix_domain::error::NotificationError;
use synthetix_domain::event::StateChangeEvent;
use synthetix_domain::id::ObserverId;

use crate::state::AppState;

/// Write half of a WebSocket, registered with the notification hub.
pub struct WebSocketObserver {
    id: ObserverId,
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WebSocketObserver {
    #[must_use]
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            id: ObserverId::new(),
            sink: Mutex::new(sink),
        }
    }
}

impl ObserverConnection for WebSocketObserver {
    fn id(&self) -> ObserverId {
        self.id
    }

    async fn send_json(&self, event: &StateChangeEvent) -> Result<(), NotificationError> {
        let text = serde_json::to_string(event)?;
        self.sink
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|err| NotificationError::Transport(Box::new(err)))
    }

    async fn close(&self) {
        if let Err(err) = self.sink.lock().await.close().await {
            tracing::debug!(observer = %self.id, error = %err, "websocket already closed");
        }
    }
}

/// `GET /api/ws/devices`
pub async fn devices_feed<S>(ws: WebSocketUpgrade, State(state): State<AppState<S>>) -> Response
where
    S: RecordStore + 'static,
{
    ws.on_upgrade(move |socket| observe(socket, state))
}

async fn observe<S>(socket: WebSocket, state: AppState<S>)
where
    S: RecordStore + 'static,
{
    let (sink, mut stream) = socket.split();
    let observer = Arc::new(WebSocketObserver::new(sink));
    let id = observer.id();
    let hub = state.service.hub();
    hub.subscribe(observer);

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(observer = %id, error = %err, "websocket read failed");
                break;
            }
        }
    }

    hub.unsubscribe(id);
}
