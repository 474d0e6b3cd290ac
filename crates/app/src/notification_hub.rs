//! Notification hub: fans state-change events out to live observers.
//!
//! Delivery is best-effort and isolated per connection. A connection whose
//! send fails or times out is evicted within the same broadcast; the
//! others are unaffected. There is no per-observer queue: a slow consumer
//! simply risks the send timeout.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use synthetix_domain::error::NotificationError;
use synthetix_domain::event::StateChangeEvent;
use synthetix_domain::id::ObserverId;

use crate::ports::ObserverConnection;

/// Default upper bound for a single send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Set of active observer connections.
///
/// The set has its own lock, independent of every device lock, and the
/// lock is never held while sending.
pub struct NotificationHub<C> {
    observers: Mutex<HashMap<ObserverId, Arc<C>>>,
    send_timeout: Duration,
}

impl<C> Default for NotificationHub<C> {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_TIMEOUT)
    }
}

impl<C> NotificationHub<C> {
    /// Create an empty hub whose sends give up after `send_timeout`.
    #[must_use]
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            observers: Mutex::new(HashMap::new()),
            send_timeout,
        }
    }

    /// Number of active observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no observer is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `id` is in the active set.
    #[must_use]
    pub fn contains(&self, id: ObserverId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Remove an observer. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let (removed, remaining) = {
            let mut observers = self.lock();
            let removed = observers.remove(&id).is_some();
            (removed, observers.len())
        };
        if removed {
            tracing::info!(observer = %id, observers = remaining, "observer disconnected");
        }
        removed
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ObserverId, Arc<C>>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: ObserverConnection> NotificationHub<C> {
    /// Add a connection to the active set. Returns the new observer count.
    pub fn subscribe(&self, connection: Arc<C>) -> usize {
        let id = connection.id();
        let count = {
            let mut observers = self.lock();
            observers.insert(id, connection);
            observers.len()
        };
        tracing::info!(observer = %id, observers = count, "observer connected");
        count
    }

    /// Send `event` to every active observer.
    ///
    /// Sends run concurrently, each bounded by the send timeout. Observers
    /// that fail are unsubscribed and closed before this returns; the close
    /// is bounded by the send timeout too. Returns
    /// the number of successful deliveries; failures never reach the caller.
    pub async fn broadcast(&self, event: &StateChangeEvent) -> usize {
        let targets: Vec<Arc<C>> = self.lock().values().cloned().collect();
        if targets.is_empty() {
            return 0;
        }

        let outcomes =
            futures::future::join_all(targets.iter().map(|conn| self.send(conn, event))).await;

        let mut delivered = 0;
        let mut evicted = Vec::new();
        for (conn, outcome) in targets.iter().zip(outcomes) {
            match outcome {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        observer = %conn.id(),
                        device_id = %event.device_id,
                        error = %err,
                        "evicting observer after failed send"
                    );
                    self.unsubscribe(conn.id());
                    evicted.push(conn);
                }
            }
        }
        futures::future::join_all(evicted.into_iter().map(|conn| self.close(conn))).await;
        tracing::debug!(
            device_id = %event.device_id,
            kind = %event.event,
            delivered,
            "broadcast complete"
        );
        delivered
    }

    /// Close an evicted connection. A peer that stopped reading may never
    /// accept the close frame, so this is bounded like a send.
    async fn close(&self, conn: &C) {
        if tokio::time::timeout(self.send_timeout, conn.close())
            .await
            .is_err()
        {
            tracing::debug!(observer = %conn.id(), "gave up closing evicted observer");
        }
    }

    async fn send(&self, conn: &C, event: &StateChangeEvent) -> Result<(), NotificationError> {
        tokio::time::timeout(self.send_timeout, conn.send_json(event))
            .await
            .unwrap_or(Err(NotificationError::Timeout))
    }
}
