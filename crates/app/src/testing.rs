//! In-memory test doubles for the port traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use synthetix_domain::device::{Command, DeviceRecord, DeviceState, DriverConfig};
use synthetix_domain::error::{DriverError, NotificationError, StoreError};
use synthetix_domain::event::StateChangeEvent;
use synthetix_domain::id::{DeviceId, ObserverId};

use crate::ports::{Driver, ObserverConnection, RecordStore};
use crate::registry::DriverRegistry;

pub(crate) fn object(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().unwrap()
}

pub(crate) fn device(id: &str) -> DeviceId {
    DeviceId::new(id).unwrap()
}

/// Shared counters observed by tests after the driver moved into the manager.
#[derive(Default)]
pub(crate) struct Probe {
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub commands: AtomicUsize,
    pub journal: Mutex<Vec<String>>,
}

impl Probe {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }
}

/// Driver whose behaviour is chosen through its configuration:
/// `fail_connect`, `fail_disconnect`, `reject`, `panic` (bools),
/// `latency_ms` and `connect_latency_ms` (integers). Every update key is
/// merged verbatim; the `append` key pushes onto a `log` array.
pub(crate) struct FakeDriver {
    device_id: DeviceId,
    connected: bool,
    state: DeviceState,
    config: DriverConfig,
    probe: Arc<Probe>,
}

impl FakeDriver {
    pub fn new(device_id: DeviceId) -> Self {
        Self::from_config(device_id, DriverConfig::new(), Arc::default())
    }

    pub fn from_config(device_id: DeviceId, config: DriverConfig, probe: Arc<Probe>) -> Self {
        Self {
            device_id,
            connected: false,
            state: object(json!({"log": []})),
            config,
            probe,
        }
    }

    fn flag(&self, key: &str) -> bool {
        self.config.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    fn millis(&self, key: &str) -> Duration {
        Duration::from_millis(self.config.get(key).and_then(Value::as_u64).unwrap_or(0))
    }
}

#[async_trait]
impl Driver for FakeDriver {
    fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    fn driver_type(&self) -> &'static str {
        "fake"
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<(), DriverError> {
        self.probe.connects.fetch_add(1, Ordering::SeqCst);
        let connect_latency = self.millis("connect_latency_ms");
        if !connect_latency.is_zero() {
            tokio::time::sleep(connect_latency).await;
        }
        if self.flag("panic_connect") {
            panic!("connect exploded");
        }
        if self.flag("fail_connect") {
            return Err(DriverError::Unreachable("no route to device".to_string()));
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DriverError> {
        self.probe.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected = false;
        if self.flag("fail_disconnect") {
            return Err(DriverError::Unreachable("already gone".to_string()));
        }
        Ok(())
    }

    async fn state(&self) -> DeviceState {
        let mut state = self.state.clone();
        state.insert("connected".to_string(), Value::Bool(self.connected));
        state
    }

    async fn set_state(&mut self, update: &Command) -> Result<(), DriverError> {
        if !self.connected {
            return Err(DriverError::NotConnected);
        }
        if self.flag("panic") {
            panic!("driver bug");
        }
        if self.flag("reject") {
            return Err(DriverError::Unreachable("device busy".to_string()));
        }
        self.probe.commands.fetch_add(1, Ordering::SeqCst);

        let tag = update.get("append").cloned();
        if let Some(tag) = &tag {
            self.probe.journal.lock().unwrap().push(format!("start:{tag}"));
        }

        let mut log = self
            .state
            .get("log")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        tokio::time::sleep(self.millis("latency_ms")).await;

        for (key, value) in update {
            if key != "append" {
                self.state.insert(key.clone(), value.clone());
            }
        }
        if let Some(tag) = tag {
            self.probe.journal.lock().unwrap().push(format!("end:{tag}"));
            log.push(tag);
        }
        self.state.insert("log".to_string(), Value::Array(log));
        Ok(())
    }
}

/// Registry with a single `fake` type whose instances report to `probe`.
pub(crate) fn fake_registry(probe: &Arc<Probe>) -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    let probe = Arc::clone(probe);
    registry.register("fake", move |id, config| {
        Ok(Box::new(FakeDriver::from_config(id, config, Arc::clone(&probe))) as Box<dyn Driver>)
    });
    registry
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum ObserverMode {
    Healthy,
    Failing,
    Hanging,
    /// Never completes a send nor a close, like a peer whose socket buffer is full.
    Unresponsive,
}

/// Observer that records what it receives.
pub(crate) struct FakeObserver {
    id: ObserverId,
    mode: ObserverMode,
    received: Mutex<Vec<StateChangeEvent>>,
    closed: AtomicBool,
}

impl FakeObserver {
    pub fn new(mode: ObserverMode) -> Arc<Self> {
        Arc::new(Self {
            id: ObserverId::new(),
            mode,
            received: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn healthy() -> Arc<Self> {
        Self::new(ObserverMode::Healthy)
    }

    pub fn received(&self) -> Vec<StateChangeEvent> {
        self.received.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ObserverConnection for FakeObserver {
    fn id(&self) -> ObserverId {
        self.id
    }

    async fn send_json(&self, event: &StateChangeEvent) -> Result<(), NotificationError> {
        match self.mode {
            ObserverMode::Healthy => {
                self.received.lock().unwrap().push(event.clone());
                Ok(())
            }
            ObserverMode::Failing => Err(NotificationError::Closed),
            ObserverMode::Hanging | ObserverMode::Unresponsive => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn close(&self) {
        if self.mode == ObserverMode::Unresponsive {
            std::future::pending::<()>().await;
        }
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Record store backed by a `HashMap`, with switchable failures.
#[derive(Default)]
pub(crate) struct InMemoryRecordStore {
    records: Mutex<HashMap<DeviceId, DeviceRecord>>,
    pub fail_fetch: AtomicBool,
    pub fail_persist: AtomicBool,
    persisted: Mutex<Vec<(DeviceId, DeviceState)>>,
}

impl InMemoryRecordStore {
    pub fn with_record(self, record: DeviceRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(record.device_id.clone(), record);
        self
    }

    pub fn persisted(&self) -> Vec<(DeviceId, DeviceState)> {
        self.persisted.lock().unwrap().clone()
    }
}

impl RecordStore for InMemoryRecordStore {
    async fn fetch_device_record(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::new("store offline"));
        }
        Ok(self.records.lock().unwrap().get(device_id).cloned())
    }

    async fn persist_device_state(
        &self,
        device_id: &DeviceId,
        state: &DeviceState,
    ) -> Result<(), StoreError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(StoreError::new("disk full"));
        }
        self.persisted
            .lock()
            .unwrap()
            .push((device_id.clone(), state.clone()));
        if let Some(record) = self.records.lock().unwrap().get_mut(device_id) {
            record.state = state.clone();
        }
        Ok(())
    }
}
