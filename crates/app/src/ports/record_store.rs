//! Record store port: the external source of device records and sink of
//! persisted device state.

use std::future::Future;

use synthetix_domain::device::{DeviceRecord, DeviceState};
use synthetix_domain::error::StoreError;
use synthetix_domain::id::DeviceId;

/// Opaque key-value storage for device records.
///
/// The core depends on these two operations only, never on a schema.
pub trait RecordStore: Send + Sync {
    /// Fetch the record of a device, `None` if the store has never seen it.
    fn fetch_device_record(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, StoreError>> + Send;

    /// Persist the latest state of a device.
    fn persist_device_state(
        &self,
        device_id: &DeviceId,
        state: &DeviceState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T: RecordStore> RecordStore for std::sync::Arc<T> {
    fn fetch_device_record(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, StoreError>> + Send {
        (**self).fetch_device_record(device_id)
    }

    fn persist_device_state(
        &self,
        device_id: &DeviceId,
        state: &DeviceState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).persist_device_state(device_id, state)
    }
}
