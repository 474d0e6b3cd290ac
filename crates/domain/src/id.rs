//! Identifier newtypes.
//!
//! Devices are keyed by caller-chosen strings (`"lamp-1"`), observers by
//! random UUIDs minted when they subscribe.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidDeviceIdError;

/// Stable string key naming one logical device instance.
///
/// Never empty and never padded with whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Validate and wrap a device identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDeviceIdError`] if `value` is empty or has
    /// leading/trailing whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidDeviceIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(InvalidDeviceIdError::Empty);
        }
        if value.trim() != value {
            return Err(InvalidDeviceIdError::Whitespace(value));
        }
        Ok(Self(value))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = InvalidDeviceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = InvalidDeviceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for one observer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverId(uuid::Uuid);

impl Default for ObserverId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl ObserverId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(self) -> uuid::Uuid {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
