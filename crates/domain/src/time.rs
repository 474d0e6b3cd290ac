//! Time helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for event times and record `last_seen` values.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
