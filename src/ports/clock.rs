//! Clock port for timestamping ledger records and archives.

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Every history record and archive name is stamped through this port so
/// tests and cassette replays can pin timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
