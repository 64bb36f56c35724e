//! Deterministic clock for tests and reproducible runs.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::ports::clock::Clock;

/// A clock that starts at a fixed instant and advances by a fixed step on
/// every reading, so consecutive records get distinct, ordered stamps.
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    /// Starts at `start`, advancing by `step` after each reading.
    #[must_use]
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self { next: Mutex::new(start), step }
    }

    /// Starts at an RFC 3339 instant and advances one second per reading.
    ///
    /// # Panics
    ///
    /// Panics if `rfc3339` does not parse.
    #[must_use]
    pub fn starting_at(rfc3339: &str) -> Self {
        let start = DateTime::parse_from_rfc3339(rfc3339)
            .unwrap_or_else(|e| panic!("invalid RFC 3339 timestamp {rfc3339:?}: {e}"))
            .with_timezone(&Utc);
        Self::new(start, Duration::seconds(1))
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        let now = *next;
        *next = now + self.step;
        now
    }
}
