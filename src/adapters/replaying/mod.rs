//! Adapters that answer port calls from a cassette instead of the world.

pub mod clock;
pub mod discovery;
pub mod git;
pub mod oracle;
pub mod runner;

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::BoxError;

pub use clock::ReplayingClock;
pub use discovery::ReplayingTestDiscovery;
pub use git::ReplayingGitRepo;
pub use oracle::ReplayingRepairOracle;
pub use runner::ReplayingTestRunner;

/// Replayer shared between the adapters fed by one cassette.
pub type SharedReplayer = Arc<Mutex<CassetteReplayer>>;

/// Wraps a replayer for sharing between adapters.
#[must_use]
pub fn shared(replayer: CassetteReplayer) -> SharedReplayer {
    Arc::new(Mutex::new(replayer))
}

/// A replayer with nothing recorded; any call through it panics. Stands in
/// for ports a replay is not expected to touch.
#[must_use]
pub fn unconfigured() -> SharedReplayer {
    shared(CassetteReplayer::new(&Cassette {
        name: "unconfigured".into(),
        recorded_at: DateTime::<Utc>::UNIX_EPOCH,
        commit: "unknown".into(),
        interactions: Vec::new(),
    }))
}

/// Takes the next recorded output for `port::method`.
///
/// # Panics
///
/// Panics if the cassette has nothing (more) for the pair.
pub(crate) fn next_output(replayer: &SharedReplayer, port: &str, method: &str) -> serde_json::Value {
    let mut guard = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    guard.next_interaction(port, method).output
}

/// Decodes a plain recorded value.
///
/// # Panics
///
/// Panics if the value does not have the expected shape.
pub(crate) fn replay_value<T: DeserializeOwned>(output: serde_json::Value, context: &str) -> T {
    serde_json::from_value(output)
        .unwrap_or_else(|e| panic!("{context}: recorded output has the wrong shape: {e}"))
}

/// Decodes a recorded `{"ok": ..}` / `{"err": ".."}` result.
///
/// # Errors
///
/// Returns the recorded error message, or a decoding error if the `ok`
/// value does not have the expected shape.
pub(crate) fn replay_result<T: DeserializeOwned>(
    output: serde_json::Value,
) -> Result<T, BoxError> {
    if let Some(err) = output.get("err") {
        return Err(err.as_str().unwrap_or("unknown error").to_string().into());
    }
    let value = match output {
        serde_json::Value::Object(mut map) if map.contains_key("ok") => {
            map.remove("ok").unwrap_or_default()
        }
        other => other,
    };
    serde_json::from_value(value).map_err(|e| format!("failed to decode replayed value: {e}").into())
}
