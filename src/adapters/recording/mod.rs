//! Adapters that delegate to a real port and write each call to a cassette.

pub mod clock;
pub mod discovery;
pub mod git;
pub mod oracle;
pub mod runner;

use std::sync::PoisonError;

use serde::Serialize;

use crate::cassette::session::SharedRecorder;

pub use clock::RecordingClock;
pub use discovery::RecordingTestDiscovery;
pub use git::RecordingGitRepo;
pub use oracle::RecordingRepairOracle;
pub use runner::RecordingTestRunner;

/// Records a call whose return value is not a `Result`.
pub(crate) fn record_interaction<I, O>(
    recorder: &SharedRecorder,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize + ?Sized,
    O: Serialize + ?Sized,
{
    let input = serde_json::to_value(input).unwrap_or_default();
    let output = serde_json::to_value(output).unwrap_or_default();
    recorder.lock().unwrap_or_else(PoisonError::into_inner).record(port, method, input, output);
}

/// Records a fallible call as `{"ok": value}` or `{"err": message}`.
pub(crate) fn record_result<T, E, I>(
    recorder: &SharedRecorder,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize + ?Sized,
{
    let output = match result {
        Ok(value) => serde_json::json!({ "ok": value }),
        Err(e) => serde_json::json!({ "err": e.to_string() }),
    };
    record_interaction(recorder, port, method, input, &output);
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::{Arc, Mutex};

    use crate::cassette::format::{Cassette, Interaction};
    use crate::cassette::recorder::CassetteRecorder;
    use crate::cassette::session::SharedRecorder;

    /// A recorder writing into a fresh temp directory.
    pub fn recorder() -> (tempfile::TempDir, SharedRecorder) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("port.cassette.yaml");
        (dir, Arc::new(Mutex::new(CassetteRecorder::new(path, "test", "unknown"))))
    }

    /// Finishes the recorder and returns what it wrote.
    pub fn finish(recorder: SharedRecorder) -> Vec<Interaction> {
        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        let path = recorder.finish().unwrap();
        Cassette::load(&path).unwrap().interactions
    }
}
