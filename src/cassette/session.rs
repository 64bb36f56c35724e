//! A recording session: one recorder per replayable port.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, warn};

use super::recorder::CassetteRecorder;

/// Environment variable that switches a run into recording mode.
pub const RECORD_ENV: &str = "MEND_RECORD";

/// Shared handle adapters use to append to a port's cassette.
pub type SharedRecorder = Arc<Mutex<CassetteRecorder>>;

/// Per-port recorders writing into one timestamped directory.
pub struct RecordingSession {
    /// Clock interactions.
    pub clock: SharedRecorder,
    /// Git interactions.
    pub git: SharedRecorder,
    /// Test runner interactions.
    pub runner: SharedRecorder,
    /// Test discovery interactions.
    pub discovery: SharedRecorder,
    /// Repair oracle interactions.
    pub oracle: SharedRecorder,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Starts a session under `<project_root>/.mend/cassettes/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or cannot be created.
    pub fn new(project_root: &Path) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let output_dir = project_root.join(".mend/cassettes").join(&timestamp);
        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }
        Self::at(output_dir, &commit_hash(project_root))
    }

    /// Starts a session writing into an explicit directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn at(output_dir: PathBuf, commit: &str) -> Result<Self, String> {
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let prefix = output_dir
            .file_name()
            .map_or_else(|| "session".to_string(), |n| n.to_string_lossy().into_owned());
        let recorder = |port: &str| -> SharedRecorder {
            Arc::new(Mutex::new(CassetteRecorder::new(
                output_dir.join(format!("{port}.cassette.yaml")),
                format!("{prefix}-{port}"),
                commit,
            )))
        };

        Ok(Self {
            clock: recorder("clock"),
            git: recorder("git"),
            runner: recorder("runner"),
            discovery: recorder("discovery"),
            oracle: recorder("oracle"),
            output_dir,
        })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes every port's cassette. All recording adapters must have been
    /// dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter still holds a recorder or a file
    /// cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        for (port, shared) in [
            ("clock", self.clock),
            ("git", self.git),
            ("runner", self.runner),
            ("discovery", self.discovery),
            ("oracle", self.oracle),
        ] {
            let recorder = Arc::try_unwrap(shared)
                .map_err(|_| format!("Recording adapter for {port} still has references"))?
                .into_inner()
                .map_err(|e| format!("Recorder lock for {port} poisoned: {e}"))?;
            if recorder.is_empty() {
                debug!(port, "no interactions recorded");
            } else {
                debug!(port, interactions = recorder.len(), "writing cassette");
            }
            recorder.finish().map_err(|e| format!("Failed to write {port} cassette: {e}"))?;
        }
        Ok(self.output_dir)
    }
}

/// `HEAD` of the repository at `project_root`, or `unknown`.
#[must_use]
pub fn commit_hash(project_root: &Path) -> String {
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(project_root)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string());

    hash.unwrap_or_else(|| {
        warn!("could not read commit hash for cassette metadata, using 'unknown'");
        "unknown".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::config::CassetteConfig;

    #[test]
    fn finish_writes_one_cassette_per_port() {
        let dir = tempfile::tempdir().unwrap();
        let session = RecordingSession::at(dir.path().join("rec"), "abc").unwrap();
        session.git.lock().unwrap().record(
            "git",
            "commit",
            serde_json::json!({"message": "m"}),
            serde_json::json!({"ok": null}),
        );

        let out = session.finish().unwrap();
        let config = CassetteConfig::from_dir(&out);
        assert!(config.clock.is_some());
        assert!(config.git.is_some());
        assert!(config.runner.is_some());
        assert!(config.discovery.is_some());
        assert!(config.oracle.is_some());
    }

    #[test]
    fn finish_refuses_while_adapter_holds_recorder() {
        let dir = tempfile::tempdir().unwrap();
        let session = RecordingSession::at(dir.path().join("rec"), "abc").unwrap();
        let _held = Arc::clone(&session.oracle);
        let err = session.finish().unwrap_err();
        assert!(err.contains("oracle still has references"));
    }

    #[test]
    fn new_places_session_under_project() {
        let dir = tempfile::tempdir().unwrap();
        let session = RecordingSession::new(dir.path()).unwrap();
        assert!(session.output_dir().starts_with(dir.path().join(".mend/cassettes")));
    }
}
