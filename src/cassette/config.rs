//! Per-port cassette selection for replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Cassette file per replayable port. A port left as `None` is not
/// replayed; the context decides what stands in for it.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Clock port cassette.
    pub clock: Option<PathBuf>,
    /// Git port cassette.
    pub git: Option<PathBuf>,
    /// Test runner port cassette.
    pub runner: Option<PathBuf>,
    /// Test discovery port cassette.
    pub discovery: Option<PathBuf>,
    /// Repair oracle port cassette.
    pub oracle: Option<PathBuf>,
}

/// Replayers loaded from a [`CassetteConfig`].
#[derive(Default)]
pub struct PortReplayers {
    /// Clock replayer.
    pub clock: Option<CassetteReplayer>,
    /// Git replayer.
    pub git: Option<CassetteReplayer>,
    /// Test runner replayer.
    pub runner: Option<CassetteReplayer>,
    /// Test discovery replayer.
    pub discovery: Option<CassetteReplayer>,
    /// Repair oracle replayer.
    pub oracle: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Uses the `<port>.cassette.yaml` files present in a recording
    /// directory, as written by a recording session.
    #[must_use]
    pub fn from_dir(dir: &Path) -> Self {
        let pick = |port: &str| {
            let path = dir.join(format!("{port}.cassette.yaml"));
            path.is_file().then_some(path)
        };
        Self {
            clock: pick("clock"),
            git: pick("git"),
            runner: pick("runner"),
            discovery: pick("discovery"),
            oracle: pick("oracle"),
        }
    }

    /// Loads a single cassette that holds interactions for several ports.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_monolithic(path: &Path) -> Result<CassetteReplayer, String> {
        Cassette::load(path).map(|cassette| CassetteReplayer::new(&cassette))
    }

    /// Loads every configured cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        let load = |path: &Option<PathBuf>| path.as_deref().map(Self::load_monolithic).transpose();
        Ok(PortReplayers {
            clock: load(&self.clock)?,
            git: load(&self.git)?,
            runner: load(&self.runner)?,
            discovery: load(&self.discovery)?,
            oracle: load(&self.oracle)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::recorder::CassetteRecorder;
    use serde_json::json;

    #[test]
    fn from_dir_picks_only_present_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder =
            CassetteRecorder::new(dir.path().join("runner.cassette.yaml"), "r", "unknown");
        recorder.record("runner", "execute", json!({}), json!({"ok": {"class_name": "A"}}));
        recorder.finish().unwrap();

        let config = CassetteConfig::from_dir(dir.path());
        assert!(config.runner.is_some());
        assert!(config.oracle.is_none());
        assert!(config.clock.is_none());

        let mut replayers = config.load_all().unwrap();
        let runner = replayers.runner.as_mut().unwrap();
        assert_eq!(runner.next_interaction("runner", "execute").output["ok"]["class_name"], "A");
        assert!(replayers.git.is_none());
    }

    #[test]
    fn load_all_surfaces_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("git.cassette.yaml");
        std::fs::write(&path, "not: [a cassette").unwrap();

        let config = CassetteConfig { git: Some(path), ..CassetteConfig::default() };
        let err = config.load_all().err().unwrap();
        assert!(err.contains("Failed to parse cassette file"));
    }
}
