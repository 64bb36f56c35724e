//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::Arc;

use crate::adapters::live::clock::LiveClock;
use crate::adapters::live::discovery::{CommandTestDiscovery, SourceScanDiscovery};
use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::git::LiveGitRepo;
use crate::adapters::live::llm::LiveLlmClient;
use crate::adapters::live::oracle::{CommandRepairOracle, LlmRepairOracle};
use crate::adapters::live::runner::CommandTestRunner;
use crate::adapters::live::shell::LiveShellExecutor;
use crate::adapters::recording::{
    RecordingClock, RecordingGitRepo, RecordingRepairOracle, RecordingTestDiscovery,
    RecordingTestRunner,
};
use crate::adapters::replaying::{
    self, shared, ReplayingClock, ReplayingGitRepo, ReplayingRepairOracle,
    ReplayingTestDiscovery, ReplayingTestRunner,
};
use crate::cassette::config::CassetteConfig;
use crate::cassette::session::RecordingSession;
use crate::config::{MendConfig, OracleBackend};
use crate::ports::clock::Clock;
use crate::ports::discovery::TestDiscovery;
use crate::ports::filesystem::FileSystem;
use crate::ports::git::GitRepo;
use crate::ports::oracle::RepairOracle;
use crate::ports::runner::TestRunner;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors wire
/// up live, recording, or replaying adapters; fields are public so tests
/// can swap in their own.
pub struct ServiceContext {
    /// Current time.
    pub clock: Box<dyn Clock>,
    /// Project and storage file I/O.
    pub fs: Box<dyn FileSystem>,
    /// Version control in the project root.
    pub git: Box<dyn GitRepo>,
    /// Test execution engine.
    pub runner: Box<dyn TestRunner>,
    /// Test method discovery.
    pub discovery: Box<dyn TestDiscovery>,
    /// Repair oracle.
    pub oracle: Box<dyn RepairOracle>,
}

impl ServiceContext {
    /// Live adapters for the project at `project_root`.
    #[must_use]
    pub fn live(project_root: &Path, config: &MendConfig) -> Self {
        let shell = || Box::new(LiveShellExecutor::in_dir(project_root));

        let discovery: Box<dyn TestDiscovery> = if config.runner.discover_command.trim().is_empty() {
            Box::new(SourceScanDiscovery::new(project_root, config.layout.clone()))
        } else {
            Box::new(CommandTestDiscovery::new(shell(), config.runner.discover_command.clone()))
        };

        let oracle: Box<dyn RepairOracle> = match config.oracle.backend {
            OracleBackend::Command => {
                Box::new(CommandRepairOracle::new(shell(), config.oracle.command.clone()))
            }
            OracleBackend::Anthropic => Box::new(LlmRepairOracle::new(
                Box::new(LiveLlmClient::new()),
                config.oracle.model.clone(),
                config.oracle.max_tokens,
            )),
        };

        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            git: Box::new(LiveGitRepo::new(project_root)),
            runner: Box::new(CommandTestRunner::new(shell(), config.runner.execute_command.clone())),
            discovery,
            oracle,
        }
    }

    /// Live adapters whose clock, git, runner, discovery, and oracle calls
    /// are written to `session`. The filesystem is not recorded.
    #[must_use]
    pub fn recording(project_root: &Path, config: &MendConfig, session: &RecordingSession) -> Self {
        let live = Self::live(project_root, config);
        Self {
            clock: Box::new(RecordingClock::new(live.clock, Arc::clone(&session.clock))),
            fs: live.fs,
            git: Box::new(RecordingGitRepo::new(live.git, Arc::clone(&session.git))),
            runner: Box::new(RecordingTestRunner::new(live.runner, Arc::clone(&session.runner))),
            discovery: Box::new(RecordingTestDiscovery::new(
                live.discovery,
                Arc::clone(&session.discovery),
            )),
            oracle: Box::new(RecordingRepairOracle::new(live.oracle, Arc::clone(&session.oracle))),
        }
    }

    /// Replays the per-port cassettes found in a recording directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a cassette in `dir` cannot be read or parsed.
    pub fn replaying(dir: &Path) -> Result<Self, String> {
        Self::replaying_from(&CassetteConfig::from_dir(dir))
    }

    /// Replays the configured cassettes. The filesystem stays live; ports
    /// without a cassette panic when called.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured cassette cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        let or_unconfigured = |r: Option<_>| r.map_or_else(replaying::unconfigured, shared);

        Ok(Self {
            clock: Box::new(ReplayingClock::new(or_unconfigured(replayers.clock))),
            fs: Box::new(LiveFileSystem),
            git: Box::new(ReplayingGitRepo::new(or_unconfigured(replayers.git))),
            runner: Box::new(ReplayingTestRunner::new(or_unconfigured(replayers.runner))),
            discovery: Box::new(ReplayingTestDiscovery::new(or_unconfigured(replayers.discovery))),
            oracle: Box::new(ReplayingRepairOracle::new(or_unconfigured(replayers.oracle))),
        })
    }
}
