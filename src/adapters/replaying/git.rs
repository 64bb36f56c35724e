//! Replaying adapter for the `GitRepo` port.

use super::{next_output, replay_result, SharedReplayer};
use crate::error::BoxError;
use crate::ports::git::GitRepo;

/// Serves recorded git results.
pub struct ReplayingGitRepo {
    replayer: SharedReplayer,
}

impl ReplayingGitRepo {
    /// Creates a git repo backed by `replayer`.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer }
    }

    fn replay<T: serde::de::DeserializeOwned>(&self, method: &str) -> Result<T, BoxError> {
        replay_result(next_output(&self.replayer, "git", method))
    }
}

impl GitRepo for ReplayingGitRepo {
    fn current_commit(&self) -> Result<String, BoxError> {
        self.replay("current_commit")
    }

    fn add_all(&self) -> Result<(), BoxError> {
        self.replay("add_all")
    }

    fn add(&self, _path: &str) -> Result<(), BoxError> {
        self.replay("add")
    }

    fn status_porcelain(&self) -> Result<String, BoxError> {
        self.replay("status_porcelain")
    }

    fn commit(&self, _message: &str) -> Result<(), BoxError> {
        self.replay("commit")
    }

    fn reset_hard(&self, _target: &str) -> Result<(), BoxError> {
        self.replay("reset_hard")
    }
}
