//! Commit-before, reset-after safety net around a repair loop.

use tracing::{debug, info};

use crate::error::MendError;
use crate::ports::git::GitRepo;

/// Result of [`SnapshotManager::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Hash of the checkpoint commit. `None` when the working tree was
    /// already clean and nothing was committed.
    pub commit: Option<String>,
}

impl Checkpoint {
    /// Whether a checkpoint commit was created.
    #[must_use]
    pub fn committed(&self) -> bool {
        self.commit.is_some()
    }
}

/// Wraps [`GitRepo`] primitives into checkpoint, stage, and rollback.
/// Every git failure becomes [`MendError::VersionControl`].
pub struct SnapshotManager<'a> {
    git: &'a dyn GitRepo,
}

impl<'a> SnapshotManager<'a> {
    /// Creates a manager over `git`.
    #[must_use]
    pub fn new(git: &'a dyn GitRepo) -> Self {
        Self { git }
    }

    /// Stages everything and commits it, unless there is nothing to commit.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::VersionControl`] if a git command fails.
    pub fn snapshot(&self, message: &str) -> Result<Checkpoint, MendError> {
        self.git.add_all().map_err(vcs)?;
        let status = self.git.status_porcelain().map_err(vcs)?;
        if status.trim().is_empty() {
            debug!("working tree clean, no checkpoint commit");
            return Ok(Checkpoint { commit: None });
        }
        self.git.commit(message).map_err(vcs)?;
        let commit = self.git.current_commit().map_err(vcs)?;
        info!(%message, %commit, "checkpoint committed");
        Ok(Checkpoint { commit: Some(commit) })
    }

    /// Stages one file for the next commit.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::VersionControl`] if `git add` fails.
    pub fn stage(&self, path: &str) -> Result<(), MendError> {
        self.git.add(path).map_err(vcs)
    }

    /// Discards every change made since `checkpoint`: resets to the parent
    /// of the checkpoint commit if one was made, otherwise to `HEAD`.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::VersionControl`] if the reset fails.
    pub fn rollback(&self, checkpoint: &Checkpoint) -> Result<(), MendError> {
        let target = match &checkpoint.commit {
            Some(commit) => format!("{commit}~1"),
            None => "HEAD".to_string(),
        };
        info!(reset_to = %target, "rolling back");
        self.git.reset_hard(&target).map_err(vcs)
    }
}

fn vcs(err: crate::error::BoxError) -> MendError {
    MendError::VersionControl(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::replaying::fixtures::replayer;
    use crate::adapters::replaying::ReplayingGitRepo;
    use serde_json::json;

    #[test]
    fn dirty_tree_is_committed() {
        let git = ReplayingGitRepo::new(replayer(&[
            ("git", "add_all", json!({"ok": null})),
            ("git", "status_porcelain", json!({"ok": "M  CalcTest.kt\n"})),
            ("git", "commit", json!({"ok": null})),
            ("git", "current_commit", json!({"ok": "3f2c9e1"})),
        ]));
        let checkpoint = SnapshotManager::new(&git).snapshot("before repair").unwrap();
        assert!(checkpoint.committed());
        assert_eq!(checkpoint.commit.as_deref(), Some("3f2c9e1"));
    }

    #[test]
    fn clean_tree_makes_no_commit() {
        // A commit call would exhaust the cassette and panic.
        let git = ReplayingGitRepo::new(replayer(&[
            ("git", "add_all", json!({"ok": null})),
            ("git", "status_porcelain", json!({"ok": ""})),
        ]));
        let checkpoint = SnapshotManager::new(&git).snapshot("before repair").unwrap();
        assert!(!checkpoint.committed());
    }

    #[test]
    fn git_failures_are_version_control_errors() {
        let git = ReplayingGitRepo::new(replayer(&[(
            "git",
            "add_all",
            json!({"err": "git add -A failed: not a git repository"}),
        )]));
        let err = SnapshotManager::new(&git).snapshot("x").unwrap_err();
        assert!(matches!(err, MendError::VersionControl(ref m) if m.contains("not a git repository")));
    }
}
