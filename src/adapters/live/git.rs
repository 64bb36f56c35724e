//! Live git adapter using `git` CLI commands.

use std::path::PathBuf;
use std::process::Command;

use crate::error::BoxError;
use crate::ports::git::GitRepo;

/// Live git adapter that shells out to the `git` CLI in a repository root.
pub struct LiveGitRepo {
    root: PathBuf,
}

impl LiveGitRepo {
    /// Creates an adapter operating on the repository at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn git(&self, args: &[&str]) -> Result<String, BoxError> {
        let output = Command::new("git").args(args).current_dir(&self.root).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(format!("git {} failed: {}{}", args.join(" "), stderr.trim(), stdout.trim())
                .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl GitRepo for LiveGitRepo {
    fn current_commit(&self) -> Result<String, BoxError> {
        Ok(self.git(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    fn add_all(&self) -> Result<(), BoxError> {
        self.git(&["add", "-A"]).map(drop)
    }

    fn add(&self, path: &str) -> Result<(), BoxError> {
        self.git(&["add", "--", path]).map(drop)
    }

    fn status_porcelain(&self) -> Result<String, BoxError> {
        self.git(&["status", "--porcelain"])
    }

    fn commit(&self, message: &str) -> Result<(), BoxError> {
        self.git(&["commit", "-m", message]).map(drop)
    }

    fn reset_hard(&self, target: &str) -> Result<(), BoxError> {
        self.git(&["reset", "--hard", target]).map(drop)
    }
}
