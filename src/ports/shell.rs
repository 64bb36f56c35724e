//! Shell executor port for running external commands.

use serde::{Deserialize, Serialize};

use crate::error::BoxError;

/// The output of a shell command execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellOutput {
    /// The exit code of the process (`-1` if killed by a signal).
    pub exit_code: i32,
    /// The captured standard output.
    pub stdout: String,
    /// The captured standard error.
    pub stderr: String,
}

impl ShellOutput {
    /// Returns `true` when the process exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes shell command lines.
///
/// The command-template adapters for the test runner, discovery, and the
/// repair oracle are built on this port. Calls block until the process
/// exits; no timeout is applied.
pub trait ShellExecutor: Send + Sync {
    /// Runs a command line in the system shell and returns its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    fn run(&self, command: &str) -> Result<ShellOutput, BoxError>;
}
