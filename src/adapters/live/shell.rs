//! Live shell executor using `std::process::Command`.

use std::path::PathBuf;
use std::process::Command;

use crate::error::BoxError;
use crate::ports::shell::{ShellExecutor, ShellOutput};

/// Live shell executor that runs command lines via `sh -c`.
pub struct LiveShellExecutor {
    working_dir: Option<PathBuf>,
}

impl LiveShellExecutor {
    /// Creates an executor that runs in the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self { working_dir: None }
    }

    /// Creates an executor that runs every command in `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { working_dir: Some(dir.into()) }
    }
}

impl Default for LiveShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellExecutor for LiveShellExecutor {
    fn run(&self, command: &str) -> Result<ShellOutput, BoxError> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        let output = cmd.output()?;
        Ok(ShellOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Quotes `value` for safe interpolation into a POSIX shell command line.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Replaces `{placeholder}` in `template` with the shell-quoted `value`.
#[must_use]
pub fn render_template(template: &str, placeholder: &str, value: &str) -> String {
    template.replace(&format!("{{{placeholder}}}"), &shell_quote(value))
}
